// Shell implementation
//
// Builds command requests with the shell's defaults and drives them through
// the transport, the response classifier and the JSON decoder.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ShellConfig;
use crate::errors::Result;
use crate::request::{CommandRequest, OptionValue, RequestBody, API_PATH};
use crate::response::{classify, Responder};
use crate::transport::Transport;

/// Client for one daemon
///
/// Holds only read-shared state after construction, so one Shell (or its
/// clones) can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct Shell {
    api_base: String,
    transport: Transport,
    options: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    body: Option<Bytes>,
    cancel: Option<CancellationToken>,
}

impl Shell {
    /// Create a shell for the daemon at `url` (e.g. "localhost:5001")
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self::with_transport(url, Transport::new()?))
    }

    /// Create a shell that dispatches through an existing transport
    pub fn with_transport(url: &str, transport: Transport) -> Self {
        let api_base = format!("{}{}", normalize_url(url), API_PATH);
        info!(api_base = %api_base, "Created daemon shell");

        Self {
            api_base,
            transport,
            options: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
            cancel: None,
        }
    }

    pub fn from_config(config: &ShellConfig) -> Result<Self> {
        let transport = match config.timeout() {
            Some(timeout) => Transport::with_timeout(timeout)?,
            None => Transport::new()?,
        };

        let mut shell = Self::with_transport(&config.api_address, transport);
        shell.options = config.options.clone();
        shell.headers = config.headers.clone();
        Ok(shell)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Option sent with every request
    pub fn with_option(mut self, key: impl Into<String>, value: impl OptionValue) -> Self {
        self.options.insert(key.into(), value.into_option_value());
        self
    }

    /// Header sent with every request
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Body sent with requests that do not set their own
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Copy of this shell whose calls abort when `token` is cancelled
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        let mut shell = self.clone();
        shell.cancel = Some(token);
        shell
    }

    /// Start a request for `command` carrying the shell's defaults
    pub fn request<I, S>(&self, command: &str, args: I) -> CommandRequest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut request = CommandRequest::new(self.api_base.clone(), command, args);
        for (key, value) in &self.options {
            request.set_option(key, value);
        }
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        if let Some(body) = &self.body {
            request = request.body(RequestBody::Bytes(body.clone()));
        }
        request
    }

    /// Send the request and classify the response
    ///
    /// On success the returned handle owns the open body.
    pub async fn post(&self, request: CommandRequest) -> Result<Responder> {
        let command = request.command().to_string();
        let raw = self.transport.send(request, self.cancel.as_ref()).await?;
        classify(raw, &command).await
    }

    /// Send the request and decode a single JSON value
    pub async fn exec<T: DeserializeOwned>(&self, request: CommandRequest) -> Result<T> {
        self.post(request).await?.decode().await
    }

    /// Send the request and decode a newline-delimited JSON stream
    pub async fn exec_lines<T: DeserializeOwned>(&self, request: CommandRequest) -> Result<Vec<T>> {
        self.post(request).await?.decode_lines().await
    }

    /// Send the request and discard the body
    pub async fn exec_discard(&self, request: CommandRequest) -> Result<()> {
        self.post(request).await?.close().await
    }
}

/// Prefix `http://` when no scheme is given and drop trailing slashes
fn normalize_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("localhost:5001"), "http://localhost:5001");
        assert_eq!(normalize_url("http://127.0.0.1:5001/"), "http://127.0.0.1:5001");
        assert_eq!(normalize_url("https://node.example"), "https://node.example");
    }

    #[test]
    fn test_api_base_appended_once() {
        let shell = Shell::new("localhost:5001").unwrap();
        assert_eq!(shell.api_base(), "http://localhost:5001/api/v0");

        let url = shell.request("ls", ["/ipfs/Qm"]).url().unwrap();
        assert_eq!(url.path(), "/api/v0/ls");
    }

    #[test]
    fn test_request_carries_defaults() {
        let shell = Shell::new("localhost:5001")
            .unwrap()
            .with_option("cid-version", 1u8)
            .with_header("X-Client", "tests")
            .with_body("payload");

        let request = shell.request("add", Vec::<String>::new());
        assert_eq!(request.options()["encoding"], "json");
        assert_eq!(request.options()["cid-version"], "1");
        assert_eq!(request.headers()["X-Client"], "tests");
        assert!(matches!(request.request_body(), RequestBody::Bytes(b) if &b[..] == b"payload"));
    }

    #[test]
    fn test_shell_option_overrides_builtin_default() {
        let shell = Shell::new("localhost:5001").unwrap().with_option("stream-channels", false);
        let request = shell.request("add", Vec::<String>::new());
        assert_eq!(request.options()["stream-channels"], "false");
    }

    #[test]
    fn test_from_config() {
        let mut config = ShellConfig::new("10.1.1.1:5001");
        config.timeout_seconds = Some(3);
        config.headers.insert("Origin".into(), "local".into());
        let shell = Shell::from_config(&config).unwrap();
        assert_eq!(shell.api_base(), "http://10.1.1.1:5001/api/v0");
        assert_eq!(shell.request("id", Vec::<String>::new()).headers()["Origin"], "local");
    }
}
