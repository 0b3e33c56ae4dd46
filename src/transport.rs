// Transport dispatcher
//
// Owns the HTTP client used for every daemon call. Keep-alive pooling is off
// and redirects are rejected rather than followed.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::errors::{Error, Result};
use crate::request::CommandRequest;
use crate::response::RawResponse;

#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new() -> Result<Self> {
        Self::from_builder(Client::builder())
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::from_builder(Client::builder().timeout(timeout))
    }

    /// Finish a caller-configured builder
    ///
    /// Pooling and redirect settings are always overridden.
    pub fn from_builder(builder: ClientBuilder) -> Result<Self> {
        let client = builder
            .pool_max_idle_per_host(0) // Disable connection reuse
            .redirect(Policy::custom(|attempt| attempt.error("unexpected redirect")))
            .build()?;
        Ok(Self { client })
    }

    /// POST the request and return the raw response
    ///
    /// When `cancel` fires before the response headers arrive the call
    /// fails with `Error::Cancelled`.
    pub async fn send(
        &self,
        request: CommandRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<RawResponse> {
        let url = request.url()?;
        let (command, custom_headers, body) = request.into_parts();

        let mut headers = HeaderMap::new();
        for (key, value) in &custom_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| Error::InvalidHeader(key.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(key.clone()))?;
            headers.append(name, value);
        }

        if let Some(boundary) = body.boundary() {
            let content_type = format!("multipart/form-data; boundary={}", boundary);
            let content_type =
                HeaderValue::from_str(&content_type).map_err(|_| Error::InvalidHeader(content_type))?;
            headers.insert(CONTENT_TYPE, content_type);
            headers.insert(
                CONTENT_DISPOSITION,
                HeaderValue::from_static("form-data; name=\"files\""),
            );
        }

        debug!(command = %command, url = %url, "Dispatching daemon command");

        let pending = self
            .client
            .post(url)
            .headers(headers)
            .body(body.into_reqwest())
            .send();

        let response = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(command = %command, "Daemon command cancelled");
                    return Err(Error::Cancelled);
                }
                response = pending => response,
            },
            None => pending.await,
        };

        let response = response.map_err(|e| {
            if e.is_timeout() {
                error!(command = %command, "Daemon request timed out: {}", e);
            } else if e.is_connect() {
                error!(command = %command, "Could not connect to daemon: {}", e);
            } else if e.is_redirect() {
                error!(command = %command, "Daemon answered with a redirect: {}", e);
            } else {
                error!(command = %command, "Daemon request failed: {}", e);
            }
            Error::from(e)
        })?;

        debug!(command = %command, status = %response.status(), "Daemon responded");
        Ok(RawResponse::from_reqwest(response))
    }
}
