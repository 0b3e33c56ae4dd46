// Command request builder
//
// A CommandRequest names a daemon command plus its positional arguments,
// options, custom headers and body. Arguments travel as repeated `arg=`
// query parameters, options as one query parameter each.

use std::collections::BTreeMap;

use bytes::Bytes;
use url::Url;

use super::body::RequestBody;
use crate::errors::Result;

/// Path segment every daemon command lives under
pub const API_PATH: &str = "/api/v0";

/// Values accepted by [`CommandRequest::option`]
///
/// Booleans render as `true`/`false`, byte buffers as their string content,
/// everything else through its `Display` rendering.
pub trait OptionValue {
    fn into_option_value(self) -> String;
}

impl OptionValue for bool {
    fn into_option_value(self) -> String {
        self.to_string()
    }
}

impl OptionValue for String {
    fn into_option_value(self) -> String {
        self
    }
}

impl OptionValue for &str {
    fn into_option_value(self) -> String {
        self.to_string()
    }
}

impl OptionValue for &String {
    fn into_option_value(self) -> String {
        self.clone()
    }
}

impl OptionValue for &[u8] {
    fn into_option_value(self) -> String {
        String::from_utf8_lossy(self).into_owned()
    }
}

impl OptionValue for Vec<u8> {
    fn into_option_value(self) -> String {
        match String::from_utf8(self) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

impl OptionValue for Bytes {
    fn into_option_value(self) -> String {
        String::from_utf8_lossy(&self).into_owned()
    }
}

macro_rules! display_option_value {
    ($($t:ty),*) => {
        $(
            impl OptionValue for $t {
                fn into_option_value(self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_option_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64, char);

#[derive(Debug)]
pub struct CommandRequest {
    api_base: String,
    command: String,
    args: Vec<String>,
    options: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    body: RequestBody,
}

impl CommandRequest {
    /// Create a request for `command` against `api_base` (which already ends in `/api/v0`)
    ///
    /// Starts with the two options every call carries: `encoding=json` and
    /// `stream-channels=true`.
    pub fn new<I, S>(api_base: impl Into<String>, command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = BTreeMap::new();
        options.insert("encoding".to_string(), "json".to_string());
        options.insert("stream-channels".to_string(), "true".to_string());

        Self {
            api_base: api_base.into(),
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            options,
            headers: BTreeMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Set an option, overwriting any previous value for `key`
    pub fn option(mut self, key: impl Into<String>, value: impl OptionValue) -> Self {
        self.set_option(key, value);
        self
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: impl OptionValue) -> &mut Self {
        self.options.insert(key.into(), value.into_option_value());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn request_body(&self) -> &RequestBody {
        &self.body
    }

    /// Render `{api_base}/{command}?arg=..&arg=..&{options}`
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.api_base, self.command))?;
        {
            let mut query = url.query_pairs_mut();
            for arg in &self.args {
                query.append_pair("arg", arg);
            }
            for (key, value) in &self.options {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub(crate) fn into_parts(self) -> (String, BTreeMap<String, String>, RequestBody) {
        (self.command, self.headers, self.body)
    }
}
