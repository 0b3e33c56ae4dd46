// Response classification
//
// Status >= 400 turns into a ProtocolError whose message is pulled from the
// body according to its content type. The body is always drained and closed
// before the error is returned. Anything below 400 is handed back open.

use std::fmt;

use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::output::Output;
use super::responder::Responder;
use crate::errors::{Error, ProtocolError, Result};

/// Status, content type and body of a daemon response
pub struct RawResponse {
    status: StatusCode,
    content_type: String,
    output: Output,
}

impl RawResponse {
    pub fn new(status: StatusCode, content_type: impl Into<String>, output: Output) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            output,
        }
    }

    pub fn from_reqwest(response: reqwest::Response) -> Self {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let output = Output::new(response.bytes_stream().map_err(Error::from));
        Self::new(status, content_type, output)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Content type without parameters such as `; charset=utf-8`
    pub fn media_type(&self) -> &str {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Turn a raw response for `command` into a success handle or a protocol error
pub async fn classify(raw: RawResponse, command: &str) -> Result<Responder> {
    if raw.status.as_u16() < 400 {
        return Ok(Responder::new(raw.output));
    }

    let status = raw.status.as_u16();
    let media_type = raw.media_type().to_string();
    let mut output = raw.output;

    let error = if raw.status == StatusCode::NOT_FOUND {
        ProtocolError::new(command, "command not found")
    } else {
        match media_type.as_str() {
            "text/plain" => {
                let message = match output.read_to_end().await {
                    Ok(body) => String::from_utf8_lossy(&body).into_owned(),
                    Err(e) => {
                        warn!(status, error = %e, "ipfs-shell: response read error");
                        String::new()
                    }
                };
                ProtocolError::new(command, message)
            }
            "application/json" => json_error(command, status, &mut output).await,
            other => {
                warn!(status, encoding = other, "ipfs-shell: unhandled response encoding");
                let body = match output.read_to_end().await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(status, error = %e, "ipfs-shell: response read error");
                        Vec::new()
                    }
                };
                ProtocolError::new(
                    command,
                    format!(
                        "unknown ipfs-shell error encoding: {:?} - {:?}",
                        other,
                        String::from_utf8_lossy(&body)
                    ),
                )
            }
        }
    };

    if let Err(e) = output.close().await {
        debug!(status, error = %e, "Failed to drain error response body");
    }

    Err(Error::Protocol(error))
}

/// Pull `Message` and `Code` out of a JSON error envelope
///
/// A malformed envelope degrades to an empty message.
async fn json_error(command: &str, status: u16, output: &mut Output) -> ProtocolError {
    let body = match output.read_to_end().await {
        Ok(body) => body,
        Err(e) => {
            warn!(status, error = %e, "ipfs-shell: response read error");
            return ProtocolError::new(command, "");
        }
    };

    let envelope = serde_json::Deserializer::from_slice(&body)
        .into_iter::<Map<String, Value>>()
        .next()
        .unwrap_or_else(|| Err(serde_json::Error::io(eof("empty error body"))));

    match envelope {
        Ok(fields) => {
            let message = match fields.get("Message") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            let code = fields.get("Code").and_then(Value::as_i64);
            ProtocolError::new(command, message).with_code(code)
        }
        Err(e) => {
            warn!(status, error = %e, "ipfs-shell: response unmarshal error");
            ProtocolError::new(command, "")
        }
    }
}

fn eof(msg: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::UnexpectedEof, msg.to_string())
}
