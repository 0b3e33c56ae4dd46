// Success handle and JSON decoding
//
// Every consuming method closes the body before returning, whatever the outcome.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::output::Output;
use crate::errors::{Error, Result};

/// Open body of a successful response
#[derive(Debug)]
pub struct Responder {
    output: Output,
}

impl Responder {
    pub(crate) fn new(output: Output) -> Self {
        Self { output }
    }

    pub fn is_closed(&self) -> bool {
        self.output.is_closed()
    }

    /// Take the raw body; the caller becomes responsible for closing it
    pub fn into_output(self) -> Output {
        self.output
    }

    /// Decode the first JSON value of the body into `T`
    ///
    /// The whole body is buffered and parsed once. An empty body is a decode error.
    pub async fn decode<T: DeserializeOwned>(mut self) -> Result<T> {
        let body = self.output.read_to_end().await;
        self.release().await;
        first_value(&body?)
    }

    /// Decode a newline-delimited JSON body into a list, in order
    pub async fn decode_lines<T: DeserializeOwned>(mut self) -> Result<Vec<T>> {
        let mut values = Vec::new();
        let mut reader = JsonValues::new(&mut self.output);
        let outcome = loop {
            match reader.next::<T>().await {
                Ok(Some(value)) => values.push(value),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        let parses = reader.parses;
        self.release().await;
        outcome?;
        debug!(records = values.len(), parses, "Decoded JSON stream");
        Ok(values)
    }

    /// Discard the body, returning any error hit while draining it
    pub async fn close(mut self) -> Result<()> {
        self.output.close().await
    }

    async fn release(&mut self) {
        if let Err(e) = self.output.close().await {
            debug!(error = %e, "Failed to drain response body");
        }
    }
}

fn first_value<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut values = serde_json::Deserializer::from_slice(body).into_iter::<T>();
    match values.next() {
        Some(value) => Ok(value?),
        None => Err(empty_body()),
    }
}

fn empty_body() -> Error {
    Error::Decode(serde_json::Error::io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "empty response body",
    )))
}

/// Incremental reader of newline-delimited JSON values
///
/// The buffer is only re-parsed once a newline (or the end of the body) has
/// arrived since the last incomplete attempt, so a large single value costs
/// one parse instead of one per chunk.
struct JsonValues<'a> {
    output: &'a mut Output,
    buf: Vec<u8>,
    ready: bool,
    done: bool,
    parses: usize,
}

impl<'a> JsonValues<'a> {
    fn new(output: &'a mut Output) -> Self {
        Self {
            output,
            buf: Vec::new(),
            ready: false,
            done: false,
            parses: 0,
        }
    }

    /// Next value, `None` once the stream ends cleanly
    async fn next<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        loop {
            if self.ready {
                self.parses += 1;
                let parsed = {
                    let mut values =
                        serde_json::Deserializer::from_slice(&self.buf).into_iter::<T>();
                    values
                        .next()
                        .map(|result| result.map(|value| (value, values.byte_offset())))
                };

                match parsed {
                    Some(Ok((value, consumed))) => {
                        self.buf.drain(..consumed);
                        return Ok(Some(value));
                    }
                    // Partial value; wait for more lines unless the stream is over
                    Some(Err(e)) if e.is_eof() && !self.done => self.ready = false,
                    Some(Err(e)) => return Err(e.into()),
                    None if self.done => return Ok(None),
                    None => self.ready = false,
                }
            }

            match self.output.chunk().await? {
                Some(chunk) => {
                    if chunk.contains(&b'\n') {
                        self.ready = true;
                    }
                    self.buf.extend_from_slice(&chunk);
                }
                None => {
                    self.done = true;
                    self.ready = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use serde::Deserialize;
    use std::io;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Record {
        hash: String,
        name: String,
        size: String,
    }

    fn chunked(body: &str, size: usize) -> Responder {
        let chunks: Vec<Result<Bytes>> = body
            .as_bytes()
            .chunks(size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Responder::new(Output::new(stream::iter(chunks)))
    }

    #[tokio::test]
    async fn test_decode_record() {
        let responder = chunked(r#"{"Hash":"QmX","Name":"f.txt","Size":"12"}"#, 5);
        let record: Record = responder.decode().await.unwrap();
        assert_eq!(
            record,
            Record {
                hash: "QmX".into(),
                name: "f.txt".into(),
                size: "12".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_decode_takes_first_value() {
        let responder = chunked("{\"Hash\":\"a\",\"Name\":\"\",\"Size\":\"1\"}\n{\"Hash\":\"b\"}", 7);
        let record: Record = responder.decode().await.unwrap();
        assert_eq!(record.hash, "a");
    }

    #[tokio::test]
    async fn test_decode_empty_body_is_decode_error() {
        let responder = Responder::new(Output::empty());
        let err = responder.decode::<Record>().await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_decode_malformed() {
        let responder = chunked("{\"Hash\":", 100);
        let err = responder.decode::<Record>().await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_decode_lines_in_order() {
        let body = "{\"Hash\":\"a\",\"Name\":\"d/a\",\"Size\":\"1\"}\n\
                    {\"Hash\":\"b\",\"Name\":\"d/b\",\"Size\":\"2\"}\n\
                    {\"Hash\":\"c\",\"Name\":\"d\",\"Size\":\"3\"}\n";
        let records: Vec<Record> = chunked(body, 4).decode_lines().await.unwrap();
        let hashes: Vec<_> = records.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_decode_lines_empty_stream() {
        let records: Vec<Record> = chunked("\n", 1).decode_lines().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_decode_lines_surfaces_bad_record() {
        let body = "{\"Hash\":\"a\",\"Name\":\"\",\"Size\":\"1\"}\n{\"Hash\":3}\n";
        let err = chunked(body, 8).decode_lines::<Record>().await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_decode_lines_truncated_tail() {
        let body = "{\"Hash\":\"a\",\"Name\":\"\",\"Size\":\"1\"}\n{\"Hash\":\"b\"";
        let err = chunked(body, 8).decode_lines::<Record>().await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_large_value_parsed_once() {
        let records: Vec<String> = (0..2000)
            .map(|i| format!(r#"{{"Hash":"Qm{i}","Name":"n{i}","Size":"{i}"}}"#))
            .collect();
        let body = format!("[{}]\n", records.join(","));
        let chunks: Vec<Result<Bytes>> = body
            .as_bytes()
            .chunks(64)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let mut output = Output::new(stream::iter(chunks));

        let mut reader = JsonValues::new(&mut output);
        let value: Vec<Record> = reader.next().await.unwrap().unwrap();
        assert_eq!(value.len(), 2000);
        assert_eq!(value[1999].hash, "Qm1999");
        assert_eq!(reader.parses, 1);
        assert!(reader.next::<Vec<Record>>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decode_lines_without_trailing_newline() {
        let body = "{\"Hash\":\"a\",\"Name\":\"\",\"Size\":\"1\"}\n{\"Hash\":\"b\",\"Name\":\"\",\"Size\":\"2\"}";
        let records: Vec<Record> = chunked(body, 3).decode_lines().await.unwrap();
        let hashes: Vec<_> = records.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_close_reports_drain_error() {
        let chunks = vec![
            Ok(Bytes::from("x")),
            Err(Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))),
        ];
        let responder = Responder::new(Output::new(stream::iter(chunks)));
        assert!(matches!(responder.close().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_transport_error_mid_body() {
        let chunks = vec![
            Ok(Bytes::from("{\"Hash\"")),
            Err(Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))),
        ];
        let responder = Responder::new(Output::new(stream::iter(chunks)));
        assert!(matches!(responder.decode::<Record>().await, Err(Error::Io(_))));
    }
}
