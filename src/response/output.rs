// Response body stream
//
// Output owns the body of one response. Once closed, every further read
// fails with `Error::BodyClosed`.

use std::fmt;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::errors::{Error, Result};

pub struct Output {
    stream: Option<BoxStream<'static, Result<Bytes>>>,
}

impl Output {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: Some(stream.boxed()),
        }
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Self::empty();
        }
        Self::new(stream::once(async move { Ok(bytes) }))
    }

    pub fn empty() -> Self {
        Self::new(stream::empty())
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Next chunk of the body, `None` at end of stream
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        let stream = self.stream.as_mut().ok_or(Error::BodyClosed)?;
        stream.next().await.transpose()
    }

    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }

    /// Read and discard the rest of the body
    pub async fn drain(&mut self) -> Result<u64> {
        let mut drained = 0u64;
        while let Some(chunk) = self.chunk().await? {
            drained += chunk.len() as u64;
        }
        Ok(drained)
    }

    /// Drain then release the stream
    ///
    /// The stream is released even when draining fails; the drain error is returned.
    /// Closing an already closed body is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.stream.is_none() {
            return Ok(());
        }
        let drained = self.drain().await;
        self.stream = None;
        drained.map(|_| ())
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn test_read_after_close_fails() {
        let mut output = Output::from_bytes("boom");
        output.close().await.unwrap();
        assert!(output.is_closed());
        assert!(matches!(output.chunk().await, Err(Error::BodyClosed)));
        assert!(matches!(output.read_to_end().await, Err(Error::BodyClosed)));
        // Second close is harmless
        output.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_read_to_end_joins_chunks() {
        let chunks = vec![Ok(Bytes::from("ab")), Ok(Bytes::from("cd"))];
        let mut output = Output::new(stream::iter(chunks));
        assert_eq!(output.read_to_end().await.unwrap(), b"abcd");
        assert_eq!(output.chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_close_releases_on_drain_error() {
        let chunks = vec![
            Ok(Bytes::from("ab")),
            Err(Error::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))),
        ];
        let mut output = Output::new(stream::iter(chunks));
        assert!(matches!(output.close().await, Err(Error::Io(_))));
        assert!(output.is_closed());
    }

    #[tokio::test]
    async fn test_empty_output() {
        let mut output = Output::from_bytes(Vec::new());
        assert_eq!(output.drain().await.unwrap(), 0);
    }
}
