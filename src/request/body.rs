// Request bodies
//
// A body is consumed exactly once, when the request is dispatched.

use std::fmt;

use bytes::Bytes;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use crate::files::MultipartSource;

pub enum RequestBody {
    Empty,
    Bytes(Bytes),
    Reader(Box<dyn AsyncRead + Send + Sync + Unpin>),
    Multipart(MultipartSource),
}

impl RequestBody {
    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        RequestBody::Reader(Box::new(reader))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Boundary token when the body is a multipart stream
    pub fn boundary(&self) -> Option<&str> {
        match self {
            RequestBody::Multipart(source) => Some(source.boundary()),
            _ => None,
        }
    }

    pub(crate) fn into_reqwest(self) -> reqwest::Body {
        match self {
            RequestBody::Empty => reqwest::Body::from(Vec::<u8>::new()),
            RequestBody::Bytes(bytes) => reqwest::Body::from(bytes),
            RequestBody::Reader(reader) => reqwest::Body::wrap_stream(ReaderStream::new(reader)),
            RequestBody::Multipart(source) => reqwest::Body::wrap_stream(source.into_stream()),
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Empty
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<MultipartSource> for RequestBody {
    fn from(source: MultipartSource) -> Self {
        RequestBody::Multipart(source)
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            RequestBody::Reader(_) => f.write_str("Reader(..)"),
            RequestBody::Multipart(source) => f
                .debug_struct("Multipart")
                .field("boundary", &source.boundary())
                .finish(),
        }
    }
}
