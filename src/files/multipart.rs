// Multipart encoding of an entry tree
//
// Each node becomes one part, walked depth first. Part headers carry the
// slash-joined, query-escaped path of the node and a content type that tells
// the daemon whether it is a directory, a symlink or file data.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::fs::File;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use rand::RngCore;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use url::form_urlencoded;

use super::entry::{Directory, FileContent, Node};

const DIRECTORY_TYPE: &str = "application/x-directory";
const SYMLINK_TYPE: &str = "application/symlink";
const FILE_TYPE: &str = "application/octet-stream";

type BoxedReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

enum Segment {
    Bytes(Bytes),
    Path(PathBuf),
    Reader(BoxedReader),
}

/// Streaming multipart body plus its boundary token
pub struct MultipartSource {
    boundary: String,
    segments: VecDeque<Segment>,
}

impl MultipartSource {
    /// Encode `directory`'s entries with a fresh random boundary
    ///
    /// `form` selects `form-data; name="file"` dispositions; otherwise parts
    /// are sent as `attachment`.
    pub fn new(directory: Directory, form: bool) -> Self {
        Self::with_boundary(directory, form, random_boundary())
    }

    pub fn with_boundary(directory: Directory, form: bool, boundary: impl Into<String>) -> Self {
        let mut encoder = Encoder {
            boundary: boundary.into(),
            form,
            segments: VecDeque::new(),
            parts: 0,
        };
        encoder.push_directory("", directory);
        encoder.finish()
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn into_stream(self) -> MultipartStream {
        MultipartStream {
            segments: self.segments,
            opening: None,
            current: None,
        }
    }
}

struct Encoder {
    boundary: String,
    form: bool,
    segments: VecDeque<Segment>,
    parts: usize,
}

impl Encoder {
    fn push_directory(&mut self, prefix: &str, directory: Directory) {
        for entry in directory.into_entries() {
            let (name, node) = entry.into_parts();
            let path = join_path(prefix, &name);
            self.push_node(path, node);
        }
    }

    fn push_node(&mut self, path: String, node: Node) {
        match node {
            Node::Directory(dir) => {
                self.push_header(&path, DIRECTORY_TYPE);
                self.push_directory(&path, dir);
            }
            Node::Symlink(target) => {
                self.push_header(&path, SYMLINK_TYPE);
                self.segments.push_back(Segment::Bytes(Bytes::from(target)));
            }
            Node::File(content) => {
                self.push_header(&path, FILE_TYPE);
                self.segments.push_back(match content {
                    FileContent::Path(p) => Segment::Path(p),
                    FileContent::Reader(r) => Segment::Reader(r),
                    FileContent::Bytes(b) => Segment::Bytes(b),
                });
            }
        }
    }

    fn push_header(&mut self, path: &str, content_type: &str) {
        let lead = if self.parts == 0 { "--" } else { "\r\n--" };
        let disposition = if self.form {
            "form-data; name=\"file\""
        } else {
            "attachment"
        };
        let filename: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
        let header = format!(
            "{lead}{boundary}\r\n\
             Content-Disposition: {disposition}; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n",
            boundary = self.boundary,
        );
        self.segments.push_back(Segment::Bytes(Bytes::from(header)));
        self.parts += 1;
    }

    fn finish(mut self) -> MultipartSource {
        let lead = if self.parts == 0 { "--" } else { "\r\n--" };
        let trailer = format!("{}{}--\r\n", lead, self.boundary);
        self.segments.push_back(Segment::Bytes(Bytes::from(trailer)));
        MultipartSource {
            boundary: self.boundary,
            segments: self.segments,
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, name),
    }
}

fn random_boundary() -> String {
    let mut buf = [0u8; 30];
    rand::thread_rng().fill_bytes(&mut buf);
    let mut boundary = String::with_capacity(60);
    for b in buf {
        let _ = write!(boundary, "{:02x}", b);
    }
    boundary
}

/// Read-once byte stream over an encoded multipart body
///
/// Files are opened on the blocking pool when their part is reached.
pub struct MultipartStream {
    segments: VecDeque<Segment>,
    opening: Option<JoinHandle<io::Result<File>>>,
    current: Option<ReaderStream<BoxedReader>>,
}

impl Stream for MultipartStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(opening) = this.opening.as_mut() {
                let opened = match Pin::new(opening).poll(cx) {
                    Poll::Ready(opened) => opened,
                    Poll::Pending => return Poll::Pending,
                };
                this.opening = None;
                match opened {
                    Ok(Ok(file)) => {
                        let file: BoxedReader = Box::new(tokio::fs::File::from_std(file));
                        this.current = Some(ReaderStream::new(file));
                    }
                    Ok(Err(e)) => return Poll::Ready(Some(Err(e))),
                    Err(e) => return Poll::Ready(Some(Err(io::Error::new(io::ErrorKind::Other, e)))),
                }
            }

            if let Some(reader) = this.current.as_mut() {
                match Pin::new(reader).poll_next(cx) {
                    Poll::Ready(Some(item)) => return Poll::Ready(Some(item)),
                    Poll::Ready(None) => this.current = None,
                    Poll::Pending => return Poll::Pending,
                }
            }

            match this.segments.pop_front() {
                None => return Poll::Ready(None),
                Some(Segment::Bytes(bytes)) => return Poll::Ready(Some(Ok(bytes))),
                Some(Segment::Reader(reader)) => this.current = Some(ReaderStream::new(reader)),
                Some(Segment::Path(path)) => {
                    this.opening = Some(tokio::task::spawn_blocking(move || File::open(path)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::DirEntry;
    use futures::TryStreamExt;

    async fn collect(source: MultipartSource) -> String {
        let bytes = source
            .into_stream()
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_random_boundary_shape() {
        let a = random_boundary();
        let b = random_boundary();
        assert_eq!(a.len(), 60);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("", ""), "");
        assert_eq!(join_path("dir", "a"), "dir/a");
    }

    #[tokio::test]
    async fn test_single_unnamed_file() {
        let dir = Directory::single("", Node::bytes("hello"));
        let source = MultipartSource::with_boundary(dir, true, "XYZ");
        assert_eq!(source.content_type(), "multipart/form-data; boundary=XYZ");

        let body = collect(source).await;
        assert_eq!(
            body,
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             hello\r\n--XYZ--\r\n"
        );
    }

    #[tokio::test]
    async fn test_nested_directory_and_link() {
        let inner = Directory::new(vec![
            DirEntry::new("a b.txt", Node::bytes("A")),
            DirEntry::new("ln", Node::symlink("a b.txt")),
        ]);
        let dir = Directory::single("root", Node::Directory(inner));
        let body = collect(MultipartSource::with_boundary(dir, false, "B")).await;

        let expected = "--B\r\n\
             Content-Disposition: attachment; filename=\"root\"\r\n\
             Content-Type: application/x-directory\r\n\r\n\
             \r\n--B\r\n\
             Content-Disposition: attachment; filename=\"root%2Fa+b.txt\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             A\r\n--B\r\n\
             Content-Disposition: attachment; filename=\"root%2Fln\"\r\n\
             Content-Type: application/symlink\r\n\r\n\
             a b.txt\r\n--B--\r\n";
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_empty_directory_closes() {
        let body = collect(MultipartSource::with_boundary(Directory::default(), true, "E")).await;
        assert_eq!(body, "--E--\r\n");
    }

    #[tokio::test]
    async fn test_streams_file_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("f.txt");
        std::fs::write(&path, "on disk").unwrap();

        let dir = Directory::single("f.txt", Node::from_path(&path).unwrap());
        let body = collect(MultipartSource::with_boundary(dir, true, "F")).await;
        assert!(body.contains("filename=\"f.txt\""));
        assert!(body.contains("\r\n\r\non disk\r\n--F--\r\n"));
    }

    #[tokio::test]
    async fn test_missing_file_surfaces_io_error() {
        let dir = Directory::single("gone", Node::File(FileContent::Path("/no/such/file".into())));
        let result = MultipartSource::with_boundary(dir, true, "G")
            .into_stream()
            .try_collect::<Vec<_>>()
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_files_opened_in_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut entries = Vec::new();
        for name in ["a", "b", "c"] {
            let path = tmp.path().join(name);
            std::fs::write(&path, format!("body-{}", name)).unwrap();
            entries.push(DirEntry::new(name, Node::from_path(&path).unwrap()));
        }

        let dir = Directory::single("d", Node::Directory(Directory::new(entries)));
        let body = collect(MultipartSource::with_boundary(dir, true, "H")).await;
        let a = body.find("body-a").unwrap();
        let b = body.find("body-b").unwrap();
        let c = body.find("body-c").unwrap();
        assert!(a < b && b < c);
    }
}
