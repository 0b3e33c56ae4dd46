// Upload entries
//
// A Node is a regular file, a symlink or a directory of named entries.
// File content is never read here; it is opened when the multipart body streams.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::AsyncRead;
use walkdir::WalkDir;

pub enum FileContent {
    /// Opened lazily while the body streams
    Path(PathBuf),
    Reader(Box<dyn AsyncRead + Send + Sync + Unpin>),
    Bytes(Bytes),
}

impl fmt::Debug for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileContent::Path(p) => f.debug_tuple("Path").field(p).finish(),
            FileContent::Reader(_) => f.write_str("Reader(..)"),
            FileContent::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
        }
    }
}

#[derive(Debug)]
pub enum Node {
    File(FileContent),
    Symlink(String),
    Directory(Directory),
}

impl Node {
    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Node::File(FileContent::Reader(Box::new(reader)))
    }

    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Node::File(FileContent::Bytes(bytes.into()))
    }

    pub fn symlink(target: impl Into<String>) -> Self {
        Node::Symlink(target.into())
    }

    /// Build a node tree for a local path
    ///
    /// The path itself is not followed when it is a symlink. Directory
    /// children are visited in file-name order and hidden entries (names
    /// starting with `.`) are skipped.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Node> {
        let path = path.as_ref();
        let meta = std::fs::symlink_metadata(path)?;
        let file_type = meta.file_type();

        if file_type.is_symlink() {
            let target = std::fs::read_link(path)?;
            return Ok(Node::Symlink(target.to_string_lossy().into_owned()));
        }

        if file_type.is_dir() {
            let mut entries = Vec::new();
            for entry in WalkDir::new(path)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
            {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') {
                    continue;
                }
                entries.push(DirEntry::new(name, Node::from_path(entry.path())?));
            }
            return Ok(Node::Directory(Directory::new(entries)));
        }

        if file_type.is_file() {
            return Ok(Node::File(FileContent::Path(path.to_path_buf())));
        }

        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported file type: {}", path.display()),
        ))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }
}

#[derive(Debug)]
pub struct DirEntry {
    name: String,
    node: Node,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, node: Node) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub(crate) fn into_parts(self) -> (String, Node) {
        (self.name, self.node)
    }
}

/// Ordered list of named entries
#[derive(Debug, Default)]
pub struct Directory {
    entries: Vec<DirEntry>,
}

impl Directory {
    pub fn new(entries: Vec<DirEntry>) -> Self {
        Self { entries }
    }

    /// Directory holding a single entry
    pub fn single(name: impl Into<String>, node: Node) -> Self {
        Self::new(vec![DirEntry::new(name, node)])
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<DirEntry> {
        self.entries
    }
}
