// Add operations
//
// Every add sends a multipart body holding a single top-level entry: a file,
// a reader, a symlink or a whole directory tree.

use std::path::Path;

use tokio::io::AsyncRead;
use tracing::debug;

use super::shell::Shell;
use super::types::AddResult;
use crate::errors::{Error, Result};
use crate::files::{Directory, MultipartSource, Node};
use crate::request::CommandRequest;

/// Per-call flags for [`Shell::add`]; unset flags are not sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    pub only_hash: Option<bool>,
    pub pin: Option<bool>,
    pub progress: Option<bool>,
    pub raw_leaves: Option<bool>,
}

impl AddOptions {
    /// Compute the hash without storing the data
    pub fn only_hash(mut self, enabled: bool) -> Self {
        self.only_hash = Some(enabled);
        self
    }

    pub fn pin(mut self, enabled: bool) -> Self {
        self.pin = Some(enabled);
        self
    }

    pub fn progress(mut self, enabled: bool) -> Self {
        self.progress = Some(enabled);
        self
    }

    pub fn raw_leaves(mut self, enabled: bool) -> Self {
        self.raw_leaves = Some(enabled);
        self
    }

    fn apply(&self, request: &mut CommandRequest) {
        let flags = [
            ("only-hash", self.only_hash),
            ("pin", self.pin),
            ("progress", self.progress),
            ("raw-leaves", self.raw_leaves),
        ];
        for (key, value) in flags {
            if let Some(enabled) = value {
                request.set_option(key, enabled);
            }
        }
    }
}

impl Shell {
    /// Add a single local file
    pub async fn add_file(&self, path: impl AsRef<Path>) -> Result<AddResult> {
        let path = path.as_ref();
        let node = Node::from_path(path)?;
        let source = MultipartSource::new(Directory::single(base_name(path), node), true);

        self.exec(self.request("add", Vec::<String>::new()).body(source))
            .await
    }

    /// Add the contents of a byte stream as one unnamed file
    pub async fn add<R>(&self, reader: R, options: AddOptions) -> Result<AddResult>
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        let source = MultipartSource::new(Directory::single("", Node::reader(reader)), true);

        let mut request = self.request("add", Vec::<String>::new());
        options.apply(&mut request);
        let request = request.body(source);

        if options.progress != Some(true) {
            return self.exec(request).await;
        }

        // Progress records come first; the final record is the one with a hash
        let records: Vec<AddResult> = self.exec_lines(request).await?;
        records
            .into_iter()
            .rev()
            .find(|record| !record.is_progress())
            .ok_or(Error::NoResults)
    }

    /// Add a symlink pointing at `target`
    pub async fn add_link(&self, target: &str) -> Result<AddResult> {
        let source = MultipartSource::new(Directory::single("", Node::symlink(target)), true);

        self.exec(self.request("add", Vec::<String>::new()).body(source))
            .await
    }

    /// Add a directory recursively with everything under it
    ///
    /// Returns one record per added node, in the order the daemon reports them.
    pub async fn add_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<AddResult>> {
        let dir = dir.as_ref();
        let node = Node::from_path(dir)?;
        let source = MultipartSource::new(Directory::single(base_name(dir), node), true);

        let request = self
            .request("add", Vec::<String>::new())
            .option("recursive", true)
            .body(source);

        let results: Vec<AddResult> = self.exec_lines(request).await?;
        if results.is_empty() {
            return Err(Error::NoResults);
        }

        debug!(path = %dir.display(), records = results.len(), "Added directory");
        Ok(results)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
