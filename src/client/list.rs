// List operations

use std::path::Path;

use serde::Deserialize;

use super::shell::Shell;
use super::types::ListObject;
use crate::errors::{Error, Result};

#[derive(Debug, Deserialize)]
struct ListOutput {
    #[serde(rename = "Objects", default)]
    objects: Vec<ListObject>,
}

impl Shell {
    /// List the entries at `path`
    ///
    /// The daemon must answer with exactly one object.
    pub async fn list(&self, path: &str) -> Result<ListObject> {
        let output: ListOutput = self.exec(self.request("ls", [path])).await?;

        let mut objects = output.objects;
        if objects.len() != 1 {
            return Err(Error::BadResponse);
        }
        Ok(objects.remove(0))
    }

    /// Add a directory, then list the last node the daemon reported (the root)
    ///
    /// Fails with `AddNotResult` when the daemon only sent progress records,
    /// e.g. when the shell carries a `progress` default option.
    pub async fn add_dir_list(&self, dir: impl AsRef<Path>) -> Result<ListObject> {
        let results = self.add_dir(dir).await?;
        let root = results
            .iter()
            .rev()
            .find(|record| !record.is_progress())
            .ok_or(Error::AddNotResult)?;
        self.list(&format!("/ipfs/{}", root.hash)).await
    }
}
