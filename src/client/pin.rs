// Pin operations

use super::shell::Shell;
use crate::errors::Result;

impl Shell {
    /// Pin the given path, recursively
    pub async fn pin(&self, path: &str) -> Result<()> {
        let request = self.request("pin/add", [path]).option("recursive", true);
        self.exec_discard(request).await
    }

    /// Unpin the given path, recursively
    pub async fn unpin(&self, path: &str) -> Result<()> {
        let request = self.request("pin/rm", [path]).option("recursive", true);
        self.exec_discard(request).await
    }
}
