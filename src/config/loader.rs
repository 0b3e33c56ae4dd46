// Configuration loader
// Loads ShellConfig from ~/.ipfs-shell/config.toml and resolves the daemon
// address advertised by a local IPFS repo

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::settings::ShellConfig;
use crate::errors::{Error, Result};

/// Load configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<ShellConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
}

/// Load ~/.ipfs-shell/config.toml, or defaults when it does not exist
pub fn load_default_config() -> Result<ShellConfig> {
    let Some(home) = dirs::home_dir() else {
        debug!("No home directory, using default configuration");
        return Ok(ShellConfig::default());
    };

    let config_path = home.join(".ipfs-shell/config.toml");
    if !config_path.exists() {
        return Ok(ShellConfig::default());
    }

    debug!(path = %config_path.display(), "Loading configuration");
    load_config(&config_path)
}

/// `$IPFS_PATH`, falling back to ~/.ipfs
pub fn default_repo_path() -> Option<PathBuf> {
    match std::env::var_os("IPFS_PATH") {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => dirs::home_dir().map(|home| home.join(".ipfs")),
    }
}

/// Read the repo's `api` file and turn its multiaddr into `host:port`
pub fn repo_api_address(repo: impl AsRef<Path>) -> Result<String> {
    let api_file = repo.as_ref().join("api");
    let contents = fs::read_to_string(&api_file)?;
    multiaddr_to_address(contents.trim())
}

fn multiaddr_to_address(addr: &str) -> Result<String> {
    let parts: Vec<&str> = addr.trim_start_matches('/').split('/').collect();
    match parts.as_slice() {
        ["ip4" | "dns" | "dns4" | "dns6", host, "tcp", port, ..] => Ok(format!("{}:{}", host, port)),
        ["ip6", host, "tcp", port, ..] => Ok(format!("[{}]:{}", host, port)),
        _ => Err(Error::Config(format!("unsupported api multiaddr: {:?}", addr))),
    }
}
