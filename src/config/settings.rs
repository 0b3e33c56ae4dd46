// Configuration structs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for building a [`crate::Shell`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Daemon API address, with or without scheme (e.g. "localhost:5001")
    pub api_address: String,

    /// Whole-request timeout in seconds; `None` waits indefinitely
    pub timeout_seconds: Option<u64>,

    /// Headers added to every request
    pub headers: BTreeMap<String, String>,

    /// Options added to every request (override the built-in defaults)
    pub options: BTreeMap<String, String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            api_address: "localhost:5001".to_string(),
            timeout_seconds: None,
            headers: BTreeMap::new(),
            options: BTreeMap::new(),
        }
    }
}

impl ShellConfig {
    pub fn new(api_address: impl Into<String>) -> Self {
        Self {
            api_address: api_address.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}
