// ipfs-shell - client for the IPFS daemon HTTP control API
// Library exports

pub mod client; // Shell facade and per-command operations
pub mod config;
pub mod errors;
pub mod files; // Upload entries and multipart encoding
pub mod logging;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{AddOptions, AddResult, ListLink, ListObject, Shell};
pub use errors::{Error, ErrorKind, ProtocolError, Result};
pub use transport::Transport;
