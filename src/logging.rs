// Tracing setup
//
// The library only emits `tracing` events. Applications that want them on
// stderr can call `init()` once at startup.

use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

/// Install a stderr subscriber filtered by RUST_LOG (default: info)
///
/// Panics if a global subscriber is already set; see [`try_init`].
pub fn init() {
    if let Err(e) = try_init() {
        panic!("failed to initialise tracing: {}", e);
    }
}

pub fn try_init() -> Result<(), TryInitError> {
    // Default: INFO level, can be overridden with RUST_LOG env var
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    // Bridge log crate → tracing (reqwest and hyper log through `log`)
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!(error = %e, "log bridge not installed, a logger is already set");
    }
    Ok(())
}
