// Configuration module
// Public interface for configuration loading

mod loader;
mod settings;

pub use loader::{default_repo_path, load_config, load_default_config, repo_api_address};
pub use settings::ShellConfig;
