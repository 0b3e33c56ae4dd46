// Daemon client
//
// Shell is the user-facing handle: it holds the API base URL, the transport
// and shared request defaults, and exposes one method per daemon command.

mod add;
mod list;
mod pin;
mod shell;
mod types;

pub use add::AddOptions;
pub use shell::Shell;
pub use types::{AddResult, ListLink, ListObject};
