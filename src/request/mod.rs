// Command requests
// Describes one daemon command and renders it into a URL and HTTP body

mod body;
mod command;

pub use body::RequestBody;
pub use command::{CommandRequest, OptionValue, API_PATH};
