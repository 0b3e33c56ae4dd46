// Response handling
//
// Classifies raw daemon responses into a success handle or a protocol error,
// and decodes success bodies as JSON.

mod classifier;
mod output;
mod responder;

pub use classifier::{classify, RawResponse};
pub use output::Output;
pub use responder::Responder;
