// File sources for uploads
//
// Turns local paths, readers and symlink targets into a tree of named
// entries, and encodes that tree as a streaming multipart body.

mod entry;
mod multipart;

pub use entry::{DirEntry, Directory, FileContent, Node};
pub use multipart::{MultipartSource, MultipartStream};
