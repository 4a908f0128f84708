//! Synchronous asset file access.
//!
//! Files are addressed by name inside a type-scoped namespace (`FileType`),
//! never by arbitrary filesystem path.

mod error;
mod file_reader;

pub use error::IoError;
pub use file_reader::{FileReader, FileRoots, FileType};
