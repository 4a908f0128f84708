use std::path::PathBuf;

use thiserror::Error;

use super::FileType;

#[derive(Error, Debug)]
pub enum IoError {
    /// The name escapes its namespace (absolute path, `..`, empty).
    #[error("invalid {ty:?} file name {name:?}")]
    InvalidName { name: String, ty: FileType },

    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fewer bytes were available than requested.
    #[error("{path} is truncated: wanted {wanted} bytes, file has {size}")]
    Truncated {
        path: PathBuf,
        wanted: usize,
        size: usize,
    },
}
