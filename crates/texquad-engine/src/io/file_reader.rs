use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use super::IoError;

/// Namespace a file name is resolved in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FileType {
    /// Read-only content shipped with the application.
    Asset,
    /// Per-user writable storage.
    Save,
}

/// Root directories backing each `FileType`.
#[derive(Debug, Clone)]
pub struct FileRoots {
    pub asset: PathBuf,
    pub save: PathBuf,
}

impl FileRoots {
    /// Assets under `asset`, saves in the system temp directory.
    pub fn new(asset: impl Into<PathBuf>) -> Self {
        Self {
            asset: asset.into(),
            save: std::env::temp_dir(),
        }
    }

    /// Resolves `name` inside the root for `ty`.
    ///
    /// Only plain relative components are accepted.
    pub fn resolve(&self, name: &str, ty: FileType) -> Result<PathBuf, IoError> {
        let rel = Path::new(name);
        let plain = !name.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !plain {
            return Err(IoError::InvalidName {
                name: name.to_string(),
                ty,
            });
        }

        let root = match ty {
            FileType::Asset => &self.asset,
            FileType::Save => &self.save,
        };
        Ok(root.join(rel))
    }
}

/// Read-only handle to a named file.
///
/// The OS handle is released when the reader is dropped, so every exit path
/// closes it. `close` is the explicit form.
#[derive(Debug)]
pub struct FileReader {
    file: File,
    path: PathBuf,
    size: usize,
}

impl FileReader {
    pub fn open(roots: &FileRoots, name: &str, ty: FileType) -> Result<Self, IoError> {
        let path = roots.resolve(name, ty)?;

        let file = File::open(&path).map_err(|source| IoError::Open {
            path: path.clone(),
            source,
        })?;
        let len = file
            .metadata()
            .map_err(|source| IoError::Open {
                path: path.clone(),
                source,
            })?
            .len();
        let size = addressable_len(&path, len)?;

        log::debug!("opened {} ({size} bytes)", path.display());
        Ok(Self { file, path, size })
    }

    /// File length in bytes, as of `open`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Fills `buf` completely from the current position.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), IoError> {
        if buf.len() > self.size {
            return Err(IoError::Truncated {
                path: self.path.clone(),
                wanted: buf.len(),
                size: self.size,
            });
        }

        self.file.read_exact(buf).map_err(|source| match source.kind() {
            std::io::ErrorKind::UnexpectedEof => IoError::Truncated {
                path: self.path.clone(),
                wanted: buf.len(),
                size: self.size,
            },
            _ => IoError::Read {
                path: self.path.clone(),
                source,
            },
        })
    }

    pub fn close(self) {
        drop(self);
    }
}

/// File length as `usize`; files larger than the address space cannot be
/// read into memory.
fn addressable_len(path: &Path, len: u64) -> Result<usize, IoError> {
    usize::try_from(len).map_err(|_| IoError::Open {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::FileTooLarge,
            format!("{len} bytes exceed the address space"),
        ),
    })
}
