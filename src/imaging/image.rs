//! The image handle passed between pipeline steps.

use super::backend::{BackendError, ImageBackend};
use crate::geometry::Size;
use std::io;
use std::path::{Path, PathBuf};

/// An image file on disk at one point in a pipeline's history, plus its
/// pixel dimensions.
///
/// The dimensions always come from probing the file; there is no way to
/// build an `Image` from a caller-supplied size. Handles are never updated
/// in place: every pipeline operation writes a new file and returns a new
/// handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    path: PathBuf,
    size: Size,
}

impl Image {
    /// Probe an existing file.
    ///
    /// Fails with [`io::ErrorKind::NotFound`] before the backend is invoked
    /// if `path` is not a regular file.
    pub fn probe(backend: &impl ImageBackend, path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        if !std::fs::metadata(&path)?.is_file() {
            return Err(BackendError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a file", path.display()),
            )));
        }
        let size = backend.identify(&path)?;
        Ok(Self { path, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> Size {
        self.size
    }
}
