//! The image-composition pipeline.
//!
//! A [`Pipeline`] owns one images directory and a counter. Every operation
//! writes a brand-new file named `generatedN.<ext>` (N taken from the
//! counter, which only ever goes up), probes it, and returns the new
//! [`Image`]. Input handles are never modified, so any intermediate result
//! can be reused later in the same run.
//!
//! ```text
//! pipelines/simple/
//! ├── recipe.toml
//! └── images/
//!     ├── GOES-East_Full_Disk_large.jpg   ← downloaded (see fetch)
//!     ├── generated0.png                  ← crop
//!     ├── generated1.png                  ← blank
//!     ├── generated2.png                  ← place
//!     └── generated3.jpg                  ← to_jpg
//! ```
//!
//! Working files are always PNG; only [`Pipeline::to_format`] produces a
//! lossy file. A failed operation returns its error immediately and leaves
//! whatever files were already written in place for inspection.
//!
//! One `Pipeline` value per images directory: two pipelines pointed at the
//! same directory will reuse counter values and overwrite each other.

use crate::geometry::{Position, Size};
use crate::imaging::{
    BackendError, BlankParams, CompositeParams, ConvertParams, CropParams, Image, ImageBackend,
    ImageFormat, OutputFile, ResizeParams,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Subdirectory of a pipeline directory that holds every image it touches.
pub const IMAGES_DIR: &str = "images";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

pub struct Pipeline<B> {
    backend: B,
    images_dir: PathBuf,
    generated: u32,
}

impl<B: ImageBackend> Pipeline<B> {
    /// Pipeline writing into `<pipeline_dir>/images`.
    pub fn new(backend: B, pipeline_dir: &Path) -> Self {
        Self::with_images_dir(backend, pipeline_dir.join(IMAGES_DIR))
    }

    pub fn with_images_dir(backend: B, images_dir: PathBuf) -> Self {
        Self {
            backend,
            images_dir,
            generated: 0,
        }
    }

    /// Number of images generated so far (also the next counter value).
    pub fn generated_count(&self) -> u32 {
        self.generated
    }

    /// Path of a file inside the images directory.
    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.images_dir.join(filename)
    }

    /// Probe an image that already exists on disk, e.g. a local photo.
    pub fn open(&self, path: impl Into<PathBuf>) -> Result<Image> {
        Ok(Image::probe(&self.backend, path)?)
    }

    /// Ensure the images directory exists.
    pub(crate) fn ensure_images_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.images_dir).map_err(|source| PipelineError::Io {
            path: self.images_dir.clone(),
            source,
        })
    }

    /// Reserve the next `generatedN.<ext>` path.
    ///
    /// The counter is bumped before anything touches the disk, so even a
    /// failed operation never hands its number to a later one. A file left at
    /// the path by an earlier, interrupted run is removed.
    fn allocate(&mut self, format: ImageFormat) -> Result<OutputFile> {
        let path = self.image_path(&format!(
            "generated{}.{}",
            self.generated,
            format.extension()
        ));
        self.generated += 1;
        self.ensure_images_dir()?;
        if path.is_file() {
            tracing::debug!(path = %path.display(), "removing stale generated image");
            std::fs::remove_file(&path).map_err(|source| PipelineError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(OutputFile { path, format })
    }

    fn finish(&self, output: OutputFile) -> Result<Image> {
        self.open(output.path)
    }

    /// Cut the rectangle `[offset, offset + size)` out of `image`.
    ///
    /// A rectangle outside the image is the tool's error to report.
    pub fn crop(&mut self, image: &Image, offset: Position, size: Size) -> Result<Image> {
        let output = self.allocate(ImageFormat::WORKING)?;
        self.backend.crop(&CropParams {
            source: image.path().to_path_buf(),
            offset,
            size,
            output: output.clone(),
        })?;
        self.finish(output)
    }

    /// A solid canvas of `color`.
    pub fn blank(&mut self, color: &str, size: Size) -> Result<Image> {
        let output = self.allocate(ImageFormat::WORKING)?;
        self.backend.blank(&BlankParams {
            color: color.to_string(),
            size,
            output: output.clone(),
        })?;
        self.finish(output)
    }

    /// Draw `overlay` over `base` with its top-left corner at `offset`.
    ///
    /// The result has `base`'s dimensions; anything of `overlay` that falls
    /// outside is clipped.
    pub fn place(&mut self, overlay: &Image, offset: Position, base: &Image) -> Result<Image> {
        let output = self.allocate(ImageFormat::WORKING)?;
        self.backend.composite(&CompositeParams {
            base: base.path().to_path_buf(),
            overlay: overlay.path().to_path_buf(),
            offset,
            output: output.clone(),
        })?;
        self.finish(output)
    }

    /// Scale `image` to `size`. Use [`crate::geometry`] to keep the aspect
    /// ratio.
    pub fn resize(&mut self, image: &Image, size: Size) -> Result<Image> {
        let output = self.allocate(ImageFormat::WORKING)?;
        self.backend.resize(&ResizeParams {
            source: image.path().to_path_buf(),
            size,
            output: output.clone(),
        })?;
        self.finish(output)
    }

    /// Re-encode `image` as `format`.
    pub fn to_format(&mut self, image: &Image, format: ImageFormat) -> Result<Image> {
        let output = self.allocate(format)?;
        self.backend.convert(&ConvertParams {
            source: image.path().to_path_buf(),
            output: output.clone(),
        })?;
        self.finish(output)
    }

    /// Re-encode as JPEG, the format desktop tools handle most reliably.
    pub fn to_jpg(&mut self, image: &Image) -> Result<Image> {
        self.to_format(image, ImageFormat::Jpg)
    }
}
