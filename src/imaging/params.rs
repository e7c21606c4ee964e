//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`Pipeline`](crate::pipeline::Pipeline) (which
//! decides what images to create and where) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock)
//! without changing pipeline logic.
//!
//! ## Types
//!
//! - [`ImageFormat`]: PNG for lossless working images, JPEG for delivery.
//! - [`OutputFile`]: where an operation writes and in which format.
//! - [`CropParams`], [`BlankParams`], [`CompositeParams`], [`ResizeParams`],
//!   [`ConvertParams`]: one per pipeline operation.

use crate::geometry::{Position, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// File formats the pipeline writes.
///
/// PNG is the working format for every intermediate image so a chain of
/// operations never compounds lossy artifacts. JPEG is only produced by an
/// explicit conversion at the end of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ImageFormat {
    Png,
    Jpg,
}

impl ImageFormat {
    /// The lossless format intermediate images are written in.
    pub const WORKING: ImageFormat = ImageFormat::Png;

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            other => Err(format!("unsupported image format: {other}")),
        }
    }
}

impl TryFrom<String> for ImageFormat {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Destination of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub format: ImageFormat,
}

/// Cut the rectangle `[offset, offset + size)` out of `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropParams {
    pub source: PathBuf,
    pub offset: Position,
    pub size: Size,
    pub output: OutputFile,
}

/// A solid canvas. `color` is anything ImageMagick accepts as a color
/// (`black`, `#102030`, `rgba(0,0,0,0.5)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankParams {
    pub color: String,
    pub size: Size,
    pub output: OutputFile,
}

/// `overlay` drawn over `base` with its top-left corner at `offset`.
/// The result has the dimensions of `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeParams {
    pub base: PathBuf,
    pub overlay: PathBuf,
    pub offset: Position,
    pub output: OutputFile,
}

/// Scale `source` to exactly `size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub size: Size,
    pub output: OutputFile,
}

/// Re-encode `source` into `output.format`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertParams {
    pub source: PathBuf,
    pub output: OutputFile,
}
