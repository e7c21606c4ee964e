//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the six operations the pipeline needs:
//! identify, crop, blank, composite, resize, and convert. Each call blocks
//! until the output file is completely written.
//!
//! The production implementation is
//! [`MagickBackend`](super::magick::MagickBackend), which shells out to
//! ImageMagick. No pixels are ever decoded in-process.

use super::params::{BlankParams, CompositeParams, ConvertParams, CropParams, ResizeParams};
use crate::command::CommandError;
use crate::geometry::Size;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("Could not read dimensions of {path}: unexpected identify output {output:?}")]
    Probe { path: String, output: String },
    #[error("ImageMagick was not found. Please install!")]
    ToolNotFound,
}

/// Trait for image processing backends.
///
/// Every backend must implement all six operations so the pipeline is
/// backend-agnostic. Implementations write exactly the file named in the
/// params' `output` and nothing else.
pub trait ImageBackend {
    /// Pixel dimensions of an existing image file.
    fn identify(&self, path: &Path) -> Result<Size, BackendError>;

    fn crop(&self, params: &CropParams) -> Result<(), BackendError>;

    fn blank(&self, params: &BlankParams) -> Result<(), BackendError>;

    fn composite(&self, params: &CompositeParams) -> Result<(), BackendError>;

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError>;
}

impl<B: ImageBackend + ?Sized> ImageBackend for &B {
    fn identify(&self, path: &Path) -> Result<Size, BackendError> {
        (**self).identify(path)
    }

    fn crop(&self, params: &CropParams) -> Result<(), BackendError> {
        (**self).crop(params)
    }

    fn blank(&self, params: &BlankParams) -> Result<(), BackendError> {
        (**self).blank(params)
    }

    fn composite(&self, params: &CompositeParams) -> Result<(), BackendError> {
        (**self).composite(params)
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        (**self).resize(params)
    }

    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError> {
        (**self).convert(params)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::imaging::params::{ImageFormat, OutputFile};
    use std::cell::{Cell, RefCell};

    /// Mock backend that records operations and writes placeholder files.
    ///
    /// Every file it produces contains its own dimensions as `WxH`, and
    /// `identify` reads that text back. Fixtures written with
    /// [`write_placeholder`] work the same way, so a chain of mock operations
    /// carries realistic sizes through the pipeline.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: RefCell<Vec<RecordedOp>>,
        fail_next: Cell<bool>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Crop {
            source: String,
            output: String,
            offset: Position,
            size: Size,
        },
        Blank {
            color: String,
            output: String,
            size: Size,
        },
        Composite {
            base: String,
            overlay: String,
            output: String,
            offset: Position,
        },
        Resize {
            source: String,
            output: String,
            size: Size,
        },
        Convert {
            source: String,
            output: String,
            format: ImageFormat,
        },
    }

    /// Write a placeholder image the mock backend understands.
    pub fn write_placeholder(path: &Path, size: Size) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, size.to_string()).unwrap();
    }

    fn read_placeholder(path: &Path) -> Result<Size, BackendError> {
        let text = std::fs::read_to_string(path)?;
        let parsed = text
            .trim()
            .split_once('x')
            .and_then(|(w, h)| Some(Size::new(w.parse().ok()?, h.parse().ok()?)));
        parsed.ok_or_else(|| BackendError::Probe {
            path: path.display().to_string(),
            output: text.clone(),
        })
    }

    fn lossy(path: &Path) -> String {
        path.to_string_lossy().to_string()
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the next non-identify operation fail like a crashed tool.
        pub fn fail_next(&self) {
            self.fail_next.set(true);
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.borrow().clone()
        }

        /// Operations other than identify, in order.
        pub fn transforms(&self) -> Vec<RecordedOp> {
            self.get_operations()
                .into_iter()
                .filter(|op| !matches!(op, RecordedOp::Identify(_)))
                .collect()
        }

        fn record(&self, op: RecordedOp) -> Result<(), BackendError> {
            self.operations.borrow_mut().push(op);
            if self.fail_next.replace(false) {
                return Err(BackendError::Probe {
                    path: String::new(),
                    output: "simulated tool failure".into(),
                });
            }
            Ok(())
        }

        fn produce(&self, output: &OutputFile, size: Size) {
            write_placeholder(&output.path, size);
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Size, BackendError> {
            self.operations
                .borrow_mut()
                .push(RecordedOp::Identify(lossy(path)));
            read_placeholder(path)
        }

        fn crop(&self, params: &CropParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Crop {
                source: lossy(&params.source),
                output: lossy(&params.output.path),
                offset: params.offset,
                size: params.size,
            })?;
            let source = read_placeholder(&params.source)?;
            // Clip like the real tool does at the image edge.
            let w = params
                .size
                .w
                .min(source.w.saturating_sub(params.offset.x.max(0) as u32));
            let h = params
                .size
                .h
                .min(source.h.saturating_sub(params.offset.y.max(0) as u32));
            self.produce(&params.output, Size::new(w, h));
            Ok(())
        }

        fn blank(&self, params: &BlankParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Blank {
                color: params.color.clone(),
                output: lossy(&params.output.path),
                size: params.size,
            })?;
            self.produce(&params.output, params.size);
            Ok(())
        }

        fn composite(&self, params: &CompositeParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Composite {
                base: lossy(&params.base),
                overlay: lossy(&params.overlay),
                output: lossy(&params.output.path),
                offset: params.offset,
            })?;
            let base = read_placeholder(&params.base)?;
            self.produce(&params.output, base);
            Ok(())
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Resize {
                source: lossy(&params.source),
                output: lossy(&params.output.path),
                size: params.size,
            })?;
            self.produce(&params.output, params.size);
            Ok(())
        }

        fn convert(&self, params: &ConvertParams) -> Result<(), BackendError> {
            self.record(RecordedOp::Convert {
                source: lossy(&params.source),
                output: lossy(&params.output.path),
                format: params.output.format,
            })?;
            let source = read_placeholder(&params.source)?;
            self.produce(&params.output, source);
            Ok(())
        }
    }

    #[test]
    fn mock_identify_reads_placeholder() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("disk.jpg");
        write_placeholder(&path, Size::new(5424, 5424));

        let backend = MockBackend::new();
        assert_eq!(backend.identify(&path).unwrap(), Size::new(5424, 5424));
        assert!(matches!(&backend.get_operations()[0], RecordedOp::Identify(p) if p.ends_with("disk.jpg")));
    }

    #[test]
    fn mock_composite_keeps_base_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let base = tmp.path().join("base.png");
        let overlay = tmp.path().join("overlay.png");
        write_placeholder(&base, Size::new(1920, 1080));
        write_placeholder(&overlay, Size::new(4000, 4000));

        let backend = MockBackend::new();
        let out = tmp.path().join("out.png");
        backend
            .composite(&CompositeParams {
                base: base.clone(),
                overlay,
                offset: Position::new(-10, -10),
                output: OutputFile {
                    path: out.clone(),
                    format: ImageFormat::Png,
                },
            })
            .unwrap();
        assert_eq!(backend.identify(&out).unwrap(), Size::new(1920, 1080));
    }

    #[test]
    fn mock_fail_next_fails_once() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        backend.fail_next();
        let params = BlankParams {
            color: "black".into(),
            size: Size::new(10, 10),
            output: OutputFile {
                path: tmp.path().join("a.png"),
                format: ImageFormat::Png,
            },
        };
        assert!(backend.blank(&params).is_err());
        assert!(backend.blank(&params).is_ok());
    }

    #[test]
    fn mock_identify_rejects_garbage() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.png");
        std::fs::write(&path, "not an image").unwrap();
        let err = MockBackend::new().identify(&path).unwrap_err();
        assert!(matches!(err, BackendError::Probe { .. }));
    }
}
