//! Image handles and the backend that does the raster work.
//!
//! | Operation | ImageMagick |
//! |---|---|
//! | **Identify** | `identify -ping -format "%w %h"` |
//! | **Crop** | `-crop WxH+X+Y +repage` |
//! | **Blank** | `-size WxH canvas:<color>` |
//! | **Composite** | `base overlay -geometry +X+Y -composite` |
//! | **Resize** | `-resize WxH` |
//! | **Convert** | output extension selects the encoder |
//!
//! The module is split into:
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`MagickBackend`]
//! - **Image**: the [`Image`] handle, built by probing a file

pub mod backend;
mod image;
pub mod magick;
mod params;

pub use backend::{BackendError, ImageBackend};
pub use image::Image;
pub use magick::{Dialect, DialectSetting, MagickBackend};
pub use params::{
    BlankParams, CompositeParams, ConvertParams, CropParams, ImageFormat, OutputFile,
    ResizeParams,
};
