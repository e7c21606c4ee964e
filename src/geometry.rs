//! Pixel geometry: positions, sizes, and the scaling math recipes use to
//! lay images out on a screen.
//!
//! All functions here are pure and testable without any I/O or images.
//! Truncation (not rounding) is used everywhere, so results never exceed
//! the box they were computed against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A position in pixels, with (0, 0) at the top left, x increasing to the
/// right and y increasing down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl From<[i32; 2]> for Position {
    fn from([x, y]: [i32; 2]) -> Self {
        Self::new(x, y)
    }
}

/// A size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

impl From<[u32; 2]> for Size {
    fn from([w, h]: [u32; 2]) -> Self {
        Self::new(w, h)
    }
}

/// `WxH`, the form ImageMagick geometry arguments start with.
impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Width over height.
pub fn aspect_ratio(size: Size) -> f64 {
    size.w as f64 / size.h as f64
}

/// Multiply both dimensions by `factor`, truncating toward zero.
///
/// ```
/// # use skywall::geometry::{scale, Size};
/// assert_eq!(scale(Size::new(1920, 1080), 0.9), Size::new(1728, 972));
/// ```
pub fn scale(size: Size, factor: f64) -> Size {
    Size::new(
        (size.w as f64 * factor) as u32,
        (size.h as f64 * factor) as u32,
    )
}

/// Size with the given width and the aspect ratio of `size`.
pub fn scale_to_width(size: Size, width: u32) -> Size {
    let height = (width as f64 / aspect_ratio(size)) as u32;
    Size::new(width, height)
}

/// Size with the given height and the aspect ratio of `size`.
pub fn scale_to_height(size: Size, height: u32) -> Size {
    let width = (height as f64 * aspect_ratio(size)) as u32;
    Size::new(width, height)
}

/// Largest size with the aspect ratio of `size` that fits inside
/// `bounding_box`.
///
/// A source wider than the box is constrained by the box width, anything
/// else by the box height.
///
/// ```
/// # use skywall::geometry::{scale_to_fit, Size};
/// assert_eq!(
///     scale_to_fit(Size::new(1000, 500), Size::new(800, 800)),
///     Size::new(800, 400)
/// );
/// ```
pub fn scale_to_fit(size: Size, bounding_box: Size) -> Size {
    if aspect_ratio(size) > aspect_ratio(bounding_box) {
        scale_to_width(size, bounding_box.w)
    } else {
        scale_to_height(size, bounding_box.h)
    }
}

/// Offset that centers an image of `image_size` inside a frame of
/// `frame_size` whose top-left corner sits at `frame_offset`.
///
/// Each axis is truncated toward zero independently. The result is negative
/// on an axis where the image is larger than the frame.
pub fn centering_offset(image_size: Size, frame_size: Size, frame_offset: Position) -> Position {
    let dx = (frame_size.w as i64 - image_size.w as i64) / 2;
    let dy = (frame_size.h as i64 - image_size.h as i64) / 2;
    frame_offset + Position::new(dx as i32, dy as i32)
}
