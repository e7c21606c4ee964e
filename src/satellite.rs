//! Cleanup recipes for full-disk satellite imagery.
//!
//! The published full-disk images carry a text info bar along the bottom
//! edge and an agency logo in the bottom-left corner. Cleaning crops off the
//! bar and paints a black patch over the logo so the disk sits on plain
//! black.

use crate::fetch::{FetchError, SourcePipeline, Transfer};
use crate::geometry::{Position, Size};
use crate::imaging::{Image, ImageBackend};
use serde::{Deserialize, Serialize};

/// What to remove from one source's `"large"` image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupProfile {
    pub source: &'static str,
    /// Height of the bottom info bar; 0 when the source has none.
    pub info_bar_height: u32,
    /// Black patch placed in the bottom-left corner after the bar is gone.
    pub logo: Size,
}

pub const GOES_EAST: CleanupProfile = CleanupProfile {
    source: "GOES-East Full Disk",
    info_bar_height: 47,
    logo: Size { w: 400, h: 400 },
};

pub const GOES_WEST: CleanupProfile = CleanupProfile {
    source: "GOES-West Full Disk",
    info_bar_height: 47,
    logo: Size { w: 400, h: 400 },
};

pub const HIMAWARI8: CleanupProfile = CleanupProfile {
    source: "Himawari-8 Full Disk",
    info_bar_height: 0,
    logo: Size { w: 1000, h: 450 },
};

/// Satellites with a cleanup profile, as named in recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Satellite {
    GoesEast,
    GoesWest,
    #[serde(rename = "himawari-8")]
    Himawari8,
}

impl Satellite {
    pub fn profile(self) -> CleanupProfile {
        match self {
            Self::GoesEast => GOES_EAST,
            Self::GoesWest => GOES_WEST,
            Self::Himawari8 => HIMAWARI8,
        }
    }
}

impl<B: ImageBackend, T: Transfer> SourcePipeline<B, T> {
    /// Fetch the `"large"` image for `profile` and clean it.
    pub fn clean_large(&mut self, profile: CleanupProfile) -> Result<Image, FetchError> {
        let full_disk = self.get(profile.source, "large")?;

        let trimmed = if profile.info_bar_height > 0 {
            let size = full_disk.size();
            if size.h <= profile.info_bar_height {
                return Err(FetchError::ShorterThanInfoBar {
                    name: profile.source,
                    height: size.h,
                    bar: profile.info_bar_height,
                });
            }
            let height = size.h - profile.info_bar_height;
            self.crop(&full_disk, Position::ORIGIN, Size::new(size.w, height))?
        } else {
            full_disk
        };

        let logo_hider = self.blank("black", profile.logo)?;
        let corner = Position::new(
            0,
            trimmed.size().h as i32 - logo_hider.size().h as i32,
        );
        Ok(self.place(&logo_hider, corner, &trimmed)?)
    }

    pub fn clean_goes_east_large(&mut self) -> Result<Image, FetchError> {
        self.clean_large(GOES_EAST)
    }

    pub fn clean_goes_west_large(&mut self) -> Result<Image, FetchError> {
        self.clean_large(GOES_WEST)
    }

    pub fn clean_himawari8_large(&mut self) -> Result<Image, FetchError> {
        self.clean_large(HIMAWARI8)
    }
}
