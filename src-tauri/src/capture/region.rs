//! Pure region cropping logic.
//!
//! This module has zero infrastructure dependencies.
//! It takes pixel data in, returns pixel data out.

use super::Bitmap;
use serde::{Deserialize, Serialize};

/// A crop rectangle in source-bitmap pixel coordinates.
///
/// Edges are exclusive on the right/bottom, so `right - left` is the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Region {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Clamps every edge into `[0, width] x [0, height]`.
    ///
    /// A region computed against one display layout may be replayed against
    /// a frame of a different size, so the result can come out empty.
    pub fn clamp_to(&self, width: u32, height: u32) -> Region {
        Region {
            left: self.left.min(width),
            top: self.top.min(height),
            right: self.right.min(width),
            bottom: self.bottom.min(height),
        }
    }
}

/// Crops a bitmap to the specified rectangle.
///
/// # Arguments
/// * `image` - The full frame
/// * `x` - Left edge of the crop rectangle
/// * `y` - Top edge of the crop rectangle
/// * `width` - Width of the crop rectangle
/// * `height` - Height of the crop rectangle
pub fn crop(image: &Bitmap, x: u32, y: u32, width: u32, height: u32) -> Result<Bitmap, CropError> {
    if width == 0 || height == 0 {
        return Err(CropError::ZeroDimension);
    }

    let (img_width, img_height) = (image.width(), image.height());

    let fits_x = x.checked_add(width).is_some_and(|r| r <= img_width);
    let fits_y = y.checked_add(height).is_some_and(|b| b <= img_height);
    if !fits_x || !fits_y {
        return Err(CropError::OutOfBounds {
            requested: (x, y, width, height),
            image_size: (img_width, img_height),
        });
    }

    Ok(image::imageops::crop_imm(image, x, y, width, height).to_image())
}

/// Applies a stored region to a freshly grabbed frame.
///
/// The region is clamped against the frame first; an empty clamped
/// rectangle is reported as [`CropError::ZeroDimension`] so the caller can
/// fall back to the full frame.
pub fn apply_region(image: &Bitmap, region: &Region) -> Result<Bitmap, CropError> {
    let clamped = region.clamp_to(image.width(), image.height());
    crop(image, clamped.left, clamped.top, clamped.width(), clamped.height())
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds image bounds ({}x{})",
        requested.0, requested.1, requested.2, requested.3,
        image_size.0, image_size.1
    )]
    OutOfBounds {
        requested: (u32, u32, u32, u32),
        image_size: (u32, u32),
    },
}
