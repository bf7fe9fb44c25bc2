//! Convenience helpers for loading and saving images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::RgbaImage;
use crate::util::{PmbpError, PmbpResult};
use std::path::Path;

/// Creates a packed image from an `image` RGBA buffer.
pub fn from_rgba_buffer(img: &image::RgbaImage) -> PmbpResult<RgbaImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    RgbaImage::from_rgba8(img.as_raw(), width, height)
}

/// Creates a packed image from a dynamic image of any colour type.
pub fn from_dynamic_image(img: &image::DynamicImage) -> PmbpResult<RgbaImage> {
    from_rgba_buffer(&img.to_rgba8())
}

/// Loads an image from disk and converts it to packed RGBA.
pub fn load_rgba_image<P: AsRef<Path>>(path: P) -> PmbpResult<RgbaImage> {
    let img = image::open(path).map_err(|err| PmbpError::ImageIo {
        reason: err.to_string(),
    })?;
    from_dynamic_image(&img)
}

/// Saves a packed image to disk; the format follows the file extension.
pub fn save_rgba_image<P: AsRef<Path>>(img: &RgbaImage, path: P) -> PmbpResult<()> {
    let width = u32::try_from(img.width()).map_err(|_| PmbpError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    let height = u32::try_from(img.height()).map_err(|_| PmbpError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    let buffer = image::RgbaImage::from_raw(width, height, img.to_rgba8()).ok_or(
        PmbpError::BufferTooSmall {
            needed: img.width() * img.height() * 4,
            got: img.data().len() * 4,
        },
    )?;
    buffer.save(path).map_err(|err| PmbpError::ImageIo {
        reason: err.to_string(),
    })
}
