//! Image views, packed RGBA buffers and preprocessing filters.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride,
//! so padded rows can be read without copying. The patch cost walks images
//! row by row through it.
//!
//! `RgbaImage` owns packed `0xAARRGGBB` pixels and exposes the colour,
//! gradient and sub-pixel accessors used by the patch cost.

use crate::util::{PmbpError, PmbpResult};

pub mod filters;
#[cfg(feature = "image-io")]
pub mod io;
mod rgba;

pub use rgba::{alpha, blue, encode_colour, green, grey, red, RgbaImage};

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> PmbpResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> PmbpResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(PmbpError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> PmbpResult<usize> {
    if width == 0 || height == 0 {
        return Err(PmbpError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(PmbpError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(PmbpError::InvalidDimensions { width, height })?;
    Ok(needed)
}
