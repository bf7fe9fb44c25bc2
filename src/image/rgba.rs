//! Owned packed-RGBA image buffer.

use crate::image::ImageView;
use crate::util::{PmbpError, PmbpResult};

/// Packs channels into a `0xAARRGGBB` pixel.
#[inline]
pub fn encode_colour(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Red channel of a packed pixel.
#[inline]
pub fn red(colour: u32) -> u8 {
    ((colour >> 16) & 0xFF) as u8
}

/// Green channel of a packed pixel.
#[inline]
pub fn green(colour: u32) -> u8 {
    ((colour >> 8) & 0xFF) as u8
}

/// Blue channel of a packed pixel.
#[inline]
pub fn blue(colour: u32) -> u8 {
    (colour & 0xFF) as u8
}

/// Alpha channel of a packed pixel.
#[inline]
pub fn alpha(colour: u32) -> u8 {
    (colour >> 24) as u8
}

/// Mean of the three colour channels, truncated.
#[inline]
pub fn grey(colour: u32) -> u8 {
    let sum = f32::from(red(colour)) + f32::from(green(colour)) + f32::from(blue(colour));
    (sum / 3.0) as u8
}

/// Owned contiguous image of packed `0xAARRGGBB` pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaImage {
    data: Vec<u32>,
    width: usize,
    height: usize,
}

impl RgbaImage {
    /// Creates an image from a row-major pixel buffer of exactly `width * height`.
    pub fn new(data: Vec<u32>, width: usize, height: usize) -> PmbpResult<Self> {
        if width == 0 || height == 0 {
            return Err(PmbpError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(PmbpError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(PmbpError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(PmbpError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image filled with a single colour.
    pub fn filled(width: usize, height: usize, colour: u32) -> PmbpResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(PmbpError::InvalidDimensions { width, height })?;
        Self::new(vec![colour; len], width, height)
    }

    /// Wraps a buffer that has this image's dimensions.
    pub(crate) fn same_shape(&self, data: Vec<u32>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            data,
            width: self.width,
            height: self.height,
        }
    }

    /// Builds an image from `[r, g, b, a]` byte quadruples.
    pub fn from_rgba8(bytes: &[u8], width: usize, height: usize) -> PmbpResult<Self> {
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(4))
            .ok_or(PmbpError::InvalidDimensions { width, height })?;
        if bytes.len() != needed {
            return Err(PmbpError::BufferTooSmall {
                needed,
                got: bytes.len(),
            });
        }
        let data = bytes
            .chunks_exact(4)
            .map(|px| encode_colour(px[0], px[1], px[2], px[3]))
            .collect();
        Self::new(data, width, height)
    }

    /// Unpacks the image into `[r, g, b, a]` byte quadruples.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 4);
        for &px in &self.data {
            out.extend_from_slice(&[red(px), green(px), blue(px), alpha(px)]);
        }
        out
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the packed pixel buffer.
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Returns a borrowed view of the pixels.
    pub fn view(&self) -> ImageView<'_, u32> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the pixel at integer coordinates, if inside.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Returns the pixel at integer coordinates; callers guarantee bounds.
    #[inline]
    pub(crate) fn pixel(&self, x: usize, y: usize) -> u32 {
        self.data[y * self.width + x]
    }

    /// Writes a pixel; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, colour: u32) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = colour;
        }
    }

    /// Checks whether a sub-pixel coordinate lies inside the image.
    #[inline]
    pub fn is_inside(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && x < self.width as f32 && y >= 0.0 && y < self.height as f32
    }

    /// Bilinearly interpolated RGB at a sub-pixel coordinate.
    ///
    /// Neighbours past the last row or column are clamped to the border.
    /// Negative coordinates below `-1` yield black.
    pub fn interpolated(&self, x: f32, y: f32) -> [f32; 3] {
        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        let nw_x = (x as i64).min(max_x);
        let nw_y = (y as i64).min(max_y);
        if nw_x < 0 || nw_y < 0 {
            return [0.0; 3];
        }
        let se_x = (nw_x + 1).min(max_x);
        let se_y = (nw_y + 1).min(max_y);

        let dx = x - nw_x as f32;
        let dy = y - nw_y as f32;

        let (nw_x, nw_y, se_x, se_y) = (nw_x as usize, nw_y as usize, se_x as usize, se_y as usize);
        let nw = self.pixel(nw_x, nw_y);
        let ne = self.pixel(se_x, nw_y);
        let sw = self.pixel(nw_x, se_y);
        let se = self.pixel(se_x, se_y);

        let w_nw = (1.0 - dx) * (1.0 - dy);
        let w_ne = dx * (1.0 - dy);
        let w_sw = (1.0 - dx) * dy;
        let w_se = dx * dy;

        let mix = |channel: fn(u32) -> u8| {
            f32::from(channel(nw)) * w_nw
                + f32::from(channel(ne)) * w_ne
                + f32::from(channel(sw)) * w_sw
                + f32::from(channel(se)) * w_se
        };
        [mix(red), mix(green), mix(blue)]
    }
}
