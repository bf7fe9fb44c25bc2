//! Preprocessing filters applied once per input image.
//!
//! The gradient image stores the grey-level gradient magnitude (central
//! differences, clamped to `[0, 255]`) in all three channels. The median
//! filter works per channel over the in-bounds part of a square window.
//! With the `rayon` feature enabled, row-parallel variants produce identical
//! output.

use crate::image::{blue, encode_colour, green, grey, red, RgbaImage};
use crate::util::{PmbpError, PmbpResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

fn gradient_row(src: &RgbaImage, y: usize, out: &mut [u32]) {
    let width = src.width();
    let height = src.height();
    for (x, slot) in out.iter_mut().enumerate() {
        let center = i32::from(grey(src.pixel(x, y)));
        let left = if x > 0 {
            i32::from(grey(src.pixel(x - 1, y)))
        } else {
            center
        };
        let right = if x + 1 < width {
            i32::from(grey(src.pixel(x + 1, y)))
        } else {
            center
        };
        let top = if y > 0 {
            i32::from(grey(src.pixel(x, y - 1)))
        } else {
            center
        };
        let bottom = if y + 1 < height {
            i32::from(grey(src.pixel(x, y + 1)))
        } else {
            center
        };

        let dx = (right - left) as f32;
        let dy = (bottom - top) as f32;
        let mag = ((dx * dx + dy * dy).sqrt() as i32).clamp(0, 255) as u8;
        *slot = encode_colour(mag, mag, mag, 255);
    }
}

fn median_row(src: &RgbaImage, y: usize, size: usize, out: &mut [u32]) {
    let half = (size / 2) as isize;
    let width = src.width() as isize;
    let height = src.height() as isize;
    let cap = size * size;
    let mut r = Vec::with_capacity(cap);
    let mut g = Vec::with_capacity(cap);
    let mut b = Vec::with_capacity(cap);

    for (x, slot) in out.iter_mut().enumerate() {
        r.clear();
        g.clear();
        b.clear();
        for v in -half..=half {
            let yy = y as isize + v;
            if yy < 0 || yy >= height {
                continue;
            }
            for u in -half..=half {
                let xx = x as isize + u;
                if xx < 0 || xx >= width {
                    continue;
                }
                let px = src.pixel(xx as usize, yy as usize);
                r.push(red(px));
                g.push(green(px));
                b.push(blue(px));
            }
        }
        r.sort_unstable();
        g.sort_unstable();
        b.sort_unstable();
        let mid = (r.len() - 1) / 2;
        *slot = encode_colour(r[mid], g[mid], b[mid], 255);
    }
}

fn check_median_size(size: usize) -> PmbpResult<()> {
    if size == 0 || size % 2 == 0 {
        return Err(PmbpError::InvalidInput("median size must be odd and positive"));
    }
    Ok(())
}

/// Computes the gradient-magnitude image.
pub fn gradient(src: &RgbaImage) -> RgbaImage {
    let width = src.width();
    let mut data = vec![0u32; src.data().len()];
    for (y, row) in data.chunks_exact_mut(width).enumerate() {
        gradient_row(src, y, row);
    }
    src.same_shape(data)
}

/// Applies a per-channel median filter with a `size x size` window.
pub fn median_filter(src: &RgbaImage, size: usize) -> PmbpResult<RgbaImage> {
    check_median_size(size)?;
    let width = src.width();
    let mut data = vec![0u32; src.data().len()];
    for (y, row) in data.chunks_exact_mut(width).enumerate() {
        median_row(src, y, size, row);
    }
    Ok(src.same_shape(data))
}

/// Row-parallel gradient-magnitude image.
#[cfg(feature = "rayon")]
pub fn gradient_par(src: &RgbaImage) -> RgbaImage {
    let width = src.width();
    let mut data = vec![0u32; src.data().len()];
    data.par_chunks_exact_mut(width)
        .enumerate()
        .for_each(|(y, row)| gradient_row(src, y, row));
    src.same_shape(data)
}

/// Row-parallel per-channel median filter.
#[cfg(feature = "rayon")]
pub fn median_filter_par(src: &RgbaImage, size: usize) -> PmbpResult<RgbaImage> {
    check_median_size(size)?;
    let width = src.width();
    let mut data = vec![0u32; src.data().len()];
    data.par_chunks_exact_mut(width)
        .enumerate()
        .for_each(|(y, row)| median_row(src, y, size, row));
    Ok(src.same_shape(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey_image(values: &[u8], width: usize, height: usize) -> RgbaImage {
        let data = values.iter().map(|&v| encode_colour(v, v, v, 255)).collect();
        RgbaImage::new(data, width, height).unwrap()
    }

    #[test]
    fn gradient_of_flat_image_is_zero() {
        let img = grey_image(&[42; 9], 3, 3);
        let grad = gradient(&img);
        assert!(grad.data().iter().all(|&px| red(px) == 0));
    }

    #[test]
    fn gradient_uses_central_differences() {
        let img = grey_image(&[0, 10, 40], 3, 1);
        let grad = gradient(&img);
        assert_eq!(red(grad.pixel(0, 0)), 10);
        assert_eq!(red(grad.pixel(1, 0)), 40);
        assert_eq!(red(grad.pixel(2, 0)), 30);
    }

    #[test]
    fn median_removes_isolated_spike() {
        let mut values = [10u8; 9];
        values[4] = 250;
        let img = grey_image(&values, 3, 3);
        let filtered = median_filter(&img, 3).unwrap();
        assert_eq!(red(filtered.pixel(1, 1)), 10);
    }

    #[test]
    fn median_rejects_even_window() {
        let img = grey_image(&[0; 4], 2, 2);
        assert!(median_filter(&img, 2).is_err());
    }
}
