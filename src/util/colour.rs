//! Colour-wheel encoding for displacement visualisation.
//!
//! Hue encodes direction and saturation encodes magnitude, following the
//! Middlebury flow colour coding. Vectors longer than the unit radius are
//! drawn darker.

const RY: usize = 15;
const YG: usize = 6;
const GC: usize = 4;
const CB: usize = 11;
const BM: usize = 13;
const MR: usize = 6;
const NCOLS: usize = RY + YG + GC + CB + BM + MR;

fn colour_wheel() -> [[f32; 3]; NCOLS] {
    let mut wheel = [[0.0f32; 3]; NCOLS];
    let mut k = 0usize;
    for i in 0..RY {
        wheel[k] = [255.0, 255.0 * i as f32 / RY as f32, 0.0];
        k += 1;
    }
    for i in 0..YG {
        wheel[k] = [255.0 - 255.0 * i as f32 / YG as f32, 255.0, 0.0];
        k += 1;
    }
    for i in 0..GC {
        wheel[k] = [0.0, 255.0, 255.0 * i as f32 / GC as f32];
        k += 1;
    }
    for i in 0..CB {
        wheel[k] = [0.0, 255.0 - 255.0 * i as f32 / CB as f32, 255.0];
        k += 1;
    }
    for i in 0..BM {
        wheel[k] = [255.0 * i as f32 / BM as f32, 0.0, 255.0];
        k += 1;
    }
    for i in 0..MR {
        wheel[k] = [255.0, 0.0, 255.0 - 255.0 * i as f32 / MR as f32];
        k += 1;
    }
    wheel
}

/// Maps a displacement normalised by the display radius to an RGB triple.
pub(crate) fn flow_colour(fx: f32, fy: f32) -> [u8; 3] {
    if !fx.is_finite() || !fy.is_finite() {
        return [0, 0, 0];
    }

    let wheel = colour_wheel();
    let rad = (fx * fx + fy * fy).sqrt();
    let a = (-fy).atan2(-fx) / std::f32::consts::PI;
    let fk = (a + 1.0) / 2.0 * (NCOLS - 1) as f32;
    let k0 = (fk as usize).min(NCOLS - 1);
    let k1 = (k0 + 1) % NCOLS;
    let f = fk - k0 as f32;

    let mut rgb = [0u8; 3];
    for (b, out) in rgb.iter_mut().enumerate() {
        let col0 = wheel[k0][b] / 255.0;
        let col1 = wheel[k1][b] / 255.0;
        let mut col = (1.0 - f) * col0 + f * col1;
        if rad <= 1.0 {
            col = 1.0 - rad * (1.0 - col);
        } else {
            col *= 0.75;
        }
        *out = (255.0 * col).clamp(0.0, 255.0) as u8;
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::flow_colour;

    #[test]
    fn zero_motion_is_white() {
        assert_eq!(flow_colour(0.0, 0.0), [255, 255, 255]);
    }

    #[test]
    fn non_finite_motion_is_black() {
        assert_eq!(flow_colour(f32::NAN, 0.0), [0, 0, 0]);
    }

    #[test]
    fn long_vectors_are_darkened() {
        let inside = flow_colour(1.0, 0.0);
        let outside = flow_colour(2.0, 0.0);
        assert!(outside.iter().zip(inside.iter()).all(|(o, i)| o <= i));
    }
}
