use crate::cost::{PatchEvaluator, View};
use crate::model::{EnergyModel, ModelKind};
use crate::state::State;
use rand::Rng;

/// Slanted-plane stereo.
///
/// A state is a plane through the pixel with unit normal `(nx, ny, nz)` and
/// disparity `d` at that pixel, stored in `meta`. `data` holds the derived
/// coefficients `(a, b, c)` so that the disparity at `(x, y)` is
/// `a * x + b * y + c`.
#[derive(Clone, Debug, PartialEq)]
pub struct StereoModel {
    weight: f32,
    truncate: f32,
}

impl StereoModel {
    pub fn new(weight: f32, truncate: f32) -> Self {
        Self { weight, truncate }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn truncate(&self) -> f32 {
        self.truncate
    }

    /// Builds the state of the plane with normal `n` passing through
    /// `(x, y, d)`.
    ///
    /// A normal that cannot be normalised or is parallel to the image plane
    /// is replaced by the fronto-parallel normal.
    pub fn plane_state(x: f32, y: f32, normal: [f32; 3], d: f32) -> State {
        let [nx, ny, nz] = unit_normal(normal);
        State {
            data: vec![-nx / nz, -ny / nz, (nx * x + ny * y + nz * d) / nz],
            meta: vec![nx, ny, nz, d],
        }
    }
}

impl Default for StereoModel {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

fn unit_normal([nx, ny, nz]: [f32; 3]) -> [f32; 3] {
    let length = (nx * nx + ny * ny + nz * nz).sqrt();
    if !length.is_finite() || length == 0.0 || nz == 0.0 {
        return [0.0, 0.0, 1.0];
    }
    [nx / length, ny / length, nz / length]
}

impl EnergyModel for StereoModel {
    fn tag(&self) -> ModelKind {
        ModelKind::Stereo
    }

    fn data_dim(&self) -> usize {
        3
    }

    fn meta_dim(&self) -> usize {
        4
    }

    /// Distances of the other pixel's 3D point to each plane, summed.
    fn pairwise_energy(
        &self,
        x1: usize,
        y1: usize,
        s1: &State,
        x2: usize,
        y2: usize,
        s2: &State,
    ) -> f32 {
        let dx = x2 as f32 - x1 as f32;
        let dy = y2 as f32 - y1 as f32;
        let dd = s2.meta[3] - s1.meta[3];
        let e1 = (s1.meta[0] * dx + s1.meta[1] * dy + s1.meta[2] * dd).abs();
        let e2 = (s2.meta[0] * dx + s2.meta[1] * dy + s2.meta[2] * dd).abs();
        self.weight * (e1 + e2).min(self.truncate)
    }

    fn displacement(&self, x: f32, y: f32, state: &State) -> (f32, f32) {
        (state.data[0] * x + state.data[1] * y + state.data[2], 0.0)
    }

    fn random_state<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        rng: &mut R,
    ) -> State {
        let max_motion = evaluator.max_motion(view);
        let scene = evaluator.scene();
        let d = max_motion * rng.random_range(-1.0f32..1.0);
        // Scale so that slopes in pixels and disparities are comparable.
        let normal = [
            rng.random_range(-1.0f32..1.0) / scene.width(view) as f32,
            rng.random_range(-1.0f32..1.0) / scene.height(view) as f32,
            rng.random_range(-1.0f32..1.0) / max_motion,
        ];
        Self::plane_state(x as f32, y as f32, normal, d)
    }

    fn random_state_around<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        current: &State,
        ratio: f32,
        rng: &mut R,
    ) -> State {
        let max_delta_d = ratio * evaluator.max_motion(view);
        let d = current.meta[3] + max_delta_d * rng.random_range(-1.0f32..1.0);
        let normal = [
            current.meta[0] + ratio * rng.random_range(-1.0f32..1.0),
            current.meta[1] + ratio * rng.random_range(-1.0f32..1.0),
            current.meta[2] + ratio * rng.random_range(-1.0f32..1.0),
        ];
        Self::plane_state(x as f32, y as f32, normal, d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_disparity_at_anchor_equals_depth() {
        let model = StereoModel::default();
        let state = StereoModel::plane_state(7.0, 3.0, [0.3, -0.2, 0.9], 5.0);
        let (dx, dy) = model.displacement(7.0, 3.0, &state);
        assert!((dx - 5.0).abs() < 1e-4);
        assert_eq!(dy, 0.0);
        let length: f32 = state.meta[..3].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((length - 1.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_normal_is_fronto_parallel() {
        let state = StereoModel::plane_state(1.0, 1.0, [1.0, 0.0, 0.0], 2.0);
        assert_eq!(state.meta, vec![0.0, 0.0, 1.0, 2.0]);
        assert_eq!(state.data, vec![0.0, 0.0, 2.0]);
    }

    #[test]
    fn coplanar_neighbours_cost_nothing() {
        let model = StereoModel::new(1.0, 10.0);
        let s = StereoModel::plane_state(0.0, 0.0, [0.0, 0.0, 1.0], 3.0);
        assert_eq!(model.pairwise_energy(0, 0, &s, 1, 0, &s), 0.0);
    }
}
