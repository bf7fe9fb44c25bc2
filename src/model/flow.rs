use crate::cost::{PatchEvaluator, View};
use crate::model::{EnergyModel, ModelKind};
use crate::state::State;
use rand::Rng;

const MAX_DRAWS: usize = 64;

/// Dense 2D optical flow; a state is the displacement `(dx, dy)`.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowModel {
    weight: f32,
    truncate: f32,
}

impl FlowModel {
    /// Truncated quadratic smoothness `weight * min(|d1 - d2|^2, truncate)`.
    pub fn new(weight: f32, truncate: f32) -> Self {
        Self { weight, truncate }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn truncate(&self) -> f32 {
        self.truncate
    }
}

impl Default for FlowModel {
    fn default() -> Self {
        Self::new(0.001, 50.0)
    }
}

impl EnergyModel for FlowModel {
    fn tag(&self) -> ModelKind {
        ModelKind::Flow
    }

    fn data_dim(&self) -> usize {
        2
    }

    fn meta_dim(&self) -> usize {
        0
    }

    fn pairwise_energy(
        &self,
        _x1: usize,
        _y1: usize,
        s1: &State,
        _x2: usize,
        _y2: usize,
        s2: &State,
    ) -> f32 {
        let dx = s1.data[0] - s2.data[0];
        let dy = s1.data[1] - s2.data[1];
        self.weight * (dx * dx + dy * dy).min(self.truncate)
    }

    fn displacement(&self, _x: f32, _y: f32, state: &State) -> (f32, f32) {
        (state.data[0], state.data[1])
    }

    /// Rejection-samples a valid displacement; falls back to zero motion
    /// when no draw is accepted.
    fn random_state<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        rng: &mut R,
    ) -> State {
        let max_motion = evaluator.max_motion(view);
        for _ in 0..MAX_DRAWS {
            let state = State::from_data(vec![
                max_motion * rng.random_range(-1.0f32..1.0),
                max_motion * rng.random_range(-1.0f32..1.0),
            ]);
            if evaluator.is_state_valid(self, view, x, y, &state) {
                return state;
            }
        }
        State::zeros(2, 0)
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
        let radius = ratio * evaluator.max_motion(view);
        let mut state = current.clone();
        state.data[0] += radius * rng.random_range(-1.0f32..1.0);
        state.data[1] += radius * rng.random_range(-1.0f32..1.0);
        if evaluator.is_state_valid(self, view, x, y, &state) {
            state
        } else {
            current.clone()
        }
    }
}
