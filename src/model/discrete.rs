use crate::cost::{PatchEvaluator, View};
use crate::model::{EnergyModel, ModelKind};
use crate::state::State;
use rand::Rng;

/// Classic discrete belief propagation over a fixed displacement lattice.
///
/// Every node holds the full lattice `-max_motion + k * step` on both axes,
/// so particles are never resampled.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscreteModel {
    weight: f32,
    truncate: f32,
    step: f32,
}

impl DiscreteModel {
    /// Creates a lattice model; a non-positive or non-finite `step` falls
    /// back to `1`.
    pub fn new(weight: f32, truncate: f32, step: f32) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            1.0
        };
        Self {
            weight,
            truncate,
            step,
        }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn truncate(&self) -> f32 {
        self.truncate
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Offsets along one axis for the given motion bound.
    pub fn axis(&self, max_motion: f32) -> Vec<f32> {
        let side = (2.0 * max_motion / self.step).floor().max(0.0) as usize + 1;
        (0..side)
            .map(|k| -max_motion + k as f32 * self.step)
            .collect()
    }

    /// All lattice states, `v` outer and `u` inner.
    pub fn lattice(&self, max_motion: f32) -> Vec<State> {
        let axis = self.axis(max_motion);
        let mut states = Vec::with_capacity(axis.len() * axis.len());
        for &v in &axis {
            for &u in &axis {
                states.push(State::from_data(vec![u, v]));
            }
        }
        states
    }

    fn snap(&self, value: f32, max_motion: f32) -> f32 {
        let last = self.axis(max_motion).len().saturating_sub(1) as f32;
        let k = ((value + max_motion) / self.step).round().clamp(0.0, last);
        -max_motion + k * self.step
    }
}

impl Default for DiscreteModel {
    fn default() -> Self {
        Self::new(0.1, 50.0, 1.0)
    }
}

/// The lattice is shared by both views and sized from view one.
fn lattice_bound(evaluator: &PatchEvaluator<'_>) -> f32 {
    evaluator.max_motion(View::One)
}

impl EnergyModel for DiscreteModel {
    fn tag(&self) -> ModelKind {
        ModelKind::Discrete
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

    /// Uniformly chosen lattice point.
    fn random_state<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        _view: View,
        _x: usize,
        _y: usize,
        rng: &mut R,
    ) -> State {
        let axis = self.axis(lattice_bound(evaluator));
        let u = axis[rng.random_range(0..axis.len())];
        let v = axis[rng.random_range(0..axis.len())];
        State::from_data(vec![u, v])
    }

    /// Perturbation snapped back onto the lattice.
    fn random_state_around<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        _view: View,
        _x: usize,
        _y: usize,
        current: &State,
        ratio: f32,
        rng: &mut R,
    ) -> State {
        let max_motion = lattice_bound(evaluator);
        let radius = ratio * max_motion;
        let u = current.data[0] + radius * rng.random_range(-1.0f32..1.0);
        let v = current.data[1] + radius * rng.random_range(-1.0f32..1.0);
        State::from_data(vec![
            self.snap(u, max_motion),
            self.snap(v, max_motion),
        ])
    }

    fn resamples(&self) -> bool {
        false
    }

    fn particle_count(&self, _configured: usize, max_motion: f32) -> usize {
        let side = self.axis(max_motion).len();
        side * side
    }

    fn initial_states<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        _view: View,
        _x: usize,
        _y: usize,
        _count: usize,
        _rng: &mut R,
    ) -> Vec<State> {
        self.lattice(lattice_bound(evaluator))
    }

    fn initial_score(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        state: &State,
    ) -> f32 {
        self.unary_energy(evaluator, view, x, y, state, evaluator.params().infinity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_covers_closed_range() {
        let model = DiscreteModel::new(1.0, 1.0, 1.0);
        assert_eq!(model.axis(2.0), vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(model.particle_count(1, 2.0), 25);
        let lattice = model.lattice(1.0);
        assert_eq!(lattice[0].data, vec![-1.0, -1.0]);
        assert_eq!(lattice[1].data, vec![0.0, -1.0]);
        assert_eq!(lattice[3].data, vec![-1.0, 0.0]);
    }

    #[test]
    fn coarse_step_truncates_lattice() {
        let model = DiscreteModel::new(1.0, 1.0, 2.0);
        assert_eq!(model.axis(1.5), vec![-1.5, 0.5]);
    }

    #[test]
    fn snap_stays_on_lattice() {
        let model = DiscreteModel::default();
        assert_eq!(model.snap(0.4, 2.0), 0.0);
        assert_eq!(model.snap(7.0, 2.0), 2.0);
        assert_eq!(model.snap(-7.0, 2.0), -2.0);
    }
}
