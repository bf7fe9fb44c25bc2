//! Energy models: what a state means and how states are scored and sampled.
//!
//! The engine is generic over [`EnergyModel`]. The three concrete models are
//! also collected in the closed [`Model`] enum, which implements the trait by
//! delegation so callers can choose a model at runtime.

mod discrete;
mod flow;
mod stereo;

pub use discrete::DiscreteModel;
pub use flow::FlowModel;
pub use stereo::StereoModel;

use crate::cost::{CostParams, PatchEvaluator, View};
use crate::engine::PmbpConfig;
use crate::state::State;
use crate::util::{PmbpError, PmbpResult};
use rand::Rng;

/// Identifies a model in persisted particle fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Discrete,
    Flow,
    Stereo,
}

impl ModelKind {
    /// One-byte tag written at the head of a field file.
    pub fn tag(self) -> u8 {
        match self {
            ModelKind::Discrete => b'A',
            ModelKind::Flow => b'B',
            ModelKind::Stereo => b'C',
        }
    }

    /// Resolves a field-file tag.
    pub fn from_tag(tag: u8) -> PmbpResult<Self> {
        match tag {
            b'A' => Ok(ModelKind::Discrete),
            b'B' => Ok(ModelKind::Flow),
            b'C' => Ok(ModelKind::Stereo),
            _ => Err(PmbpError::UnknownApplication { tag }),
        }
    }
}

/// Contract between the particle engine and a concrete labelling problem.
pub trait EnergyModel {
    fn tag(&self) -> ModelKind;

    /// Number of coordinates in `State::data`.
    fn data_dim(&self) -> usize;

    /// Number of coordinates in `State::meta`.
    fn meta_dim(&self) -> usize;

    /// Smoothness cost between neighbouring pixels; truncated and non-negative.
    fn pairwise_energy(
        &self,
        x1: usize,
        y1: usize,
        s1: &State,
        x2: usize,
        y2: usize,
        s2: &State,
    ) -> f32;

    /// Displacement `(dx, dy)` that `state` assigns to pixel `(x, y)`.
    fn displacement(&self, x: f32, y: f32, state: &State) -> (f32, f32);

    /// Draws a fresh state for pixel `(x, y)` of `view`.
    fn random_state<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        rng: &mut R,
    ) -> State;

    /// Perturbs `current` by an amount proportional to `ratio`.
    #[allow(clippy::too_many_arguments)]
    fn random_state_around<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        current: &State,
        ratio: f32,
        rng: &mut R,
    ) -> State;

    /// Candidate proposed to a pixel from a neighbour's best state.
    fn state_from_neighbour(&self, best: &State) -> State {
        best.clone()
    }

    /// Patch cost of `state`, or `infinity` if the state is invalid or the
    /// cost exceeds `threshold`.
    fn unary_energy(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        state: &State,
        threshold: f32,
    ) -> f32 {
        if !evaluator.is_state_valid(self, view, x, y, state) {
            return evaluator.params().infinity;
        }
        evaluator.patch_cost(self, view, x, y, state, threshold)
    }

    /// Whether the engine should propagate and randomise particles.
    fn resamples(&self) -> bool {
        true
    }

    /// Particles per node given the configured count and the effective
    /// motion bound.
    fn particle_count(&self, configured: usize, _max_motion: f32) -> usize {
        configured
    }

    /// States a node starts with.
    fn initial_states<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        count: usize,
        rng: &mut R,
    ) -> Vec<State> {
        (0..count)
            .map(|_| self.random_state(evaluator, view, x, y, rng))
            .collect()
    }

    /// Score a freshly initialised particle starts with.
    fn initial_score(
        &self,
        _evaluator: &PatchEvaluator<'_>,
        _view: View,
        _x: usize,
        _y: usize,
        _state: &State,
    ) -> f32 {
        0.0
    }
}

/// Runtime-selected energy model.
#[derive(Clone, Debug, PartialEq)]
pub enum Model {
    Flow(FlowModel),
    Stereo(StereoModel),
    Discrete(DiscreteModel),
}

macro_rules! delegate {
    ($self:ident, $model:ident => $body:expr) => {
        match $self {
            Model::Flow($model) => $body,
            Model::Stereo($model) => $body,
            Model::Discrete($model) => $body,
        }
    };
}

impl EnergyModel for Model {
    fn tag(&self) -> ModelKind {
        delegate!(self, m => m.tag())
    }

    fn data_dim(&self) -> usize {
        delegate!(self, m => m.data_dim())
    }

    fn meta_dim(&self) -> usize {
        delegate!(self, m => m.meta_dim())
    }

    fn pairwise_energy(
        &self,
        x1: usize,
        y1: usize,
        s1: &State,
        x2: usize,
        y2: usize,
        s2: &State,
    ) -> f32 {
        delegate!(self, m => m.pairwise_energy(x1, y1, s1, x2, y2, s2))
    }

    fn displacement(&self, x: f32, y: f32, state: &State) -> (f32, f32) {
        delegate!(self, m => m.displacement(x, y, state))
    }

    fn random_state<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        rng: &mut R,
    ) -> State {
        delegate!(self, m => m.random_state(evaluator, view, x, y, rng))
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
        delegate!(self, m => m.random_state_around(evaluator, view, x, y, current, ratio, rng))
    }

    fn state_from_neighbour(&self, best: &State) -> State {
        delegate!(self, m => m.state_from_neighbour(best))
    }

    fn unary_energy(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        state: &State,
        threshold: f32,
    ) -> f32 {
        delegate!(self, m => m.unary_energy(evaluator, view, x, y, state, threshold))
    }

    fn resamples(&self) -> bool {
        delegate!(self, m => m.resamples())
    }

    fn particle_count(&self, configured: usize, max_motion: f32) -> usize {
        delegate!(self, m => m.particle_count(configured, max_motion))
    }

    fn initial_states<R: Rng + ?Sized>(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        count: usize,
        rng: &mut R,
    ) -> Vec<State> {
        delegate!(self, m => m.initial_states(evaluator, view, x, y, count, rng))
    }

    fn initial_score(
        &self,
        evaluator: &PatchEvaluator<'_>,
        view: View,
        x: usize,
        y: usize,
        state: &State,
    ) -> f32 {
        delegate!(self, m => m.initial_score(evaluator, view, x, y, state))
    }
}

/// The three supported applications with their tuned defaults.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Application {
    Flow,
    Stereo,
    Discrete,
}

impl Application {
    /// Engine configuration tuned for this application.
    pub fn default_config(self) -> PmbpConfig {
        match self {
            Application::Flow => PmbpConfig {
                n_iterations: 10,
                n_particles: 1,
                cost: CostParams {
                    patch_size: 2,
                    max_motion: 0.0,
                    tau1: 20.0,
                    tau2: 20.0,
                    alpha: 0.0,
                    asw: 15.0,
                    border: 0.85,
                    infinity: 9_999_999.0,
                },
                ..PmbpConfig::default()
            },
            Application::Stereo => PmbpConfig {
                n_iterations: 10,
                n_particles: 1,
                cost: CostParams {
                    patch_size: 10,
                    max_motion: 59.0,
                    tau1: 10.0,
                    tau2: 2.0,
                    alpha: 0.9,
                    asw: 10.0,
                    border: 0.85,
                    infinity: 999_999.0,
                },
                ..PmbpConfig::default()
            },
            Application::Discrete => {
                let mut cost = CostParams {
                    patch_size: 1,
                    max_motion: 5.0,
                    tau1: 20.0,
                    tau2: 20.0,
                    alpha: 0.0,
                    asw: 15.0,
                    border: 0.85,
                    infinity: 0.0,
                };
                let p = cost.patch_size as f32;
                cost.infinity = p * p * cost.border_cost();
                PmbpConfig {
                    n_iterations: 10,
                    n_particles: 1,
                    cost,
                    ..PmbpConfig::default()
                }
            }
        }
    }

    /// Model with this application's default smoothness parameters.
    pub fn default_model(self) -> Model {
        match self {
            Application::Flow => Model::Flow(FlowModel::new(0.001, 50.0)),
            Application::Stereo => Model::Stereo(StereoModel::new(1.0, 1.0)),
            Application::Discrete => Model::Discrete(DiscreteModel::default()),
        }
    }

    pub fn kind(self) -> ModelKind {
        match self {
            Application::Flow => ModelKind::Flow,
            Application::Stereo => ModelKind::Stereo,
            Application::Discrete => ModelKind::Discrete,
        }
    }
}
