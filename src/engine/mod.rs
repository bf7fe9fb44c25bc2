//! Particle max-product belief propagation over the pixel grid.
//!
//! [`ParticleGraph`] owns one node grid per view. Each iteration sweeps the
//! grid in one of four alternating orders; at every pixel it rescores the
//! current particles against the neighbours' cached foundations, lets the
//! model propose new candidates, and refreshes the pixel's own foundations.
//!
//! Messages are never stored. The message from a neighbour `n` to pixel `p`
//! for a state `s` is recomputed on demand as the minimum over `n`'s
//! particles of the pairwise cost plus `n`'s foundation towards `p`.

mod fields;
mod output;
mod resample;
pub mod sweep;

pub use sweep::SweepOrder;

use crate::cost::{CostParams, PatchEvaluator, Scene, View};
use crate::grid::{Grid, Mask};
use crate::image::RgbaImage;
use crate::model::EnergyModel;
use crate::node::{Direction, Node, Particle};
use crate::state::State;
use crate::trace::{trace_event, trace_span};
use crate::util::{PmbpError, PmbpResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::ops::ControlFlow;
use std::time::Instant;

/// Starting value of the minimisation inside a message.
const MESSAGE_CEILING: f32 = 1e10;

/// Engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct PmbpConfig {
    /// Number of iterations run by [`ParticleGraph::solve`].
    pub n_iterations: usize,
    /// Particles per node for resampling models.
    pub n_particles: usize,
    /// Also solve view two, matched against view one.
    pub bidirectional: bool,
    /// Seed of the engine's random generator.
    pub seed: u64,
    /// Side of the median filter used for adaptive support weights.
    pub median_size: usize,
    /// Unary cost parameters.
    pub cost: CostParams,
}

impl Default for PmbpConfig {
    fn default() -> Self {
        Self {
            n_iterations: 10,
            n_particles: 1,
            bidirectional: false,
            seed: 0,
            median_size: 3,
            cost: CostParams::default(),
        }
    }
}

/// Particle belief propagation state for a pair of images.
#[derive(Debug)]
pub struct ParticleGraph<M: EnergyModel> {
    model: M,
    config: PmbpConfig,
    scene: Scene,
    n_particles: usize,
    nodes: [Grid<Node>; 2],
    processed: [Mask; 2],
    propagated: [Mask; 2],
    rng: StdRng,
}

impl<M: EnergyModel> ParticleGraph<M> {
    /// Preprocesses both images and initialises every node of view one
    /// (and of view two when bidirectional).
    pub fn new(
        model: M,
        config: PmbpConfig,
        one: RgbaImage,
        two: RgbaImage,
    ) -> PmbpResult<Self> {
        if config.n_particles == 0 {
            return Err(PmbpError::InvalidInput("n_particles must be positive"));
        }
        if config.cost.asw.is_nan() || config.cost.asw <= 0.0 {
            return Err(PmbpError::InvalidInput("asw must be positive"));
        }
        let scene = Scene::new(one, two, config.median_size)?;
        let bound = PatchEvaluator::new(&scene, &config.cost).max_motion(View::One);
        let n_particles = model.particle_count(config.n_particles, bound);
        if n_particles == 0 {
            return Err(PmbpError::InvalidInput("model produced an empty particle set"));
        }

        let empty = |view: View| {
            Grid::filled(
                scene.width(view),
                scene.height(view),
                Node::new(n_particles, model.data_dim(), model.meta_dim()),
            )
        };
        let nodes = [empty(View::One), empty(View::Two)];
        let processed = [
            Mask::new(scene.width(View::One), scene.height(View::One)),
            Mask::new(scene.width(View::Two), scene.height(View::Two)),
        ];
        let propagated = processed.clone();
        let rng = StdRng::seed_from_u64(config.seed);

        let mut graph = Self {
            model,
            config,
            scene,
            n_particles,
            nodes,
            processed,
            propagated,
            rng,
        };
        graph.initialise_nodes();
        Ok(graph)
    }

    /// Re-initialises every node of the active views.
    pub fn initialise_nodes(&mut self) {
        let _span = trace_span!("initialise", particles = self.n_particles).entered();
        for view in self.active_views() {
            for y in 0..self.height(view) {
                for x in 0..self.width(view) {
                    self.initialise_node(view, x, y);
                }
            }
        }
    }

    /// Runs all configured iterations.
    pub fn solve(&mut self) {
        self.solve_with(|_, _| ControlFlow::Continue(()));
    }

    /// Runs the configured iterations, calling `on_iteration` after each one.
    ///
    /// Returning `ControlFlow::Break` stops early. Returns the number of
    /// completed iterations.
    pub fn solve_with<F>(&mut self, mut on_iteration: F) -> usize
    where
        F: FnMut(usize, &Self) -> ControlFlow<()>,
    {
        let _span = trace_span!("solve", iterations = self.config.n_iterations).entered();
        let start = Instant::now();
        for it in 0..self.config.n_iterations {
            self.iterate(it);
            trace_event!(
                "iteration",
                index = it,
                elapsed_s = start.elapsed().as_secs_f64(),
                propagated_pct = self.propagated[View::One.index()].percentage(true)
            );
            if on_iteration(it, self).is_break() {
                return it + 1;
            }
        }
        self.config.n_iterations
    }

    /// One iteration: view two first when bidirectional, then view one.
    pub fn iterate(&mut self, it: usize) {
        let _span = trace_span!("iteration", index = it).entered();
        for mask in &mut self.propagated {
            mask.set_all(false);
        }
        if self.config.bidirectional {
            self.iterate_view(it, View::Two);
        }
        self.iterate_view(it, View::One);
        self.reset_processed();
    }

    /// One sweep over `view` in the order assigned to iteration `it`.
    pub fn iterate_view(&mut self, it: usize, view: View) {
        let order = SweepOrder::for_iteration(it);
        let _span = trace_span!("sweep", view = view.index(), order = ?order).entered();
        for (x, y) in order.pixels(self.width(view), self.height(view)) {
            self.update_current_disbelief(view, x, y);
            self.update(view, x, y);
            self.cache(view, x, y);
        }
    }

    /// Clears the processed flags of both views.
    pub fn reset_processed(&mut self) {
        for mask in &mut self.processed {
            mask.set_all(false);
        }
    }

    /// Rescores every particle of `(x, y)` against the current neighbour foundations.
    pub fn update_current_disbelief(&mut self, view: View, x: usize, y: usize) {
        for k in 0..self.node(view, x, y).len() {
            let score = self.evaluate_disbelief(view, x, y, self.node(view, x, y).state(k), false);
            self.node_mut(view, x, y).set_score(k, score);
        }
    }

    /// Model-specific particle refinement: propagation then random search.
    pub fn update(&mut self, view: View, x: usize, y: usize) {
        if !self.model.resamples() {
            return;
        }
        self.propagate(view, x, y);
        self.randomise(view, x, y);
    }

    /// Refreshes the foundations of `(x, y)` and marks it processed.
    pub fn cache(&mut self, view: View, x: usize, y: usize) {
        let (width, height) = (self.width(view), self.height(view));
        let node = self.node(view, x, y);
        let count = node.len();
        let mut fresh: [Option<Vec<f32>>; 4] = Default::default();

        for direction in Direction::ALL {
            let Some(from) = direction.neighbour(x, y, width, height) else {
                continue;
            };
            let values = (0..count)
                .map(|k| {
                    let message = self.evaluate_message(view, from, (x, y), node.state(k));
                    node.score(k) - message
                })
                .collect();
            fresh[direction.index()] = Some(values);
        }

        let node = self.node_mut(view, x, y);
        for direction in Direction::ALL {
            if let Some(values) = fresh[direction.index()].take() {
                let foundation = node.foundation_mut(direction);
                for (k, value) in values.into_iter().enumerate() {
                    foundation.set(k, value);
                }
                foundation.normalize();
            }
        }
        self.processed[view.index()].set(x, y, true);
    }

    /// Messages from all neighbours plus the unary cost of `state` at `(x, y)`.
    ///
    /// With `early_termination`, the unary evaluation gives up once it can no
    /// longer beat the worst particle of the node.
    pub fn evaluate_disbelief(
        &self,
        view: View,
        x: usize,
        y: usize,
        state: &State,
        early_termination: bool,
    ) -> f32 {
        let (width, height) = (self.width(view), self.height(view));
        let mut message_sum = 0.0;
        for direction in Direction::ALL {
            if let Some(from) = direction.neighbour(x, y, width, height) {
                message_sum += self.evaluate_message(view, from, (x, y), state);
            }
        }
        let threshold = if early_termination {
            self.max_disbelief(view, x, y) - message_sum
        } else {
            self.config.cost.infinity
        };
        let unary = self
            .model
            .unary_energy(&self.evaluator(), view, x, y, state, threshold);
        unary + message_sum
    }

    /// Message sent from pixel `from` to its neighbour `to`, evaluated at `state`.
    pub fn evaluate_message(
        &self,
        view: View,
        from: (usize, usize),
        to: (usize, usize),
        state: &State,
    ) -> f32 {
        let sender = self.node(view, from.0, from.1);
        let foundation = sender.foundation(Direction::between(from, to));
        sender
            .particles()
            .iter()
            .enumerate()
            .fold(MESSAGE_CEILING, |best, (i, particle)| {
                let pairwise = self.model.pairwise_energy(
                    to.0,
                    to.1,
                    state,
                    from.0,
                    from.1,
                    &particle.state,
                );
                best.min(pairwise + foundation.value(i))
            })
    }

    /// Best state of `(x, y)`; ties resolve to the lowest particle index.
    pub fn min_disbelief_state(&self, view: View, x: usize, y: usize) -> &State {
        self.node(view, x, y).min_state()
    }

    /// Score of the worst particle of `(x, y)`.
    pub fn max_disbelief(&self, view: View, x: usize, y: usize) -> f32 {
        self.node(view, x, y).max_score()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &PmbpConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Patch evaluator bound to this graph's scene and cost parameters.
    pub fn evaluator(&self) -> PatchEvaluator<'_> {
        PatchEvaluator::new(&self.scene, &self.config.cost)
    }

    /// Particles per node.
    pub fn n_particles(&self) -> usize {
        self.n_particles
    }

    pub fn width(&self, view: View) -> usize {
        self.nodes[view.index()].width()
    }

    pub fn height(&self, view: View) -> usize {
        self.nodes[view.index()].height()
    }

    pub fn nodes(&self, view: View) -> &Grid<Node> {
        &self.nodes[view.index()]
    }

    pub fn node(&self, view: View, x: usize, y: usize) -> &Node {
        &self.nodes[view.index()][(x, y)]
    }

    pub fn node_mut(&mut self, view: View, x: usize, y: usize) -> &mut Node {
        &mut self.nodes[view.index()][(x, y)]
    }

    /// Pixels whose foundations were refreshed in the current sweep.
    pub fn processed(&self, view: View) -> &Mask {
        &self.processed[view.index()]
    }

    /// Pixels that accepted at least one candidate in the current iteration.
    pub fn propagated(&self, view: View) -> &Mask {
        &self.propagated[view.index()]
    }

    /// Share of pixels of `view` that accepted a candidate, in percent.
    pub fn propagated_percentage(&self, view: View) -> f32 {
        self.propagated[view.index()].percentage(true)
    }

    fn active_views(&self) -> Vec<View> {
        if self.config.bidirectional {
            vec![View::One, View::Two]
        } else {
            vec![View::One]
        }
    }

    fn set_node(&mut self, view: View, x: usize, y: usize, particles: Vec<Particle>) {
        self.nodes[view.index()][(x, y)] = Node::from_particles(particles);
    }
}
