//! PMBP particle refinement: neighbour propagation and random search.

use crate::cost::{PatchEvaluator, View};
use crate::engine::ParticleGraph;
use crate::model::EnergyModel;
use crate::node::{Direction, Particle};
use crate::state::State;

/// First perturbation radius, relative to the motion bound.
const INITIAL_RATIO: f32 = 0.1;
/// Random search stops once the radius drops to this value.
const MIN_RATIO: f32 = 0.001;

impl<M: EnergyModel> ParticleGraph<M> {
    /// Fills `(x, y)` with the model's initial particles and zeroed foundations.
    pub fn initialise_node(&mut self, view: View, x: usize, y: usize) {
        let evaluator = PatchEvaluator::new(&self.scene, &self.config.cost);
        let states = self
            .model
            .initial_states(&evaluator, view, x, y, self.n_particles, &mut self.rng);
        let particles: Vec<Particle> = states
            .into_iter()
            .map(|state| Particle {
                score: self.model.initial_score(&evaluator, view, x, y, &state),
                state,
            })
            .collect();
        self.set_node(view, x, y, particles);
    }

    /// Proposes the best state of every neighbour already processed in this sweep.
    pub fn propagate(&mut self, view: View, x: usize, y: usize) {
        let (width, height) = (self.width(view), self.height(view));
        for direction in Direction::ALL {
            let Some((nx, ny)) = direction.neighbour(x, y, width, height) else {
                continue;
            };
            if !self.processed[view.index()].get(nx, ny) {
                continue;
            }
            let candidate = self
                .model
                .state_from_neighbour(self.min_disbelief_state(view, nx, ny));
            self.propose_candidate(view, x, y, candidate, false);
        }
    }

    /// Proposes perturbations of each particle with geometrically shrinking
    /// radius, each centred on the particle's current state.
    pub fn randomise(&mut self, view: View, x: usize, y: usize) {
        for k in 0..self.node(view, x, y).len() {
            let mut ratio = INITIAL_RATIO;
            while ratio > MIN_RATIO {
                // Slot k may have been replaced by the previous proposal.
                let current = self.node(view, x, y).state(k).clone();
                let evaluator = PatchEvaluator::new(&self.scene, &self.config.cost);
                let candidate = self.model.random_state_around(
                    &evaluator,
                    view,
                    x,
                    y,
                    &current,
                    ratio,
                    &mut self.rng,
                );
                self.propose_candidate(view, x, y, candidate, false);
                ratio /= 2.0;
            }
        }
    }

    /// Replaces the worst particle of `(x, y)` with `state` if it scores
    /// strictly better. Returns whether the candidate was accepted.
    ///
    /// `force` is currently ignored.
    pub fn propose_candidate(
        &mut self,
        view: View,
        x: usize,
        y: usize,
        state: State,
        _force: bool,
    ) -> bool {
        let node = self.node(view, x, y);
        let worst = node.max_index();
        let highest = node.score(worst);
        let disbelief = self.evaluate_disbelief(view, x, y, &state, true);
        if disbelief < highest {
            self.node_mut(view, x, y).set_particle(worst, state, disbelief);
            self.propagated[view.index()].set(x, y, true);
            true
        } else {
            false
        }
    }
}
