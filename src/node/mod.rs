//! Per-pixel particle sets.
//!
//! A node stores a fixed number of `(state, score)` particles and one
//! foundation per grid direction. Scores are disbeliefs: lower is better.

pub mod foundation;

pub use foundation::{Direction, Foundation};

use crate::state::State;
use std::fmt;

/// A candidate state and its current disbelief.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub state: State,
    pub score: f32,
}

/// Particle set of one pixel together with its cached foundations.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    particles: Vec<Particle>,
    foundations: [Foundation; 4],
}

impl Node {
    /// Creates `count` zero-scored particles with zero states.
    pub fn new(count: usize, data_dim: usize, meta_dim: usize) -> Self {
        let particles = (0..count)
            .map(|_| Particle {
                state: State::zeros(data_dim, meta_dim),
                score: 0.0,
            })
            .collect();
        Self {
            particles,
            foundations: std::array::from_fn(|_| Foundation::zeros(count)),
        }
    }

    /// Builds a node from explicit particles; foundations start at zero.
    pub fn from_particles(particles: Vec<Particle>) -> Self {
        let count = particles.len();
        Self {
            particles,
            foundations: std::array::from_fn(|_| Foundation::zeros(count)),
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn state(&self, k: usize) -> &State {
        &self.particles[k].state
    }

    pub fn score(&self, k: usize) -> f32 {
        self.particles[k].score
    }

    /// Replaces particle `k` with `state` scored `score`.
    pub fn set_particle(&mut self, k: usize, state: State, score: f32) {
        self.particles[k] = Particle { state, score };
    }

    pub fn set_score(&mut self, k: usize, score: f32) {
        self.particles[k].score = score;
    }

    pub fn foundation(&self, direction: Direction) -> &Foundation {
        &self.foundations[direction.index()]
    }

    pub fn foundation_mut(&mut self, direction: Direction) -> &mut Foundation {
        &mut self.foundations[direction.index()]
    }

    /// Index of the lowest-scoring particle; ties go to the lowest index.
    pub fn min_index(&self) -> usize {
        let mut best = 0;
        for (k, particle) in self.particles.iter().enumerate().skip(1) {
            if particle.score < self.particles[best].score {
                best = k;
            }
        }
        best
    }

    /// Index of the highest-scoring particle; ties go to the lowest index.
    pub fn max_index(&self) -> usize {
        let mut worst = 0;
        for (k, particle) in self.particles.iter().enumerate().skip(1) {
            if particle.score > self.particles[worst].score {
                worst = k;
            }
        }
        worst
    }

    pub fn min_score(&self) -> f32 {
        self.score(self.min_index())
    }

    pub fn max_score(&self) -> f32 {
        self.score(self.max_index())
    }

    /// State of the lowest-scoring particle.
    pub fn min_state(&self) -> &State {
        self.state(self.min_index())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "particles ({}):", self.particles.len())?;
        for particle in &self.particles {
            writeln!(f, "  {} -> {}", particle.state, particle.score)?;
        }
        for direction in Direction::ALL {
            write!(f, "{direction:?}:")?;
            for value in self.foundation(direction).values() {
                write!(f, " {value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
