//! Points in a model's search space.

use std::fmt;

/// A candidate displacement or parametrization.
///
/// `data` holds the coordinates the displacement is computed from; `meta`
/// carries optional auxiliary values (for stereo planes, the normal and depth
/// that `data` is derived from, which are easier to perturb and propagate).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    pub data: Vec<f32>,
    pub meta: Vec<f32>,
}

impl State {
    /// Creates a zero state with the given dimensions.
    pub fn zeros(data_dim: usize, meta_dim: usize) -> Self {
        Self {
            data: vec![0.0; data_dim],
            meta: vec![0.0; meta_dim],
        }
    }

    /// Creates a state with no auxiliary coordinates.
    pub fn from_data(data: Vec<f32>) -> Self {
        Self {
            data,
            meta: Vec::new(),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in &self.data {
            write!(f, "{value} ")?;
        }
        if !self.meta.is_empty() {
            write!(f, " || meta: ")?;
            for value in &self.meta {
                write!(f, "{value} ")?;
            }
        }
        Ok(())
    }
}
