//! Low-level building blocks for custom solvers and diagnostics.
//!
//! These types expose per-pixel nodes, cached foundations, dense grids and
//! the preprocessing filters beyond the high-level `ParticleGraph` API. Most
//! users should prefer the top-level `ParticleGraph`, `Model` and
//! `PmbpConfig` types.

pub use crate::cost::ViewImages;
pub use crate::format::{peek_kind, FieldBlock};
pub use crate::grid::{Grid, Mask};
pub use crate::image::filters::{gradient, median_filter};
#[cfg(feature = "rayon")]
pub use crate::image::filters::{gradient_par, median_filter_par};
pub use crate::node::{Direction, Foundation, Node, Particle};
