//! PMBP is a particle max-product belief propagation engine for dense
//! correspondence between two images.
//!
//! Each pixel holds a small set of continuous candidate states (particles).
//! Sweeps over the grid pass min-sum messages between 4-neighbours, score
//! candidates with an adaptive-support patch cost, and resample particles by
//! propagating good neighbour states and by random search around the current
//! ones. Three energy models are provided: 2D optical flow, slanted-plane
//! stereo, and classic discrete BP over a fixed displacement lattice.
//!
//! Image preprocessing can run in parallel via the `rayon` feature; the
//! engine itself is sequential.

pub mod cost;
pub mod engine;
pub mod format;
pub mod grid;
pub mod image;
pub mod lowlevel;
pub mod model;
pub mod node;
pub mod state;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use image::io;

pub use cost::{CostParams, PatchEvaluator, Scene, View};
pub use engine::{ParticleGraph, PmbpConfig, SweepOrder};
pub use format::{FieldFile, FlowField};
pub use image::{ImageView, RgbaImage};
pub use model::{
    Application, DiscreteModel, EnergyModel, FlowModel, Model, ModelKind, StereoModel,
};
pub use state::State;
pub use util::{PmbpError, PmbpResult};
