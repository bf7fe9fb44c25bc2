//! Shared utility helpers.

pub(crate) mod colour;
pub mod error;

pub use error::{PmbpError, PmbpResult};
