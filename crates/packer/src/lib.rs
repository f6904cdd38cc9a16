//! Sphere packing: fills the unit ball with non-overlapping spheres by
//! rejection sampling and yields them in fixed-size batches.
//!
//! # Invariants
//! - Every placement has `min_radius <= r <= max_radius`.
//! - Every placement satisfies `|center| + r <= 1`.
//! - Any two placements keep a gap of at least `min_radius` between surfaces.
//! - Batches are yielded in acceptance order, never duplicated.
//!
//! The sampler is brute force: each candidate is tested against every
//! accepted placement.

mod cancel;
mod config;
mod error;
mod packer;
mod validation;

pub use cancel::CancelToken;
pub use config::{ConfigError, DEFAULT_MAX_ATTEMPTS, PackConfig};
pub use error::PackError;
pub use packer::{Batch, Packer, candidate_radius, generate};
pub use validation::{ValidationReport, validate};
