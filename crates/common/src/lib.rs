//! Shared types for the cubefield workspace.
//!
//! The packer produces [`Placement`]s; the renderer turns them into
//! [`Transform`]s. Default configuration constants live here so both sides
//! agree on capacity and radius bounds.

mod types;

pub use types::{Placement, Transform};

/// Target number of placements per run.
pub const N: usize = 6000;
/// Smallest accepted radius. Also the minimum gap between two placements.
pub const MIN_R: f32 = 0.003;
/// Largest accepted radius.
pub const MAX_R: f32 = 0.3;
/// Placements per emitted batch.
pub const N_PER_CHUNK: usize = 20;
/// Number of `f32` values per placement on the wire: `[x, y, z, r]`.
pub const STRIDE: usize = 4;
