//! Rendering Adapter: renderer-agnostic scene state for the cube field.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Instances are append-only; an instance keeps its slot once assigned.
//! - Field rotation is presentation state only and never feeds back into packing.

mod renderer;
mod rotation;
mod scene;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use rotation::{RotationAnimator, TURN_DELAY, TURN_DURATION, ease};
pub use scene::{CubeInstance, CubeScene, FIELD_SCALE, InstanceGroup, SizeClass, format_count};
