//! wgpu render backend for the cube field.
//!
//! Draws one instanced rounded-box mesh per size class. Instance data is
//! uploaded incrementally as the scene grows; the field rotation travels in
//! the uniform buffer so rotating never touches instance data.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Instance slots are written once, in arrival order.

mod camera;
mod gpu;
mod mesh;
mod shaders;

pub use camera::OrthoCamera;
pub use gpu::WgpuRenderer;
pub use mesh::{Vertex, rounded_box_mesh};
