use std::fmt::Write as _;

use crate::scene::{CubeScene, SizeClass};

/// Orthographic view configuration: the view spans `[-aspect, aspect]`
/// horizontally and `[-1, 1]` vertically.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Width over height of the output surface.
    pub aspect: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            aspect: 16.0 / 9.0,
        }
    }
}

impl RenderView {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
        }
    }

    /// `(left, right, bottom, top)` of the view volume.
    pub fn extents(&self) -> (f32, f32, f32, f32) {
        (-self.aspect, self.aspect, -1.0, 1.0)
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and a view configuration, then produces
/// output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &CubeScene, view: &RenderView) -> Self::Output;
}

/// Text renderer for the CLI, logs, and tests.
///
/// Lists group sizes and, up to `max_instances`, individual cubes.
#[derive(Debug)]
pub struct DebugTextRenderer {
    pub max_instances: usize,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self { max_instances: 16 }
    }
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &CubeScene, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Cube Field (n={}, tests={}) ===",
            scene.n(),
            scene.tests_n()
        );
        let _ = writeln!(
            out,
            "Instances: {} (small={} medium={} large={})",
            scene.instance_count(),
            scene.group(SizeClass::Small).len(),
            scene.group(SizeClass::Medium).len(),
            scene.group(SizeClass::Large).len()
        );
        let (left, right, bottom, top) = view.extents();
        let r = scene.rotation();
        let _ = writeln!(
            out,
            "View: x=[{left:.2}, {right:.2}] y=[{bottom:.2}, {top:.2}] rotation=({:.3}, {:.3}, {:.3}, {:.3})",
            r.x, r.y, r.z, r.w
        );

        let mut shown = 0;
        'groups: for group in scene.groups() {
            for inst in group.instances() {
                if shown >= self.max_instances {
                    break 'groups;
                }
                let c = inst.placement.center;
                let _ = writeln!(
                    out,
                    "  [{:<6}] pos=({:.3}, {:.3}, {:.3}) r={:.4}",
                    group.class().name(),
                    c.x,
                    c.y,
                    c.z,
                    inst.placement.radius
                );
                shown += 1;
            }
        }
        if shown < scene.instance_count() {
            let _ = writeln!(out, "  ... {} more", scene.instance_count() - shown);
        }

        out
    }
}
