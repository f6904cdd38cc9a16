use cubefield_render::RenderView;
use glam::Mat4;

/// Fixed orthographic camera looking down -Z. Only the aspect ratio changes,
/// on window resize.
pub struct OrthoCamera {
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthoCamera {
    fn default() -> Self {
        Self {
            aspect: 16.0 / 9.0,
            near: -1.0,
            far: 1.0,
        }
    }
}

impl OrthoCamera {
    pub fn from_view(view: &RenderView) -> Self {
        Self {
            aspect: view.aspect,
            ..Self::default()
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = RenderView::from_size(width, height).aspect;
    }

    pub fn view(&self) -> RenderView {
        RenderView {
            aspect: self.aspect,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let (left, right, bottom, top) = self.view().extents();
        Mat4::orthographic_rh(left, right, bottom, top, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn default_camera() {
        let cam = OrthoCamera::default();
        let vp = cam.view_projection();
        // Should produce a valid matrix (no NaN)
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn unit_ball_fits_vertically() {
        let cam = OrthoCamera::from_view(&RenderView { aspect: 2.0 });
        let vp = cam.view_projection();
        let top = vp.project_point3(Vec3::new(0.0, 1.0, 0.0));
        assert!((top.y - 1.0).abs() < 1e-6);
        let right = vp.project_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!((right.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn depth_range_covers_field() {
        let cam = OrthoCamera::default();
        let vp = cam.view_projection();
        let front = vp.project_point3(Vec3::new(0.0, 0.0, 1.0));
        let back = vp.project_point3(Vec3::new(0.0, 0.0, -1.0));
        assert!(front.z >= -1e-6 && front.z <= 1.0 + 1e-6);
        assert!(back.z >= -1e-6 && back.z <= 1.0 + 1e-6);
        assert!(front.z < back.z);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut cam = OrthoCamera::default();
        cam.resize(800, 800);
        assert_eq!(cam.aspect, 1.0);
    }
}
