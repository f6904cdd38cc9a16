use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// An accepted sphere: center inside the unit ball plus radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub center: Vec3,
    pub radius: f32,
}

impl Placement {
    pub fn new(x: f32, y: f32, z: f32, radius: f32) -> Self {
        Self {
            center: Vec3::new(x, y, z),
            radius,
        }
    }

    /// Flatten to the `[x, y, z, r]` wire layout.
    pub fn to_array(self) -> [f32; 4] {
        [self.center.x, self.center.y, self.center.z, self.radius]
    }

    pub fn from_array(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    /// Distance between the two centers.
    pub fn distance(&self, other: &Placement) -> f32 {
        self.center.distance(other.center)
    }

    /// Remaining space between the two surfaces. Negative when they overlap.
    pub fn gap(&self, other: &Placement) -> f32 {
        self.distance(other) - self.radius - other.radius
    }

    /// Transform that maps the unit cube instance onto this placement.
    pub fn to_transform(self) -> Transform {
        Transform {
            position: self.center,
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(self.radius),
        }
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_array_layout() {
        let p = Placement::new(0.1, -0.2, 0.3, 0.05);
        assert_eq!(p.to_array(), [0.1, -0.2, 0.3, 0.05]);
        assert_eq!(Placement::from_array(p.to_array()), p);
    }

    #[test]
    fn gap_is_negative_on_overlap() {
        let a = Placement::new(0.0, 0.0, 0.0, 0.2);
        let b = Placement::new(0.3, 0.0, 0.0, 0.2);
        assert!(a.gap(&b) < 0.0);

        let c = Placement::new(0.5, 0.0, 0.0, 0.1);
        assert!((a.gap(&c) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn transform_scales_by_radius() {
        let t = Placement::new(1.0, 2.0, 3.0, 0.25).to_transform();
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::splat(0.25));
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }
}
