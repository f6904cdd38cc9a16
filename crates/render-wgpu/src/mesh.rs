use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::f32::consts::FRAC_PI_2;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Quads spent on each rounded edge.
const BEVEL_SEGMENTS: usize = 4;

/// `(normal, u, v)` per face, with `u x v = normal` so quads wind CCW from
/// outside.
const FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

/// Grid coordinates along one face axis: dense inside the two bevel bands,
/// a single span across the flat middle.
fn face_ticks(bevel: f32) -> Vec<f32> {
    let inner = 1.0 - bevel;
    let mut ticks = Vec::with_capacity(2 * BEVEL_SEGMENTS + 2);
    for k in 0..=BEVEL_SEGMENTS {
        let a = k as f32 / BEVEL_SEGMENTS as f32 * FRAC_PI_2;
        ticks.push(-inner - bevel * a.cos());
    }
    for k in 0..=BEVEL_SEGMENTS {
        let a = k as f32 / BEVEL_SEGMENTS as f32 * FRAC_PI_2;
        ticks.push(inner + bevel * a.sin());
    }
    ticks
}

/// A 2x2x2 box centered on the origin with edges and corners rounded to
/// `bevel` (clamped to `[0.001, 1]`).
///
/// Each face grid point is pushed onto the rounded surface: it is clamped to
/// the inner box, and whatever sticks out is rescaled to length `bevel`.
pub fn rounded_box_mesh(bevel: f32) -> (Vec<Vertex>, Vec<u16>) {
    let bevel = bevel.clamp(0.001, 1.0);
    let inner = Vec3::splat(1.0 - bevel);
    let ticks = face_ticks(bevel);
    let side = ticks.len();

    let mut vertices = Vec::with_capacity(FACES.len() * side * side);
    let mut indices = Vec::with_capacity(FACES.len() * (side - 1) * (side - 1) * 6);

    for (normal, u, v) in FACES {
        let base = vertices.len() as u16;
        for &a in &ticks {
            for &b in &ticks {
                let p = normal + u * a + v * b;
                let core = p.clamp(-inner, inner);
                let out = p - core;
                let (position, n) = if out.length_squared() > 1e-12 {
                    let dir = out.normalize();
                    (core + dir * bevel, dir)
                } else {
                    (p, normal)
                };
                vertices.push(Vertex {
                    position: position.to_array(),
                    normal: n.to_array(),
                });
            }
        }
        let idx = |i: usize, j: usize| base + (i * side + j) as u16;
        for i in 0..side - 1 {
            for j in 0..side - 1 {
                let (a, b, c, d) = (idx(i, j), idx(i + 1, j), idx(i + 1, j + 1), idx(i, j + 1));
                indices.extend_from_slice(&[a, b, c, c, d, a]);
            }
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_in_range() {
        let (verts, indices) = rounded_box_mesh(0.08);
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().all(|&i| (i as usize) < verts.len()));
    }

    #[test]
    fn stays_inside_box_with_unit_normals() {
        for bevel in [0.04, 0.08, 0.4] {
            let (verts, _) = rounded_box_mesh(bevel);
            for v in &verts {
                let p = Vec3::from_array(v.position);
                assert!(p.abs().max_element() <= 1.0 + 1e-5, "{p:?}");
                let n = Vec3::from_array(v.normal);
                assert!((n.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn corners_are_rounded() {
        let bevel = 0.4;
        let (verts, _) = rounded_box_mesh(bevel);
        let farthest = verts
            .iter()
            .map(|v| Vec3::from_array(v.position).length())
            .fold(0.0f32, f32::max);
        let expected = Vec3::splat(1.0 - bevel).length() + bevel;
        assert!((farthest - expected).abs() < 1e-4);
        assert!(farthest < 3.0f32.sqrt());
    }

    #[test]
    fn faces_wind_outward() {
        let (verts, indices) = rounded_box_mesh(0.08);
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(verts[i as usize].position));
            let face_normal = (b - a).cross(c - a);
            if face_normal.length_squared() < 1e-12 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0);
        }
    }
}
