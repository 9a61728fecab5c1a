//! Generated primitive meshes
//!
//! Used for test fixtures and demo scenes. All primitives are centered at the
//! origin with outward-facing (counter-clockwise) winding and +Z up.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::Mesh;

/// Axis-aligned cube with the given edge length
pub fn cube(size: f32) -> Mesh {
    let h = size * 0.5;
    Mesh {
        vertices: vec![
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
        ],
        indices: vec![
            // +Z
            0, 1, 2, 0, 2, 3,
            // -Z
            5, 4, 7, 5, 7, 6,
            // -X
            4, 0, 3, 4, 3, 7,
            // +X
            1, 5, 6, 1, 6, 2,
            // +Y
            3, 2, 6, 3, 6, 7,
            // -Y
            4, 5, 1, 4, 1, 0,
        ],
    }
}

/// UV sphere with poles on the Z axis
///
/// `segments` is the number of slices around Z (at least 3), `rings` the
/// number of bands from pole to pole (at least 2).
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut vertices = vec![Vec3::new(0.0, 0.0, radius)];
    for ring in 1..rings {
        let theta = PI * ring as f32 / rings as f32;
        let (ring_radius, z) = (radius * theta.sin(), radius * theta.cos());
        for segment in 0..segments {
            let phi = TAU * segment as f32 / segments as f32;
            vertices.push(Vec3::new(ring_radius * phi.cos(), ring_radius * phi.sin(), z));
        }
    }
    vertices.push(Vec3::new(0.0, 0.0, -radius));

    let north = 0;
    let south = (vertices.len() - 1) as u32;
    let ring_start = |ring: u32| 1 + (ring - 1) * segments;

    let mut indices = Vec::new();
    for s in 0..segments {
        let next = (s + 1) % segments;
        indices.extend([north, ring_start(1) + s, ring_start(1) + next]);
    }
    for ring in 1..rings - 1 {
        let (upper, lower) = (ring_start(ring), ring_start(ring + 1));
        for s in 0..segments {
            let next = (s + 1) % segments;
            let (a, b, c, d) = (upper + s, upper + next, lower + s, lower + next);
            indices.extend([a, c, d, a, d, b]);
        }
    }
    let last = ring_start(rings - 1);
    for s in 0..segments {
        let next = (s + 1) % segments;
        indices.extend([south, last + next, last + s]);
    }

    Mesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_counts() {
        let mesh = cube(2.0);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_sphere_counts_and_volume() {
        let mesh = uv_sphere(5.0, 32, 16);
        assert_eq!(mesh.vertex_count(), 2 + 32 * 15);
        assert_eq!(mesh.triangle_count(), 2 * 32 + 2 * 32 * 14);

        // Inscribed polyhedron: a little under the analytic volume
        let analytic = 4.0 / 3.0 * std::f64::consts::PI * 125.0;
        let volume = mesh.stats().volume;
        assert!(volume < analytic);
        assert!(volume > analytic * 0.95);
    }

    #[test]
    fn test_sphere_winding_points_outward() {
        let mesh = uv_sphere(1.0, 12, 6);
        for [a, b, c] in mesh.triangles() {
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }
}
