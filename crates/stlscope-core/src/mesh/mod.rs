//! Indexed triangle meshes
//!
//! STL files store every triangle with its own three corners. [`MeshBuilder`]
//! merges corners with identical coordinates so that vertex counts match what
//! users expect from other tools (a cube has 8 vertices, not 36).

pub mod primitives;

use std::collections::HashMap;

use glam::Vec3;

use crate::bounds::Aabb;

/// A triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over triangles as corner positions
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Bounding box of all vertices, `None` if the mesh has no vertices
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().copied())
    }

    /// Compute volume, area, center and extent
    pub fn stats(&self) -> MeshStats {
        let mut signed_volume = 0.0_f64;
        let mut surface_area = 0.0_f64;

        for [a, b, c] in self.triangles() {
            let (a, b, c) = (a.as_dvec3(), b.as_dvec3(), c.as_dvec3());
            // Divergence theorem: sum of signed tetrahedra against the origin
            signed_volume += a.dot(b.cross(c)) / 6.0;
            surface_area += (b - a).cross(c - a).length() * 0.5;
        }

        let center = if self.vertices.is_empty() {
            Vec3::ZERO
        } else {
            let sum: glam::DVec3 = self.vertices.iter().map(|v| v.as_dvec3()).sum();
            (sum / self.vertices.len() as f64).as_vec3()
        };

        MeshStats {
            volume: signed_volume.abs(),
            surface_area,
            center,
            diagonal: self.bounds().map_or(0.0, |b| b.diagonal()),
        }
    }
}

/// Derived measurements of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshStats {
    /// Enclosed volume (meaningful for closed meshes only)
    pub volume: f64,
    /// Total triangle area
    pub surface_area: f64,
    /// Mean of all vertex positions
    pub center: Vec3,
    /// Length of the bounding box diagonal
    pub diagonal: f32,
}

/// Incrementally builds a [`Mesh`] from unindexed triangles, merging
/// vertices whose coordinates are bit-identical.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: Mesh,
    lookup: HashMap<[u32; 3], u32>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triangle given its three corners
    pub fn push_triangle(&mut self, corners: [Vec3; 3]) {
        for corner in corners {
            let index = self.vertex_index(corner);
            self.mesh.indices.push(index);
        }
    }

    fn vertex_index(&mut self, position: Vec3) -> u32 {
        // -0.0 and 0.0 are the same point
        let position = position + Vec3::ZERO;
        let key = position.to_array().map(f32::to_bits);
        *self.lookup.entry(key).or_insert_with(|| {
            self.mesh.vertices.push(position);
            (self.mesh.vertices.len() - 1) as u32
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    pub fn build(self) -> Mesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builder_merges_shared_corners() {
        let mut builder = MeshBuilder::new();
        builder.push_triangle([Vec3::ZERO, Vec3::X, Vec3::Y]);
        builder.push_triangle([Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y]);

        let mesh = builder.build();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_builder_merges_negative_zero() {
        let mut builder = MeshBuilder::new();
        builder.push_triangle([Vec3::ZERO, Vec3::X, Vec3::Y]);
        builder.push_triangle([Vec3::new(-0.0, 0.0, -0.0), Vec3::Y, Vec3::Z]);

        assert_eq!(builder.build().vertex_count(), 4);
    }

    #[test]
    fn test_cube_stats() {
        let mesh = primitives::cube(10.0);
        let stats = mesh.stats();

        assert_relative_eq!(stats.volume, 1000.0, epsilon = 1e-6);
        assert_relative_eq!(stats.surface_area, 600.0, epsilon = 1e-6);
        assert_eq!(stats.center, Vec3::ZERO);
        assert_relative_eq!(stats.diagonal, 10.0 * 3.0_f32.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert!(mesh.bounds().is_none());
        assert_eq!(mesh.stats().volume, 0.0);
    }
}
