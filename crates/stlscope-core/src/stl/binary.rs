//! Binary STL
//!
//! Layout:
//! - 80 bytes: Header (arbitrary text)
//! - 4 bytes: Number of triangles (u32 little-endian)
//! - For each triangle (50 bytes):
//!   - 12 bytes: Normal vector (3 x f32 little-endian)
//!   - 36 bytes: 3 vertices (9 x f32 little-endian)
//!   - 2 bytes: Attribute byte count (usually 0)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::Vec3;

use crate::mesh::{Mesh, MeshBuilder};
use crate::{Error, Result};

const HEADER_LEN: usize = 80;
const PREAMBLE_LEN: usize = HEADER_LEN + 4;
const TRIANGLE_LEN: usize = 50;

fn triangle_count(bytes: &[u8]) -> Option<usize> {
    let count = bytes.get(HEADER_LEN..PREAMBLE_LEN)?;
    Some(u32::from_le_bytes([count[0], count[1], count[2], count[3]]) as usize)
}

/// True when the file length is exactly what the binary triangle count predicts
pub(super) fn has_exact_binary_size(bytes: &[u8]) -> bool {
    triangle_count(bytes)
        .and_then(|n| n.checked_mul(TRIANGLE_LEN))
        .and_then(|body| body.checked_add(PREAMBLE_LEN))
        .is_some_and(|expected| expected == bytes.len())
}

pub(super) fn parse(bytes: &[u8]) -> Result<Mesh> {
    let count = triangle_count(bytes).ok_or_else(|| {
        Error::Parse(format!(
            "file is {} bytes, too short for a binary STL header",
            bytes.len()
        ))
    })?;

    let body = &bytes[PREAMBLE_LEN..];
    if body.len() / TRIANGLE_LEN < count {
        return Err(Error::Parse(format!(
            "header declares {} triangles but only {} are present",
            count,
            body.len() / TRIANGLE_LEN
        )));
    }

    let mut builder = MeshBuilder::new();
    for (i, record) in body.chunks_exact(TRIANGLE_LEN).take(count).enumerate() {
        // Skip the stored normal, it is recomputed from the winding when needed
        let corners = [
            read_vec3(&record[12..24]),
            read_vec3(&record[24..36]),
            read_vec3(&record[36..48]),
        ];
        if corners.iter().any(|c| !c.is_finite()) {
            return Err(Error::Parse(format!("triangle {i} has a non-finite coordinate")));
        }
        builder.push_triangle(corners);
    }

    Ok(builder.build())
}

fn read_vec3(bytes: &[u8]) -> Vec3 {
    let f = |at: usize| {
        f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    };
    Vec3::new(f(0), f(4), f(8))
}

/// Export a mesh to a binary STL file
pub fn write_stl<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_stl_to(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh as binary STL to any writer
pub fn write_stl_to<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    // Header (80 bytes, padded with spaces)
    let header = format!(
        "Stlscope STL - {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    let mut header_bytes = [b' '; HEADER_LEN];
    let header_len = header.len().min(HEADER_LEN);
    header_bytes[..header_len].copy_from_slice(&header.as_bytes()[..header_len]);
    writer.write_all(&header_bytes)?;

    let num_triangles = u32::try_from(mesh.triangle_count())
        .map_err(|_| Error::Parse("too many triangles for binary STL".to_string()))?;
    writer.write_all(&num_triangles.to_le_bytes())?;

    for [a, b, c] in mesh.triangles() {
        let normal = (b - a).cross(c - a).try_normalize().unwrap_or(Vec3::Z);
        for v in [normal, a, b, c] {
            for component in v.to_array() {
                writer.write_all(&component.to_le_bytes())?;
            }
        }
        // Attribute byte count
        writer.write_all(&0u16.to_le_bytes())?;
    }

    Ok(())
}
