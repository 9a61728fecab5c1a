//! STL reading and writing
//!
//! Both STL flavours are supported for reading:
//!
//! - **Binary**: 80-byte header, `u32` triangle count, 50 bytes per triangle
//! - **ASCII**: `solid ... facet normal ... outer loop / vertex x y z ... endsolid`
//!
//! Many exporters write binary files whose header begins with `solid`, so the
//! binary layout is checked first: if the file size matches the triangle
//! count exactly it is binary regardless of the header text.

mod ascii;
mod binary;

use std::path::Path;

use crate::mesh::Mesh;
use crate::{Error, Result};

pub use binary::{write_stl, write_stl_to};

/// Mesh file formats that can be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
}

impl MeshFormat {
    /// Detect format from file extension (case-insensitive)
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
        }
    }
}

/// Load a mesh from disk, choosing the reader from the file extension
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    match MeshFormat::from_extension(path) {
        Some(MeshFormat::Stl) => read_stl(path),
        None => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Read an STL file (binary or ASCII)
pub fn read_stl<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let bytes = std::fs::read(path)?;
    parse_stl(&bytes)
}

/// Parse STL data already in memory
pub fn parse_stl(bytes: &[u8]) -> Result<Mesh> {
    if binary::has_exact_binary_size(bytes) {
        return binary::parse(bytes);
    }
    if looks_like_ascii(bytes) {
        return ascii::parse(bytes);
    }
    binary::parse(bytes)
}

fn looks_like_ascii(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(b"solid")
}
