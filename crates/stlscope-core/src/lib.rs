//! # Stlscope Core
//!
//! Triangle mesh geometry for the Stlscope viewer.
//!
//! This crate owns everything that is about the shape of a model and nothing
//! about how it is displayed:
//!
//! - [`Mesh`]: indexed triangle mesh with merged vertices
//! - [`Aabb`]: axis-aligned bounding boxes
//! - [`MeshStats`]: volume, surface area, center and diagonal
//! - [`stl`]: binary and ASCII STL reading, binary STL writing
//! - [`mesh::primitives`]: simple generated meshes (cube, sphere)
//!
//! ## Example
//!
//! ```rust,ignore
//! use stlscope_core::prelude::*;
//!
//! let mesh = read_mesh("bracket.stl")?;
//! println!("{} faces, volume {:.2}", mesh.triangle_count(), mesh.stats().volume);
//! ```
//!
//! ## Units and Conventions
//!
//! - **Distances**: whatever unit the source file uses (usually millimeters). No conversion.
//! - **Coordinate system**: right-handed, Z-up (the usual convention for STL and 3D printing)
//! - **Precision**: geometry is stored as `f32`, matching the STL format

pub mod bounds;
pub mod mesh;
pub mod stl;

mod error;

pub use bounds::Aabb;
pub use error::{Error, Result};
pub use mesh::{Mesh, MeshBuilder, MeshStats};
pub use stl::{MeshFormat, read_mesh};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bounds::Aabb;
    pub use crate::mesh::{Mesh, MeshBuilder, MeshStats, primitives};
    pub use crate::stl::{MeshFormat, parse_stl, read_mesh, read_stl, write_stl};

    // Math (re-export glam)
    pub use glam::{Mat4, Quat, Vec3};

    pub use crate::{Error, Result};
}
