//! ASCII STL

use glam::Vec3;

use crate::mesh::{Mesh, MeshBuilder};
use crate::{Error, Result};

pub(super) fn parse(bytes: &[u8]) -> Result<Mesh> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::Parse(format!("ASCII STL is not valid UTF-8: {e}")))?;

    let mut builder = MeshBuilder::new();
    let mut corners: Vec<Vec3> = Vec::with_capacity(3);
    let mut in_loop = false;
    let mut tokens = text.split_ascii_whitespace();

    while let Some(token) = tokens.next() {
        match token {
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                let mut coord = || -> Result<f32> {
                    let raw = tokens.next().ok_or_else(|| {
                        Error::Parse("unexpected end of file in vertex".to_string())
                    })?;
                    let value: f32 = raw
                        .parse()
                        .map_err(|_| Error::Parse(format!("invalid vertex coordinate '{raw}'")))?;
                    if value.is_finite() {
                        Ok(value)
                    } else {
                        Err(Error::Parse(format!("non-finite vertex coordinate '{raw}'")))
                    }
                };
                let vertex = Vec3::new(coord()?, coord()?, coord()?);
                corners.push(vertex);
            }
            "endloop" => {
                if corners.len() != 3 {
                    return Err(Error::Parse(format!(
                        "facet {} has {} vertices, expected 3",
                        builder.triangle_count() + 1,
                        corners.len()
                    )));
                }
                builder.push_triangle([corners[0], corners[1], corners[2]]);
                in_loop = false;
            }
            _ => {}
        }
    }

    if in_loop {
        return Err(Error::Parse("unterminated facet loop".to_string()));
    }

    Ok(builder.build())
}
