/// Optional collision file (`.col`)
///
/// `[u32 vertex_count]` followed by `vertex_count / 3` triangles of three
/// `(f32 x, f32 y, f32 z)` positions.

use std::io::Read;
use std::path::Path;
use glam::Vec3;
use crate::asset::binary::{read_pod_array, read_u32};
use crate::error::{Error, Result};
use crate::physics::{CollisionShape, Triangle};

pub const COLLISION_EXTENSION: &str = "col";

pub fn read_collision_triangles<R: Read>(reader: &mut R) -> Result<Vec<Triangle>> {
    let vertex_count = read_u32(reader, "collision vertex count")?;
    if vertex_count % 3 != 0 {
        return Err(Error::ParseError(format!(
            "collision vertex count {} is not a multiple of 3",
            vertex_count
        )));
    }
    let positions = read_pod_array::<[f32; 3], R>(reader, vertex_count, "collision vertices")?;
    Ok(positions
        .chunks_exact(3)
        .map(|tri| [Vec3::from(tri[0]), Vec3::from(tri[1]), Vec3::from(tri[2])])
        .collect())
}

/// Load the collision shape next to a model
///
/// A missing file is not an error and yields `CollisionShape::Empty`.
pub fn load_collision_shape(path: &Path) -> Result<CollisionShape> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(CollisionShape::Empty),
        Err(err) => return Err(err.into()),
    };
    let mut reader = std::io::BufReader::new(file);
    Ok(CollisionShape::TriangleMesh(read_collision_triangles(&mut reader)?))
}

/// Encode triangles (tooling and tests)
pub fn encode_collision_file(triangles: &[Triangle]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4 + triangles.len() * 36);
    bytes.extend_from_slice(&((triangles.len() * 3) as u32).to_le_bytes());
    for vertex in triangles.iter().flatten() {
        for component in vertex.to_array() {
            bytes.extend_from_slice(&component.to_le_bytes());
        }
    }
    bytes
}

#[cfg(test)]
#[path = "collision_file_tests.rs"]
mod tests;
