/// Binary mesh file (`.mesh`)
///
/// Little-endian layout:
///
/// ```text
/// [u32 mesh_count]
/// per mesh:
///   [u32 vertex_count][u32 index_count]
///   [vertex_count * vertex][index_count * u32]
///   [64-byte NUL-terminated diffuse name][64-byte NUL-terminated specular name]
/// ```

use std::io::Read;
use bytemuck::Pod;
use crate::asset::binary::{read_bytes, read_pod_array, read_u32};
use crate::error::{Error, Result};

pub const MESH_EXTENSION: &str = "mesh";

/// Size of a texture name field
pub const TEXTURE_NAME_LEN: usize = 64;

/// Texture name marker selecting the fallback texture
pub const NO_TEXTURE_MARKER: &str = "NONE";

/// Texture reference stored in a mesh record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureName {
    /// File name relative to the texture directory
    Named(String),
    /// `"NONE"` (or an empty field): use the configured fallback
    Fallback,
}

impl TextureName {
    /// Decode a fixed-size name field
    ///
    /// The name ends at the first NUL; a field without NUL uses all bytes.
    pub fn from_field(field: &[u8]) -> Result<Self> {
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        let name = std::str::from_utf8(&field[..end])
            .map_err(|_| Error::ParseError("texture name is not valid UTF-8".to_string()))?;
        if name.is_empty() || name == NO_TEXTURE_MARKER {
            Ok(TextureName::Fallback)
        } else {
            Ok(TextureName::Named(name.to_string()))
        }
    }
}

/// One decoded mesh record
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRecord<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
    pub diffuse: TextureName,
    pub specular: TextureName,
}

pub fn read_mesh_count<R: Read>(reader: &mut R) -> Result<u32> {
    read_u32(reader, "mesh count")
}

/// Counts and arrays of one mesh, starting at the vertex count
///
/// Zero vertices or zero indices is a parse error. Index values are not
/// checked against the vertex count.
pub fn read_geometry_data<V: Pod, R: Read>(reader: &mut R) -> Result<(Vec<V>, Vec<u32>)> {
    let vertex_count = read_u32(reader, "vertex count")?;
    let index_count = read_u32(reader, "index count")?;
    if vertex_count == 0 || index_count == 0 {
        return Err(Error::ParseError(format!(
            "mesh has {} vertices and {} indices",
            vertex_count, index_count
        )));
    }
    let vertices = read_pod_array::<V, R>(reader, vertex_count, "vertex array")?;
    let indices = read_pod_array::<u32, R>(reader, index_count, "index array")?;
    Ok((vertices, indices))
}

/// Diffuse and specular name fields following the index array
pub fn read_texture_names<R: Read>(reader: &mut R) -> Result<(TextureName, TextureName)> {
    let diffuse = read_bytes(reader, TEXTURE_NAME_LEN as u64, "diffuse texture name")?;
    let specular = read_bytes(reader, TEXTURE_NAME_LEN as u64, "specular texture name")?;
    Ok((TextureName::from_field(&diffuse)?, TextureName::from_field(&specular)?))
}

/// Decode a whole mesh file
pub fn read_mesh_file<V: Pod, R: Read>(reader: &mut R) -> Result<Vec<MeshRecord<V>>> {
    let count = read_mesh_count(reader)?;
    let mut records = Vec::new();
    for _ in 0..count {
        let (vertices, indices) = read_geometry_data::<V, R>(reader)?;
        let (diffuse, specular) = read_texture_names(reader)?;
        records.push(MeshRecord { vertices, indices, diffuse, specular });
    }
    Ok(records)
}

/// Encode mesh records (tooling and tests)
pub fn encode_mesh_file<V: Pod>(records: &[MeshRecord<V>]) -> Vec<u8> {
    fn name_field(name: &TextureName) -> [u8; TEXTURE_NAME_LEN] {
        let mut field = [0u8; TEXTURE_NAME_LEN];
        let text = match name {
            TextureName::Named(name) => name.as_str(),
            TextureName::Fallback => NO_TEXTURE_MARKER,
        };
        let len = text.len().min(TEXTURE_NAME_LEN - 1);
        field[..len].copy_from_slice(&text.as_bytes()[..len]);
        field
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for record in records {
        bytes.extend_from_slice(&(record.vertices.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(record.indices.len() as u32).to_le_bytes());
        bytes.extend_from_slice(bytemuck::cast_slice(&record.vertices));
        bytes.extend_from_slice(bytemuck::cast_slice(&record.indices));
        bytes.extend_from_slice(&name_field(&record.diffuse));
        bytes.extend_from_slice(&name_field(&record.specular));
    }
    bytes
}

#[cfg(test)]
#[path = "mesh_file_tests.rs"]
mod tests;
