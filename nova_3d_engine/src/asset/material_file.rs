/// Text material file (`.mat`)
///
/// Whitespace-separated triples `<name> <shininess> <specular_strength>`,
/// one per mesh, in mesh order.

use std::path::Path;
use crate::error::{Error, Result};

pub const MATERIAL_EXTENSION: &str = "mat";

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialEntry {
    pub name: String,
    pub shininess: f32,
    pub specular_strength: f32,
}

/// Parse `expected` entries; trailing content is ignored
pub fn parse_material_entries(text: &str, expected: usize) -> Result<Vec<MaterialEntry>> {
    let mut tokens = text.split_whitespace();
    let mut entries = Vec::with_capacity(expected);
    for index in 0..expected {
        let mut next = |field: &str| {
            tokens.next().ok_or_else(|| {
                Error::ParseError(format!("material {} of {}: missing {}", index, expected, field))
            })
        };
        let name = next("name")?.to_string();
        let shininess = next("shininess")?;
        let specular_strength = next("specular strength")?;
        entries.push(MaterialEntry {
            shininess: parse_scalar(shininess, &name, "shininess")?,
            specular_strength: parse_scalar(specular_strength, &name, "specular strength")?,
            name,
        });
    }
    Ok(entries)
}

fn parse_scalar(token: &str, material: &str, field: &str) -> Result<f32> {
    token.parse::<f32>().map_err(|_| {
        Error::ParseError(format!("material '{}': {} '{}' is not a number", material, field, token))
    })
}

/// Read and parse a material file; a missing file is `AssetNotFound`
pub fn read_material_file(path: &Path, expected: usize) -> Result<Vec<MaterialEntry>> {
    let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::AssetNotFound(path.display().to_string()),
        _ => Error::from(err),
    })?;
    parse_material_entries(&text, expected)
}

#[cfg(test)]
#[path = "material_file_tests.rs"]
mod tests;
