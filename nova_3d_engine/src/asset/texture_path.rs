/// Texture path convention: `<texture_directory>/<name>` with fallbacks

use std::path::PathBuf;
use crate::asset::TextureName;
use crate::config::Config;

/// Which material texture a name is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    Diffuse,
    Specular,
}

/// Path of the texture file for `name`
///
/// `TextureName::Fallback` resolves to the configured fallback for `slot`.
pub fn resolve_texture_path(config: &Config, name: &TextureName, slot: TextureSlot) -> PathBuf {
    match (name, slot) {
        (TextureName::Named(file), _) => config.texture_directory.join(file),
        (TextureName::Fallback, TextureSlot::Diffuse) => config.fallback_diffuse_path(),
        (TextureName::Fallback, TextureSlot::Specular) => config.fallback_specular_path(),
    }
}

#[cfg(test)]
#[path = "texture_path_tests.rs"]
mod tests;
