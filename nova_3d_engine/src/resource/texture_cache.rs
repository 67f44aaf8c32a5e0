//! Texture de-duplication by file path
//!
//! Decoding image files is delegated to a `TextureLoader`; the cache creates
//! each GPU texture once and hands out shared references.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::engine_debug;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, Texture, TextureDesc};
use crate::log::LogSink;

/// Decodes an image file into pixels
pub trait TextureLoader {
    fn load(&self, path: &Path) -> Result<TextureDesc>;
}

pub struct TextureCache {
    textures: FxHashMap<PathBuf, Arc<dyn Texture>>,
    logger: LogSink,
}

impl TextureCache {
    pub fn new(logger: LogSink) -> Self {
        Self {
            textures: FxHashMap::default(),
            logger,
        }
    }

    /// Texture for `path`, loading and uploading it on first use
    pub fn get_or_load(
        &mut self,
        device: &dyn GraphicsDevice,
        loader: &dyn TextureLoader,
        path: &Path,
    ) -> Result<Arc<dyn Texture>> {
        if let Some(texture) = self.textures.get(path) {
            return Ok(texture.clone());
        }
        let desc = loader.load(path)?;
        let texture = device.create_texture(&desc)?;
        engine_debug!(
            self.logger,
            "nova3d::TextureCache",
            "Loaded '{}' ({}x{})",
            path.display(),
            desc.width,
            desc.height
        );
        self.textures.insert(path.to_path_buf(), texture.clone());
        Ok(texture)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.textures.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Drop textures only the cache still references; returns how many
    pub fn release_unused(&mut self) -> usize {
        let before = self.textures.len();
        self.textures.retain(|_, texture| Arc::strong_count(texture) > 1);
        before - self.textures.len()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }
}

#[cfg(test)]
#[path = "texture_cache_tests.rs"]
mod tests;
