//! Engine configuration
//!
//! Built once by the application and handed to the components that need it
//! (swapchain extent fallback, texture lookup, validation layers).

use std::path::PathBuf;
use crate::log::LogSeverity;

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Application name (reported to the driver)
    pub app_name: String,

    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),

    /// Window width used when the surface leaves the extent to the application
    pub window_width: u32,

    /// Window height used when the surface leaves the extent to the application
    pub window_height: u32,

    /// Clear color for the swapchain render pass (RGBA)
    pub clear_color: [f32; 4],

    /// Directory that texture names in mesh files are resolved against
    pub texture_directory: PathBuf,

    /// File used when a mesh names no diffuse texture
    pub fallback_diffuse_texture: String,

    /// File used when a mesh names no specular texture
    pub fallback_specular_texture: String,

    /// Enable Vulkan validation layers (needs the `vulkan-validation` feature)
    pub enable_validation: bool,

    /// Minimum severity forwarded by the default log sink
    pub log_severity: LogSeverity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Nova3D Application".to_string(),
            app_version: (1, 0, 0),
            window_width: 1280,
            window_height: 720,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            texture_directory: PathBuf::from("data/textures"),
            fallback_diffuse_texture: "default_diffuse.png".to_string(),
            fallback_specular_texture: "default_specular.png".to_string(),
            enable_validation: cfg!(debug_assertions),
            log_severity: LogSeverity::Info,
        }
    }
}

impl Config {
    /// Full path of the fallback diffuse texture
    pub fn fallback_diffuse_path(&self) -> PathBuf {
        self.texture_directory.join(&self.fallback_diffuse_texture)
    }

    /// Full path of the fallback specular texture
    pub fn fallback_specular_path(&self) -> PathBuf {
        self.texture_directory.join(&self.fallback_specular_texture)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
