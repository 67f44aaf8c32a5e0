/// Texture trait, texture format and texture descriptor

use std::any::Any;

/// Texture and attachment pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
    D32_FLOAT_S8_UINT,
}

impl TextureFormat {
    /// True for depth (or depth/stencil) formats
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D32_FLOAT | TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT_S8_UINT
        )
    }

    /// True when the format carries a stencil aspect
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT_S8_UINT)
    }

    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::D32_FLOAT_S8_UINT => 8,
            _ => 4,
        }
    }
}

/// Descriptor for creating a sampled 2D texture
///
/// `data` holds tightly packed pixels (`width * height * bytes_per_pixel`).
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
}

/// Sampled texture (image, view and sampler)
pub trait Texture: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> TextureFormat;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
