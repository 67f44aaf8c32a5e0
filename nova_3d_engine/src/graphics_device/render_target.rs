/// RenderTarget trait - an image view usable as a framebuffer attachment

use std::any::Any;
use crate::graphics_device::TextureFormat;

/// Attachment view (swapchain image view or depth buffer)
///
/// Swapchain images belong to the presentation engine; only their views are
/// owned here. Depth targets own their image and memory as well.
pub trait RenderTarget: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> TextureFormat;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
