/// Presentation types and the PresentationDevice trait
///
/// The core swapchain state machine drives a `PresentationDevice`; the
/// backend only knows how to talk to the surface.

use std::any::Any;
use std::sync::Arc;
use bitflags::bitflags;
use crate::error::Result;
use crate::graphics_device::{CommandList, RenderTarget, TextureFormat};

/// Surface extent value meaning "the application chooses the size"
pub const SURFACE_EXTENT_UNDEFINED: u32 = u32::MAX;

/// 2D size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    Fifo,
    FifoRelaxed,
}

bitflags! {
    /// Surface transforms (a set, or a single current transform)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SurfaceTransform: u32 {
        const IDENTITY = 1 << 0;
        const ROTATE_90 = 1 << 1;
        const ROTATE_180 = 1 << 2;
        const ROTATE_270 = 1 << 3;
        const HORIZONTAL_MIRROR = 1 << 4;
        const INHERIT = 1 << 8;
    }
}

/// What the surface reports about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
    /// `SURFACE_EXTENT_UNDEFINED` width means the application decides
    pub current_extent: Extent2D,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
    pub supported_transforms: SurfaceTransform,
    pub current_transform: SurfaceTransform,
}

/// Pipeline stage a semaphore wait applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    TopOfPipe,
    Transfer,
    ColorAttachmentOutput,
    BottomOfPipe,
}

/// Parameters of a swapchain (re)creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub image_count: u32,
    pub format: TextureFormat,
    pub extent: Extent2D,
    pub present_mode: PresentMode,
    pub pre_transform: SurfaceTransform,
}

/// GPU-GPU synchronization primitive
pub trait Semaphore: Send + Sync {
    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Surface and queue operations needed for presentation
pub trait PresentationDevice: Send + Sync {
    fn surface_capabilities(&self) -> Result<SurfaceCapabilities>;

    fn surface_present_modes(&self) -> Result<Vec<PresentMode>>;

    /// Color format of the swapchain images
    fn surface_format(&self) -> TextureFormat;

    /// Create the swapchain (replacing any previous one) and a view per image
    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<Vec<Arc<dyn RenderTarget>>>;

    /// Destroy the swapchain; its views must already be dropped
    fn destroy_swapchain(&mut self);

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>>;

    /// Acquire the next image, waiting without timeout; signals `signal`
    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<u32>;

    /// Submit a primary list to the graphics queue
    fn submit(
        &self,
        primary: &dyn CommandList,
        wait: &dyn Semaphore,
        wait_stage: PipelineStage,
        signal: &dyn Semaphore,
    ) -> Result<()>;

    /// Queue `image_index` for presentation once `wait` is signalled
    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<()>;

    /// Block until the presentation queue is idle
    fn wait_idle(&self) -> Result<()>;
}
