//! Swapchain and presentation state machine
//!
//! ```text
//! Uninitialized --init--> Initialized --acquire--> ImageAcquired
//!                          ^  |   |                     |
//!                 present  |  |   recreate         clear_image
//!                          |  |                         v
//!                          |  teardown --> TornDown  Recording
//!                          |                            |
//!                          +--------- Presenting <------+
//! ```
//!
//! One frame is in flight at a time: a new acquire is rejected until the
//! previous frame has been presented. Semaphores are created per frame and
//! destroyed once the frame is presented.

use std::sync::Arc;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentDesc, ClearValue, CommandList, Extent2D, Framebuffer, FramebufferDesc, GraphicsDevice,
    ImageLayout, LoadOp, PipelineStage, PresentMode, PresentationDevice, Rect2D, RenderPass,
    RenderPassDesc, RenderTarget, Semaphore, StoreOp, SubpassContents, SurfaceCapabilities,
    SurfaceTransform, SwapchainDesc, TextureFormat, SURFACE_EXTENT_UNDEFINED,
};
use crate::log::LogSink;
use crate::{engine_debug, engine_info, engine_trace, engine_warn};

const SOURCE: &str = "nova3d::Swapchain";

// ============================================================================
// SELECTION RULES
// ============================================================================

/// Surface extent, or the window size when the surface leaves it open
pub fn choose_extent(capabilities: &SurfaceCapabilities, window: Extent2D) -> Extent2D {
    if capabilities.current_extent.width != SURFACE_EXTENT_UNDEFINED {
        return capabilities.current_extent;
    }
    Extent2D {
        // Upper bound applied last; reports may carry min > max
        width: window
            .width
            .max(capabilities.min_image_extent.width)
            .min(capabilities.max_image_extent.width.max(1)),
        height: window
            .height
            .max(capabilities.min_image_extent.height)
            .min(capabilities.max_image_extent.height.max(1)),
    }
}

/// MAILBOX, then IMMEDIATE, then FIFO (always supported)
pub fn choose_present_mode(available: &[PresentMode]) -> PresentMode {
    [PresentMode::Mailbox, PresentMode::Immediate]
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(PresentMode::Fifo)
}

/// One more than the minimum, capped by the maximum when there is one
pub fn choose_image_count(capabilities: &SurfaceCapabilities) -> u32 {
    let wanted = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        wanted.min(capabilities.max_image_count)
    } else {
        wanted
    }
}

/// Identity when supported, else whatever the surface currently uses
pub fn choose_pre_transform(capabilities: &SurfaceCapabilities) -> SurfaceTransform {
    if capabilities.supported_transforms.contains(SurfaceTransform::IDENTITY) {
        SurfaceTransform::IDENTITY
    } else {
        capabilities.current_transform
    }
}

/// Single-subpass pass: cleared color + depth/stencil, both stored
pub fn swapchain_render_pass_desc(color: TextureFormat, depth: TextureFormat) -> RenderPassDesc {
    RenderPassDesc {
        color_attachments: vec![AttachmentDesc {
            format: color,
            samples: 1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::ColorAttachment,
            final_layout: ImageLayout::ColorAttachment,
        }],
        depth_attachment: Some(AttachmentDesc {
            format: depth,
            samples: 1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::Load,
            stencil_store_op: StoreOp::Store,
            initial_layout: ImageLayout::DepthStencilAttachment,
            final_layout: ImageLayout::DepthStencilAttachment,
        }),
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainState {
    Uninitialized,
    Initialized,
    AcquiringImage,
    ImageAcquired,
    Recording,
    Presenting,
    TornDown,
}

/// Presentation-engine image with its view and framebuffer
struct SwapchainImage {
    view: Arc<dyn RenderTarget>,
    framebuffer: Arc<dyn Framebuffer>,
}

/// Per-frame synchronization
struct FrameSync {
    image_acquired: Box<dyn Semaphore>,
    render_complete: Box<dyn Semaphore>,
    image_index: u32,
}

pub struct Swapchain {
    device: Arc<dyn GraphicsDevice>,
    presentation: Box<dyn PresentationDevice>,
    logger: LogSink,
    window_extent: Extent2D,
    state: SwapchainState,
    extent: Extent2D,
    present_mode: PresentMode,
    color_format: TextureFormat,
    depth: Option<Arc<dyn RenderTarget>>,
    render_pass: Option<Arc<dyn RenderPass>>,
    images: Vec<SwapchainImage>,
    frame: Option<FrameSync>,
}

impl Swapchain {
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        presentation: Box<dyn PresentationDevice>,
        config: &Config,
        logger: LogSink,
    ) -> Self {
        let color_format = presentation.surface_format();
        Self {
            device,
            presentation,
            logger,
            window_extent: Extent2D::new(config.window_width, config.window_height),
            state: SwapchainState::Uninitialized,
            extent: Extent2D::new(0, 0),
            present_mode: PresentMode::Fifo,
            color_format,
            depth: None,
            render_pass: None,
            images: Vec::new(),
            frame: None,
        }
    }

    fn expect_state(&self, expected: SwapchainState, operation: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState(format!(
                "{} requires {:?}, swapchain is {:?}",
                operation, expected, self.state
            )));
        }
        Ok(())
    }

    /// Create the swapchain, render pass and framebuffers
    ///
    /// `depth` is the shared depth/stencil view attached to every framebuffer.
    pub fn init(&mut self, depth: Arc<dyn RenderTarget>) -> Result<()> {
        self.expect_state(SwapchainState::Uninitialized, "init")?;
        self.build(depth)?;
        self.state = SwapchainState::Initialized;
        engine_info!(
            self.logger,
            SOURCE,
            "Swapchain ready: {}x{}, {} images, {:?}",
            self.extent.width,
            self.extent.height,
            self.images.len(),
            self.present_mode
        );
        Ok(())
    }

    fn build(&mut self, depth: Arc<dyn RenderTarget>) -> Result<()> {
        let capabilities = self.presentation.surface_capabilities()?;
        let modes = self.presentation.surface_present_modes()?;

        let desc = SwapchainDesc {
            image_count: choose_image_count(&capabilities),
            format: self.presentation.surface_format(),
            extent: choose_extent(&capabilities, self.window_extent),
            present_mode: choose_present_mode(&modes),
            pre_transform: choose_pre_transform(&capabilities),
        };
        engine_debug!(self.logger, SOURCE, "Creating swapchain {:?}", desc);

        let views = self.presentation.create_swapchain(&desc)?;

        let pass_desc = swapchain_render_pass_desc(desc.format, depth.format());
        let render_pass = match &self.render_pass {
            Some(pass) if *pass.desc() == pass_desc => pass.clone(),
            _ => self.device.create_render_pass(&pass_desc)?,
        };

        let mut images = Vec::with_capacity(views.len());
        for view in views {
            let framebuffer = self.device.create_framebuffer(&FramebufferDesc {
                render_pass: &render_pass,
                attachments: vec![view.clone(), depth.clone()],
                width: desc.extent.width,
                height: desc.extent.height,
            })?;
            images.push(SwapchainImage { view, framebuffer });
        }

        self.extent = desc.extent;
        self.present_mode = desc.present_mode;
        self.color_format = desc.format;
        self.render_pass = Some(render_pass);
        self.depth = Some(depth);
        self.images = images;
        Ok(())
    }

    /// Create this frame's semaphores and acquire the next image
    ///
    /// Blocks until the presentation engine releases an image.
    pub fn acquire_next_image(&mut self) -> Result<u32> {
        self.expect_state(SwapchainState::Initialized, "acquire_next_image")?;
        self.state = SwapchainState::AcquiringImage;

        let acquired = self.create_frame_sync();
        match acquired {
            Ok(frame) => {
                let index = frame.image_index;
                self.frame = Some(frame);
                self.state = SwapchainState::ImageAcquired;
                engine_trace!(self.logger, SOURCE, "Acquired image {}", index);
                Ok(index)
            }
            Err(err) => {
                self.state = SwapchainState::Initialized;
                Err(err)
            }
        }
    }

    fn create_frame_sync(&mut self) -> Result<FrameSync> {
        let image_acquired = self.presentation.create_semaphore()?;
        let render_complete = self.presentation.create_semaphore()?;
        let image_index = self.presentation.acquire_next_image(image_acquired.as_ref())?;
        if image_index as usize >= self.images.len() {
            return Err(Error::BackendError(format!(
                "presentation engine returned image {} of {}",
                image_index,
                self.images.len()
            )));
        }
        Ok(FrameSync {
            image_acquired,
            render_complete,
            image_index,
        })
    }

    /// Begin the render pass on the acquired image's framebuffer
    ///
    /// Clears color to `color`, depth to 1.0 and stencil to 0. The pass
    /// content is expected from secondary command lists.
    pub fn clear_image(&mut self, cmd: &mut dyn CommandList, color: [f32; 4]) -> Result<()> {
        self.expect_state(SwapchainState::ImageAcquired, "clear_image")?;
        let (render_pass, framebuffer) = match (&self.render_pass, self.current_framebuffer()) {
            (Some(pass), Some(framebuffer)) => (pass.clone(), framebuffer.clone()),
            _ => return Err(Error::InvalidState("no framebuffer for the acquired image".to_string())),
        };
        cmd.begin_render_pass(
            &render_pass,
            &framebuffer,
            Rect2D::from_size(self.extent.width, self.extent.height),
            &[
                ClearValue::Color(color),
                ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
            ],
            SubpassContents::SecondaryCommandLists,
        )?;
        self.state = SwapchainState::Recording;
        Ok(())
    }

    /// Submit `primary` and present the acquired image
    ///
    /// The submission waits on the acquire semaphore at bottom-of-pipe and
    /// signals render-complete, which gates the present. The frame's
    /// semaphores are destroyed afterwards, whatever the outcome; after a
    /// successful submit that is only once the queue is idle.
    pub fn present(&mut self, primary: &dyn CommandList) -> Result<()> {
        self.expect_state(SwapchainState::Recording, "present")?;
        let frame = self
            .frame
            .take()
            .ok_or_else(|| Error::InvalidState("no frame in flight".to_string()))?;
        self.state = SwapchainState::Presenting;

        let submitted = self.presentation.submit(
            primary,
            frame.image_acquired.as_ref(),
            PipelineStage::BottomOfPipe,
            frame.render_complete.as_ref(),
        );
        let result = match submitted {
            Ok(()) => {
                let presented = self.presentation.present(frame.image_index, frame.render_complete.as_ref());
                // Once submitted, the semaphores stay in use until the queue drains
                let drained = self.presentation.wait_idle();
                presented.and(drained)
            }
            Err(err) => Err(err),
        };

        drop(frame);
        self.state = SwapchainState::Initialized;
        result
    }

    /// Rebuild for a new window size
    ///
    /// Waits for the device, destroys framebuffers, views and swapchain as a
    /// batch, then runs the init choices again. The render pass survives when
    /// the formats are unchanged.
    pub fn recreate(&mut self, width: u32, height: u32, depth: Arc<dyn RenderTarget>) -> Result<()> {
        self.expect_state(SwapchainState::Initialized, "recreate")?;
        self.device.wait_idle()?;
        self.release_images();
        self.window_extent = Extent2D::new(width, height);
        self.build(depth)?;
        engine_info!(
            self.logger,
            SOURCE,
            "Swapchain recreated: {}x{}",
            self.extent.width,
            self.extent.height
        );
        Ok(())
    }

    /// Framebuffers before the views they reference, then the swapchain
    fn release_images(&mut self) {
        let images = std::mem::take(&mut self.images);
        let (framebuffers, views): (Vec<_>, Vec<_>) =
            images.into_iter().map(|image| (image.framebuffer, image.view)).unzip();
        drop(framebuffers);
        drop(views);
        self.depth = None;
        self.presentation.destroy_swapchain();
    }

    /// Destroy framebuffers and views, then the render pass, then the swapchain
    pub fn teardown(&mut self) {
        if matches!(self.state, SwapchainState::Uninitialized | SwapchainState::TornDown) {
            self.state = SwapchainState::TornDown;
            return;
        }
        if let Err(err) = self.device.wait_idle() {
            engine_warn!(self.logger, SOURCE, "wait_idle before teardown failed: {}", err);
        }
        self.frame = None;
        let images = std::mem::take(&mut self.images);
        let (framebuffers, views): (Vec<_>, Vec<_>) =
            images.into_iter().map(|image| (image.framebuffer, image.view)).unzip();
        drop(framebuffers);
        drop(views);
        self.depth = None;
        self.render_pass = None;
        self.presentation.destroy_swapchain();
        self.state = SwapchainState::TornDown;
        engine_debug!(self.logger, SOURCE, "Swapchain torn down");
    }

    // ===== ACCESSORS =====

    pub fn state(&self) -> SwapchainState {
        self.state
    }

    /// Index of the image acquired for the current frame
    pub fn current_image_index(&self) -> Option<u32> {
        self.frame.as_ref().map(|frame| frame.image_index)
    }

    /// Framebuffer of the image acquired for the current frame
    pub fn current_framebuffer(&self) -> Option<&Arc<dyn Framebuffer>> {
        let index = self.current_image_index()? as usize;
        self.images.get(index).map(|image| &image.framebuffer)
    }

    pub fn render_pass(&self) -> Option<&Arc<dyn RenderPass>> {
        self.render_pass.as_ref()
    }

    pub fn framebuffer(&self, index: usize) -> Option<&Arc<dyn Framebuffer>> {
        self.images.get(index).map(|image| &image.framebuffer)
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    pub fn color_format(&self) -> TextureFormat {
        self.color_format
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
