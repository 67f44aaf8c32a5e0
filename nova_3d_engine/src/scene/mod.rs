//! Scene: models rendered into passes, and the camera that views them

pub mod camera;
pub mod model;

pub use camera::{vulkan_perspective, Camera};
pub use model::{Model, SkinnedModel, StaticModel};

use std::sync::Arc;
use glam::Mat4;
use crate::config::Config;
use crate::graphics_device::{
    Extent2D, Framebuffer, GraphicsDevice, Pipeline, Rect2D, RenderPass, RenderPassKind, Viewport,
};
use crate::log::LogSink;
use crate::physics::PhysicsWorld;

/// Long-lived services handed to models at load time
#[derive(Clone)]
pub struct RenderContext {
    pub device: Arc<dyn GraphicsDevice>,
    pub config: Config,
    pub logger: LogSink,
}

impl RenderContext {
    pub fn new(device: Arc<dyn GraphicsDevice>, config: Config, logger: LogSink) -> Self {
        Self { device, config, logger }
    }
}

/// Inputs that change once per frame
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub view: Mat4,
    pub projection: Mat4,
    pub physics: &'a dyn PhysicsWorld,
    /// Incremented by the caller for every presented frame
    pub frame_index: u64,
}

/// Where one pass renders: pipeline, render pass, framebuffer and area
#[derive(Clone)]
pub struct PassTarget {
    pub pipeline: Arc<dyn Pipeline>,
    pub render_pass: Arc<dyn RenderPass>,
    pub framebuffer: Arc<dyn Framebuffer>,
    pub viewport: Viewport,
    pub scissor: Rect2D,
}

impl PassTarget {
    /// Target covering the whole `extent`
    pub fn full(
        pipeline: Arc<dyn Pipeline>,
        render_pass: Arc<dyn RenderPass>,
        framebuffer: Arc<dyn Framebuffer>,
        extent: Extent2D,
    ) -> Self {
        Self {
            pipeline,
            render_pass,
            framebuffer,
            viewport: Viewport::from_size(extent.width, extent.height),
            scissor: Rect2D::from_size(extent.width, extent.height),
        }
    }

    pub fn kind(&self) -> RenderPassKind {
        self.pipeline.kind()
    }
}
