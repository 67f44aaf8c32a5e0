/// CommandList trait - records GPU commands
///
/// Primary lists are submitted; secondary lists are recorded against an
/// inherited render pass/framebuffer and executed from a primary.

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Buffer, DescriptorSet, Framebuffer, Pipeline, RenderPass};

/// Primary or secondary command list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandListLevel {
    Primary,
    Secondary,
}

/// Render pass state a secondary list continues
#[derive(Clone)]
pub struct CommandListInheritance {
    pub render_pass: Arc<dyn RenderPass>,
    pub framebuffer: Arc<dyn Framebuffer>,
    pub subpass: u32,
}

/// How the contents of a render pass are provided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpassContents {
    /// Recorded directly in the primary list
    Inline,
    /// Provided by executed secondary lists
    SecondaryCommandLists,
}

/// Viewport (depth range included)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-extent viewport with depth range [0, 1]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Integer rectangle (scissor, render area)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Clear value for one attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

/// Region of a buffer-to-buffer copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferCopy {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

/// Command list
pub trait CommandList: Send + Sync {
    fn level(&self) -> CommandListLevel;

    /// Begin recording (resets previous content)
    ///
    /// Secondary lists recorded for use inside a render pass pass the
    /// inherited render pass and framebuffer.
    fn begin(&mut self, inheritance: Option<&CommandListInheritance>) -> Result<()>;

    fn end(&mut self) -> Result<()>;

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
        contents: SubpassContents,
    ) -> Result<()>;

    fn end_render_pass(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()>;

    /// Bind `set` at set index 0 of the pipeline layout
    fn bind_descriptor_set(&mut self, pipeline: &Arc<dyn Pipeline>, set: &dyn DescriptorSet) -> Result<()>;

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()>;

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, index_type: IndexType) -> Result<()>;

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()>;

    fn copy_buffer(&mut self, src: &Arc<dyn Buffer>, dst: &Arc<dyn Buffer>, region: BufferCopy) -> Result<()>;

    /// Execute secondary lists (primary lists only)
    fn execute_commands(&mut self, secondaries: &[&dyn CommandList]) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
