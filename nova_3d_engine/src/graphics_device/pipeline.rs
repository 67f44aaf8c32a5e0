/// Pipeline trait, render pass kinds and vertex input layout

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use crate::graphics_device::{DescriptorSetLayout, RenderPass};

/// Which pass a pipeline renders
///
/// Decides the descriptor layout a model binds for that pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPassKind {
    /// Deferred geometry pass (transform, diffuse, specular, material)
    Geometry,
    /// Shadow depth pass (transform only)
    Shadow,
}

impl RenderPassKind {
    pub const ALL: [RenderPassKind; 2] = [RenderPassKind::Geometry, RenderPassKind::Shadow];

    pub fn name(&self) -> &'static str {
        match self {
            RenderPassKind::Geometry => "geometry",
            RenderPassKind::Shadow => "shadow",
        }
    }
}

impl fmt::Display for RenderPassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Vertex attribute data format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum BufferFormat {
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    R32G32B32A32_UINT,
}

impl BufferFormat {
    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            BufferFormat::R32_SFLOAT => 4,
            BufferFormat::R32G32_SFLOAT => 8,
            BufferFormat::R32G32B32_SFLOAT => 12,
            BufferFormat::R32G32B32A32_SFLOAT | BufferFormat::R32G32B32A32_UINT => 16,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    /// Format of the attribute
    pub format: BufferFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex input layout (single interleaved binding)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Stride in bytes between consecutive vertices
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

/// Face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Back,
    Front,
}

/// Descriptor for creating a graphics pipeline
pub struct PipelineDesc {
    pub kind: RenderPassKind,
    /// SPIR-V words
    pub vertex_shader: Vec<u32>,
    /// SPIR-V words; shadow pipelines may omit the fragment stage
    pub fragment_shader: Option<Vec<u32>>,
    pub vertex_layout: VertexLayout,
    pub descriptor_set_layout: Arc<dyn DescriptorSetLayout>,
    pub render_pass: Arc<dyn RenderPass>,
    pub cull_mode: CullMode,
    pub depth_test: bool,
}

/// Graphics pipeline tagged with the pass it belongs to
pub trait Pipeline: Send + Sync {
    fn kind(&self) -> RenderPassKind;

    /// Layout of the single descriptor set bound at set 0
    fn descriptor_set_layout(&self) -> &Arc<dyn DescriptorSetLayout>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
