/// Pipeline - Vulkan implementation of the engine Pipeline trait

use nova_3d_engine::nova3d::render::{
    DescriptorSetLayout as EngineDescriptorSetLayout, Pipeline as EnginePipeline, RenderPassKind,
};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Graphics pipeline and its layout (one descriptor set at index 0)
pub struct Pipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    kind: RenderPassKind,
    descriptor_set_layout: Arc<dyn EngineDescriptorSetLayout>,
}

impl Pipeline {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        pipeline: vk::Pipeline,
        pipeline_layout: vk::PipelineLayout,
        kind: RenderPassKind,
        descriptor_set_layout: Arc<dyn EngineDescriptorSetLayout>,
    ) -> Self {
        Self {
            ctx,
            pipeline,
            pipeline_layout,
            kind,
            descriptor_set_layout,
        }
    }
}

impl EnginePipeline for Pipeline {
    fn kind(&self) -> RenderPassKind {
        self.kind
    }

    fn descriptor_set_layout(&self) -> &Arc<dyn EngineDescriptorSetLayout> {
        &self.descriptor_set_layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}
