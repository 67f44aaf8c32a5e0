//! Pass-typed descriptor binding
//!
//! A model binds one descriptor set per pass it is rendered in. The writes
//! for a pass are fixed by `RenderPassKind` and checked against the layout
//! before they reach the device.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferDescriptorInfo, DescriptorResource, DescriptorSet, DescriptorSetLayoutDesc, DescriptorWrite,
    GraphicsDevice, Pipeline, RenderPassKind, Texture,
};

/// Per-mesh resources sampled by the geometry pass
#[derive(Clone, Copy)]
pub struct MaterialBindings<'a> {
    pub diffuse: &'a Arc<dyn Texture>,
    pub specular: &'a Arc<dyn Texture>,
    pub material: &'a BufferDescriptorInfo,
}

/// Full descriptor rewrite for `kind`
///
/// Geometry: 0 transform, 1 diffuse, 2 specular, 3 material.
/// Shadow: 0 transform.
pub fn descriptor_writes_for(
    kind: RenderPassKind,
    transform: &BufferDescriptorInfo,
    material: Option<MaterialBindings<'_>>,
) -> Result<Vec<DescriptorWrite>> {
    let transform_write = DescriptorWrite {
        binding: 0,
        resource: DescriptorResource::UniformBuffer(transform.clone()),
    };
    match kind {
        RenderPassKind::Shadow => Ok(vec![transform_write]),
        RenderPassKind::Geometry => {
            let material = material.ok_or_else(|| {
                Error::InvalidResource("geometry pass needs textures and a material uniform".to_string())
            })?;
            Ok(vec![
                transform_write,
                DescriptorWrite {
                    binding: 1,
                    resource: DescriptorResource::CombinedImageSampler(material.diffuse.clone()),
                },
                DescriptorWrite {
                    binding: 2,
                    resource: DescriptorResource::CombinedImageSampler(material.specular.clone()),
                },
                DescriptorWrite {
                    binding: 3,
                    resource: DescriptorResource::UniformBuffer(material.material.clone()),
                },
            ])
        }
    }
}

/// Descriptor set allocated for one pipeline's pass
pub struct PassDescriptorSet {
    kind: RenderPassKind,
    layout: DescriptorSetLayoutDesc,
    set: Box<dyn DescriptorSet>,
}

impl PassDescriptorSet {
    /// Allocate a set for `pipeline`; its layout must be the standard one
    /// for the pipeline's pass
    pub fn new(device: &dyn GraphicsDevice, pipeline: &Arc<dyn Pipeline>) -> Result<Self> {
        let kind = pipeline.kind();
        let layout = pipeline.descriptor_set_layout();
        let expected = DescriptorSetLayoutDesc::for_pass(kind);
        if *layout.desc() != expected {
            return Err(Error::InvalidResource(format!(
                "{} pipeline has a non-standard descriptor layout",
                kind
            )));
        }
        let set = device.create_descriptor_set(layout)?;
        Ok(Self { kind, layout: expected, set })
    }

    pub fn kind(&self) -> RenderPassKind {
        self.kind
    }

    /// Validate `writes` against the layout, then update in place
    pub fn rewrite(&mut self, writes: &[DescriptorWrite]) -> Result<()> {
        self.layout.validate(writes)?;
        self.set.update(writes)
    }

    pub fn set(&self) -> &dyn DescriptorSet {
        self.set.as_ref()
    }
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
