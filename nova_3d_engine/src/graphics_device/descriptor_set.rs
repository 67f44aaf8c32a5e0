/// Descriptor set layouts, descriptor writes and descriptor sets

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use bitflags::bitflags;
use crate::error::{Error, Result};
use crate::graphics_device::{BufferDescriptorInfo, RenderPassKind, Texture};

/// Kind of resource bound to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    UniformBuffer,
    CombinedImageSampler,
}

bitflags! {
    /// Shader stages that can see a binding
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

/// One binding slot of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub stages: ShaderStageFlags,
}

/// Descriptor for creating a descriptor set layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSetLayoutDesc {
    pub bindings: Vec<DescriptorBinding>,
}

impl DescriptorSetLayoutDesc {
    /// Layout used by every model for the given pass
    ///
    /// Geometry: 0 transform UBO, 1 diffuse, 2 specular, 3 material UBO.
    /// Shadow: 0 transform UBO.
    pub fn for_pass(kind: RenderPassKind) -> Self {
        let transform = DescriptorBinding {
            binding: 0,
            descriptor_type: DescriptorType::UniformBuffer,
            stages: ShaderStageFlags::VERTEX,
        };
        match kind {
            RenderPassKind::Geometry => Self {
                bindings: vec![
                    transform,
                    DescriptorBinding {
                        binding: 1,
                        descriptor_type: DescriptorType::CombinedImageSampler,
                        stages: ShaderStageFlags::FRAGMENT,
                    },
                    DescriptorBinding {
                        binding: 2,
                        descriptor_type: DescriptorType::CombinedImageSampler,
                        stages: ShaderStageFlags::FRAGMENT,
                    },
                    DescriptorBinding {
                        binding: 3,
                        descriptor_type: DescriptorType::UniformBuffer,
                        stages: ShaderStageFlags::FRAGMENT,
                    },
                ],
            },
            RenderPassKind::Shadow => Self { bindings: vec![transform] },
        }
    }

    pub fn binding(&self, slot: u32) -> Option<&DescriptorBinding> {
        self.bindings.iter().find(|b| b.binding == slot)
    }

    /// Check a full rewrite against this layout
    ///
    /// Every slot must be written exactly once with a resource of the slot's
    /// type, and no write may target a slot the layout does not have.
    pub fn validate(&self, writes: &[DescriptorWrite]) -> Result<()> {
        let mut seen = vec![false; self.bindings.len()];
        for write in writes {
            let position = self
                .bindings
                .iter()
                .position(|b| b.binding == write.binding)
                .ok_or_else(|| {
                    Error::InvalidResource(format!(
                        "descriptor write targets slot {} which the layout does not declare",
                        write.binding
                    ))
                })?;
            let expected = self.bindings[position].descriptor_type;
            let actual = write.resource.descriptor_type();
            if expected != actual {
                return Err(Error::InvalidResource(format!(
                    "descriptor slot {} expects {:?}, got {:?}",
                    write.binding, expected, actual
                )));
            }
            if seen[position] {
                return Err(Error::InvalidResource(format!(
                    "descriptor slot {} written twice",
                    write.binding
                )));
            }
            seen[position] = true;
        }
        if let Some(missing) = seen.iter().position(|written| !written) {
            return Err(Error::InvalidResource(format!(
                "descriptor slot {} left unwritten",
                self.bindings[missing].binding
            )));
        }
        Ok(())
    }
}

/// Resource view written into a slot
#[derive(Clone)]
pub enum DescriptorResource {
    UniformBuffer(BufferDescriptorInfo),
    CombinedImageSampler(Arc<dyn Texture>),
}

impl DescriptorResource {
    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            DescriptorResource::UniformBuffer(_) => DescriptorType::UniformBuffer,
            DescriptorResource::CombinedImageSampler(_) => DescriptorType::CombinedImageSampler,
        }
    }
}

impl fmt::Debug for DescriptorResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorResource::UniformBuffer(info) => f.debug_tuple("UniformBuffer").field(info).finish(),
            DescriptorResource::CombinedImageSampler(texture) => f
                .debug_tuple("CombinedImageSampler")
                .field(&(texture.width(), texture.height()))
                .finish(),
        }
    }
}

/// One slot update
#[derive(Debug, Clone)]
pub struct DescriptorWrite {
    pub binding: u32,
    pub resource: DescriptorResource,
}

/// Descriptor set layout created from a `DescriptorSetLayoutDesc`
pub trait DescriptorSetLayout: Send + Sync {
    fn desc(&self) -> &DescriptorSetLayoutDesc;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Descriptor set allocated for one layout
///
/// Mutated in place; the caller guarantees no submitted command list still
/// reads it.
pub trait DescriptorSet: Send + Sync {
    fn layout(&self) -> &Arc<dyn DescriptorSetLayout>;

    /// Write the given slots
    fn update(&mut self, writes: &[DescriptorWrite]) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
