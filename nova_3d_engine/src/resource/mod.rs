//! GPU resources: staged upload, geometry, uniforms, materials and binding

pub mod staging;
pub mod geometry;
pub mod uniform;
pub mod mesh;
pub mod material;
pub mod texture_cache;
pub mod binding;

pub use staging::{upload, StagedUpload};
pub use geometry::{
    Geometry, MeshVertex, SkinnedGeometry, SkinnedVertex, StaticGeometry, StaticVertex,
};
pub use uniform::{MaterialUniform, TransformUniform, UniformBlock};
pub use mesh::{Mesh, SkinnedMesh, StaticMesh};
pub use material::Material;
pub use texture_cache::{TextureCache, TextureLoader};
pub use binding::{descriptor_writes_for, MaterialBindings, PassDescriptorSet};
