//! Model: meshes with materials, per-pass bindings and a physics body
//!
//! Loading reads three files next to each other:
//!
//! ```text
//! <path>.mesh   binary geometry + texture names   (required)
//! <path>.mat    text material scalars             (required)
//! <path>.col    binary collision triangles        (optional)
//! ```
//!
//! Every mesh gets one descriptor set and one secondary command list per
//! pipeline the model was loaded for. Rendering a pass rewrites the sets and
//! re-records the secondary lists, then executes them into the caller's
//! primary list.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::asset::{
    companion_path, load_collision_shape, read_material_file, read_mesh_file, resolve_texture_path, TextureSlot,
    COLLISION_EXTENSION, MATERIAL_EXTENSION, MESH_EXTENSION,
};
use crate::error::{Error, Result};
use crate::graphics_device::{CommandList, CommandListInheritance, CommandListLevel, Pipeline, RenderPassKind};
use crate::log::LogSink;
use crate::physics::{CollisionShape, PhysicsWorld, RigidBodyDesc, RigidBodyHandle};
use crate::resource::{
    descriptor_writes_for, Geometry, Material, MaterialBindings, Mesh, MeshVertex, PassDescriptorSet,
    SkinnedVertex, StaticVertex, TextureCache, TextureLoader, TransformUniform, UniformBlock,
};
use crate::scene::{FrameContext, PassTarget, RenderContext};
use crate::{engine_debug, engine_info, engine_trace, engine_warn};

const SOURCE: &str = "nova3d::Model";

/// Model with position + color vertices
///
/// Static vertices carry no normals, UVs or material uniform, so a
/// `StaticModel` only joins passes whose layout is transform-only
/// (`RenderPassKind::Shadow`, slot 0). Its MVP-only color pipeline is built
/// with that kind; loading it with a Geometry pipeline is rejected.
pub type StaticModel = Model<StaticVertex>;
pub type SkinnedModel = Model<SkinnedVertex>;

/// Loaded model
///
/// Fields drop in declaration order: command lists, descriptor sets,
/// uniforms, then geometry.
pub struct Model<V: MeshVertex> {
    /// [mesh][pass]
    command_lists: Vec<Vec<Box<dyn CommandList>>>,
    /// [mesh][pass]
    descriptor_sets: Vec<Vec<PassDescriptorSet>>,
    transform: UniformBlock<TransformUniform>,
    materials: Vec<Material>,
    meshes: Vec<Mesh<V>>,
    pass_kinds: Vec<RenderPassKind>,
    name: String,
    body: Option<RigidBodyHandle>,
    physics_static: bool,
    position: Vec3,
    transform_frame: Option<u64>,
    logger: LogSink,
}

impl<V: MeshVertex> Model<V> {
    /// Load `<path>.mesh`, `<path>.mat` and the optional `<path>.col`
    ///
    /// Textures are looked up through `textures`, so models naming the same
    /// file share one GPU texture. The body is registered last, as static
    /// (with zero mass, whatever `mass` says) when the model has no
    /// collision shape or `mass` is zero.
    pub fn load(
        ctx: &RenderContext,
        path: &Path,
        pipelines: &[Arc<dyn Pipeline>],
        mass: f32,
        physics: &mut dyn PhysicsWorld,
        textures: &mut TextureCache,
        loader: &dyn TextureLoader,
    ) -> Result<Self> {
        let device = ctx.device.as_ref();
        let pass_kinds = pass_kinds_for::<V>(pipelines)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mesh_path = companion_path(path, MESH_EXTENSION);
        let file = File::open(&mesh_path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::AssetNotFound(mesh_path.display().to_string()),
            _ => Error::from(err),
        })?;
        let records = read_mesh_file::<V, _>(&mut BufReader::new(file))?;
        if records.is_empty() {
            return Err(Error::ParseError(format!("'{}' contains no meshes", mesh_path.display())));
        }
        let entries = read_material_file(&companion_path(path, MATERIAL_EXTENSION), records.len())?;

        let mut meshes = Vec::with_capacity(records.len());
        let mut materials = Vec::with_capacity(records.len());
        for (record, entry) in records.iter().zip(entries) {
            let diffuse_path = resolve_texture_path(&ctx.config, &record.diffuse, TextureSlot::Diffuse);
            let specular_path = resolve_texture_path(&ctx.config, &record.specular, TextureSlot::Specular);
            let diffuse = textures.get_or_load(device, loader, &diffuse_path)?;
            let specular = textures.get_or_load(device, loader, &specular_path)?;
            materials.push(Material::new(entry.name, diffuse, specular, entry.shininess, entry.specular_strength));

            let geometry = Geometry::from_data(device, &ctx.logger, &record.vertices, &record.indices)?;
            meshes.push(Mesh::new(device, geometry)?);
        }

        let mut descriptor_sets = Vec::with_capacity(meshes.len());
        let mut command_lists = Vec::with_capacity(meshes.len());
        for _ in &meshes {
            descriptor_sets.push(
                pipelines
                    .iter()
                    .map(|pipeline| PassDescriptorSet::new(device, pipeline))
                    .collect::<Result<Vec<_>>>()?,
            );
            command_lists.push(
                pipelines
                    .iter()
                    .map(|_| device.create_command_list(CommandListLevel::Secondary))
                    .collect::<Result<Vec<_>>>()?,
            );
        }
        let transform = UniformBlock::new(device, &TransformUniform::default())?;

        let shape = load_collision_shape(&companion_path(path, COLLISION_EXTENSION))?;
        let physics_static = shape == CollisionShape::Empty || mass == 0.0;
        let body = physics.add_body(RigidBodyDesc {
            // Static bodies carry no mass
            mass: if physics_static { 0.0 } else { mass },
            is_static: physics_static,
            shape,
            position: Vec3::ZERO,
        })?;

        engine_info!(
            ctx.logger,
            SOURCE,
            "Loaded model '{}': {} meshes, passes {:?}, {}",
            name,
            meshes.len(),
            pass_kinds,
            if physics_static { "static" } else { "dynamic" }
        );

        Ok(Self {
            command_lists,
            descriptor_sets,
            transform,
            materials,
            meshes,
            pass_kinds,
            name,
            body: Some(body),
            physics_static,
            position: Vec3::ZERO,
            transform_frame: None,
            logger: ctx.logger.clone(),
        })
    }

    /// Record this model into `primary` for one pass
    ///
    /// `primary` must be inside `pass.render_pass` with secondary-list
    /// contents. The transform uniform is written on the first pass of each
    /// frame; later passes of the same frame reuse it.
    pub fn render(&mut self, frame: &FrameContext<'_>, pass: &PassTarget, primary: &mut dyn CommandList) -> Result<()> {
        let kind = pass.kind();
        let slot = self
            .pass_kinds
            .iter()
            .position(|loaded| *loaded == kind)
            .ok_or_else(|| {
                Error::InvalidResource(format!("model '{}' was not loaded for the {} pass", self.name, kind))
            })?;

        if self.transform_frame != Some(frame.frame_index) {
            let world = self.world_transform(frame.physics)?;
            self.transform
                .update(&TransformUniform::new(world, frame.view, frame.projection))?;
            self.transform_frame = Some(frame.frame_index);
        }

        let inheritance = CommandListInheritance {
            render_pass: pass.render_pass.clone(),
            framebuffer: pass.framebuffer.clone(),
            subpass: 0,
        };

        for (index, mesh) in self.meshes.iter().enumerate() {
            let material = &self.materials[index];
            mesh.update_uniform_buffer(material)?;

            let bindings = mesh.material_buffer_info().map(|info| MaterialBindings {
                diffuse: material.diffuse(),
                specular: material.specular(),
                material: info,
            });
            let writes = descriptor_writes_for(kind, self.transform.descriptor_info(), bindings)?;
            let set = &mut self.descriptor_sets[index][slot];
            set.rewrite(&writes)?;

            let cmd = &mut self.command_lists[index][slot];
            cmd.begin(Some(&inheritance))?;
            cmd.set_viewport(pass.viewport)?;
            cmd.set_scissor(pass.scissor)?;
            cmd.bind_pipeline(&pass.pipeline)?;
            cmd.bind_descriptor_set(&pass.pipeline, set.set())?;
            mesh.render(cmd.as_mut())?;
            cmd.end()?;

            primary.execute_commands(&[cmd.as_ref()])?;
        }

        engine_trace!(
            self.logger,
            SOURCE,
            "'{}' recorded {} meshes for {} (frame {})",
            self.name,
            self.meshes.len(),
            kind,
            frame.frame_index
        );
        Ok(())
    }

    /// Move the model
    ///
    /// Teleports the physics body; the stored position is what the model
    /// renders at once the body is gone.
    pub fn set_position(&mut self, physics: &mut dyn PhysicsWorld, x: f32, y: f32, z: f32) -> Result<()> {
        self.position = Vec3::new(x, y, z);
        if let Some(handle) = self.body {
            let body = physics
                .body_mut(handle)
                .ok_or_else(|| Error::InvalidState(format!("body of model '{}' is not registered", self.name)))?;
            body.set_position(self.position);
        }
        Ok(())
    }

    fn world_transform(&self, physics: &dyn PhysicsWorld) -> Result<Mat4> {
        match self.body {
            Some(handle) => physics
                .world_transform(handle)
                .ok_or_else(|| Error::InvalidState(format!("body of model '{}' is not registered", self.name))),
            None => Ok(Mat4::from_translation(self.position)),
        }
    }

    /// Remove the body from `physics`, then release the GPU resources
    pub fn unload(mut self, physics: &mut dyn PhysicsWorld) {
        if let Some(handle) = self.body.take() {
            if !physics.remove_body(handle) {
                engine_warn!(self.logger, SOURCE, "body of model '{}' was already removed", self.name);
            }
        }
        engine_debug!(self.logger, SOURCE, "Unloading model '{}'", self.name);
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn meshes(&self) -> &[Mesh<V>] {
        &self.meshes
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material_mut(&mut self, index: usize) -> Option<&mut Material> {
        self.materials.get_mut(index)
    }

    /// Passes this model can be rendered in
    pub fn passes(&self) -> &[RenderPassKind] {
        &self.pass_kinds
    }

    pub fn transform_uniform(&self) -> &UniformBlock<TransformUniform> {
        &self.transform
    }

    pub fn body(&self) -> Option<RigidBodyHandle> {
        self.body
    }

    /// True when the body was registered as static
    pub fn is_physics_static(&self) -> bool {
        self.physics_static
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }
}

impl<V: MeshVertex> Drop for Model<V> {
    fn drop(&mut self) {
        if self.body.is_some() {
            engine_warn!(
                self.logger,
                SOURCE,
                "Model '{}' dropped without unload, its body is still registered",
                self.name
            );
        }
    }
}

/// One pass per pipeline, no duplicates, and a geometry pass only for
/// vertices that carry a material uniform
fn pass_kinds_for<V: MeshVertex>(pipelines: &[Arc<dyn Pipeline>]) -> Result<Vec<RenderPassKind>> {
    if pipelines.is_empty() {
        return Err(Error::InvalidResource("a model needs at least one pipeline".to_string()));
    }
    let mut kinds = Vec::with_capacity(pipelines.len());
    for pipeline in pipelines {
        let kind = pipeline.kind();
        if kinds.contains(&kind) {
            return Err(Error::InvalidResource(format!("two {} pipelines", kind)));
        }
        if kind == RenderPassKind::Geometry && !V::HAS_MATERIAL_UNIFORM {
            return Err(Error::InvalidResource(format!(
                "{}-byte vertices have no material uniform for the {} pass",
                std::mem::size_of::<V>(),
                kind
            )));
        }
        kinds.push(kind);
    }
    Ok(kinds)
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
