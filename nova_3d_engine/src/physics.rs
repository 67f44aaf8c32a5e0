//! Rigid body provider seen by the renderer
//!
//! The engine only needs a world transform per model and the ability to
//! register, move and remove bodies. Simulation lives behind `PhysicsWorld`.

use glam::{Mat4, Vec3};
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};

new_key_type! {
    /// Handle of a body registered in a `PhysicsWorld`
    pub struct RigidBodyHandle;
}

/// Collision triangle (three positions)
pub type Triangle = [Vec3; 3];

#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    /// No collision geometry
    Empty,
    TriangleMesh(Vec<Triangle>),
}

/// Registration parameters of a body
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyDesc {
    pub mass: f32,
    /// Static bodies never move under simulation
    pub is_static: bool,
    pub shape: CollisionShape,
    pub position: Vec3,
}

pub trait RigidBody {
    fn world_transform(&self) -> Mat4;

    /// Teleport the body
    fn set_position(&mut self, position: Vec3);

    fn is_static(&self) -> bool;
}

pub trait PhysicsWorld {
    fn add_body(&mut self, desc: RigidBodyDesc) -> Result<RigidBodyHandle>;

    /// Remove a body; returns false if the handle was not registered
    fn remove_body(&mut self, handle: RigidBodyHandle) -> bool;

    fn body(&self, handle: RigidBodyHandle) -> Option<&dyn RigidBody>;

    fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut dyn RigidBody>;

    fn world_transform(&self, handle: RigidBodyHandle) -> Option<Mat4> {
        self.body(handle).map(|body| body.world_transform())
    }
}

// ===== KINEMATIC WORLD =====

/// Body that only stores a transform
#[derive(Debug, Clone)]
pub struct KinematicBody {
    pub transform: Mat4,
    pub mass: f32,
    pub is_static: bool,
    pub shape: CollisionShape,
}

impl RigidBody for KinematicBody {
    fn world_transform(&self) -> Mat4 {
        self.transform
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform.w_axis = position.extend(1.0);
    }

    fn is_static(&self) -> bool {
        self.is_static
    }
}

/// Physics world without simulation
///
/// Bodies keep whatever transform they were given. Used by tools and tests,
/// and by applications that move models themselves.
#[derive(Default)]
pub struct KinematicWorld {
    bodies: SlotMap<RigidBodyHandle, KinematicBody>,
}

impl KinematicWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn get(&self, handle: RigidBodyHandle) -> Option<&KinematicBody> {
        self.bodies.get(handle)
    }
}

impl PhysicsWorld for KinematicWorld {
    fn add_body(&mut self, desc: RigidBodyDesc) -> Result<RigidBodyHandle> {
        if !desc.mass.is_finite() || desc.mass < 0.0 {
            return Err(Error::InvalidResource(format!("invalid body mass {}", desc.mass)));
        }
        Ok(self.bodies.insert(KinematicBody {
            transform: Mat4::from_translation(desc.position),
            mass: desc.mass,
            is_static: desc.is_static,
            shape: desc.shape,
        }))
    }

    fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.bodies.remove(handle).is_some()
    }

    fn body(&self, handle: RigidBodyHandle) -> Option<&dyn RigidBody> {
        self.bodies.get(handle).map(|body| body as &dyn RigidBody)
    }

    fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut dyn RigidBody> {
        self.bodies.get_mut(handle).map(|body| body as &mut dyn RigidBody)
    }
}

#[cfg(test)]
#[path = "physics_tests.rs"]
mod tests;
