/// Camera - view and projection handed to models each frame
///
/// The camera stores matrices and the viewport; it does not move itself.
/// The caller owns it and updates it between frames.

use glam::{Mat4, Vec3};
use crate::graphics_device::{Extent2D, Rect2D, Viewport};
use crate::physics::PhysicsWorld;
use crate::scene::FrameContext;

#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    viewport: Viewport,
    scissor: Option<Rect2D>,
}

impl Camera {
    pub fn new(view: Mat4, projection: Mat4, viewport: Viewport) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            viewport,
            scissor: None,
        }
    }

    /// Right-handed perspective camera looking from `eye` at `target`
    ///
    /// The projection targets Vulkan clip space (Y down, depth 0..1).
    pub fn look_at(eye: Vec3, target: Vec3, fov_y_radians: f32, extent: Extent2D, near: f32, far: f32) -> Self {
        let aspect = extent.width.max(1) as f32 / extent.height.max(1) as f32;
        Self::new(
            Mat4::look_at_rh(eye, target, Vec3::Y),
            vulkan_perspective(fov_y_radians, aspect, near, far),
            Viewport::from_size(extent.width, extent.height),
        )
    }

    // ===== GETTERS =====

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// projection * view
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn scissor(&self) -> Option<&Rect2D> {
        self.scissor.as_ref()
    }

    /// Explicit scissor, or the viewport bounds
    pub fn effective_scissor(&self) -> Rect2D {
        self.scissor.unwrap_or(Rect2D {
            x: self.viewport.x as i32,
            y: self.viewport.y as i32,
            width: self.viewport.width as u32,
            height: self.viewport.height as u32,
        })
    }

    /// Per-frame inputs for `Model::render`
    pub fn frame<'a>(&self, physics: &'a dyn PhysicsWorld, frame_index: u64) -> FrameContext<'a> {
        FrameContext {
            view: self.view_matrix,
            projection: self.projection_matrix,
            physics,
            frame_index,
        }
    }

    // ===== SETTERS =====

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// `None` means same as viewport
    pub fn set_scissor(&mut self, scissor: Option<Rect2D>) {
        self.scissor = scissor;
    }
}

/// `perspective_rh` with the Y axis flipped for Vulkan
pub fn vulkan_perspective(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let mut projection = Mat4::perspective_rh(fov_y_radians, aspect, near, far);
    projection.y_axis.y = -projection.y_axis.y;
    projection
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
