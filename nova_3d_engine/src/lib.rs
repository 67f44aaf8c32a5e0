/*!
# Nova3D Engine

Core traits and types for the Nova3D renderer.

The crate is backend-agnostic: GPU objects are trait objects created by a
`GraphicsDevice`, and presentation goes through a `PresentationDevice`.
The Vulkan backend lives in `nova_3d_engine_renderer_vulkan`.

## Architecture

- **graphics_device**: device, buffer, texture, pipeline, descriptor and
  command list traits
- **resource**: staged uploads, geometry, uniforms, materials, pass binding
- **presentation**: swapchain state machine
- **scene**: models rendered per pass, camera
- **asset**: mesh, material and collision file formats
- **physics**: rigid body provider seen by models

Every component that logs receives a `LogSink`; nothing is global.
*/

// Internal modules
mod error;
pub mod config;
pub mod log;
pub mod graphics_device;
pub mod resource;
pub mod asset;
pub mod physics;
pub mod presentation;
pub mod scene;

// Main nova3d namespace module
pub mod nova3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::Config;

    // Device traits
    pub use crate::graphics_device::{GraphicsDevice, PresentationDevice};

    // Logging sub-module (engine_* macros are exported at the crate root)
    pub mod log {
        pub use crate::log::{DefaultLogger, FacadeLogger, LogEntry, LogSeverity, LogSink, Logger, MemoryLogger};
    }

    // Render sub-module with all GPU-facing types
    pub mod render {
        pub use crate::graphics_device::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod asset {
        pub use crate::asset::*;
    }

    pub mod presentation {
        pub use crate::presentation::*;
    }

    pub mod physics {
        pub use crate::physics::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math and POD libraries at crate root
pub use glam;
pub use bytemuck;
