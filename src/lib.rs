/*!
# Nova 3D Engine

Multi-pass render-graph orchestration core for a real-time 3D renderer.

This crate decides which GPU passes exist, how their outputs chain together
frame-to-frame, how camera viewports are tiled inside a render target, and how
command buffers are recorded and submitted with correct cross-pass
synchronization. GPU resource wrappers are recycled through a generic object
pool instead of being reallocated every frame.

## Architecture

- **GraphicsDevice**: boundary trait to the low-level graphics-API backend
- **ObjectPool**: generic create/lookup/release registry for GPU objects
- **TargetRegistry**: fixed set of named render targets and their attachments
- **RenderGraph**: frame driver — rebuild, pack viewports, record, submit,
  present

Backend implementations provide a concrete `GraphicsDevice`; the crate itself
never touches a graphics API directly.
*/

// Internal modules
mod error;
pub mod log;
pub mod device;
pub mod pool;
pub mod scene;
pub mod target;
pub mod graph;

// Main nova3d namespace module
pub mod nova3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Render sub-module with all rendering types
    pub mod render {
        pub use crate::device::*;
        pub use crate::target::*;
        pub use crate::graph::*;
    }

    // Pool sub-module
    pub mod pool {
        pub use crate::pool::*;
    }

    // Scene boundary sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Crate-root re-exports
pub use error::{Error, Result};

// Re-export math library at crate root
pub use glam;
