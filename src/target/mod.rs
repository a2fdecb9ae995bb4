//! Render targets and the fixed-slot target registry

mod render_target;
mod target_registry;

pub use render_target::{Attachments, RenderTarget, Subpass, TargetKind, ViewportTile};
pub use target_registry::TargetRegistry;
