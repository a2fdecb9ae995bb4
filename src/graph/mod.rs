//! Render graph: pass building, viewport packing, frame driving

mod pass_builder;
mod render_graph;
mod transparency;
mod viewport_packer;

pub use render_graph::{EnvironmentUniform, FrameState, RenderGraph, MAX_LIGHTS};
pub use transparency::sort_back_to_front;
pub use viewport_packer::{grid_dimensions, pack, scissor_for};
