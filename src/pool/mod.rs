//! Pooled GPU-object lifecycle management
//!
//! One generic pool type serves every GPU-object category (pipelines,
//! buffers, framebuffers, queues, ...) instead of a per-type copy. Objects
//! cycle between an active map and an inactive free-list and are never
//! destroyed while active.

mod object_pool;
mod gpu_objects;

pub use object_pool::{ObjectPool, PoolObject, PoolHandle};
pub use gpu_objects::{PipelineObject, PipelineParams, UniformBufferObject};
