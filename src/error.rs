//! Error types for the Nova3D engine
//!
//! This module defines the error types used throughout the engine,
//! including device failures, resource exhaustion, and pooled-object
//! handle violations.

use std::fmt;

/// Result type for Nova3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nova3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, DirectX, etc.)
    BackendError(String),

    /// Out of GPU memory or no physical resource available
    OutOfMemory,

    /// Invalid resource (image, buffer, shader, descriptor, etc.)
    InvalidResource(String),

    /// A pooled-object handle that is not currently active
    ///
    /// This is a programming invariant violation: it aborts the offending
    /// operation but never the process.
    UnknownHandle(String),

    /// Initialization failed (device, swapchain, subsystems)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::UnknownHandle(msg) => write!(f, "Unknown handle: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
