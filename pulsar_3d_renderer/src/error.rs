//! Error types for the Pulsar3D renderer
//!
//! One error enum covers the whole workspace: fatal setup failures
//! (device/format negotiation, resource loading) and backend failures
//! surfaced at runtime. Recoverable presentation staleness is NOT an
//! error - it is handled inside the frame loop and never reaches here.

use std::fmt;

/// Result type for Pulsar3D operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pulsar3D renderer errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan call failed, queue submit rejected, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, texture, shader, framebuffer, ...)
    InvalidResource(String),

    /// Initialization failed (instance, surface, swapchain, subsystems)
    InitializationFailed(String),

    /// No physical device satisfied the suitability predicate
    NoSuitableDevice(String),

    /// No candidate format supports the requested usage
    NoSupportedFormat(String),

    /// An asset (shader bytecode, texture pixels) could not be loaded
    ResourceLoad(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::NoSuitableDevice(msg) => write!(f, "No suitable device: {}", msg),
            Error::NoSupportedFormat(msg) => write!(f, "No supported format: {}", msg),
            Error::ResourceLoad(msg) => write!(f, "Resource load failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR and build an [`Error::BackendError`] value in one step
///
/// # Example
///
/// ```ignore
/// device.queue_submit(...)
///     .map_err(|e| engine_err!("pulsar3d::vulkan", "Queue submit failed: {:?}", e))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        $crate::engine_error!($source, $($arg)*);
        $crate::pulsar3d::Error::BackendError(format!($($arg)*))
    }};
}

/// Log an ERROR and return early with an [`Error::BackendError`]
///
/// # Example
///
/// ```ignore
/// if image_index as usize >= framebuffers.len() {
///     engine_bail!("pulsar3d::vulkan", "image index {} out of range", image_index);
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
