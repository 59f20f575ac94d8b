/// Tests for error types and the error macros

use super::*;
use crate::pulsar3d;

// ============================================================================
// Tests: Display formatting
// ============================================================================

#[test]
fn test_display_backend_error() {
    let err = Error::BackendError("queue submit rejected".to_string());
    assert_eq!(err.to_string(), "Backend error: queue submit rejected");
}

#[test]
fn test_display_out_of_memory() {
    assert_eq!(Error::OutOfMemory.to_string(), "Out of GPU memory");
}

#[test]
fn test_display_no_suitable_device() {
    let err = Error::NoSuitableDevice("0 devices enumerated".to_string());
    assert_eq!(err.to_string(), "No suitable device: 0 devices enumerated");
}

#[test]
fn test_display_no_supported_format() {
    let err = Error::NoSupportedFormat("depth".to_string());
    assert_eq!(err.to_string(), "No supported format: depth");
}

#[test]
fn test_display_resource_load() {
    let err = Error::ResourceLoad("shaders/cube.vert".to_string());
    assert_eq!(err.to_string(), "Resource load failed: shaders/cube.vert");
}

#[test]
fn test_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(Error::OutOfMemory);
    assert_eq!(err.to_string(), "Out of GPU memory");
}

// ============================================================================
// Tests: error macros
// ============================================================================

#[test]
fn test_engine_err_builds_backend_error() {
    let err = crate::engine_err!("pulsar3d::tests", "code {}", 42);
    match err {
        pulsar3d::Error::BackendError(msg) => assert_eq!(msg, "code 42"),
        other => panic!("unexpected variant: {:?}", other),
    }
}

#[test]
fn test_engine_bail_returns_early() {
    #[allow(unreachable_code)]
    fn failing() -> Result<u32> {
        crate::engine_bail!("pulsar3d::tests", "bailed with {}", "context");
        Ok(0)
    }

    match failing() {
        Err(Error::BackendError(msg)) => assert_eq!(msg, "bailed with context"),
        other => panic!("unexpected result: {:?}", other),
    }
}
