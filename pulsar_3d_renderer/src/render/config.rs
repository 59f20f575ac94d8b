/// Renderer configuration

/// Default window width when the collaborator reports a zero extent
pub const DEFAULT_WINDOW_WIDTH: u32 = 800;

/// Default window height when the collaborator reports a zero extent
pub const DEFAULT_WINDOW_HEIGHT: u32 = 450;

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable validation layers and the debug messenger
    pub enable_validation: bool,

    /// Application name reported to the backend
    pub app_name: String,

    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),

    /// Number of frames allowed in flight concurrently
    pub frames_in_flight: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Pulsar".to_string(),
            app_version: (1, 0, 0),
            frames_in_flight: 2,
        }
    }
}
