/*!
# Pulsar 3D Renderer

Core types for the Pulsar 3D renderer: error handling, logging, the color
value utility, and the platform-agnostic frame presentation layer.

## Architecture

The renderer is decomposed into five components behind explicit seams:

- **Device Context / Swapchain Manager / Render Target Set / Frame
  Synchronization Ring**: backend-owned, reached through the
  [`FramePresenter`](render::FramePresenter) trait (see the
  `pulsar_3d_renderer_vulkan` crate for the Vulkan implementation).
- **Frame Loop Driver** ([`render::FrameLoop`]): the per-frame state
  machine living in this crate, testable without a GPU.

Windowing stays external behind
[`PresentationWindow`](render::PresentationWindow).
*/

// Internal modules
mod color;
mod error;
pub mod log;
pub mod render;

// Main pulsar3d namespace module
pub mod pulsar3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Color utility
    pub use crate::color::{BlendMode, Color};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{
            DefaultLogger, LogEntry, LogSeverity, Logger, reset_logger, set_logger,
        };
    }

    // Render sub-module with the presentation seams and the frame loop
    pub mod render {
        pub use crate::render::*;
    }
}
