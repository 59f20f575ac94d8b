/// FramePresenter trait - the backend seam driven by the frame loop
///
/// A presenter owns the device, the swapchain and its render targets, the
/// per-slot synchronization primitives, and the recorded command buffers.
/// The frame loop driver never touches backend handles; it only sequences
/// these operations and reacts to their outcomes.

use crate::error::Result;

/// Outcome of an image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image was acquired and may be rendered to
    Acquired {
        /// Index of the acquired swapchain image
        image_index: u32,
        /// The presentation engine flagged the chain as suboptimal
        suboptimal: bool,
    },

    /// The chain is stale; nothing was acquired
    OutOfDate,
}

/// Outcome of a presentation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The image was queued for presentation
    Presented,

    /// The chain is stale; the image was not presented
    OutOfDate,

    /// The image was presented but the chain no longer matches the surface
    Suboptimal,
}

/// Backend contract consumed by [`FrameLoop`](crate::render::FrameLoop)
///
/// Synchronization contract per slot:
/// - [`wait_frame`](Self::wait_frame) blocks until the slot's in-flight
///   fence is signaled. It must NOT reset the fence: an iteration abandoned
///   after the wait (stale or failed acquire) leaves the slot re-waitable.
/// - [`submit_frame`](Self::submit_frame) resets the fence immediately
///   before submission, waits the slot's image-available semaphore at the
///   color-attachment-output stage, and signals the slot's render-finished
///   semaphore and fence on completion.
/// - [`present_frame`](Self::present_frame) waits the slot's
///   render-finished semaphore.
pub trait FramePresenter {
    /// Number of slots in the synchronization ring
    fn frames_in_flight(&self) -> usize;

    /// Block until the slot's previous GPU work has completed
    fn wait_frame(&mut self, slot: usize) -> Result<()>;

    /// Request the next presentable image using the slot's semaphore
    ///
    /// Staleness is reported through [`AcquireOutcome::OutOfDate`];
    /// `Err` is reserved for unexpected failures (the driver treats those
    /// as transient and retries next iteration).
    fn acquire_image(&mut self, slot: usize) -> Result<AcquireOutcome>;

    /// Submit the image's recorded command buffer gated on the slot
    fn submit_frame(&mut self, slot: usize, image_index: u32) -> Result<()>;

    /// Queue the image for presentation
    ///
    /// Staleness is reported through the outcome, not `Err`.
    fn present_frame(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome>;

    /// Tear down and recreate everything tied to the current swapchain
    /// generation, using the given framebuffer size as the extent hint
    ///
    /// Implementations must drain the device, destroy render targets and
    /// chain in strict reverse-creation order, recreate them, and re-record
    /// command buffers. The synchronization ring is left untouched.
    fn rebuild_targets(&mut self, width: u32, height: u32) -> Result<()>;

    /// Block until the device has finished all in-flight work
    fn wait_idle(&self) -> Result<()>;
}
