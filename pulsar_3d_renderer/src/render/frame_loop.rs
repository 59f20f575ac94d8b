/// FrameLoop - the per-frame orchestration state machine
///
/// Drives one iteration at a time against a [`FramePresenter`] and a
/// [`PresentationWindow`]: wait slot fence, acquire, submit, present,
/// advance. Detects swapchain staleness (reported by acquire/present or
/// signaled by a resize notification) and runs the rebuild transition.
///
/// Staleness never escapes this module as an error; unexpected
/// acquire/present failures are logged and the iteration abandoned so a
/// glitching presentation engine degrades instead of terminating the
/// session.

use crate::error::Result;
use crate::render::{AcquireOutcome, FramePresenter, PresentOutcome, PresentationWindow};
use crate::{engine_debug, engine_info, engine_warn};

/// Lifecycle phase of the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Created, no iteration run yet
    Idle,

    /// Steady-state rendering
    Rendering,

    /// Tearing down and recreating the swapchain generation
    Rebuilding,

    /// Draining the device before teardown
    ShuttingDown,

    /// Shut down; no further iterations are valid
    Terminated,
}

/// What a single iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// A frame was submitted (and presented, unless the chain went stale
    /// at the present step)
    Rendered {
        /// Swapchain image the frame targeted
        image_index: u32,
    },

    /// The chain was stale at acquire; targets were rebuilt instead
    Rebuilt,

    /// A transient failure abandoned the iteration; nothing advanced
    Skipped,
}

/// Frame loop driver state
///
/// The slot index cycles over the presenter's synchronization ring with
/// period N. It only advances once a frame has actually been submitted:
/// abandoned iterations (stale or failed acquire) retry on the same slot,
/// whose fence is still signaled because [`FramePresenter::submit_frame`]
/// is the only operation that resets it.
pub struct FrameLoop {
    current_slot: usize,
    resize_pending: bool,
    phase: LoopPhase,
}

impl FrameLoop {
    /// Create an idle frame loop starting at slot 0
    pub fn new() -> Self {
        Self {
            current_slot: 0,
            resize_pending: false,
            phase: LoopPhase::Idle,
        }
    }

    /// Current synchronization slot index
    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Whether a resize notification is waiting to be honored
    pub fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// Record an out-of-band resize notification
    ///
    /// Checked after the next successful present; the chain is then
    /// rebuilt even if the presentation engine never reported staleness.
    pub fn notify_resized(&mut self) {
        self.resize_pending = true;
    }

    /// Run the loop until the window requests close, then drain the device
    pub fn run(
        &mut self,
        presenter: &mut dyn FramePresenter,
        window: &mut dyn PresentationWindow,
    ) -> Result<()> {
        engine_info!("pulsar3d::FrameLoop", "Entering frame loop");

        while !window.should_close() {
            window.poll_events();
            self.run_iteration(presenter, window)?;
        }

        self.shutdown(presenter)
    }

    /// Run exactly one frame iteration
    ///
    /// # Errors
    ///
    /// Only construction-order and device-level failures (fence wait,
    /// queue submit, rebuild) propagate. Staleness and transient
    /// acquire/present hiccups are absorbed here.
    pub fn run_iteration(
        &mut self,
        presenter: &mut dyn FramePresenter,
        window: &mut dyn PresentationWindow,
    ) -> Result<IterationOutcome> {
        if self.phase == LoopPhase::Idle {
            self.phase = LoopPhase::Rendering;
        }

        let slot = self.current_slot;

        // 1. Wait for the GPU to release this slot. The first N iterations
        //    return immediately: every fence starts its life signaled.
        presenter.wait_frame(slot)?;

        // 2. Acquire. The slot is not advanced on any abandon path below.
        let image_index = match presenter.acquire_image(slot) {
            Ok(AcquireOutcome::Acquired { image_index, suboptimal }) => {
                if suboptimal {
                    self.resize_pending = true;
                }
                image_index
            }
            Ok(AcquireOutcome::OutOfDate) => {
                engine_debug!("pulsar3d::FrameLoop", "Swapchain out of date at acquire");
                self.rebuild(presenter, window)?;
                return Ok(IterationOutcome::Rebuilt);
            }
            Err(e) => {
                engine_warn!(
                    "pulsar3d::FrameLoop",
                    "Failed to acquire swapchain image, skipping frame: {}",
                    e
                );
                return Ok(IterationOutcome::Skipped);
            }
        };

        // 3. Submit. This resets the slot's fence; from here on the slot
        //    must advance no matter how presentation goes.
        presenter.submit_frame(slot, image_index)?;

        // 4. Present.
        match presenter.present_frame(slot, image_index) {
            Ok(PresentOutcome::Presented) => {
                if self.resize_pending {
                    self.resize_pending = false;
                    self.rebuild(presenter, window)?;
                }
            }
            Ok(PresentOutcome::OutOfDate) | Ok(PresentOutcome::Suboptimal) => {
                engine_debug!("pulsar3d::FrameLoop", "Swapchain stale at present");
                self.resize_pending = false;
                self.rebuild(presenter, window)?;
            }
            Err(e) => {
                engine_warn!(
                    "pulsar3d::FrameLoop",
                    "Failed to present swapchain image: {}",
                    e
                );
            }
        }

        // 5. Advance the slot ring.
        self.current_slot = (slot + 1) % presenter.frames_in_flight();

        Ok(IterationOutcome::Rendered { image_index })
    }

    /// Drain the device and mark the loop terminated
    pub fn shutdown(&mut self, presenter: &mut dyn FramePresenter) -> Result<()> {
        self.phase = LoopPhase::ShuttingDown;
        presenter.wait_idle()?;
        self.phase = LoopPhase::Terminated;
        engine_info!("pulsar3d::FrameLoop", "Frame loop terminated");
        Ok(())
    }

    /// Rebuild transition: recreate everything tied to the swapchain
    /// generation, leaving slot index and synchronization ring untouched
    fn rebuild(
        &mut self,
        presenter: &mut dyn FramePresenter,
        window: &mut dyn PresentationWindow,
    ) -> Result<()> {
        self.phase = LoopPhase::Rebuilding;

        // A minimized window reports a zero extent; park here pumping
        // events until it comes back (or the user closes it).
        let (mut width, mut height) = window.framebuffer_size();
        while width == 0 || height == 0 {
            if window.should_close() {
                self.phase = LoopPhase::ShuttingDown;
                return Ok(());
            }
            window.poll_events();
            let size = window.framebuffer_size();
            width = size.0;
            height = size.1;
        }

        presenter.rebuild_targets(width, height)?;

        engine_info!(
            "pulsar3d::FrameLoop",
            "Swapchain generation rebuilt at {}x{}",
            width,
            height
        );
        self.phase = LoopPhase::Rendering;
        Ok(())
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "frame_loop_tests.rs"]
mod tests;
