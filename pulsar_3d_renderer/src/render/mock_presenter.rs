/// Mock presenter and window for frame loop tests (no GPU required)
///
/// The mock models exactly the synchronization surface the driver relies
/// on: per-slot fences born signaled, reset only at submit, re-signaled
/// when a later wait would have blocked on them. Acquire and present
/// outcomes are scripted per call; unscripted calls succeed.

use std::cell::Cell;
use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::render::{AcquireOutcome, FramePresenter, PresentOutcome, PresentationWindow};

/// Scripted outcome for one acquire call
pub enum ScriptedAcquire {
    /// Acquire succeeds
    Acquire,
    /// Acquire succeeds but flags the chain suboptimal
    AcquireSuboptimal,
    /// The chain is stale
    OutOfDate,
    /// Unexpected failure (driver should skip the iteration)
    Fail,
}

/// Scripted outcome for one present call
pub enum ScriptedPresent {
    /// Present succeeds
    Present,
    /// The chain is stale
    OutOfDate,
    /// Presented, but the chain no longer matches the surface
    Suboptimal,
    /// Unexpected failure (driver should log and continue)
    Fail,
}

/// Mock backend implementing [`FramePresenter`]
pub struct MockPresenter {
    slots: usize,
    image_count: u32,
    next_image: u32,

    /// Per-slot fence state; true = signaled (GPU work done)
    fence_signaled: Vec<bool>,

    /// Scripted acquire outcomes, consumed front to back
    pub acquire_script: VecDeque<ScriptedAcquire>,
    /// Scripted present outcomes, consumed front to back
    pub present_script: VecDeque<ScriptedPresent>,

    /// Journal of every call, e.g. "wait(0)", "submit(0, 2)"
    pub calls: Vec<String>,
    /// Number of waits that found an unsignaled fence (i.e. would block)
    pub blocked_waits: usize,
    /// Number of rebuild_targets calls
    pub rebuild_count: usize,
    /// Extent passed to the most recent rebuild
    pub last_rebuild_extent: Option<(u32, u32)>,

    drained: Cell<bool>,
}

impl MockPresenter {
    pub fn new(slots: usize) -> Self {
        Self {
            slots,
            image_count: 3,
            next_image: 0,
            fence_signaled: vec![true; slots],
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            calls: Vec::new(),
            blocked_waits: 0,
            rebuild_count: 0,
            last_rebuild_extent: None,
            drained: Cell::new(false),
        }
    }

    /// Whether wait_idle has been called
    pub fn drained(&self) -> bool {
        self.drained.get()
    }

    /// Fence state of a slot (true = signaled)
    pub fn fence_signaled(&self, slot: usize) -> bool {
        self.fence_signaled[slot]
    }
}

impl FramePresenter for MockPresenter {
    fn frames_in_flight(&self) -> usize {
        self.slots
    }

    fn wait_frame(&mut self, slot: usize) -> Result<()> {
        self.calls.push(format!("wait({})", slot));
        if !self.fence_signaled[slot] {
            // A real fence wait would block here until the GPU finishes.
            self.blocked_waits += 1;
            self.fence_signaled[slot] = true;
        }
        Ok(())
    }

    fn acquire_image(&mut self, slot: usize) -> Result<AcquireOutcome> {
        self.calls.push(format!("acquire({})", slot));
        let suboptimal = match self.acquire_script.pop_front() {
            None | Some(ScriptedAcquire::Acquire) => false,
            Some(ScriptedAcquire::AcquireSuboptimal) => true,
            Some(ScriptedAcquire::OutOfDate) => return Ok(AcquireOutcome::OutOfDate),
            Some(ScriptedAcquire::Fail) => {
                return Err(Error::BackendError("scripted acquire failure".to_string()))
            }
        };

        let image_index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        Ok(AcquireOutcome::Acquired { image_index, suboptimal })
    }

    fn submit_frame(&mut self, slot: usize, image_index: u32) -> Result<()> {
        self.calls.push(format!("submit({}, {})", slot, image_index));
        // Submission is the only operation that resets the slot fence.
        self.fence_signaled[slot] = false;
        Ok(())
    }

    fn present_frame(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome> {
        self.calls.push(format!("present({}, {})", slot, image_index));
        match self.present_script.pop_front() {
            None | Some(ScriptedPresent::Present) => Ok(PresentOutcome::Presented),
            Some(ScriptedPresent::OutOfDate) => Ok(PresentOutcome::OutOfDate),
            Some(ScriptedPresent::Suboptimal) => Ok(PresentOutcome::Suboptimal),
            Some(ScriptedPresent::Fail) => {
                Err(Error::BackendError("scripted present failure".to_string()))
            }
        }
    }

    fn rebuild_targets(&mut self, width: u32, height: u32) -> Result<()> {
        self.calls.push(format!("rebuild({}, {})", width, height));
        self.rebuild_count += 1;
        self.last_rebuild_extent = Some((width, height));
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.drained.set(true);
        Ok(())
    }
}

/// Mock windowing collaborator
pub struct MockWindow {
    /// Close immediately
    pub close: bool,
    /// Close once this many polls have happened
    pub close_after_polls: Option<usize>,
    /// Number of poll_events calls so far
    pub polls: usize,
    /// Sizes to step through, one per poll
    pub pending_sizes: VecDeque<(u32, u32)>,
    current_size: (u32, u32),
}

impl MockWindow {
    pub fn new() -> Self {
        Self {
            close: false,
            close_after_polls: None,
            polls: 0,
            pending_sizes: VecDeque::new(),
            current_size: (800, 450),
        }
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        let mut window = Self::new();
        window.current_size = (width, height);
        window
    }
}

impl PresentationWindow for MockWindow {
    fn poll_events(&mut self) {
        self.polls += 1;
        if let Some(size) = self.pending_sizes.pop_front() {
            self.current_size = size;
        }
    }

    fn should_close(&self) -> bool {
        if self.close {
            return true;
        }
        match self.close_after_polls {
            Some(n) => self.polls >= n,
            None => false,
        }
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.current_size
    }
}
