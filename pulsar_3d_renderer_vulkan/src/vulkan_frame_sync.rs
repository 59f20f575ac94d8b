/// Frame Synchronization Ring - per-slot primitives for frames in flight
///
/// A passive pool of N slots, each carrying the image-available and
/// render-finished semaphores plus the in-flight fence for one frame.
/// Allocated once at startup, indexed by the frame loop driver, reused
/// until shutdown. Rebuilding the swapchain does not touch the ring.

use ash::vk;

use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::engine_error;

/// Synchronization primitives for one in-flight frame
pub struct FrameSlot {
    /// Signaled by the presentation engine when the acquired image is ready
    pub image_available: vk::Semaphore,
    /// Signaled by the graphics queue when rendering completes
    pub render_finished: vk::Semaphore,
    /// Signaled by the GPU when the slot's submission retires
    pub in_flight: vk::Fence,
}

/// Fixed ring of [`FrameSlot`]s
pub struct FrameRing {
    slots: Vec<FrameSlot>,
}

/// Next slot in the ring
pub fn advance_slot(slot: usize, ring_len: usize) -> usize {
    (slot + 1) % ring_len
}

impl FrameRing {
    /// Create `n` slots, every fence pre-signaled
    ///
    /// The pre-signaled fences guarantee the first `n` iterations never
    /// block waiting for "previous" work that never happened.
    pub fn new(device: &ash::Device, n: usize) -> Result<Self> {
        let semaphore_info = vk::SemaphoreCreateInfo::default();
        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

        let mut slots = Vec::with_capacity(n);
        for _ in 0..n {
            let slot = unsafe {
                let image_available =
                    device.create_semaphore(&semaphore_info, None).map_err(|e| {
                        engine_error!("pulsar3d::vulkan", "Failed to create image-available semaphore: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create semaphore: {:?}", e))
                    })?;
                let render_finished =
                    device.create_semaphore(&semaphore_info, None).map_err(|e| {
                        engine_error!("pulsar3d::vulkan", "Failed to create render-finished semaphore: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create semaphore: {:?}", e))
                    })?;
                let in_flight = device.create_fence(&fence_info, None).map_err(|e| {
                    engine_error!("pulsar3d::vulkan", "Failed to create in-flight fence: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create fence: {:?}", e))
                })?;

                FrameSlot { image_available, render_finished, in_flight }
            };
            slots.push(slot);
        }

        Ok(Self { slots })
    }

    /// Number of slots in the ring
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Borrow one slot
    pub fn slot(&self, index: usize) -> &FrameSlot {
        &self.slots[index]
    }

    /// Destroy every primitive in the ring
    ///
    /// # Safety
    ///
    /// The device must be idle; no submission may still reference a slot.
    pub unsafe fn destroy(&mut self, device: &ash::Device) {
        for slot in &self.slots {
            device.destroy_semaphore(slot.image_available, None);
            device.destroy_semaphore(slot.render_finished, None);
            device.destroy_fence(slot.in_flight, None);
        }
        self.slots.clear();
    }
}

#[cfg(test)]
#[path = "vulkan_frame_sync_tests.rs"]
mod tests;
