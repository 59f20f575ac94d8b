/// GpuContext - shared GPU resources for all Vulkan objects
///
/// Contains everything resource types need to allocate, upload and free:
/// the device, the memory allocator, the resolved queues and a reusable
/// command pool for one-shot transfer work.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use pulsar_3d_renderer::pulsar3d::Result;
use pulsar_3d_renderer::engine_err;

use crate::vulkan_device::ResolvedQueueFamilies;

/// Shared GPU context, handed out as `Arc<GpuContext>` to every resource
/// (buffers, textures, descriptor pools) so each can free itself on drop.
///
/// Device and instance destruction is handled by `VulkanPresenter::drop()`,
/// which controls the full teardown order; this struct destroys nothing.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, mutex for &self access)
    /// ManuallyDrop so it can be released explicitly before the device
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue
    pub graphics_queue: vk::Queue,

    /// Transfer queue (aliases the graphics queue when no dedicated
    /// transfer family exists)
    pub transfer_queue: vk::Queue,

    /// Present queue (may alias the graphics queue)
    pub present_queue: vk::Queue,

    /// Resolved queue family indices
    pub families: ResolvedQueueFamilies,

    /// Transient command pool on the transfer family for one-shot uploads
    pub upload_command_pool: Mutex<vk::CommandPool>,
}

impl GpuContext {
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        graphics_queue: vk::Queue,
        transfer_queue: vk::Queue,
        present_queue: vk::Queue,
        families: ResolvedQueueFamilies,
        upload_command_pool: vk::CommandPool,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            graphics_queue,
            transfer_queue,
            present_queue,
            families,
            upload_command_pool: Mutex::new(upload_command_pool),
        }
    }

    /// Record and run a one-shot command buffer on the transfer queue,
    /// blocking until the queue is idle
    ///
    /// Used by setup-time upload helpers (staging copies, image layout
    /// transitions), never by the steady-state frame loop.
    pub fn execute_one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        unsafe {
            let pool = *self
                .upload_command_pool
                .lock()
                .map_err(|_| engine_err!("pulsar3d::vulkan", "Upload command pool lock poisoned"))?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = self
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to allocate one-shot command buffer: {:?}", e))?[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to begin one-shot command buffer: {:?}", e))?;

            record(command_buffer);

            self.device
                .end_command_buffer(command_buffer)
                .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to end one-shot command buffer: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let result = self
                .device
                .queue_submit(self.transfer_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to submit one-shot command buffer: {:?}", e))
                .and_then(|_| {
                    self.device
                        .queue_wait_idle(self.transfer_queue)
                        .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to wait for transfer queue: {:?}", e))
                });

            self.device.free_command_buffers(pool, &command_buffers);

            result
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        // Teardown is sequenced by VulkanPresenter::drop(); nothing here.
    }
}
