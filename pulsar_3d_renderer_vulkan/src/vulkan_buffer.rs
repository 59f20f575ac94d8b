/// GPU buffer with staging upload
///
/// Device-local buffers are filled through a transient staging buffer and
/// a one-shot copy on the transfer queue (create staging, copy, wait the
/// queue idle, destroy staging). Host-visible buffers stay mapped for
/// direct per-frame writes.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::{engine_bail, engine_err, engine_error};

use crate::vulkan_context::GpuContext;

/// A Vulkan buffer and its memory allocation
pub struct GpuBuffer {
    ctx: Arc<GpuContext>,
    pub buffer: vk::Buffer,
    allocation: Option<Allocation>,
    pub size: u64,
}

fn create_raw(
    ctx: &Arc<GpuContext>,
    size: u64,
    usage: vk::BufferUsageFlags,
    location: MemoryLocation,
    name: &str,
) -> Result<(vk::Buffer, Allocation)> {
    let device = &ctx.device;

    let buffer_info = vk::BufferCreateInfo::default()
        .size(size)
        .usage(usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);

    let buffer = unsafe { device.create_buffer(&buffer_info, None) }.map_err(|e| {
        engine_err!("pulsar3d::vulkan", "Failed to create buffer of {} bytes: {:?}", size, e)
    })?;

    let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

    let allocation = ctx
        .allocator
        .lock()
        .map_err(|_| engine_err!("pulsar3d::vulkan", "Allocator lock poisoned"))?
        .allocate(&AllocationCreateDesc {
            name,
            requirements,
            location,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })
        .map_err(|_| {
            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
            engine_error!("pulsar3d::vulkan", "Out of GPU memory for buffer ({:.2} MB)", size_mb);
            unsafe { device.destroy_buffer(buffer, None) };
            Error::OutOfMemory
        })?;

    unsafe { device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) }
        .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to bind buffer memory: {:?}", e))?;

    Ok((buffer, allocation))
}

impl GpuBuffer {
    /// Create a host-visible buffer, mapped for direct writes
    ///
    /// Used for per-frame uniform data.
    pub fn host_visible(
        ctx: Arc<GpuContext>,
        size: u64,
        usage: vk::BufferUsageFlags,
    ) -> Result<Self> {
        let (buffer, allocation) = create_raw(&ctx, size, usage, MemoryLocation::CpuToGpu, "host buffer")?;
        Ok(Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
        })
    }

    /// Create a device-local buffer filled from `data` via staging
    ///
    /// Used for vertex and index data uploaded once at setup time.
    pub fn device_local(
        ctx: Arc<GpuContext>,
        usage: vk::BufferUsageFlags,
        data: &[u8],
    ) -> Result<Self> {
        let size = data.len() as u64;

        let staging = Self::host_visible(
            ctx.clone(),
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
        )?;
        staging.write(0, data)?;

        let (buffer, allocation) = create_raw(
            &ctx,
            size,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            MemoryLocation::GpuOnly,
            "device buffer",
        )?;

        ctx.execute_one_shot(|command_buffer| {
            let region = vk::BufferCopy::default().size(size);
            unsafe {
                ctx.device
                    .cmd_copy_buffer(command_buffer, staging.buffer, buffer, &[region]);
            }
        })?;

        // Staging drops here, after the transfer queue went idle.
        Ok(Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
        })
    }

    /// Write into the mapped memory of a host-visible buffer
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            engine_bail!(
                "pulsar3d::vulkan",
                "Buffer write out of range: {} + {} > {}",
                offset,
                data.len(),
                self.size
            );
        }

        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("buffer has no allocation".to_string()))?;

        let mapped = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::InvalidResource("buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.add(offset as usize), data.len());
        }

        Ok(())
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
