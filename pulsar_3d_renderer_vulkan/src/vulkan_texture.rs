/// Sampled 2D texture with staging upload
///
/// Pixels go through a staging buffer into a device-local image with two
/// layout transitions around the copy: undefined to transfer-dst, then
/// transfer-dst to shader-read. The upload is synchronized by the
/// one-shot command buffer's transfer-queue idle wait.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::{engine_bail, engine_err, engine_error};

use crate::vulkan_buffer::GpuBuffer;
use crate::vulkan_context::GpuContext;

/// A sampled 2D RGBA8 texture
pub struct GpuTexture {
    ctx: Arc<GpuContext>,
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub sampler: vk::Sampler,
    allocation: Option<Allocation>,
    pub width: u32,
    pub height: u32,
}

impl GpuTexture {
    /// Upload decoded RGBA8 pixels into a sampled texture
    ///
    /// # Arguments
    ///
    /// * `pixels` - `width * height * 4` bytes, row-major RGBA
    /// * `max_anisotropy` - device limit for the sampler
    pub fn from_rgba8(
        ctx: Arc<GpuContext>,
        width: u32,
        height: u32,
        pixels: &[u8],
        max_anisotropy: f32,
    ) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            engine_bail!(
                "pulsar3d::vulkan",
                "Texture data size mismatch: {} bytes for {}x{} RGBA",
                pixels.len(),
                width,
                height
            );
        }

        let device = &ctx.device;
        let format = vk::Format::R8G8B8A8_SRGB;

        let staging = GpuBuffer::host_visible(
            ctx.clone(),
            pixels.len() as u64,
            vk::BufferUsageFlags::TRANSFER_SRC,
        )?;
        staging.write(0, pixels)?;

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D { width, height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .samples(vk::SampleCountFlags::TYPE_1)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let image = unsafe { device.create_image(&image_info, None) }
            .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to create texture image: {:?}", e))?;

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let allocation = ctx
            .allocator
            .lock()
            .map_err(|_| engine_err!("pulsar3d::vulkan", "Allocator lock poisoned"))?
            .allocate(&AllocationCreateDesc {
                name: "texture",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|_| {
                engine_error!("pulsar3d::vulkan", "Out of GPU memory for texture");
                Error::OutOfMemory
            })?;

        unsafe { device.bind_image_memory(image, allocation.memory(), allocation.offset()) }
            .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to bind texture memory: {:?}", e))?;

        let subresource_range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };

        ctx.execute_one_shot(|command_buffer| unsafe {
            // undefined -> transfer-dst
            let to_transfer = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(subresource_range)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);

            ctx.device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            let region = vk::BufferImageCopy::default()
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_extent(vk::Extent3D { width, height, depth: 1 });

            ctx.device.cmd_copy_buffer_to_image(
                command_buffer,
                staging.buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            // transfer-dst -> shader-read
            let to_shader = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(subresource_range)
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ);

            ctx.device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_shader],
            );
        })?;

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(subresource_range);

        let view = unsafe { device.create_image_view(&view_info, None) }
            .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to create texture view: {:?}", e))?;

        let sampler_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(true)
            .max_anisotropy(max_anisotropy)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR);

        let sampler = unsafe { device.create_sampler(&sampler_info, None) }
            .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to create sampler: {:?}", e))?;

        Ok(Self {
            ctx,
            image,
            view,
            sampler,
            allocation: Some(allocation),
            width,
            height,
        })
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
            self.ctx.device.destroy_image_view(self.view, None);
            self.ctx.device.destroy_image(self.image, None);
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
        }
    }
}
