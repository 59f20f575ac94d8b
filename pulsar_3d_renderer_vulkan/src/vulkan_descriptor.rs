/// Descriptor machinery for the fixed scene binding shape
///
/// One layout: a uniform buffer at binding 0 (vertex stage) and a
/// combined image sampler at binding 1 (fragment stage). The layout lives
/// for the whole session; the pool and sets are regenerated with every
/// swapchain generation because their count follows the image count.

use ash::vk;
use std::sync::Arc;

use pulsar_3d_renderer::pulsar3d::Result;
use pulsar_3d_renderer::{engine_bail, engine_err};

use crate::vulkan_buffer::GpuBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_texture::GpuTexture;

/// Session-lifetime descriptor set layout (UBO + combined image sampler)
pub struct SceneSetLayout {
    ctx: Arc<GpuContext>,
    pub layout: vk::DescriptorSetLayout,
}

impl SceneSetLayout {
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let bindings = [
            vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX),
            vk::DescriptorSetLayoutBinding::default()
                .binding(1)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT),
        ];

        let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

        let layout = unsafe { ctx.device.create_descriptor_set_layout(&layout_info, None) }
            .map_err(|e| {
                engine_err!("pulsar3d::vulkan", "Failed to create descriptor set layout: {:?}", e)
            })?;

        Ok(Self { ctx, layout })
    }
}

impl Drop for SceneSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx
                .device
                .destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Per-generation descriptor pool and sets, one set per swapchain image
pub struct SceneDescriptorSets {
    ctx: Arc<GpuContext>,
    pool: vk::DescriptorPool,
    pub sets: Vec<vk::DescriptorSet>,
}

impl SceneDescriptorSets {
    /// Allocate and write one set per uniform buffer, all sampling the
    /// same texture
    pub fn new(
        ctx: Arc<GpuContext>,
        layout: &SceneSetLayout,
        uniforms: &[GpuBuffer],
        texture: &GpuTexture,
    ) -> Result<Self> {
        if uniforms.is_empty() {
            engine_bail!("pulsar3d::vulkan", "Descriptor sets requested for zero uniform buffers");
        }
        let count = uniforms.len() as u32;

        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: count,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: count,
            },
        ];

        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(count);

        let pool = unsafe { ctx.device.create_descriptor_pool(&pool_info, None) }
            .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to create descriptor pool: {:?}", e))?;

        let layouts = vec![layout.layout; uniforms.len()];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);

        let sets = unsafe { ctx.device.allocate_descriptor_sets(&alloc_info) }.map_err(|e| {
            unsafe { ctx.device.destroy_descriptor_pool(pool, None) };
            engine_err!("pulsar3d::vulkan", "Failed to allocate descriptor sets: {:?}", e)
        })?;

        for (set, uniform) in sets.iter().zip(uniforms) {
            let buffer_info = [vk::DescriptorBufferInfo::default()
                .buffer(uniform.buffer)
                .offset(0)
                .range(uniform.size)];

            let image_info = [vk::DescriptorImageInfo::default()
                .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .image_view(texture.view)
                .sampler(texture.sampler)];

            let writes = [
                vk::WriteDescriptorSet::default()
                    .dst_set(*set)
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&buffer_info),
                vk::WriteDescriptorSet::default()
                    .dst_set(*set)
                    .dst_binding(1)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(&image_info),
            ];

            unsafe { ctx.device.update_descriptor_sets(&writes, &[]) };
        }

        Ok(Self { ctx, pool, sets })
    }
}

impl Drop for SceneDescriptorSets {
    fn drop(&mut self) {
        unsafe {
            // Frees the sets with it.
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}
