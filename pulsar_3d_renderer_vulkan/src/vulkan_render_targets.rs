/// Render Target Set - render pass, pipeline and framebuffers for one
/// swapchain generation
///
/// Everything here is tied 1:1 to a set of swapchain image views and is
/// torn down and rebuilt with the chain. Teardown order is strict and the
/// exact inverse of creation: framebuffers, pipeline, pipeline layout,
/// render pass, depth buffers. Violating it is undefined behavior on the
/// device.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_shader::create_shader_module;

/// Depth formats probed in descending preference order
const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// First candidate whose optimal-tiling features include depth-stencil
/// attachment usage
fn first_supported_depth_format<F>(candidates: &[vk::Format], query: F) -> Result<vk::Format>
where
    F: Fn(vk::Format) -> vk::FormatFeatureFlags,
{
    candidates
        .iter()
        .copied()
        .find(|&format| {
            query(format).contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
        .ok_or_else(|| {
            engine_error!("pulsar3d::vulkan", "No supported depth attachment format");
            Error::NoSupportedFormat("no depth attachment format supported".to_string())
        })
}

/// Probe the device for a usable depth attachment format
pub fn find_depth_format(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<vk::Format> {
    first_supported_depth_format(&DEPTH_FORMAT_CANDIDATES, |format| {
        unsafe { instance.get_physical_device_format_properties(physical_device, format) }
            .optimal_tiling_features
    })
}

/// Whether the format carries a stencil aspect
fn has_stencil_component(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT
    )
}

/// Everything needed to build one render target generation
pub struct RenderTargetDesc<'a> {
    /// Swapchain color format
    pub color_format: vk::Format,
    /// Depth attachment format, None to render without depth
    pub depth_format: Option<vk::Format>,
    /// Current swapchain extent
    pub extent: vk::Extent2D,
    /// One color view per swapchain image
    pub image_views: &'a [vk::ImageView],
    /// Vertex stage SPIR-V
    pub vertex_spirv: &'a [u32],
    /// Fragment stage SPIR-V
    pub fragment_spirv: &'a [u32],
    /// Vertex input bindings, supplied by the vertex-data collaborator
    pub vertex_bindings: &'a [vk::VertexInputBindingDescription],
    /// Vertex input attributes
    pub vertex_attributes: &'a [vk::VertexInputAttributeDescription],
    /// Descriptor set layouts for the pipeline layout
    pub set_layouts: &'a [vk::DescriptorSetLayout],
}

/// One per-image depth attachment
struct DepthBuffer {
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

/// Render pass, pipeline and framebuffers for one swapchain generation
pub struct RenderTargetSet {
    pub render_pass: vk::RenderPass,
    pub pipeline_layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
    depth_buffers: Vec<DepthBuffer>,
    pub framebuffers: Vec<vk::Framebuffer>,
    pub extent: vk::Extent2D,
}

impl RenderTargetSet {
    /// Build the full set for the given swapchain generation
    ///
    /// Framebuffer count equals `desc.image_views.len()`; when depth is
    /// requested, the matching depth view is attached at the same index.
    pub fn build(ctx: &Arc<GpuContext>, desc: &RenderTargetDesc<'_>) -> Result<Self> {
        let device = &ctx.device;

        let render_pass = create_render_pass(device, desc.color_format, desc.depth_format)?;

        let depth_buffers = match desc.depth_format {
            Some(format) => create_depth_buffers(ctx, format, desc.extent, desc.image_views.len())?,
            None => Vec::new(),
        };

        let (pipeline_layout, pipeline) = create_pipeline(device, render_pass, desc)?;

        let mut framebuffers = Vec::with_capacity(desc.image_views.len());
        for (i, &view) in desc.image_views.iter().enumerate() {
            let mut attachments = vec![view];
            if let Some(depth) = depth_buffers.get(i) {
                attachments.push(depth.view);
            }

            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass)
                .attachments(&attachments)
                .width(desc.extent.width)
                .height(desc.extent.height)
                .layers(1);

            let framebuffer = unsafe { device.create_framebuffer(&framebuffer_info, None) }
                .map_err(|e| {
                    engine_err!("pulsar3d::vulkan", "Failed to create framebuffer {}: {:?}", i, e)
                })?;
            framebuffers.push(framebuffer);
        }

        Ok(Self {
            render_pass,
            pipeline_layout,
            pipeline,
            depth_buffers,
            framebuffers,
            extent: desc.extent,
        })
    }

    /// Number of framebuffers in this generation
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Tear down in strict inverse-creation order
    ///
    /// # Safety
    ///
    /// The device must be idle; no submission may still reference this
    /// generation.
    pub unsafe fn destroy(&mut self, ctx: &GpuContext) {
        let device = &ctx.device;

        for &framebuffer in &self.framebuffers {
            device.destroy_framebuffer(framebuffer, None);
        }
        self.framebuffers.clear();

        device.destroy_pipeline(self.pipeline, None);
        device.destroy_pipeline_layout(self.pipeline_layout, None);
        device.destroy_render_pass(self.render_pass, None);

        for depth in &mut self.depth_buffers {
            device.destroy_image_view(depth.view, None);
            device.destroy_image(depth.image, None);
            if let Some(allocation) = depth.allocation.take() {
                if let Ok(mut allocator) = ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
        }
        self.depth_buffers.clear();
    }
}

/// One color attachment (clear/store, ends presentable), an optional
/// depth attachment (clear/discard), a single subpass and one
/// external dependency gating color-attachment output
fn create_render_pass(
    device: &ash::Device,
    color_format: vk::Format,
    depth_format: Option<vk::Format>,
) -> Result<vk::RenderPass> {
    let mut attachments = vec![vk::AttachmentDescription::default()
        .format(color_format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)];

    let color_ref = vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

    let depth_ref = depth_format.map(|format| {
        attachments.push(
            vk::AttachmentDescription::default()
                .format(format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        );
        vk::AttachmentReference::default()
            .attachment(1)
            .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
    });

    let color_refs = [color_ref];
    let mut subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs);
    if let Some(ref depth_ref) = depth_ref {
        subpass = subpass.depth_stencil_attachment(depth_ref);
    }

    // Keep the GPU from writing the attachment before the presentation
    // engine has released the image.
    let (stage_mask, access_mask) = if depth_ref.is_some() {
        (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )
    } else {
        (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        )
    };

    let dependency = vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(stage_mask)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(stage_mask)
        .dst_access_mask(access_mask);

    let render_pass_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(std::slice::from_ref(&subpass))
        .dependencies(std::slice::from_ref(&dependency));

    unsafe { device.create_render_pass(&render_pass_info, None) }
        .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to create render pass: {:?}", e))
}

/// One depth image + view per swapchain image
fn create_depth_buffers(
    ctx: &Arc<GpuContext>,
    format: vk::Format,
    extent: vk::Extent2D,
    count: usize,
) -> Result<Vec<DepthBuffer>> {
    let device = &ctx.device;
    let mut buffers = Vec::with_capacity(count);

    for _ in 0..count {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .samples(vk::SampleCountFlags::TYPE_1)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let image = unsafe { device.create_image(&image_info, None) }
            .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to create depth image: {:?}", e))?;

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let allocation = ctx
            .allocator
            .lock()
            .map_err(|_| engine_err!("pulsar3d::vulkan", "Allocator lock poisoned"))?
            .allocate(&AllocationCreateDesc {
                name: "depth buffer",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|_| {
                engine_error!("pulsar3d::vulkan", "Out of GPU memory for depth buffer");
                Error::OutOfMemory
            })?;

        unsafe { device.bind_image_memory(image, allocation.memory(), allocation.offset()) }
            .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to bind depth image memory: {:?}", e))?;

        let mut aspect = vk::ImageAspectFlags::DEPTH;
        if has_stencil_component(format) {
            aspect |= vk::ImageAspectFlags::STENCIL;
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = unsafe { device.create_image_view(&view_info, None) }
            .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to create depth image view: {:?}", e))?;

        buffers.push(DepthBuffer {
            image,
            view,
            allocation: Some(allocation),
        });
    }

    Ok(buffers)
}

/// The fixed-function + shader graphics pipeline
///
/// Triangle list, one viewport/scissor pair sized to the extent,
/// back-face culling with counter-clockwise front face, no multisampling,
/// depth test/write with LESS when a depth attachment exists, one color
/// blend attachment with blending disabled (equation fields populated but
/// inert), no dynamic state.
fn create_pipeline(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    desc: &RenderTargetDesc<'_>,
) -> Result<(vk::PipelineLayout, vk::Pipeline)> {
    let vertex_module = create_shader_module(device, desc.vertex_spirv)?;
    let fragment_module = match create_shader_module(device, desc.fragment_spirv) {
        Ok(module) => module,
        Err(e) => {
            unsafe { device.destroy_shader_module(vertex_module, None) };
            return Err(e);
        }
    };

    let stages = [
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex_module)
            .name(c"main"),
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(fragment_module)
            .name(c"main"),
    ];

    let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
        .vertex_binding_descriptions(desc.vertex_bindings)
        .vertex_attribute_descriptions(desc.vertex_attributes);

    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
        .primitive_restart_enable(false);

    let viewports = [vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: desc.extent.width as f32,
        height: desc.extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }];
    let scissors = [vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent: desc.extent,
    }];
    let viewport_state = vk::PipelineViewportStateCreateInfo::default()
        .viewports(&viewports)
        .scissors(&scissors);

    let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .depth_bias_enable(false);

    let multisample = vk::PipelineMultisampleStateCreateInfo::default()
        .sample_shading_enable(false)
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
        .depth_test_enable(desc.depth_format.is_some())
        .depth_write_enable(desc.depth_format.is_some())
        .depth_compare_op(vk::CompareOp::LESS)
        .depth_bounds_test_enable(false)
        .stencil_test_enable(false);

    // Blending disabled; the equation fields are set but inert.
    let blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
        .color_write_mask(vk::ColorComponentFlags::RGBA)
        .blend_enable(false)
        .src_color_blend_factor(vk::BlendFactor::ONE)
        .dst_color_blend_factor(vk::BlendFactor::ZERO)
        .color_blend_op(vk::BlendOp::ADD)
        .src_alpha_blend_factor(vk::BlendFactor::ONE)
        .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
        .alpha_blend_op(vk::BlendOp::ADD)];
    let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
        .logic_op_enable(false)
        .attachments(&blend_attachments);

    let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(desc.set_layouts);
    let pipeline_layout = unsafe { device.create_pipeline_layout(&layout_info, None) }
        .map_err(|e| {
            unsafe {
                device.destroy_shader_module(fragment_module, None);
                device.destroy_shader_module(vertex_module, None);
            }
            engine_err!("pulsar3d::vulkan", "Failed to create pipeline layout: {:?}", e)
        })?;

    let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&stages)
        .vertex_input_state(&vertex_input)
        .input_assembly_state(&input_assembly)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization)
        .multisample_state(&multisample)
        .depth_stencil_state(&depth_stencil)
        .color_blend_state(&color_blend)
        .layout(pipeline_layout)
        .render_pass(render_pass)
        .subpass(0);

    let pipeline_result = unsafe {
        device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
    };

    // Modules are only needed for pipeline creation.
    unsafe {
        device.destroy_shader_module(fragment_module, None);
        device.destroy_shader_module(vertex_module, None);
    }

    let pipeline = pipeline_result
        .map_err(|(_, e)| {
            unsafe { device.destroy_pipeline_layout(pipeline_layout, None) };
            engine_err!("pulsar3d::vulkan", "Failed to create graphics pipeline: {:?}", e)
        })?[0];

    Ok((pipeline_layout, pipeline))
}

#[cfg(test)]
#[path = "vulkan_render_targets_tests.rs"]
mod tests;
