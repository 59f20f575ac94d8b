/// VulkanPresenter - the Vulkan implementation of the FramePresenter seam
///
/// Owns the whole backend: instance, debug messenger, surface, device
/// context, swapchain generation, render target set, frame
/// synchronization ring, command buffers and the command recording
/// collaborator. The frame loop driver in the core crate sequences it.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use pulsar_3d_renderer::pulsar3d::render::{AcquireOutcome, Config, FramePresenter, PresentOutcome};
use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::{engine_bail, engine_err, engine_error, engine_info};

use crate::vulkan_context::GpuContext;
use crate::vulkan_debug::create_debug_messenger;
use crate::vulkan_device::DeviceContext;
use crate::vulkan_frame_sync::FrameRing;
use crate::vulkan_instance::create_instance;
use crate::vulkan_recorder::{CommandRecorder, RecordContext};
use crate::vulkan_render_targets::{find_depth_format, RenderTargetDesc, RenderTargetSet};
use crate::vulkan_swapchain::SwapchainState;

/// Scene description consumed by [`VulkanPresenter::install_scene`]
///
/// Vertex layout and descriptor set layouts come from the external
/// vertex-data collaborator; SPIR-V comes from the shader loader.
pub struct SceneDesc {
    pub vertex_spirv: Vec<u32>,
    pub fragment_spirv: Vec<u32>,
    pub vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    pub set_layouts: Vec<vk::DescriptorSetLayout>,
    /// Probe for a depth format and render with depth testing
    pub enable_depth: bool,
}

/// The Vulkan backend behind the frame loop
pub struct VulkanPresenter {
    frames_in_flight: usize,

    // Teardown is sequenced explicitly in Drop, not by field order.
    _entry: ash::Entry,
    instance: ash::Instance,
    debug: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,

    limits: vk::PhysicalDeviceLimits,
    physical_device: vk::PhysicalDevice,
    gpu: Arc<GpuContext>,

    swapchain: SwapchainState,
    ring: FrameRing,
    command_pool: vk::CommandPool,
    command_buffers: Vec<vk::CommandBuffer>,

    depth_format: Option<vk::Format>,
    render_targets: Option<RenderTargetSet>,
    scene: Option<SceneDesc>,
    recorder: Option<Box<dyn CommandRecorder>>,
}

impl VulkanPresenter {
    /// Bring up the backend: instance, surface, device, swapchain, ring
    ///
    /// # Arguments
    ///
    /// * `window` - surface provider (display + window handles)
    /// * `config` - validation toggle, app identity, frames in flight
    /// * `window_extent_hint` - current framebuffer size in pixels
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: &Config,
        window_extent_hint: (u32, u32),
    ) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to load Vulkan library: {:?}", e);
            Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
        })?;

        let display_handle = window.display_handle().map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to get display handle: {}", e);
            Error::InitializationFailed(format!("Failed to get display handle: {}", e))
        })?;
        let window_handle = window.window_handle().map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to get window handle: {}", e);
            Error::InitializationFailed(format!("Failed to get window handle: {}", e))
        })?;

        let instance = create_instance(&entry, config, display_handle.as_raw())?;

        let debug = if config.enable_validation {
            Some(create_debug_messenger(&entry, &instance)?)
        } else {
            None
        };

        let surface = unsafe {
            ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
        }
        .map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to create surface: {:?}", e);
            Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
        })?;

        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        let device_ctx = DeviceContext::create(&instance, &surface_loader, surface)?;

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device_ctx.device.clone(),
            physical_device: device_ctx.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to create GPU allocator: {:?}", e);
            Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
        })?;

        // One-shot uploads run on the transfer queue.
        let upload_pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(device_ctx.families.transfer)
            .flags(
                vk::CommandPoolCreateFlags::TRANSIENT
                    | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            );
        let upload_command_pool = unsafe {
            device_ctx.device.create_command_pool(&upload_pool_info, None)
        }
        .map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to create upload command pool: {:?}", e);
            Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e))
        })?;

        let gpu = Arc::new(GpuContext::new(
            device_ctx.device.clone(),
            Arc::new(Mutex::new(allocator)),
            device_ctx.graphics_queue,
            device_ctx.transfer_queue,
            device_ctx.present_queue,
            device_ctx.families,
            upload_command_pool,
        ));

        let swapchain = SwapchainState::create(
            &instance,
            &gpu.device,
            device_ctx.physical_device,
            &surface_loader,
            surface,
            &gpu.families,
            window_extent_hint,
        )?;

        let ring = FrameRing::new(&gpu.device, config.frames_in_flight)?;

        let command_pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(gpu.families.graphics);
        let command_pool = unsafe { gpu.device.create_command_pool(&command_pool_info, None) }
            .map_err(|e| {
                engine_error!("pulsar3d::vulkan", "Failed to create command pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
            })?;

        engine_info!(
            "pulsar3d::vulkan",
            "Presenter ready: {} frames in flight, {} swapchain images",
            config.frames_in_flight,
            swapchain.image_count()
        );

        Ok(Self {
            frames_in_flight: config.frames_in_flight,
            _entry: entry,
            instance,
            debug,
            surface_loader,
            surface,
            limits: device_ctx.limits,
            physical_device: device_ctx.physical_device,
            gpu,
            swapchain,
            ring,
            command_pool,
            command_buffers: Vec::new(),
            depth_format: None,
            render_targets: None,
            scene: None,
            recorder: None,
        })
    }

    /// Shared GPU context for resource creation
    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    /// Negotiated swapchain color format
    pub fn surface_format(&self) -> vk::Format {
        self.swapchain.format.format
    }

    /// Current swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent
    }

    /// Current swapchain image count
    pub fn image_count(&self) -> usize {
        self.swapchain.image_count()
    }

    /// Framebuffer count of the current generation (0 before a scene is
    /// installed)
    pub fn framebuffer_count(&self) -> usize {
        self.render_targets
            .as_ref()
            .map(|t| t.framebuffer_count())
            .unwrap_or(0)
    }

    /// Device limit for sampler anisotropy
    pub fn max_sampler_anisotropy(&self) -> f32 {
        self.limits.max_sampler_anisotropy
    }

    /// Install the scene and build the first render target generation
    ///
    /// Probes the depth format when the scene asks for depth, hands the
    /// recorder its first generation and records all command buffers.
    pub fn install_scene(
        &mut self,
        scene: SceneDesc,
        recorder: Box<dyn CommandRecorder>,
    ) -> Result<()> {
        if self.scene.is_some() {
            engine_bail!("pulsar3d::vulkan", "A scene is already installed");
        }

        self.depth_format = if scene.enable_depth {
            Some(find_depth_format(&self.instance, self.physical_device)?)
        } else {
            None
        };

        self.scene = Some(scene);
        self.recorder = Some(recorder);
        self.build_generation()
    }

    /// Build render targets + command buffers for the current swapchain
    fn build_generation(&mut self) -> Result<()> {
        let scene = self
            .scene
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("no scene installed".to_string()))?;
        let recorder = self
            .recorder
            .as_mut()
            .ok_or_else(|| Error::InvalidResource("no recorder installed".to_string()))?;

        recorder.on_generation(self.swapchain.image_count(), self.swapchain.extent)?;

        let targets = RenderTargetSet::build(
            &self.gpu,
            &RenderTargetDesc {
                color_format: self.swapchain.format.format,
                depth_format: self.depth_format,
                extent: self.swapchain.extent,
                image_views: &self.swapchain.image_views,
                vertex_spirv: &scene.vertex_spirv,
                fragment_spirv: &scene.fragment_spirv,
                vertex_bindings: &scene.vertex_bindings,
                vertex_attributes: &scene.vertex_attributes,
                set_layouts: &scene.set_layouts,
            },
        )?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(self.swapchain.image_count() as u32);

        self.command_buffers = unsafe { self.gpu.device.allocate_command_buffers(&alloc_info) }
            .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to allocate command buffers: {:?}", e))?;

        for (image_index, &command_buffer) in self.command_buffers.iter().enumerate() {
            let ctx = RecordContext {
                device: &self.gpu.device,
                render_pass: targets.render_pass,
                framebuffer: targets.framebuffers[image_index],
                pipeline: targets.pipeline,
                pipeline_layout: targets.pipeline_layout,
                extent: targets.extent,
                has_depth: self.depth_format.is_some(),
            };
            recorder.record(&ctx, command_buffer, image_index)?;
        }

        self.render_targets = Some(targets);
        Ok(())
    }

    /// Tear down the per-generation state in strict order: command
    /// buffers, render targets, swapchain
    ///
    /// # Safety
    ///
    /// The device must be idle.
    unsafe fn destroy_generation(&mut self) {
        if !self.command_buffers.is_empty() {
            self.gpu
                .device
                .free_command_buffers(self.command_pool, &self.command_buffers);
            self.command_buffers.clear();
        }
        if let Some(mut targets) = self.render_targets.take() {
            targets.destroy(&self.gpu);
        }
        self.swapchain.destroy(&self.gpu.device);
    }
}

impl FramePresenter for VulkanPresenter {
    fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    fn wait_frame(&mut self, slot: usize) -> Result<()> {
        let fence = self.ring.slot(slot).in_flight;
        unsafe {
            self.gpu
                .device
                .wait_for_fences(&[fence], true, u64::MAX)
                .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to wait for frame fence: {:?}", e))
        }
    }

    fn acquire_image(&mut self, slot: usize) -> Result<AcquireOutcome> {
        let semaphore = self.ring.slot(slot).image_available;
        self.swapchain.acquire(semaphore)
    }

    fn submit_frame(&mut self, slot: usize, image_index: u32) -> Result<()> {
        if image_index as usize >= self.command_buffers.len() {
            engine_bail!(
                "pulsar3d::vulkan",
                "Image index {} out of range ({} command buffers)",
                image_index,
                self.command_buffers.len()
            );
        }

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.prepare_frame(image_index as usize, self.swapchain.extent)?;
        }

        let frame = self.ring.slot(slot);
        let wait_semaphores = [frame.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [frame.render_finished];
        let command_buffers = [self.command_buffers[image_index as usize]];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            // The fence is reset only here, right before the submission
            // that will signal it again. An iteration abandoned earlier
            // leaves the slot's fence signaled and re-waitable.
            self.gpu
                .device
                .reset_fences(&[frame.in_flight])
                .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to reset frame fence: {:?}", e))?;

            self.gpu
                .device
                .queue_submit(self.gpu.graphics_queue, &[submit_info], frame.in_flight)
                .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to submit frame: {:?}", e))
        }
    }

    fn present_frame(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome> {
        let wait_semaphore = self.ring.slot(slot).render_finished;
        self.swapchain
            .present(self.gpu.present_queue, image_index, wait_semaphore)
    }

    fn rebuild_targets(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe {
            self.gpu
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to wait idle before rebuild: {:?}", e))?;

            self.destroy_generation();
        }

        self.swapchain = SwapchainState::create(
            &self.instance,
            &self.gpu.device,
            self.physical_device,
            &self.surface_loader,
            self.surface,
            &self.gpu.families,
            (width, height),
        )?;

        if self.scene.is_some() {
            self.build_generation()?;
        }

        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.gpu
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("pulsar3d::vulkan", "Failed to wait for device idle: {:?}", e))
        }
    }
}

impl Drop for VulkanPresenter {
    fn drop(&mut self) {
        unsafe {
            self.gpu.device.device_wait_idle().ok();

            // Per-generation state first (command buffers, render
            // targets, swapchain views and chain).
            self.destroy_generation();

            // Scene resources: buffers/images/samplers, then descriptor
            // pool/layout, via the recorder's own drop order.
            self.recorder = None;
            self.scene = None;

            // Synchronization ring, then the command pools.
            self.ring.destroy(&self.gpu.device);
            self.gpu.device.destroy_command_pool(self.command_pool, None);
            {
                let mut pool = self.gpu.upload_command_pool.lock().unwrap();
                if *pool != vk::CommandPool::null() {
                    self.gpu.device.destroy_command_pool(*pool, None);
                    *pool = vk::CommandPool::null();
                }
            }

            // Free allocator pages before the device goes away.
            if let Some(ctx) = Arc::get_mut(&mut self.gpu) {
                ManuallyDrop::drop(&mut ctx.allocator);
            }

            // Device, debug messenger, surface, instance.
            self.gpu.device.destroy_device(None);
            if let Some((loader, messenger)) = self.debug.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
    }
}
