/// Swapchain Manager - presentable image chain for one surface generation
///
/// Owns the chain, its images and one color view per image. The whole
/// state is destroyed and recreated wholesale whenever the surface
/// becomes incompatible (resize) or the presentation engine reports the
/// chain stale; render targets only borrow one generation's views.

use ash::vk;

use pulsar_3d_renderer::pulsar3d::render::{
    AcquireOutcome, PresentOutcome, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH,
};
use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::{engine_err, engine_error, engine_info};

use crate::vulkan_device::ResolvedQueueFamilies;

/// Surface format chosen outright when the surface accepts any format,
/// and preferred whenever it is offered
const PREFERRED_SURFACE_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Prefer the 8-bit BGRA / sRGB-nonlinear pair; otherwise take the first
/// supported format. A single `UNDEFINED` entry means "any format".
fn choose_surface_format(available: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    if available.len() == 1 && available[0].format == vk::Format::UNDEFINED {
        return PREFERRED_SURFACE_FORMAT;
    }

    available
        .iter()
        .find(|f| {
            f.format == PREFERRED_SURFACE_FORMAT.format
                && f.color_space == PREFERRED_SURFACE_FORMAT.color_space
        })
        .copied()
        .unwrap_or(available[0])
}

/// Mailbox over immediate over the always-available FIFO
fn choose_present_mode(available: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if available.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else if available.contains(&vk::PresentModeKHR::IMMEDIATE) {
        vk::PresentModeKHR::IMMEDIATE
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// A fixed `current_extent` is taken verbatim; the `u32::MAX` sentinel
/// means the window decides, with the framebuffer size clamped into the
/// surface bounds. A zero framebuffer dimension (minimized window) falls
/// back to the default window size before clamping.
fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer: (u32, u32),
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let (mut width, mut height) = framebuffer;
    if width == 0 {
        width = DEFAULT_WINDOW_WIDTH;
    }
    if height == 0 {
        height = DEFAULT_WINDOW_HEIGHT;
    }

    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One above the minimum, clamped by the maximum when it is bounded
/// (a zero maximum means unbounded)
fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// Swapchain state for one generation
pub struct SwapchainState {
    loader: ash::khr::swapchain::Device,
    chain: vk::SwapchainKHR,
    /// Negotiated format and color space
    pub format: vk::SurfaceFormatKHR,
    /// Negotiated present mode
    pub present_mode: vk::PresentModeKHR,
    /// Negotiated extent
    pub extent: vk::Extent2D,
    /// Presentable images, owned by the chain
    pub images: Vec<vk::Image>,
    /// One 2D color view per image
    pub image_views: Vec<vk::ImageView>,
}

impl SwapchainState {
    /// Negotiate and create a fresh chain
    ///
    /// # Arguments
    ///
    /// * `window_extent_hint` - current framebuffer size, used only when
    ///   the surface does not fix the extent itself
    ///
    /// Failure here is fatal: there is no recovery path for swapchain
    /// creation itself (staleness of an existing chain is recoverable
    /// and handled by the frame loop).
    pub fn create(
        instance: &ash::Instance,
        device: &ash::Device,
        physical_device: vk::PhysicalDevice,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        families: &ResolvedQueueFamilies,
        window_extent_hint: (u32, u32),
    ) -> Result<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)
        }
        .map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to get surface capabilities: {:?}", e);
            Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
        })?;

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)
        }
        .map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to get surface formats: {:?}", e);
            Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
        })?;
        if formats.is_empty() {
            engine_error!("pulsar3d::vulkan", "Surface reports no formats");
            return Err(Error::NoSupportedFormat("surface reports no formats".to_string()));
        }

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)
        }
        .map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to get present modes: {:?}", e);
            Error::InitializationFailed(format!("Failed to get present modes: {:?}", e))
        })?;

        let format = choose_surface_format(&formats);
        let present_mode = choose_present_mode(&present_modes);
        let extent = choose_extent(&capabilities, window_extent_hint);
        let image_count = choose_image_count(&capabilities);

        engine_info!(
            "pulsar3d::vulkan",
            "Creating swapchain: {}x{}, {:?} / {:?}, {:?}, {} images",
            extent.width,
            extent.height,
            format.format,
            format.color_space,
            present_mode,
            image_count
        );

        let mut create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        // Concurrent sharing only when graphics and present are distinct
        // families; exclusive otherwise.
        let shared_families = [families.graphics, families.present];
        if families.graphics != families.present {
            create_info = create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&shared_families);
        } else {
            create_info = create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE);
        }

        let loader = ash::khr::swapchain::Device::new(instance, device);
        let chain = unsafe { loader.create_swapchain(&create_info, None) }.map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to create swapchain: {:?}", e);
            Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
        })?;

        let images = unsafe { loader.get_swapchain_images(chain) }.map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to get swapchain images: {:?}", e);
            Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
        })?;

        let mut image_views = Vec::with_capacity(images.len());
        for &image in &images {
            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe { device.create_image_view(&view_info, None) }.map_err(|e| {
                engine_error!("pulsar3d::vulkan", "Failed to create swapchain image view: {:?}", e);
                Error::InitializationFailed(format!("Failed to create image view: {:?}", e))
            })?;
            image_views.push(view);
        }

        Ok(Self {
            loader,
            chain,
            format,
            present_mode,
            extent,
            images,
            image_views,
        })
    }

    /// Number of presentable images in this generation
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Request the next presentable image, signaling `semaphore` when it
    /// becomes available
    pub fn acquire(&mut self, semaphore: vk::Semaphore) -> Result<AcquireOutcome> {
        match unsafe {
            self.loader
                .acquire_next_image(self.chain, u64::MAX, semaphore, vk::Fence::null())
        } {
            Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Acquired { image_index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
            Err(e) => Err(engine_err!(
                "pulsar3d::vulkan",
                "Failed to acquire next swapchain image: {:?}",
                e
            )),
        }
    }

    /// Queue `image_index` for presentation, waiting on `wait_semaphore`
    pub fn present(
        &mut self,
        present_queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> Result<PresentOutcome> {
        let wait_semaphores = [wait_semaphore];
        let swapchains = [self.chain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.loader.queue_present(present_queue, &present_info) } {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) => Ok(PresentOutcome::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::OutOfDate),
            Err(e) => Err(engine_err!(
                "pulsar3d::vulkan",
                "Failed to present swapchain image: {:?}",
                e
            )),
        }
    }

    /// Release image views, then the chain
    ///
    /// Must run before a re-`create`, with the device already drained.
    ///
    /// # Safety
    ///
    /// No GPU work may still reference this generation.
    pub unsafe fn destroy(&mut self, device: &ash::Device) {
        for &view in &self.image_views {
            device.destroy_image_view(view, None);
        }
        self.image_views.clear();
        self.loader.destroy_swapchain(self.chain, None);
        self.chain = vk::SwapchainKHR::null();
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
