/// Device Context - physical device selection and logical device creation
///
/// Selection is first-suitable in enumeration order, no scoring: a device
/// qualifies when its queue families cover graphics and present, the
/// required device extensions are offered, the required features are
/// supported, and the surface exposes at least one format and one present
/// mode. Each candidate is reported the same way the instance support
/// check reports extensions.

use ash::vk;
use std::collections::BTreeSet;
use std::ffi::CStr;

use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::{engine_debug, engine_error, engine_info};

/// Device extensions every candidate must offer
pub const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 1] = [ash::khr::swapchain::NAME];

/// Queue family indices discovered for one physical device
///
/// Graphics and present must both resolve before a logical device can be
/// created; a dedicated transfer family is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// First family with graphics support
    pub graphics: Option<u32>,
    /// First family with transfer support but no graphics (dedicated)
    pub transfer: Option<u32>,
    /// First family able to present to the surface
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Whether the mandatory roles are covered
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// Resolve into concrete indices, aliasing transfer onto graphics
    /// when no dedicated transfer family exists
    pub fn resolve(&self) -> Option<ResolvedQueueFamilies> {
        let graphics = self.graphics?;
        let present = self.present?;
        Some(ResolvedQueueFamilies {
            graphics,
            transfer: self.transfer.unwrap_or(graphics),
            present,
        })
    }
}

/// Fully resolved queue family indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedQueueFamilies {
    pub graphics: u32,
    pub transfer: u32,
    pub present: u32,
}

impl ResolvedQueueFamilies {
    /// Distinct family indices, deduplicated and ordered
    ///
    /// One `DeviceQueueCreateInfo` is built per entry.
    pub fn unique_indices(&self) -> BTreeSet<u32> {
        BTreeSet::from([self.graphics, self.transfer, self.present])
    }
}

/// Everything the suitability predicate needs to know about one candidate
#[derive(Debug, Clone)]
pub struct DeviceSuitability {
    /// Device name, for the selection report
    pub name: String,
    /// Discovered queue families
    pub families: QueueFamilyIndices,
    /// Required device extensions the candidate does NOT offer
    pub missing_extensions: Vec<String>,
    /// Whether the required features (sampler anisotropy) are supported
    pub has_required_features: bool,
    /// Whether the surface reports at least one format for this device
    pub has_surface_formats: bool,
    /// Whether the surface reports at least one present mode
    pub has_present_modes: bool,
}

impl DeviceSuitability {
    /// The suitability predicate
    pub fn is_suitable(&self) -> bool {
        self.families.is_complete()
            && self.missing_extensions.is_empty()
            && self.has_required_features
            && self.has_surface_formats
            && self.has_present_modes
    }
}

/// First suitable candidate in enumeration order
///
/// # Errors
///
/// [`Error::NoSuitableDevice`] when the list is empty or nothing qualifies.
pub fn pick_first_suitable(candidates: &[DeviceSuitability]) -> Result<usize> {
    if candidates.is_empty() {
        engine_error!("pulsar3d::vulkan", "No Vulkan-capable GPU found");
        return Err(Error::NoSuitableDevice("no Vulkan-capable GPU found".to_string()));
    }

    engine_debug!("pulsar3d::vulkan", "Physical Devices :");
    let mut selected = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let suitable = candidate.is_suitable();
        engine_debug!(
            "pulsar3d::vulkan",
            "\t {} {}",
            if suitable { "[v]" } else { "[ ]" },
            candidate.name
        );
        if suitable && selected.is_none() {
            selected = Some(index);
        }
    }

    selected.ok_or_else(|| {
        engine_error!("pulsar3d::vulkan", "Failed to find a suitable GPU");
        Error::NoSuitableDevice("no enumerated device satisfied the requirements".to_string())
    })
}

/// Discover queue family indices for one physical device
pub fn find_queue_families(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> QueueFamilyIndices {
    let properties =
        unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

    let mut indices = QueueFamilyIndices::default();
    for (i, family) in properties.iter().enumerate() {
        if family.queue_count == 0 {
            continue;
        }
        let index = i as u32;

        if indices.graphics.is_none()
            && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
        {
            indices.graphics = Some(index);
        }

        if indices.transfer.is_none()
            && family.queue_flags.contains(vk::QueueFlags::TRANSFER)
            && !family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
        {
            indices.transfer = Some(index);
        }

        if indices.present.is_none() {
            let supported = unsafe {
                surface_loader.get_physical_device_surface_support(physical_device, index, surface)
            }
            .unwrap_or(false);
            if supported {
                indices.present = Some(index);
            }
        }
    }

    indices
}

/// Build the suitability report for one physical device
fn query_suitability(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> DeviceSuitability {
    let properties = unsafe { instance.get_physical_device_properties(physical_device) };
    let name = properties
        .device_name_as_c_str()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "<unnamed device>".to_string());

    let families = find_queue_families(instance, physical_device, surface_loader, surface);

    let available_extensions: Vec<String> =
        unsafe { instance.enumerate_device_extension_properties(physical_device) }
            .unwrap_or_default()
            .iter()
            .filter_map(|props| props.extension_name_as_c_str().ok())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();

    let missing_extensions = REQUIRED_DEVICE_EXTENSIONS
        .iter()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !available_extensions.contains(n))
        .collect();

    let features = unsafe { instance.get_physical_device_features(physical_device) };

    let has_surface_formats = unsafe {
        surface_loader.get_physical_device_surface_formats(physical_device, surface)
    }
    .map(|f| !f.is_empty())
    .unwrap_or(false);

    let has_present_modes = unsafe {
        surface_loader.get_physical_device_surface_present_modes(physical_device, surface)
    }
    .map(|m| !m.is_empty())
    .unwrap_or(false);

    DeviceSuitability {
        name,
        families,
        missing_extensions,
        has_required_features: features.sampler_anisotropy == vk::TRUE,
        has_surface_formats,
        has_present_modes,
    }
}

/// Outcome of device selection and logical device creation
pub struct DeviceContext {
    /// Selected physical device
    pub physical_device: vk::PhysicalDevice,
    /// Physical device limits (sampler anisotropy bound, ...)
    pub limits: vk::PhysicalDeviceLimits,
    /// Logical device
    pub device: ash::Device,
    /// Graphics queue
    pub graphics_queue: vk::Queue,
    /// Transfer queue (aliases graphics without a dedicated family)
    pub transfer_queue: vk::Queue,
    /// Present queue
    pub present_queue: vk::Queue,
    /// Resolved queue family indices
    pub families: ResolvedQueueFamilies,
}

impl DeviceContext {
    /// Select the first suitable physical device and create the logical
    /// device with one queue per distinct family
    pub fn create(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<Self> {
        let physical_devices = unsafe { instance.enumerate_physical_devices() }.map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
            Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
        })?;

        let candidates: Vec<DeviceSuitability> = physical_devices
            .iter()
            .map(|&pd| query_suitability(instance, pd, surface_loader, surface))
            .collect();

        let selected = pick_first_suitable(&candidates)?;
        let physical_device = physical_devices[selected];
        let families = candidates[selected]
            .families
            .resolve()
            .ok_or_else(|| Error::NoSuitableDevice("unresolved queue families".to_string()))?;

        engine_info!("pulsar3d::vulkan", "Selected : {}", candidates[selected].name);

        let limits = unsafe { instance.get_physical_device_properties(physical_device) }.limits;

        // One queue per distinct family, all at priority 1.0
        let queue_priorities = [1.0_f32];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = families
            .unique_indices()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        let extension_names: Vec<_> =
            REQUIRED_DEVICE_EXTENSIONS.iter().map(|n| n.as_ptr()).collect();

        let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = unsafe { instance.create_device(physical_device, &device_create_info, None) }
            .map_err(|e| {
                engine_error!("pulsar3d::vulkan", "Failed to create logical device: {:?}", e);
                Error::InitializationFailed(format!("Failed to create device: {:?}", e))
            })?;

        let graphics_queue = unsafe { device.get_device_queue(families.graphics, 0) };
        let transfer_queue = unsafe { device.get_device_queue(families.transfer, 0) };
        let present_queue = unsafe { device.get_device_queue(families.present, 0) };

        Ok(Self {
            physical_device,
            limits,
            device,
            graphics_queue,
            transfer_queue,
            present_queue,
            families,
        })
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
