/// Instance creation with extension and layer support reporting
///
/// Before creating the instance, the required instance extensions (from
/// the windowing system, plus debug utils when validation is on) and the
/// validation layers are checked against what the loader actually offers,
/// and every entry is reported. A missing required entry is a fatal setup
/// error, not something to discover later as a cryptic creation failure.

use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr, CString};

use pulsar_3d_renderer::pulsar3d::render::Config;
use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::{engine_debug, engine_error};

/// Validation layers requested when `Config::enable_validation` is set
pub const VALIDATION_LAYERS: [&CStr; 1] = [c"VK_LAYER_KHRONOS_validation"];

/// Names in `required` that do not appear in `available`
fn missing_names(required: &[String], available: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !available.contains(name))
        .cloned()
        .collect()
}

/// Log one `[v]`/`[ ]` row per available name, `[x]` per missing one,
/// and report whether every required name is available
fn report_support(kind: &str, required: &[String], available: &[String]) -> bool {
    engine_debug!("pulsar3d::vulkan", "{} :", kind);
    for name in available {
        let marker = if required.contains(name) { "[v]" } else { "[ ]" };
        engine_debug!("pulsar3d::vulkan", "\t {} {}", marker, name);
    }

    let missing = missing_names(required, available);
    for name in &missing {
        engine_debug!("pulsar3d::vulkan", "\t [x] {}", name);
    }

    missing.is_empty()
}

/// Create the Vulkan instance, verifying extension and layer support
///
/// # Arguments
///
/// * `entry` - Loaded Vulkan entry points
/// * `config` - Renderer configuration (validation toggle, app identity)
/// * `display_handle` - Display the windowing extensions are derived from
pub fn create_instance(
    entry: &ash::Entry,
    config: &Config,
    display_handle: RawDisplayHandle,
) -> Result<ash::Instance> {
    let app_name = CString::new(config.app_name.as_str())
        .map_err(|_| Error::InitializationFailed("Application name contains NUL".to_string()))?;
    let (major, minor, patch) = config.app_version;

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, major, minor, patch))
        .engine_name(c"Pulsar")
        .engine_version(vk::make_api_version(0, 1, 0, 0))
        .api_version(vk::API_VERSION_1_3);

    // Required extensions: windowing system + debug utils when validating
    let mut extension_names = ash_window::enumerate_required_extensions(display_handle)
        .map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to get required extensions: {:?}", e);
            Error::InitializationFailed(format!("Failed to get required extensions: {:?}", e))
        })?
        .to_vec();

    if config.enable_validation {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
    }

    let required_extensions: Vec<String> = extension_names
        .iter()
        .map(|&ptr| unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
        .collect();

    let available_extensions: Vec<String> = unsafe {
        entry.enumerate_instance_extension_properties(None)
    }
    .map_err(|e| {
        engine_error!("pulsar3d::vulkan", "Failed to enumerate instance extensions: {:?}", e);
        Error::InitializationFailed(format!("Failed to enumerate instance extensions: {:?}", e))
    })?
    .iter()
    .filter_map(|props| props.extension_name_as_c_str().ok())
    .map(|name| name.to_string_lossy().into_owned())
    .collect();

    if !report_support("Extensions", &required_extensions, &available_extensions) {
        engine_error!("pulsar3d::vulkan", "Not all required instance extensions are available");
        return Err(Error::InitializationFailed(
            "Not all required instance extensions are available".to_string(),
        ));
    }

    // Validation layers are required once validation is requested
    let layer_names: Vec<*const c_char> = if config.enable_validation {
        let required_layers: Vec<String> = VALIDATION_LAYERS
            .iter()
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        let available_layers: Vec<String> = unsafe { entry.enumerate_instance_layer_properties() }
            .map_err(|e| {
                engine_error!("pulsar3d::vulkan", "Failed to enumerate instance layers: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate instance layers: {:?}", e))
            })?
            .iter()
            .filter_map(|props| props.layer_name_as_c_str().ok())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        if !report_support("Layers", &required_layers, &available_layers) {
            engine_error!("pulsar3d::vulkan", "Not all required validation layers are available");
            return Err(Error::InitializationFailed(
                "Not all required validation layers are available".to_string(),
            ));
        }

        VALIDATION_LAYERS.iter().map(|name| name.as_ptr()).collect()
    } else {
        Vec::new()
    };

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_layer_names(&layer_names)
        .enabled_extension_names(&extension_names);

    unsafe { entry.create_instance(&create_info, None) }.map_err(|e| {
        engine_error!("pulsar3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
        Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
    })
}

#[cfg(test)]
#[path = "vulkan_instance_tests.rs"]
mod tests;
