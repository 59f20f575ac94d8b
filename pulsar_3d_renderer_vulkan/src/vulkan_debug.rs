/// Validation layer debug messenger
///
/// Routes validation output through the engine logger so it lands in the
/// same stream as everything else. Severity maps onto log severity;
/// message type becomes a bracketed prefix.

use ash::vk;
use std::ffi::CStr;
use std::os::raw::c_void;

use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::{engine_debug, engine_error, engine_info, engine_warn};

/// Messenger callback invoked by the validation layers
///
/// Always returns `vk::FALSE`: validation output must never abort the
/// triggering call.
pub(crate) unsafe extern "system" fn debug_messenger_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let type_prefix = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "[General]",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "[Validation]",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "[Performance]",
        _ => "[Unknown]",
    };

    let message = if p_callback_data.is_null() {
        "<no message>".to_string()
    } else {
        unsafe { CStr::from_ptr((*p_callback_data).p_message) }
            .to_string_lossy()
            .into_owned()
    };

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            engine_error!("pulsar3d::vulkan::debug", "{} {}", type_prefix, message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            engine_warn!("pulsar3d::vulkan::debug", "{} {}", type_prefix, message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            engine_info!("pulsar3d::vulkan::debug", "{} {}", type_prefix, message)
        }
        _ => engine_debug!("pulsar3d::vulkan::debug", "{} {}", type_prefix, message),
    }

    vk::FALSE
}

/// Create the debug messenger reporting errors and warnings
pub fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    let loader = ash::ext::debug_utils::Instance::new(entry, instance);

    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_messenger_callback));

    let messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None) }
        .map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to create debug messenger: {:?}", e);
            Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
        })?;

    Ok((loader, messenger))
}
