/// Validation layer messenger
///
/// Messages are forwarded to the `LogSink` the device was created with.
/// Compiled only with the `vulkan-validation` feature.

use nova_3d_engine::nova3d::log::{LogSeverity, LogSink};
use nova_3d_engine::nova3d::{Error, Result};
use nova_3d_engine::engine_error;
use ash::vk;
use std::ffi::CStr;

use crate::vulkan_context::DebugMessenger;

const SOURCE: &str = "nova3d::vulkan::validation";

pub(crate) const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Engine severity of a validation message
pub(crate) fn severity_from_vk(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Debug
    } else {
        LogSeverity::Trace
    }
}

/// Message severities worth asking the driver for, given the sink threshold
pub(crate) fn severity_mask_for(min: LogSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    let mut mask = vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
    if min <= LogSeverity::Warn {
        mask |= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING;
    }
    if min <= LogSeverity::Debug {
        mask |= vk::DebugUtilsMessageSeverityFlagsEXT::INFO;
    }
    if min <= LogSeverity::Trace {
        mask |= vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE;
    }
    mask
}

unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || user_data.is_null() {
        return vk::FALSE;
    }
    let sink = &*(user_data as *const LogSink);
    let callback_data = &*p_callback_data;

    let message_id = if callback_data.p_message_id_name.is_null() {
        "Unknown".into()
    } else {
        CStr::from_ptr(callback_data.p_message_id_name).to_string_lossy()
    };
    let message = if callback_data.p_message.is_null() {
        "No message".into()
    } else {
        CStr::from_ptr(callback_data.p_message).to_string_lossy()
    };

    let kind = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    };

    sink.log(
        severity_from_vk(message_severity),
        SOURCE,
        format!("[{}] {}: {}", kind, message_id, message),
    );

    vk::FALSE
}

/// Create the messenger; `sink` is boxed so the callback sees a stable address
pub(crate) fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    sink: LogSink,
) -> Result<DebugMessenger> {
    let loader = ash::ext::debug_utils::Instance::new(entry, instance);
    let sink = Box::new(sink);

    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(severity_mask_for(sink.min_severity()))
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(vulkan_debug_callback))
        .user_data(sink.as_ref() as *const LogSink as *mut std::os::raw::c_void);

    let messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None) }.map_err(|e| {
        engine_error!(sink, SOURCE, "Failed to create debug messenger: {:?}", e);
        Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
    })?;

    Ok(DebugMessenger { loader, messenger, sink })
}

#[cfg(test)]
#[path = "vulkan_debug_tests.rs"]
mod tests;
