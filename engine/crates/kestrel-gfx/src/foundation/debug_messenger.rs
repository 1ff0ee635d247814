//! Vulkan validation 消息转发到 log

use std::ffi::{CStr, c_void};

use ash::vk;

/// 可以设置 debug name 的 Vulkan 对象类型
pub trait DebugType {
    fn debug_type_name() -> &'static str;

    fn vk_handle(&self) -> impl vk::Handle;
}

/// validation layer 的消息回调，按 severity 映射到 log level
unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let message = unsafe {
        let callback_data = *p_callback_data;
        if callback_data.p_message.is_null() {
            std::borrow::Cow::from("")
        } else {
            CStr::from_ptr(callback_data.p_message).to_string_lossy()
        }
    };

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[vulkan][{message_type:?}] {message}");
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[vulkan][{message_type:?}] {message}");
        }
        _ => {
            log::debug!("[vulkan][{message_type:?}] {message}");
        }
    }

    vk::FALSE
}

pub struct GfxDebugMessenger {
    debug_utils: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl GfxDebugMessenger {
    pub fn new(entry: &ash::Entry, instance: &ash::Instance) -> Self {
        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback));

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None).unwrap() };
        Self {
            debug_utils,
            messenger,
        }
    }

    pub fn destroy(&self) {
        unsafe {
            self.debug_utils.destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}
