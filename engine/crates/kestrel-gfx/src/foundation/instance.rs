//! Vulkan Entry + Instance

use std::ffi::CString;

use ash::vk;
use itertools::Itertools;

use crate::foundation::debug_messenger::GfxDebugMessenger;

pub struct GfxInstance {
    entry: ash::Entry,
    instance: ash::Instance,
    debug_messenger: Option<GfxDebugMessenger>,
}

// 创建与销毁
impl GfxInstance {
    const ENGINE_NAME: &'static str = "Kestrel";

    /// 创建 Vulkan instance
    ///
    /// # param
    /// * display_handle - 需要创建 surface 时传入，决定所需的 WSI 扩展
    ///
    /// # Panic
    /// 平台上没有可用的 Vulkan loader 时 panic（环境级致命错误）
    pub fn new(app_name: &str, display_handle: Option<raw_window_handle::RawDisplayHandle>) -> Self {
        let entry = unsafe { ash::Entry::load().expect("no vulkan loader available on this platform") };

        let app_name = CString::new(app_name).unwrap();
        let engine_name = CString::new(Self::ENGINE_NAME).unwrap();
        let app_info = vk::ApplicationInfo::default()
            .application_name(app_name.as_c_str())
            .engine_name(engine_name.as_c_str())
            .api_version(vk::API_VERSION_1_3);

        let mut extensions = vec![ash::ext::debug_utils::NAME.as_ptr()];
        if let Some(display_handle) = display_handle {
            extensions.extend_from_slice(
                ash_window::enumerate_required_extensions(display_handle)
                    .expect("unsupported window system for vulkan surface"),
            );
        }

        // 存在 validation layer 时才启用，避免干净环境下创建失败
        let validation_layer = c"VK_LAYER_KHRONOS_validation";
        let available_layers = unsafe { entry.enumerate_instance_layer_properties().unwrap_or_default() };
        let enable_validation = cfg!(debug_assertions)
            && available_layers
                .iter()
                .any(|layer| layer.layer_name_as_c_str().is_ok_and(|name| name == validation_layer));
        let layers = if enable_validation {
            vec![validation_layer.as_ptr()]
        } else {
            vec![]
        };
        log::info!(
            "create vulkan instance, validation: {}, extensions: {}",
            enable_validation,
            extensions.len()
        );

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let instance = unsafe { entry.create_instance(&create_info, None).expect("failed to create vulkan instance") };

        let debug_messenger =
            if enable_validation { Some(GfxDebugMessenger::new(&entry, &instance)) } else { None };

        Self {
            entry,
            instance,
            debug_messenger,
        }
    }

    pub fn destroy(&self) {
        log::info!("destroying vulkan instance");
        if let Some(messenger) = &self.debug_messenger {
            messenger.destroy();
        }
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

// getters
impl GfxInstance {
    #[inline]
    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    #[inline]
    pub fn handle(&self) -> &ash::Instance {
        &self.instance
    }

    /// 枚举所有物理设备
    pub fn physical_devices(&self) -> Vec<vk::PhysicalDevice> {
        unsafe { self.instance.enumerate_physical_devices().expect("failed to enumerate physical devices").into_iter().collect_vec() }
    }
}
