//! Vulkan 逻辑设备封装
//!
//! 包含核心设备 API 以及 swapchain / debug utils 扩展的函数指针。
//! 这些函数指针在应用生命周期中保持不变，可以安全共享。

use std::cell::Cell;
use std::ffi::CString;
use std::ops::Deref;

use ash::vk;

use crate::foundation::{debug_messenger::DebugType, instance::GfxInstance, physical_device::GfxPhysicalDevice};

pub struct GfxDevice {
    pub(crate) device: ash::Device,
    /// 交换链扩展 API
    pub(crate) swapchain: ash::khr::swapchain::Device,
    /// 调试工具扩展 API
    pub(crate) debug_utils: ash::ext::debug_utils::Device,

    #[cfg(debug_assertions)]
    destroyed: Cell<bool>,
}

// 构造与销毁
impl GfxDevice {
    pub fn new(instance: &GfxInstance, physical_device: &GfxPhysicalDevice) -> Self {
        let _span = tracy_client::span!("GfxDevice::new");

        let queue_priorities = [1.0_f32];
        let queue_create_info = vk::DeviceQueueCreateInfo::default()
            .queue_family_index(physical_device.graphics_queue_family)
            .queue_priorities(&queue_priorities);

        let device_exts = [ash::khr::swapchain::NAME.as_ptr()];

        // 本引擎需要的 features：
        // - 各向异性采样、wireframe、独立混合（基础）
        // - timeline semaphore（1.2，fence 计数器）
        // - synchronization2 + dynamic rendering（1.3）
        let basic_features = vk::PhysicalDeviceFeatures::default()
            .sampler_anisotropy(true)
            .fill_mode_non_solid(true)
            .independent_blend(true);
        let mut features12 = vk::PhysicalDeviceVulkan12Features::default().timeline_semaphore(true);
        let mut features13 =
            vk::PhysicalDeviceVulkan13Features::default().synchronization2(true).dynamic_rendering(true);
        let mut all_features = vk::PhysicalDeviceFeatures2::default()
            .features(basic_features)
            .push_next(&mut features12)
            .push_next(&mut features13);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(std::slice::from_ref(&queue_create_info))
            .enabled_extension_names(&device_exts)
            .push_next(&mut all_features);

        let device = unsafe {
            instance
                .handle()
                .create_device(physical_device.vk_handle, &device_create_info, None)
                .expect("failed to create vulkan device")
        };

        let swapchain = ash::khr::swapchain::Device::new(instance.handle(), &device);
        let debug_utils = ash::ext::debug_utils::Device::new(instance.handle(), &device);

        Self {
            device,
            swapchain,
            debug_utils,

            #[cfg(debug_assertions)]
            destroyed: Cell::new(false),
        }
    }

    pub fn destroy(&self) {
        log::info!("destroying device");

        #[cfg(debug_assertions)]
        self.destroyed.set(true);

        unsafe {
            self.device.destroy_device(None);
        }
    }
}

// getters
impl GfxDevice {
    #[inline]
    pub fn vk_handle(&self) -> vk::Device {
        self.device.handle()
    }

    #[inline]
    pub fn swapchain(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain
    }

    #[inline]
    pub fn debug_utils(&self) -> &ash::ext::debug_utils::Device {
        &self.debug_utils
    }
}

// tools
impl GfxDevice {
    #[inline]
    pub fn set_object_debug_name<T: vk::Handle>(&self, handle: T, name: impl AsRef<str>) {
        let name = CString::new(name.as_ref()).unwrap();
        unsafe {
            self.debug_utils
                .set_debug_utils_object_name(
                    &vk::DebugUtilsObjectNameInfoEXT::default().object_name(name.as_c_str()).object_handle(handle),
                )
                .ok();
        }
    }

    pub fn set_debug_name<T: DebugType>(&self, handle: &T, name: impl AsRef<str>) {
        let debug_name = format!("{}::{}", T::debug_type_name(), name.as_ref());
        self.set_object_debug_name(handle.vk_handle(), debug_name);
    }

    #[inline]
    pub fn wait_idle(&self) {
        unsafe {
            self.device.device_wait_idle().unwrap();
        }
    }
}

impl Deref for GfxDevice {
    type Target = ash::Device;
    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

impl Drop for GfxDevice {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        debug_assert!(self.destroyed.get(), "GfxDevice must be destroyed before being dropped.");
    }
}
