use ash::vk;

use crate::foundation::instance::GfxInstance;

pub struct GfxSurface {
    pub(crate) handle: vk::SurfaceKHR,
    surface_fn: ash::khr::surface::Instance,
}

impl GfxSurface {
    pub fn new(
        instance: &GfxInstance,
        display_handle: raw_window_handle::RawDisplayHandle,
        window_handle: raw_window_handle::RawWindowHandle,
    ) -> Self {
        let handle = unsafe {
            ash_window::create_surface(instance.entry(), instance.handle(), display_handle, window_handle, None)
                .expect("failed to create vulkan surface")
        };
        let surface_fn = ash::khr::surface::Instance::new(instance.entry(), instance.handle());

        Self {
            handle,
            surface_fn,
        }
    }

    pub fn destroy(&self) {
        unsafe {
            self.surface_fn.destroy_surface(self.handle, None);
        }
    }

    #[inline]
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    pub fn supports_present(&self, pdevice: vk::PhysicalDevice, queue_family_index: u32) -> bool {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_support(pdevice, queue_family_index, self.handle)
                .unwrap_or(false)
        }
    }

    pub fn get_capabilities(&self, pdevice: vk::PhysicalDevice) -> vk::SurfaceCapabilitiesKHR {
        unsafe { self.surface_fn.get_physical_device_surface_capabilities(pdevice, self.handle).unwrap() }
    }

    pub fn get_formats(&self, pdevice: vk::PhysicalDevice) -> Vec<vk::SurfaceFormatKHR> {
        unsafe { self.surface_fn.get_physical_device_surface_formats(pdevice, self.handle).unwrap() }
    }
}
