//! 物理设备选择

use ash::vk;

use crate::{foundation::instance::GfxInstance, swapchain::surface::GfxSurface};

pub struct GfxPhysicalDevice {
    pub vk_handle: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub graphics_queue_family: u32,
}

impl GfxPhysicalDevice {
    /// 选择物理设备：优先独显；需要 graphics queue family，
    /// 提供了 surface 时还需要 present 支持
    ///
    /// # Panic
    /// 没有可用的适配器是环境级致命错误
    pub fn pick(instance: &GfxInstance, surface: Option<&GfxSurface>) -> Self {
        let candidates = instance.physical_devices();
        assert!(!candidates.is_empty(), "no vulkan physical device found");

        let mut chosen: Option<(vk::PhysicalDevice, vk::PhysicalDeviceProperties, u32)> = None;
        for pdevice in candidates {
            let properties = unsafe { instance.handle().get_physical_device_properties(pdevice) };
            let Some(queue_family) = Self::find_graphics_queue_family(instance, pdevice, surface) else {
                continue;
            };

            let is_discrete = properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;
            match &chosen {
                Some((_, existing, _))
                    if existing.device_type == vk::PhysicalDeviceType::DISCRETE_GPU || !is_discrete => {}
                _ => chosen = Some((pdevice, properties, queue_family)),
            }
        }

        let (vk_handle, properties, graphics_queue_family) =
            chosen.expect("no vulkan device with graphics + present support");
        let memory_properties = unsafe { instance.handle().get_physical_device_memory_properties(vk_handle) };

        log::info!(
            "picked physical device: {:?}, type: {:?}, graphics queue family: {}",
            properties.device_name_as_c_str().unwrap_or_default(),
            properties.device_type,
            graphics_queue_family
        );

        Self {
            vk_handle,
            properties,
            memory_properties,
            graphics_queue_family,
        }
    }

    fn find_graphics_queue_family(
        instance: &GfxInstance,
        pdevice: vk::PhysicalDevice,
        surface: Option<&GfxSurface>,
    ) -> Option<u32> {
        let families = unsafe { instance.handle().get_physical_device_queue_family_properties(pdevice) };
        families.iter().enumerate().find_map(|(idx, family)| {
            let idx = idx as u32;
            if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                return None;
            }
            if let Some(surface) = surface
                && !surface.supports_present(pdevice, idx)
            {
                return None;
            }
            Some(idx)
        })
    }

    /// device local 堆的总容量，用于显存预算上报
    pub fn device_local_heap_bytes(&self) -> u64 {
        self.memory_properties
            .memory_heaps
            .iter()
            .take(self.memory_properties.memory_heap_count as usize)
            .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
            .map(|heap| heap.size)
            .sum()
    }

    /// uniform buffer 的 offset 对齐要求
    #[inline]
    pub fn min_ubo_offset_align(&self) -> vk::DeviceSize {
        self.properties.limits.min_uniform_buffer_offset_alignment
    }
}
