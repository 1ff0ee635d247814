use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use crate::{
    commands::command_queue::GfxCommandQueue,
    foundation::{device::GfxDevice, physical_device::GfxPhysicalDevice},
    swapchain::surface::GfxSurface,
};

pub struct GfxSwapchain {
    swapchain_handle: vk::SwapchainKHR,

    swapchain_images: Vec<vk::Image>,
    swapchain_image_index: usize,

    color_format: vk::Format,
    swapchain_extent: vk::Extent2D,

    device: Rc<GfxDevice>,
}

// new & init
impl GfxSwapchain {
    pub fn new(
        device: Rc<GfxDevice>,
        physical_device: &GfxPhysicalDevice,
        surface: &GfxSurface,
        window_physical_extent: vk::Extent2D,
    ) -> Self {
        let surface_capabilities = surface.get_capabilities(physical_device.vk_handle);
        let surface_format = Self::choose_surface_format(surface, physical_device);

        // 确定 window 的 extent 尺寸
        let extent = Self::calculate_swapchain_extent(&surface_capabilities, window_physical_extent);
        log::info!(
            "create swapchain: format {:?}, extent {}x{}",
            surface_format.format,
            extent.width,
            extent.height
        );

        // max_image_count == 0，表示不限制 image 数量
        let image_count = if surface_capabilities.max_image_count == 0 {
            surface_capabilities.min_image_count + 1
        } else {
            u32::min(surface_capabilities.max_image_count, surface_capabilities.min_image_count + 1)
        };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.handle())
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
            .pre_transform(surface_capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vk::PresentModeKHR::FIFO)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .clipped(true);

        let swapchain_handle = unsafe { device.swapchain().create_swapchain(&create_info, None).unwrap() };
        device.set_object_debug_name(swapchain_handle, "main-swapchain");
        let images = unsafe { device.swapchain().get_swapchain_images(swapchain_handle).unwrap() };

        Self {
            swapchain_handle,
            swapchain_images: images,
            swapchain_image_index: 0,
            color_format: surface_format.format,
            swapchain_extent: extent,
            device,
        }
    }

    /// 优先 sRGB 格式，shader 输出会被自动转换 linear -> sRGB
    fn choose_surface_format(surface: &GfxSurface, physical_device: &GfxPhysicalDevice) -> vk::SurfaceFormatKHR {
        let formats = surface.get_formats(physical_device.vk_handle);
        assert!(!formats.is_empty(), "surface reports no formats");
        formats
            .iter()
            .find(|f| {
                matches!(f.format, vk::Format::R8G8B8A8_SRGB | vk::Format::B8G8R8A8_SRGB)
                    && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
            .copied()
            .unwrap_or(formats[0])
    }

    /// 如果 surface_capabilities.current_extent 包含特殊值 0xFFFFFFFF，
    /// 则表示可以自己设置交换链的 extent
    fn calculate_swapchain_extent(
        surface_capabilities: &vk::SurfaceCapabilitiesKHR,
        window_physical_extent: vk::Extent2D,
    ) -> vk::Extent2D {
        let surface_extent = surface_capabilities.current_extent;
        if surface_extent.width == 0xFFFFFFFF || surface_extent.height == 0xFFFFFFFF {
            let width = window_physical_extent
                .width
                .clamp(surface_capabilities.min_image_extent.width, surface_capabilities.max_image_extent.width);
            let height = window_physical_extent
                .height
                .clamp(surface_capabilities.min_image_extent.height, surface_capabilities.max_image_extent.height);
            vk::Extent2D { width, height }
        } else {
            surface_extent
        }
    }
}

// getters
impl GfxSwapchain {
    #[inline]
    pub fn present_images(&self) -> Vec<vk::Image> {
        self.swapchain_images.clone()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain_extent
    }

    #[inline]
    pub fn color_format(&self) -> vk::Format {
        self.color_format
    }

    #[inline]
    pub fn current_image_index(&self) -> usize {
        self.swapchain_image_index
    }

    #[inline]
    pub fn current_image(&self) -> vk::Image {
        self.swapchain_images[self.swapchain_image_index]
    }
}

// update
impl GfxSwapchain {
    /// 获取下一帧要写入的 image
    ///
    /// # Panic
    /// device lost 等不可恢复错误 panic；suboptimal 只记 log
    pub fn acquire_next_image(&mut self, semaphore: vk::Semaphore) {
        let result = unsafe {
            self.device.swapchain().acquire_next_image(self.swapchain_handle, u64::MAX, semaphore, vk::Fence::null())
        };

        match result {
            Ok((image_index, is_suboptimal)) => {
                if is_suboptimal {
                    log::warn!("swapchain acquire image index {image_index} is not optimal");
                }
                self.swapchain_image_index = image_index as usize;
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::warn!("swapchain is out of date when acquiring next image");
            }
            Err(e) => {
                panic!("failed to acquire next swapchain image: {e:?}");
            }
        }
    }

    /// 返回环境级错误给调用方判定，suboptimal / out-of-date 只记 log
    pub fn present_image(
        &self,
        queue: &GfxCommandQueue,
        wait_semaphores: &[vk::Semaphore],
    ) -> Result<(), vk::Result> {
        let wait_semaphores = wait_semaphores.iter().copied().collect_vec();
        let image_indices = [self.swapchain_image_index as u32];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .image_indices(&image_indices)
            .swapchains(std::slice::from_ref(&self.swapchain_handle));

        let result = unsafe { self.device.swapchain().queue_present(queue.handle(), &present_info) };
        match result {
            Ok(is_suboptimal) => {
                if is_suboptimal {
                    log::warn!("swapchain present image index {} is not optimal", self.swapchain_image_index);
                }
                Ok(())
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::warn!("swapchain is out of date when presenting image");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

// destroy
impl GfxSwapchain {
    pub fn destroy(mut self) {
        unsafe {
            self.device.swapchain().destroy_swapchain(self.swapchain_handle, None);
        }
        self.swapchain_handle = vk::SwapchainKHR::null();
    }
}
