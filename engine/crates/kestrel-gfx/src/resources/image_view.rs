use std::rc::Rc;

use ash::vk;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

pub struct GfxImageView {
    handle: vk::ImageView,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxImageView {
    fn debug_type_name() -> &'static str {
        "GfxImageView"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl Drop for GfxImageView {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.handle, None);
        }
    }
}

impl GfxImageView {
    /// 2D view，覆盖全部 mip level
    pub fn new_2d(
        device: Rc<GfxDevice>,
        image: vk::Image,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
        mip_levels: u32,
        debug_name: &str,
    ) -> Self {
        Self::new(
            device,
            image,
            format,
            vk::ImageViewType::TYPE_2D,
            vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: mip_levels,
                base_array_layer: 0,
                layer_count: 1,
            },
            debug_name,
        )
    }

    /// cube view，覆盖 6 个面
    pub fn new_cube(device: Rc<GfxDevice>, image: vk::Image, format: vk::Format, debug_name: &str) -> Self {
        Self::new(
            device,
            image,
            format,
            vk::ImageViewType::CUBE,
            vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 6,
            },
            debug_name,
        )
    }

    /// cube map 单个面的 2D view，用作 render target attachment
    pub fn new_cube_face(
        device: Rc<GfxDevice>,
        image: vk::Image,
        format: vk::Format,
        face: u32,
        debug_name: &str,
    ) -> Self {
        assert!(face < 6, "invalid cube map face: {face}");
        Self::new(
            device,
            image,
            format,
            vk::ImageViewType::TYPE_2D,
            vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: face,
                layer_count: 1,
            },
            debug_name,
        )
    }

    fn new(
        device: Rc<GfxDevice>,
        image: vk::Image,
        format: vk::Format,
        view_type: vk::ImageViewType,
        subresource_range: vk::ImageSubresourceRange,
        debug_name: &str,
    ) -> Self {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(view_type)
            .format(format)
            .subresource_range(subresource_range);

        let handle = unsafe { device.create_image_view(&create_info, None).unwrap() };
        let view = Self {
            handle,
            device,
        };
        view.device.set_debug_name(&view, debug_name);
        view
    }

    #[inline]
    pub fn handle(&self) -> vk::ImageView {
        self.handle
    }
}
