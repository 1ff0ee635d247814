use std::rc::Rc;

use ash::vk;
use vk_mem::Alloc;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice, mem_allocator::GfxAllocator};

/// 2D image 的创建参数
pub struct GfxImageCreateInfo {
    pub extent: vk::Extent2D,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    pub mip_levels: u32,
    /// cube map 时为 6
    pub array_layers: u32,
    pub samples: vk::SampleCountFlags,
    pub flags: vk::ImageCreateFlags,
}

impl GfxImageCreateInfo {
    pub fn new_2d(extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            extent,
            format,
            usage,
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            flags: vk::ImageCreateFlags::empty(),
        }
    }

    pub fn new_cube(extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            extent,
            format,
            usage,
            mip_levels: 1,
            array_layers: 6,
            samples: vk::SampleCountFlags::TYPE_1,
            flags: vk::ImageCreateFlags::CUBE_COMPATIBLE,
        }
    }

    // builder
    #[inline]
    pub fn samples(mut self, samples: vk::SampleCountFlags) -> Self {
        self.samples = samples;
        self
    }

    // builder
    #[inline]
    pub fn mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    fn as_vk_info(&self) -> vk::ImageCreateInfo<'_> {
        vk::ImageCreateInfo {
            flags: self.flags,
            image_type: vk::ImageType::TYPE_2D,
            format: self.format,
            extent: self.extent.into(),
            mip_levels: self.mip_levels,
            array_layers: self.array_layers,
            samples: self.samples,
            tiling: vk::ImageTiling::OPTIMAL,
            usage: self.usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            // spec 上面说，这里只能是 UNDEFINED 或者 PREINITIALIZED
            initial_layout: vk::ImageLayout::UNDEFINED,
            ..Default::default()
        }
    }

    /// 估算分配大小，只用于显存占用账目
    fn estimated_bytes(&self) -> u64 {
        let pixel_bytes: u64 = match self.format {
            vk::Format::D32_SFLOAT => 4,
            vk::Format::R16G16B16A16_SFLOAT => 8,
            _ => 4,
        };
        self.extent.width as u64
            * self.extent.height as u64
            * pixel_bytes
            * self.array_layers as u64
            * (self.samples.as_raw() as u64)
    }
}

pub struct GfxImage {
    handle: vk::Image,
    allocation: vk_mem::Allocation,

    extent: vk::Extent2D,
    format: vk::Format,
    tracked_bytes: u64,

    allocator: Rc<GfxAllocator>,
    _device: Rc<GfxDevice>,
}

impl DebugType for GfxImage {
    fn debug_type_name() -> &'static str {
        "GfxImage"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl Drop for GfxImage {
    fn drop(&mut self) {
        unsafe {
            self.allocator.destroy_image(self.handle, &mut self.allocation);
        }
        self.allocator.track_free(self.tracked_bytes);
    }
}

// new & init
impl GfxImage {
    pub fn new(
        device: Rc<GfxDevice>,
        allocator: Rc<GfxAllocator>,
        image_info: &GfxImageCreateInfo,
        debug_name: &str,
    ) -> Self {
        let alloc_ci = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            ..Default::default()
        };
        let (image, alloc) = unsafe { allocator.create_image(&image_info.as_vk_info(), &alloc_ci).unwrap() };

        let tracked_bytes = image_info.estimated_bytes();
        allocator.track_alloc(tracked_bytes);

        let image = Self {
            handle: image,
            allocation: alloc,
            extent: image_info.extent,
            format: image_info.format,
            tracked_bytes,
            allocator,
            _device: device,
        };
        image._device.set_debug_name(&image, debug_name);
        image
    }
}

// getters
impl GfxImage {
    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }
}
