use std::rc::Rc;

use ash::vk;
use vk_mem::Alloc;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice, mem_allocator::GfxAllocator};

pub struct GfxBuffer {
    handle: vk::Buffer,
    allocation: vk_mem::Allocation,

    size: vk::DeviceSize,

    /// 在创建时写死；只有 mem_map 的 buffer 才有值
    map_ptr: Option<*mut u8>,

    allocator: Rc<GfxAllocator>,
    _device: Rc<GfxDevice>,
}

impl DebugType for GfxBuffer {
    fn debug_type_name() -> &'static str {
        "GfxBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl Drop for GfxBuffer {
    fn drop(&mut self) {
        unsafe {
            if self.map_ptr.is_some() {
                self.allocator.unmap_memory(&mut self.allocation);
            }
            self.allocator.destroy_buffer(self.handle, &mut self.allocation);
        }
        self.allocator.track_free(self.size);
    }
}

// init & destroy
impl GfxBuffer {
    /// mem_map 为 true 时 buffer 常驻映射，可通过 [`Self::write_bytes`] 写入；
    /// 内存位置交给 vma 决定，倾向 device local
    pub fn new(
        device: Rc<GfxDevice>,
        allocator: Rc<GfxAllocator>,
        buffer_size: vk::DeviceSize,
        buffer_usage: vk::BufferUsageFlags,
        mem_map: bool,
        name: impl AsRef<str>,
    ) -> Self {
        let buffer_ci = vk::BufferCreateInfo::default().size(buffer_size).usage(buffer_usage);
        let alloc_ci = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            flags: if mem_map {
                vk_mem::AllocationCreateFlags::HOST_ACCESS_RANDOM
            } else {
                vk_mem::AllocationCreateFlags::empty()
            },
            ..Default::default()
        };

        let (buffer, mut alloc) = unsafe { allocator.create_buffer(&buffer_ci, &alloc_ci).unwrap() };

        let mut mapped_ptr = None;
        if mem_map {
            unsafe {
                mapped_ptr = Some(allocator.map_memory(&mut alloc).unwrap());
            }
        }

        allocator.track_alloc(buffer_size);
        device.set_object_debug_name(buffer, format!("Buffer::{}", name.as_ref()));
        Self {
            handle: buffer,
            allocation: alloc,
            size: buffer_size,
            map_ptr: mapped_ptr,
            allocator,
            _device: device,
        }
    }

    /// 用于向 GPU 传输数据的临时 buffer
    #[inline]
    pub fn new_stage_buffer(
        device: Rc<GfxDevice>,
        allocator: Rc<GfxAllocator>,
        size: vk::DeviceSize,
        debug_name: impl AsRef<str>,
    ) -> Self {
        Self::new(device, allocator, size, vk::BufferUsageFlags::TRANSFER_SRC, true, debug_name)
    }
}

// getters
impl GfxBuffer {
    #[inline]
    pub fn vk_buffer(&self) -> vk::Buffer {
        self.handle
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

// tools
impl GfxBuffer {
    /// 通过 mem map 将数据写入 buffer 指定 offset 处
    pub fn write_bytes(&self, offset: usize, data: &[u8]) {
        let map_ptr = self.map_ptr.expect("buffer is not mapped");
        assert!(offset + data.len() <= self.size as usize, "write out of buffer bounds");
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), map_ptr.add(offset), data.len());
        }
        self.allocator.flush_allocation(&self.allocation, offset as vk::DeviceSize, data.len() as vk::DeviceSize).unwrap();
    }
}
