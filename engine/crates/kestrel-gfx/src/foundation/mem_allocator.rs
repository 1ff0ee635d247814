//! vk-mem 封装
//!
//! 由于 vma 的生命周期设定：需要引用 Instance 以及 Device，
//! 并确保在其生命周期之内这两个的引用是有效的。
//! 因此需要在其他部分都初始化完成后再初始化 vma。

use std::cell::Cell;
use std::ops::Deref;

use ash::vk;

use crate::foundation::{instance::GfxInstance, physical_device::GfxPhysicalDevice};

pub struct GfxAllocator {
    inner: vk_mem::Allocator,

    /// 本 allocator 经手的存活分配字节数，用于显存占用上报
    allocated_bytes: Cell<u64>,
    device_local_budget_bytes: u64,
}

impl GfxAllocator {
    pub fn new(instance: &GfxInstance, physical_device: &GfxPhysicalDevice, device: &ash::Device) -> Self {
        let mut vma_ci = vk_mem::AllocatorCreateInfo::new(instance.handle(), device, physical_device.vk_handle);
        vma_ci.vulkan_api_version = vk::API_VERSION_1_3;

        let vma = unsafe { vk_mem::Allocator::new(vma_ci).expect("failed to create vma allocator") };

        Self {
            inner: vma,
            allocated_bytes: Cell::new(0),
            device_local_budget_bytes: physical_device.device_local_heap_bytes(),
        }
    }

    /// 分配/释放时更新占用账目
    #[inline]
    pub(crate) fn track_alloc(&self, bytes: u64) {
        self.allocated_bytes.set(self.allocated_bytes.get() + bytes);
    }

    #[inline]
    pub(crate) fn track_free(&self, bytes: u64) {
        self.allocated_bytes.set(self.allocated_bytes.get().saturating_sub(bytes));
    }

    /// (已分配字节数, device local 预算字节数)
    #[inline]
    pub fn memory_report(&self) -> (u64, u64) {
        (self.allocated_bytes.get(), self.device_local_budget_bytes)
    }
}

impl Deref for GfxAllocator {
    type Target = vk_mem::Allocator;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
