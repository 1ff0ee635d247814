use std::rc::Rc;

use ash::vk;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

/// 描述符池
///
/// 描述符集随池一起销毁，不单独 free。
pub struct GfxDescriptorPool {
    handle: vk::DescriptorPool,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxDescriptorPool {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl Drop for GfxDescriptorPool {
    fn drop(&mut self) {
        unsafe { self.device.destroy_descriptor_pool(self.handle, None) };
    }
}

impl GfxDescriptorPool {
    pub fn new(
        device: Rc<GfxDevice>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
        debug_name: &str,
    ) -> Self {
        let create_info = vk::DescriptorPoolCreateInfo::default().max_sets(max_sets).pool_sizes(pool_sizes);
        let pool = unsafe { device.create_descriptor_pool(&create_info, None).unwrap() };

        let pool = Self {
            handle: pool,
            device,
        };
        pool.device.set_debug_name(&pool, debug_name);
        pool
    }

    /// 分配描述符集
    pub fn allocate_set(&self, layout: vk::DescriptorSetLayout, debug_name: &str) -> vk::DescriptorSet {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.handle)
            .set_layouts(std::slice::from_ref(&layout));
        let descriptor_set = unsafe { self.device.allocate_descriptor_sets(&alloc_info).unwrap()[0] };
        self.device.set_object_debug_name(descriptor_set, debug_name);
        descriptor_set
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.handle
    }
}
