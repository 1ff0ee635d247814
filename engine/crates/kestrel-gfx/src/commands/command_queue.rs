use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use crate::{
    commands::submit_info::GfxSubmitInfo,
    foundation::{debug_messenger::DebugType, device::GfxDevice},
};

/// # Destroy
/// queue 随 device 一起销毁，不需要单独释放
pub struct GfxCommandQueue {
    vk_queue: vk::Queue,
    queue_family_index: u32,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxCommandQueue {
    fn debug_type_name() -> &'static str {
        "GfxCommandQueue"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_queue
    }
}

// 创建
impl GfxCommandQueue {
    pub fn new(device: Rc<GfxDevice>, queue_family_index: u32, debug_name: &str) -> Self {
        let vk_queue = unsafe { device.get_device_queue(queue_family_index, 0) };
        let queue = Self {
            vk_queue,
            queue_family_index,
            device,
        };
        queue.device.set_debug_name(&queue, debug_name);
        queue
    }
}

// getters
impl GfxCommandQueue {
    #[inline]
    pub fn handle(&self) -> vk::Queue {
        self.vk_queue
    }

    #[inline]
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }
}

// tools
impl GfxCommandQueue {
    pub fn submit(&self, batches: Vec<GfxSubmitInfo>, fence: Option<vk::Fence>) {
        unsafe {
            // batches 的存在是有必要的，submit_infos 引用的是 batches 的内存
            let submit_infos = batches.iter().map(|b| b.submit_info()).collect_vec();
            self.device
                .queue_submit2(self.vk_queue, &submit_infos, fence.unwrap_or(vk::Fence::null()))
                .unwrap()
        }
    }

    /// 根据 specification，vkQueueWaitIdle 应该和 Fence 效率相同
    #[inline]
    pub fn wait_idle(&self) {
        unsafe { self.device.queue_wait_idle(self.vk_queue).unwrap() }
    }
}
