//! 各种同步原语

use std::rc::Rc;

use ash::vk;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

/// # Destroy
/// 不应该实现 Drop，因为可以 Clone，需要手动 destroy
#[derive(Clone)]
pub struct GfxSemaphore {
    semaphore: vk::Semaphore,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxSemaphore {
    fn debug_type_name() -> &'static str {
        "GfxSemaphore"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.semaphore
    }
}

impl GfxSemaphore {
    pub fn new(device: Rc<GfxDevice>, debug_name: &str) -> Self {
        let semaphore = unsafe { device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None).unwrap() };

        let semaphore = Self {
            semaphore,
            device,
        };
        semaphore.device.set_debug_name(&semaphore, debug_name);
        semaphore
    }

    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }

    #[inline]
    pub fn destroy(self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// timeline semaphore：单调递增的 GPU/CPU 同步计数器
///
/// fence 计数器的 Vulkan 实现载体：signal 一个值保证之前提交的工作完成，
/// CPU 可以查询当前计数或阻塞等待某个值。
#[derive(Clone)]
pub struct GfxTimelineSemaphore {
    semaphore: vk::Semaphore,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxTimelineSemaphore {
    fn debug_type_name() -> &'static str {
        "GfxTimelineSemaphore"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.semaphore
    }
}

impl GfxTimelineSemaphore {
    pub fn new(device: Rc<GfxDevice>, initial_value: u64, debug_name: &str) -> Self {
        let mut timeline_type_ci = vk::SemaphoreTypeCreateInfo::default()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(initial_value);
        let timeline_semaphore_ci = vk::SemaphoreCreateInfo::default().push_next(&mut timeline_type_ci);
        let semaphore = unsafe { device.create_semaphore(&timeline_semaphore_ci, None).unwrap() };

        let semaphore = Self {
            semaphore,
            device,
        };
        semaphore.device.set_debug_name(&semaphore, debug_name);
        semaphore
    }

    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }

    /// 查询 GPU 侧当前已完成的计数
    #[inline]
    pub fn value(&self) -> u64 {
        unsafe { self.device.get_semaphore_counter_value(self.semaphore).unwrap() }
    }

    /// 阻塞等待 timeline 达到指定值
    #[inline]
    pub fn wait(&self, timeline_value: u64, timeout_ns: u64) {
        unsafe {
            let wait_semaphore = [self.semaphore];
            let wait_info = vk::SemaphoreWaitInfo::default()
                .semaphores(&wait_semaphore)
                .values(std::slice::from_ref(&timeline_value));
            self.device.wait_semaphores(&wait_info, timeout_ns).unwrap();
        }
    }

    #[inline]
    pub fn destroy(self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
