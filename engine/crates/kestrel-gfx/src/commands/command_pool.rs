use std::rc::Rc;

use ash::vk;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

/// 绑定到 queue family 而非单个 queue
pub struct GfxCommandPool {
    handle: vk::CommandPool,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxCommandPool {
    fn debug_type_name() -> &'static str {
        "GfxCommandPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

// 创建与销毁
impl GfxCommandPool {
    pub fn new(
        device: Rc<GfxDevice>,
        queue_family_index: u32,
        flags: vk::CommandPoolCreateFlags,
        debug_name: &str,
    ) -> Self {
        let pool = unsafe {
            device
                .create_command_pool(
                    &vk::CommandPoolCreateInfo::default().queue_family_index(queue_family_index).flags(flags),
                    None,
                )
                .unwrap()
        };

        let command_pool = Self {
            handle: pool,
            device,
        };
        command_pool.device.set_debug_name(&command_pool, debug_name);
        command_pool
    }

    pub fn destroy(self) {
        unsafe {
            self.device.destroy_command_pool(self.handle, None);
        }
    }
}

// getters
impl GfxCommandPool {
    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.handle
    }
}
