use std::rc::Rc;

use ash::vk;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

/// 全局共享的 pipeline layout
///
/// 本引擎所有图形管线共用一套绑定布局（root signature 的等价物），
/// 因此 layout 不跟随单个管线，而是设备初始化时创建一次。
pub struct GfxPipelineLayout {
    handle: vk::PipelineLayout,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxPipelineLayout {
    fn debug_type_name() -> &'static str {
        "GfxPipelineLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl Drop for GfxPipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_layout(self.handle, None);
        }
    }
}

impl GfxPipelineLayout {
    pub fn new(device: Rc<GfxDevice>, set_layouts: &[vk::DescriptorSetLayout], debug_name: &str) -> Self {
        let create_info = vk::PipelineLayoutCreateInfo::default().set_layouts(set_layouts);
        let handle = unsafe { device.create_pipeline_layout(&create_info, None).unwrap() };

        let layout = Self {
            handle,
            device,
        };
        layout.device.set_debug_name(&layout, debug_name);
        layout
    }

    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.handle
    }
}
