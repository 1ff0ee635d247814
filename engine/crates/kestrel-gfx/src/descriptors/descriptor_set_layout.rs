use std::rc::Rc;

use ash::vk;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

/// 描述符集布局
///
/// 本引擎所有 draw 共用一套布局（root signature 的等价物）：
/// - binding 0: uniform buffer（vertex + fragment）
/// - binding 1..2: sampled image（fragment）
/// - binding 3: sampler（fragment）
pub struct GfxDescriptorSetLayout {
    layout: vk::DescriptorSetLayout,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxDescriptorSetLayout {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorSetLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.layout
    }
}

impl Drop for GfxDescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

impl GfxDescriptorSetLayout {
    pub fn new_draw_layout(device: Rc<GfxDevice>, texture_slots: u32, debug_name: &str) -> Self {
        let mut bindings = vec![
            vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT),
        ];
        for slot in 0..texture_slots {
            bindings.push(
                vk::DescriptorSetLayoutBinding::default()
                    .binding(1 + slot)
                    .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT),
            );
        }
        bindings.push(
            vk::DescriptorSetLayoutBinding::default()
                .binding(1 + texture_slots)
                .descriptor_type(vk::DescriptorType::SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT),
        );

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let layout = unsafe { device.create_descriptor_set_layout(&create_info, None).unwrap() };

        let layout = Self {
            layout,
            device,
        };
        layout.device.set_debug_name(&layout, debug_name);
        layout
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}
