use std::rc::Rc;

use ash::vk;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

pub struct GfxSampler {
    handle: vk::Sampler,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxSampler {
    fn debug_type_name() -> &'static str {
        "GfxSampler"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl Drop for GfxSampler {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.handle, None);
        }
    }
}

impl GfxSampler {
    pub fn new(
        device: Rc<GfxDevice>,
        filter: vk::Filter,
        address_mode: vk::SamplerAddressMode,
        max_anisotropy: f32,
        debug_name: &str,
    ) -> Self {
        let mipmap_mode = if filter == vk::Filter::LINEAR {
            vk::SamplerMipmapMode::LINEAR
        } else {
            vk::SamplerMipmapMode::NEAREST
        };
        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter)
            .min_filter(filter)
            .mipmap_mode(mipmap_mode)
            .address_mode_u(address_mode)
            .address_mode_v(address_mode)
            .address_mode_w(address_mode)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .anisotropy_enable(max_anisotropy > 1.0)
            .max_anisotropy(max_anisotropy);

        let handle = unsafe { device.create_sampler(&create_info, None).unwrap() };
        let sampler = Self {
            handle,
            device,
        };
        sampler.device.set_debug_name(&sampler, debug_name);
        sampler
    }

    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.handle
    }
}
