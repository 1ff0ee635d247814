use std::io::Cursor;
use std::rc::Rc;

use ash::vk;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

/// shader module，只在管线创建期间存活
///
/// SPIR-V 字节由文件系统协作方提供，这里不关心其来源。
pub struct GfxShaderModule {
    handle: vk::ShaderModule,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxShaderModule {
    fn debug_type_name() -> &'static str {
        "GfxShaderModule"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl GfxShaderModule {
    /// # Panic
    /// 空字节或长度不是 4 的倍数说明给的不是 SPIR-V，属于内容错误
    pub fn new(device: Rc<GfxDevice>, spirv_bytes: &[u8], debug_name: &str) -> Self {
        assert!(!spirv_bytes.is_empty(), "shader '{debug_name}' has no spirv bytes");
        let code = ash::util::read_spv(&mut Cursor::new(spirv_bytes))
            .unwrap_or_else(|e| panic!("shader '{debug_name}' is not valid spirv: {e}"));

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let handle = unsafe { device.create_shader_module(&create_info, None).unwrap() };

        let module = Self {
            handle,
            device,
        };
        module.device.set_debug_name(&module, debug_name);
        module
    }

    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.handle
    }

    #[inline]
    pub fn destroy(self) {
        unsafe {
            self.device.destroy_shader_module(self.handle, None);
        }
    }
}
