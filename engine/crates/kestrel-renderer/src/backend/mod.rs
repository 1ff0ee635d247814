//! 后端选择
//!
//! 后端在创建时通过工厂选定，共享源码里没有任何按 API 的条件编译。

pub mod headless;
pub mod vulkan;

use kestrel_render_interface::backend::RenderBackend;
use kestrel_render_interface::settings::RenderSettings;

/// 可用的后端种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// 主后端：Vulkan
    Vulkan,
    /// 测试/无显示环境用：把命令记录成计数
    Headless,
}

/// 创建 surface 所需的窗口句柄
#[derive(Clone, Copy)]
pub struct WindowHandles {
    pub display: raw_window_handle::RawDisplayHandle,
    pub window: raw_window_handle::RawWindowHandle,
}

/// 后端工厂
///
/// # Panic
/// Vulkan 后端必须提供窗口句柄；平台图形 API 不可用时 panic
pub fn create_backend(
    kind: BackendKind,
    settings: &RenderSettings,
    window: Option<WindowHandles>,
) -> Box<dyn RenderBackend> {
    match kind {
        BackendKind::Vulkan => {
            let window = window.expect("vulkan backend requires window handles");
            Box::new(vulkan::VulkanBackend::new(settings, window))
        }
        BackendKind::Headless => Box::new(headless::HeadlessBackend::new(settings)),
    }
}
