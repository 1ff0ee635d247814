//! Kestrel 渲染层的后端无关接口
//!
//! 所有图形后端（Vulkan / Headless）共享的类型与契约：
//! - 绘制模式枚举（blend / depth / cull / fill）
//! - 顶点数据布局
//! - 资源状态跟踪（barrier 去重与 split barrier 标记）
//! - 管线 key 与确定性哈希
//! - 描述符池的容量账本
//! - 渲染统计
//! - [`backend::RenderBackend`] trait 本体
//!
//! 本 crate 不依赖任何图形 API。

pub mod backend;
pub mod descriptor;
pub mod handles;
pub mod modes;
pub mod pipeline;
pub mod resource_state;
pub mod settings;
pub mod stats;
pub mod vertex;
