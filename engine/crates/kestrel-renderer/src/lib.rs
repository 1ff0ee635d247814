//! Kestrel 的设备门面层
//!
//! [`render_device::RenderDevice`] 是渲染的统一入口：帧生命周期状态机、
//! 资源状态转换、管线缓存、fence 记账、每帧临时池的回收都在这里，
//! 对所有后端一致。后端通过 [`backend`] 工厂选择。

pub mod backend;
pub mod deferred_release;
pub mod frame_sync;
pub mod pipeline_cache;
pub mod render_device;
