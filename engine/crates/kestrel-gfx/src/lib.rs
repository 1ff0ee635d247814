//! Kestrel 的 Vulkan 封装层
//!
//! 对 ash / vk-mem 的薄封装。所有对象的构造函数都显式接受
//! device / allocator 的引用，没有任何全局状态。

pub mod commands;
pub mod descriptors;
pub mod foundation;
pub mod pipelines;
pub mod resources;
pub mod swapchain;
