//! 各种 GPU 对象的不透明句柄
//!
//! 句柄由 backend 发放，backend 内部维护句柄到原生对象的映射。

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub u64);

/// 每次 draw 临时分配的描述符堆的句柄，随帧回收
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransientSetHandle(pub u64);

/// 参与状态跟踪的 GPU 资源（image）的标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u64);
