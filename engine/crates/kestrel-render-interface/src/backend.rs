//! 图形后端的能力契约
//!
//! 设备门面通过这个 trait 驱动具体后端。后端只负责忠实地执行命令与
//! 对象创建；状态去重、管线缓存、fence 记账、池回收等策略都在门面层，
//! 对所有后端一致。

use crate::handles::{
    PipelineHandle, RenderTargetHandle, ResourceId, ShaderHandle, TextureHandle, TransientSetHandle,
    VertexBufferHandle,
};
use crate::modes::{Anisotropy, ClearFlags, PixelFormat, TextureFilter, TextureWrap};
use crate::pipeline::PipelineKey;
use crate::resource_state::BarrierDesc;
use crate::settings::DefaultRenderSettings;
use crate::stats::GpuMemoryInfo;
use crate::vertex::{Face, VertexData, VertexFormat};

/// 纹理创建参数
///
/// 采样参数（wrap / filter / anisotropy）跟随纹理对象，
/// draw 时按 slot-0 纹理的参数选择 sampler。
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub mip_count: u32,
    pub is_cube: bool,
    pub wrap: TextureWrap,
    pub filter: TextureFilter,
    pub anisotropy: Anisotropy,
}

/// 离屏渲染目标的创建参数
#[derive(Debug, Clone, Copy)]
pub struct RenderTargetDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub is_cube: bool,
    pub wrap: TextureWrap,
    pub filter: TextureFilter,
}

/// shader 创建参数；SPIR-V 字节由 FileSystem 协作方提供
pub struct ShaderDesc<'a> {
    pub vertex_spirv: &'a [u8],
    pub fragment_spirv: &'a [u8],
    pub name: &'a str,
}

/// 单次 draw 的描述符绑定内容
#[derive(Debug, Clone, Copy)]
pub struct DrawBindings {
    pub textures: [TextureHandle; DefaultRenderSettings::MAX_TEXTURE_SLOTS],
}

/// 纹理创建结果：句柄 + 参与状态跟踪的资源
#[derive(Debug, Clone, Copy)]
pub struct CreatedTexture {
    pub handle: TextureHandle,
    pub resource: ResourceId,
}

/// 渲染目标创建结果
///
/// `texture` 是 color image 作为采样源时的句柄；
/// color / depth 资源分别参与状态跟踪。
#[derive(Debug, Clone, Copy)]
pub struct CreatedRenderTarget {
    pub handle: RenderTargetHandle,
    pub texture: TextureHandle,
    pub color_resource: ResourceId,
    pub depth_resource: ResourceId,
}

/// present 阶段的环境级致命错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentError {
    DeviceLost,
    SurfaceLost,
}

impl std::fmt::Display for PresentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceLost => write!(f, "device lost"),
            Self::SurfaceLost => write!(f, "surface lost"),
        }
    }
}

pub trait RenderBackend {
    fn kind_name(&self) -> &'static str;

    // ------------------------------------------------------------------
    // 资源创建
    // ------------------------------------------------------------------

    fn create_vertex_buffer(&mut self, faces: &[Face], vertices: VertexData<'_>, name: &str) -> VertexBufferHandle;

    fn vertex_buffer_face_count(&self, vertex_buffer: VertexBufferHandle) -> u32;

    fn vertex_buffer_format(&self, vertex_buffer: VertexBufferHandle) -> VertexFormat;

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8], name: &str) -> CreatedTexture;

    fn create_render_target(&mut self, desc: &RenderTargetDesc, name: &str) -> CreatedRenderTarget;

    /// 无效的 SPIR-V（空字节、长度不是 4 的倍数）是内容错误，断言失败
    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> ShaderHandle;

    /// 同步构建完整管线对象；昂贵，只应由管线缓存 miss 时调用
    fn create_pipeline(&mut self, key: &PipelineKey) -> PipelineHandle;

    // ------------------------------------------------------------------
    // swapchain 与静态信息
    // ------------------------------------------------------------------

    /// 所有 backbuffer image 的资源 id，初始化后一次性登记
    fn backbuffer_resources(&self) -> Vec<ResourceId>;

    /// 当前帧要写入的 backbuffer 的资源 id
    fn current_backbuffer_resource(&self) -> ResourceId;

    /// (color, depth)；sample_count == 1 时为 None
    fn msaa_resources(&self) -> Option<(ResourceId, ResourceId)>;

    fn backbuffer_extent(&self) -> (u32, u32);

    fn backbuffer_format(&self) -> PixelFormat;

    fn sample_count(&self) -> u32;

    fn render_target_extent(&self, target: RenderTargetHandle) -> (u32, u32);

    fn render_target_format(&self, target: RenderTargetHandle) -> PixelFormat;

    fn render_target_is_cube(&self, target: RenderTargetHandle) -> bool;

    // ------------------------------------------------------------------
    // 帧录制
    // ------------------------------------------------------------------

    /// 开始录制新一帧的命令（acquire backbuffer、重置 command buffer）
    fn reset_command_list(&mut self);

    fn record_barrier(&mut self, barrier: &BarrierDesc);

    /// `None` 绑定 swapchain backbuffer
    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>, cube_face: u32);

    /// 清除当前绑定目标，并将 viewport/scissor 设为目标尺寸
    fn clear_screen(&mut self, flags: ClearFlags, color: [f32; 4]);

    /// uniform ring 前进一格
    fn advance_uniform_ring(&mut self);

    /// 将数据写入 ring 的当前槽位
    fn write_current_uniforms(&mut self, data: &[u8]);

    /// 为本次 draw 分配临时描述符堆并写入绑定；
    /// 返回的句柄进入帧释放列表，fence 达成后由门面销毁
    fn write_draw_descriptors(&mut self, bindings: &DrawBindings) -> TransientSetHandle;

    /// 只允许在关联 fence 已完成后调用
    fn destroy_transient_set(&mut self, set: TransientSetHandle);

    fn draw_indexed(
        &mut self,
        vertex_buffer: VertexBufferHandle,
        pipeline: PipelineHandle,
        descriptors: TransientSetHandle,
        start_face: u32,
        end_face: u32,
    );

    fn resolve_msaa_to_backbuffer(&mut self);

    fn push_group_marker(&mut self, name: &str);

    fn pop_group_marker(&mut self);

    // ------------------------------------------------------------------
    // 提交与同步
    // ------------------------------------------------------------------

    /// 提交录制的命令并 signal 给定的 fence 值。
    /// 值由门面的 fence 计数器按严格提交顺序发放。
    fn submit_and_signal(&mut self, fence_value: u64);

    /// 查询 GPU 已经完成的最大 fence 值
    fn completed_fence_value(&mut self) -> u64;

    /// 阻塞等待直到 fence 值完成；无超时
    fn wait_fence(&mut self, fence_value: u64);

    fn present_frame(&mut self) -> Result<(), PresentError>;

    // ------------------------------------------------------------------
    // 能力与诊断
    // ------------------------------------------------------------------

    fn supports_polygon_offset(&self) -> bool;

    fn set_polygon_offset(&mut self, enable: bool, factor: f32, units: f32);

    fn gpu_memory_usage(&self) -> GpuMemoryInfo;

    /// 按依赖顺序释放全部 GPU 对象；调用方保证 GPU 已空闲
    fn release_gpu_objects(&mut self);
}
