//! 渲染层的固定配置

use crate::modes::PixelFormat;

/// 渲染器默认配置
pub struct DefaultRenderSettings;

impl DefaultRenderSettings {
    /// 每个 draw 的纹理绑定槽位数
    pub const MAX_TEXTURE_SLOTS: usize = 2;

    /// uniform ring 中 256 字节 buffer 的数量
    pub const UNIFORM_RING_SIZE: u32 = 300;
    /// 单个 uniform buffer 的大小（对齐要求的倍数）
    pub const UNIFORM_BUFFER_SIZE: u64 = 256;

    /// 各描述符池的容量；uniform ring 必须放得进 CBV 池
    pub const CBV_SRV_UAV_POOL_CAPACITY: u32 = 512;
    pub const SAMPLER_POOL_CAPACITY: u32 = 16;
    pub const RTV_POOL_CAPACITY: u32 = 32;
    pub const DSV_POOL_CAPACITY: u32 = 8;

    pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
}

/// 创建渲染设备时的一次性配置
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub app_name: String,
    pub width: u32,
    pub height: u32,
    /// MSAA 采样数；1 表示关闭
    pub sample_count: u32,
}

impl RenderSettings {
    pub fn new(app_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            app_name: app_name.into(),
            width,
            height,
            sample_count: 1,
        }
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        assert!(
            sample_count.is_power_of_two() && sample_count <= 16,
            "invalid sample count: {sample_count}"
        );
        self.sample_count = sample_count;
        self
    }

    #[inline]
    pub fn backbuffer_format() -> PixelFormat {
        PixelFormat::Rgba8Srgb
    }
}
