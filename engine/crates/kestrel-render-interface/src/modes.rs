//! 绘制状态的各种模式枚举
//!
//! 这些枚举是管线 key 的组成部分，两个语义相同的组合必须比较相等。

use bitflags::bitflags;

/// 混合模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// 不混合，直接覆盖
    Off,
    /// src.a * src + (1 - src.a) * dst
    AlphaBlend,
    /// src + dst
    Additive,
}

/// 深度测试与深度写入的组合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    /// LEQUAL 测试，写入深度
    LessOrEqualWriteOn,
    /// LEQUAL 测试，不写入深度
    LessOrEqualWriteOff,
    /// 不测试，不写入
    NoneWriteOff,
}

/// 背面剔除模式
///
/// 按照 OpenGL 的传统，将 CCW 视为 front face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    Off,
    Back,
    Front,
}

/// 填充模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    Solid,
    Wireframe,
}

/// 像素格式
///
/// 只列出本引擎实际使用的格式；backend 负责映射到原生格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8Srgb,
    Rgba8Unorm,
    Bgra8Srgb,
    Bgra8Unorm,
    Rgba16Float,
    Depth32Float,
}

/// 纹理坐标超出 [0, 1] 时的采样行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    Repeat,
    Clamp,
}

/// 纹理放大缩小时的过滤方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// 各向异性过滤级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anisotropy {
    X1,
    X2,
    X4,
    X8,
}

impl Anisotropy {
    /// sampler 矩阵中按各向异性级别的下标
    #[inline]
    pub fn sampler_index(self) -> usize {
        match self {
            Self::X1 => 0,
            Self::X2 => 1,
            Self::X4 => 2,
            Self::X8 => 3,
        }
    }

    #[inline]
    pub fn max_anisotropy(self) -> f32 {
        match self {
            Self::X1 => 1.0,
            Self::X2 => 2.0,
            Self::X4 => 4.0,
            Self::X8 => 8.0,
        }
    }
}

bitflags! {
    /// ClearScreen 的清屏目标
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = 0b01;
        const DEPTH = 0b10;
    }
}
