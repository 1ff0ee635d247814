//! 顶点数据布局
//!
//! 三种顶点格式对应三套固定的 attribute 布局，是管线 key 的一部分。

use glam::{Vec2, Vec3, Vec4};

/// 一个三角形面，索引类型固定为 u16
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Face {
    pub a: u16,
    pub b: u16,
    pub c: u16,
}

impl Face {
    #[inline]
    pub fn new(a: u16, b: u16, c: u16) -> Self {
        Self { a, b, c }
    }
}

/// position + uv + color
///
/// 顶点内用裸 f32 数组存储：glam 的 SIMD 向量有 16 字节对齐，
/// 会在 attribute 之间引入 padding，破坏紧凑布局
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPTC {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl VertexPTC {
    #[inline]
    pub fn new(position: Vec3, uv: Vec2, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
            color: color.to_array(),
        }
    }
}

/// position + uv + normal
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPTN {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl VertexPTN {
    #[inline]
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// position + uv + normal + tangent + color
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPTNTC {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub color: [f32; 4],
}

impl VertexPTNTC {
    #[inline]
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3, tangent: Vec4, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
            normal: normal.to_array(),
            tangent: tangent.to_array(),
            color: color.to_array(),
        }
    }
}

/// 顶点格式种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Ptc,
    Ptn,
    Ptntc,
}

impl VertexFormat {
    /// 单个顶点的字节数
    #[inline]
    pub fn stride(self) -> u32 {
        match self {
            Self::Ptc => size_of::<VertexPTC>() as u32,
            Self::Ptn => size_of::<VertexPTN>() as u32,
            Self::Ptntc => size_of::<VertexPTNTC>() as u32,
        }
    }
}

/// 创建 vertex buffer 时的顶点数据
pub enum VertexData<'a> {
    Ptc(&'a [VertexPTC]),
    Ptn(&'a [VertexPTN]),
    Ptntc(&'a [VertexPTNTC]),
}

impl VertexData<'_> {
    #[inline]
    pub fn format(&self) -> VertexFormat {
        match self {
            Self::Ptc(_) => VertexFormat::Ptc,
            Self::Ptn(_) => VertexFormat::Ptn,
            Self::Ptntc(_) => VertexFormat::Ptntc,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Ptc(v) => v.len(),
            Self::Ptn(v) => v.len(),
            Self::Ptntc(v) => v.len(),
        }
    }

    /// 顶点数据的原始字节
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Ptc(v) => bytemuck::cast_slice(v),
            Self::Ptn(v) => bytemuck::cast_slice(v),
            Self::Ptntc(v) => bytemuck::cast_slice(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_strides() {
        assert_eq!(VertexFormat::Ptc.stride(), 36);
        assert_eq!(VertexFormat::Ptn.stride(), 32);
        assert_eq!(VertexFormat::Ptntc.stride(), 64);
    }

    #[test]
    fn test_vertex_data_bytes() {
        let vertices = [VertexPTC::default(); 3];
        let data = VertexData::Ptc(&vertices);
        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.bytes().len(), 3 * 36);
        assert_eq!(data.format(), VertexFormat::Ptc);
    }
}
