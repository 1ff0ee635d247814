//! 管线 key
//!
//! 一次 draw 的全部固定功能 + shader 配置归约成一个 key。
//! 缓存查找永远使用完整 key 的相等比较；64 位哈希只用于调试名和
//! 碰撞诊断，不参与正确性。

use crate::handles::ShaderHandle;
use crate::modes::{BlendMode, CullMode, DepthFunc, FillMode, PixelFormat};
use crate::vertex::VertexFormat;

/// 完整的管线配置 key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub vertex_format: VertexFormat,
    pub shader: ShaderHandle,
    pub blend_mode: BlendMode,
    pub depth_func: DepthFunc,
    pub cull_mode: CullMode,
    pub fill_mode: FillMode,
    pub color_format: PixelFormat,
    pub sample_count: u32,
}

impl PipelineKey {
    /// key 的确定性 64 位哈希（FNV-1a）
    ///
    /// 跨进程、跨运行稳定，用于管线的调试命名与碰撞诊断。
    pub fn hash64(&self) -> u64 {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let fields: [u64; 8] = [
            self.vertex_format as u64,
            self.shader.0,
            self.blend_mode as u64,
            self.depth_func as u64,
            self.cull_mode as u64,
            self.fill_mode as u64,
            self.color_format as u64,
            self.sample_count as u64,
        ];

        let mut hash = FNV_OFFSET;
        for field in fields {
            for byte in field.to_le_bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(FNV_PRIME);
            }
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_key() -> PipelineKey {
        PipelineKey {
            vertex_format: VertexFormat::Ptc,
            shader: ShaderHandle(7),
            blend_mode: BlendMode::Off,
            depth_func: DepthFunc::LessOrEqualWriteOn,
            cull_mode: CullMode::Back,
            fill_mode: FillMode::Solid,
            color_format: PixelFormat::Rgba8Srgb,
            sample_count: 1,
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(base_key().hash64(), base_key().hash64());
    }

    #[test]
    fn test_distinct_keys_hash_differently() {
        // 枚举所有 blend × depth × cull × fill 组合，检查哈希两两不同。
        // 哈希碰撞本身不是正确性问题（缓存按完整 key 比较），
        // 但这个小空间里就碰撞说明哈希实现坏了。
        let blends = [BlendMode::Off, BlendMode::AlphaBlend, BlendMode::Additive];
        let depths = [DepthFunc::LessOrEqualWriteOn, DepthFunc::LessOrEqualWriteOff, DepthFunc::NoneWriteOff];
        let culls = [CullMode::Off, CullMode::Back, CullMode::Front];
        let fills = [FillMode::Solid, FillMode::Wireframe];

        let mut seen = std::collections::HashMap::new();
        for blend in blends {
            for depth in depths {
                for cull in culls {
                    for fill in fills {
                        let key = PipelineKey {
                            blend_mode: blend,
                            depth_func: depth,
                            cull_mode: cull,
                            fill_mode: fill,
                            ..base_key()
                        };
                        if let Some(other) = seen.insert(key.hash64(), key) {
                            panic!("hash collision between {key:?} and {other:?}");
                        }
                    }
                }
            }
        }
        assert_eq!(seen.len(), 3 * 3 * 3 * 2);
    }
}
