//! 管线状态缓存
//!
//! 以完整的 [`PipelineKey`] 为 key 记忆已构建的原生管线对象。
//! miss 时同步构建（昂贵，首次可达秒级），hit 时 O(1) 返回。
//! 会话期间从不逐出：管线数量受 {材质数 × 目标格式 × 采样数} 的
//! 有限组合约束。
//!
//! 查找永远按完整 key 的相等比较进行；64 位哈希只用于调试名。
//! 观测到两个不同 key 哈希相同时记一条 warn，不影响正确性。

use std::collections::HashMap;

use kestrel_render_interface::backend::RenderBackend;
use kestrel_render_interface::handles::PipelineHandle;
use kestrel_render_interface::pipeline::PipelineKey;

#[derive(Default)]
pub struct PipelineCache {
    pipelines: HashMap<PipelineKey, PipelineHandle>,
    /// 哈希 → 首个使用该哈希的 key，用于碰撞诊断
    hash_index: HashMap<u64, PipelineKey>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回 (句柄, 是否新构建)
    pub fn get_or_create(&mut self, backend: &mut dyn RenderBackend, key: &PipelineKey) -> (PipelineHandle, bool) {
        if let Some(handle) = self.pipelines.get(key) {
            return (*handle, false);
        }

        let hash = key.hash64();
        match self.hash_index.get(&hash) {
            Some(existing) if existing != key => {
                log::warn!("pipeline key hash collision: {hash:016x} shared by {existing:?} and {key:?}");
            }
            None => {
                self.hash_index.insert(hash, *key);
            }
            _ => {}
        }

        log::info!("building pipeline {hash:016x} ({key:?})");
        let handle = backend.create_pipeline(key);
        self.pipelines.insert(*key, handle);
        (handle, true)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// 只清空缓存表；原生对象由后端在 release 时销毁
    pub fn clear(&mut self) {
        self.pipelines.clear();
        self.hash_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;
    use kestrel_render_interface::handles::ShaderHandle;
    use kestrel_render_interface::modes::{BlendMode, CullMode, DepthFunc, FillMode, PixelFormat};
    use kestrel_render_interface::settings::RenderSettings;
    use kestrel_render_interface::vertex::VertexFormat;

    fn base_key() -> PipelineKey {
        PipelineKey {
            vertex_format: VertexFormat::Ptc,
            shader: ShaderHandle(1),
            blend_mode: BlendMode::Off,
            depth_func: DepthFunc::LessOrEqualWriteOn,
            cull_mode: CullMode::Back,
            fill_mode: FillMode::Solid,
            color_format: PixelFormat::Rgba8Srgb,
            sample_count: 1,
        }
    }

    #[test]
    fn test_repeated_lookup_returns_identical_handle() {
        let mut backend = HeadlessBackend::new(&RenderSettings::new("test", 64, 64));
        let mut cache = PipelineCache::new();

        let (first, built_first) = cache.get_or_create(&mut backend, &base_key());
        let (second, built_second) = cache.get_or_create(&mut backend, &base_key());

        assert!(built_first);
        assert!(!built_second);
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_all_mode_combinations_get_unique_handles() {
        let mut backend = HeadlessBackend::new(&RenderSettings::new("test", 64, 64));
        let mut cache = PipelineCache::new();

        let blends = [BlendMode::Off, BlendMode::AlphaBlend, BlendMode::Additive];
        let depths = [DepthFunc::LessOrEqualWriteOn, DepthFunc::LessOrEqualWriteOff, DepthFunc::NoneWriteOff];
        let culls = [CullMode::Off, CullMode::Back, CullMode::Front];
        let fills = [FillMode::Solid, FillMode::Wireframe];

        let mut handles = std::collections::HashSet::new();
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
                        let (handle, _) = cache.get_or_create(&mut backend, &key);
                        assert!(handles.insert(handle), "two distinct configurations mapped to {handle:?}");
                    }
                }
            }
        }
        assert_eq!(cache.len(), 3 * 3 * 3 * 2);
    }
}
