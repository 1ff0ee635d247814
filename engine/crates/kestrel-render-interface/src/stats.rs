//! 渲染统计
//!
//! 诊断 overlay 使用的计数器。per-frame 的计数在每帧 present 后清零，
//! 累计值（管线构建数等）保留整个会话。

use std::fmt::Write;
use std::time::Instant;

/// GPU 显存占用信息，单位 MB
#[derive(Debug, Clone, Copy, Default)]
pub struct GpuMemoryInfo {
    pub used_mbytes: u32,
    pub budget_mbytes: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStatistics {
    pub draw_calls: u32,
    pub triangles: u32,
    pub barrier_calls: u32,
    pub render_target_binds: u32,
    pub uniform_updates: u32,
    pub fence_signals: u32,
    pub fence_waits: u32,
    /// 会话累计
    pub pipeline_builds: u32,
    pub frame_time_ms: f32,
}

/// 统计收集器
pub struct StatisticsCollector {
    current: RenderStatistics,
    frame_start: Option<Instant>,
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self {
            current: RenderStatistics::default(),
            frame_start: None,
        }
    }

    #[inline]
    pub fn inc_draw_calls(&mut self) {
        self.current.draw_calls += 1;
    }

    #[inline]
    pub fn inc_triangles(&mut self, count: u32) {
        self.current.triangles += count;
    }

    #[inline]
    pub fn inc_barrier_calls(&mut self) {
        self.current.barrier_calls += 1;
    }

    #[inline]
    pub fn inc_render_target_binds(&mut self) {
        self.current.render_target_binds += 1;
    }

    #[inline]
    pub fn inc_uniform_updates(&mut self) {
        self.current.uniform_updates += 1;
    }

    #[inline]
    pub fn inc_fence_signals(&mut self) {
        self.current.fence_signals += 1;
    }

    #[inline]
    pub fn inc_fence_waits(&mut self) {
        self.current.fence_waits += 1;
    }

    #[inline]
    pub fn inc_pipeline_builds(&mut self) {
        self.current.pipeline_builds += 1;
    }

    /// 帧开始计时
    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// 帧结束：记录帧时间，清零 per-frame 计数
    pub fn end_frame(&mut self) {
        if let Some(start) = self.frame_start.take() {
            self.current.frame_time_ms = start.elapsed().as_secs_f32() * 1000.0;
        }
        let pipeline_builds = self.current.pipeline_builds;
        let frame_time_ms = self.current.frame_time_ms;
        self.current = RenderStatistics {
            pipeline_builds,
            frame_time_ms,
            ..Default::default()
        };
    }

    #[inline]
    pub fn current(&self) -> &RenderStatistics {
        &self.current
    }

    /// 诊断 overlay 文本
    pub fn overlay_string(&self) -> String {
        let stats = &self.current;
        let mut out = String::new();
        let _ = writeln!(out, "frame time: {:.2} ms", stats.frame_time_ms);
        let _ = writeln!(out, "draw calls: {}", stats.draw_calls);
        let _ = writeln!(out, "triangles: {}", stats.triangles);
        let _ = writeln!(out, "barrier calls: {}", stats.barrier_calls);
        let _ = writeln!(out, "render target binds: {}", stats.render_target_binds);
        let _ = writeln!(out, "uniform updates: {}", stats.uniform_updates);
        let _ = writeln!(out, "fence signals: {}", stats.fence_signals);
        let _ = writeln!(out, "fence waits: {}", stats.fence_waits);
        let _ = writeln!(out, "pipeline builds: {}", stats.pipeline_builds);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_frame_resets_per_frame_counters() {
        let mut stats = StatisticsCollector::new();
        stats.begin_frame();
        stats.inc_draw_calls();
        stats.inc_triangles(12);
        stats.inc_pipeline_builds();
        stats.end_frame();

        assert_eq!(stats.current().draw_calls, 0);
        assert_eq!(stats.current().triangles, 0);
        // 会话累计值保留
        assert_eq!(stats.current().pipeline_builds, 1);
    }

    #[test]
    fn test_overlay_contains_counters() {
        let mut stats = StatisticsCollector::new();
        stats.inc_draw_calls();
        let overlay = stats.overlay_string();
        assert!(overlay.contains("draw calls: 1"));
        assert!(overlay.contains("barrier calls: 0"));
    }
}
