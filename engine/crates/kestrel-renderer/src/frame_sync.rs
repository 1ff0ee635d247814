//! fence 计数器
//!
//! 单调递增的 GPU/CPU 同步计数：提交获得一个 fence 值，
//! 值按严格提交顺序发放；等到某个值即保证该值之前提交的所有
//! GPU 工作都已退役。这是本层唯一的跨队列排序原语，
//! "等上一帧"与"回收临时池"都建立在它之上。

use kestrel_render_interface::backend::RenderBackend;

pub struct FrameSync {
    /// 下一次 signal 要用的值，初始 1
    next_value: u64,
    /// 已观测到完成的最大值，缓存以避免重复查询驱动
    last_completed: u64,
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSync {
    pub fn new() -> Self {
        Self {
            next_value: 1,
            last_completed: 0,
        }
    }

    /// 提交录制好的命令并 signal 下一个 fence 值
    pub fn execute_and_signal(&mut self, backend: &mut dyn RenderBackend) -> u64 {
        let value = self.next_value;
        backend.submit_and_signal(value);
        self.next_value += 1;
        value
    }

    /// 查询某个 fence 值是否已完成
    ///
    /// 只有缓存值落后于请求值时才重新查询设备。
    pub fn is_complete(&mut self, backend: &mut dyn RenderBackend, value: u64) -> bool {
        assert!(value < self.next_value, "fence value {value} has never been signaled");
        if value > self.last_completed {
            self.last_completed = self.last_completed.max(backend.completed_fence_value());
        }
        value <= self.last_completed
    }

    /// 阻塞等待某个 fence 值；已完成时直接返回
    pub fn wait_for(&mut self, backend: &mut dyn RenderBackend, value: u64) {
        if value == 0 || self.is_complete(backend, value) {
            return;
        }
        backend.wait_fence(value);
        self.last_completed = self.last_completed.max(value);
    }

    #[inline]
    pub fn last_completed(&self) -> u64 {
        self.last_completed
    }

    #[inline]
    pub fn last_signaled(&self) -> u64 {
        self.next_value - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;
    use kestrel_render_interface::settings::RenderSettings;

    fn headless() -> HeadlessBackend {
        HeadlessBackend::new(&RenderSettings::new("test", 64, 64))
    }

    #[test]
    fn test_signal_values_strictly_increase() {
        let mut backend = headless();
        let mut sync = FrameSync::new();

        let v1 = sync.execute_and_signal(&mut backend);
        let v2 = sync.execute_and_signal(&mut backend);
        let v3 = sync.execute_and_signal(&mut backend);
        assert!(v1 < v2 && v2 < v3);
        assert_eq!(v1, 1);
    }

    #[test]
    fn test_is_complete_tracks_gpu_progress() {
        let mut backend = headless();
        backend.hold_gpu(true);
        let mut sync = FrameSync::new();

        let v = sync.execute_and_signal(&mut backend);
        assert!(!sync.is_complete(&mut backend, v));

        backend.advance_gpu_to(v);
        assert!(sync.is_complete(&mut backend, v));
    }

    #[test]
    fn test_wait_for_implies_complete() {
        let mut backend = headless();
        backend.hold_gpu(true);
        let mut sync = FrameSync::new();

        let v = sync.execute_and_signal(&mut backend);
        sync.wait_for(&mut backend, v);
        assert!(sync.is_complete(&mut backend, v));
    }

    #[test]
    fn test_completed_value_is_cached() {
        let mut backend = headless();
        let trace = backend.trace();
        let mut sync = FrameSync::new();

        let v1 = sync.execute_and_signal(&mut backend);
        let v2 = sync.execute_and_signal(&mut backend);

        assert!(sync.is_complete(&mut backend, v2));
        let queries = trace.borrow().completed_queries;

        // v1 <= 缓存的 last_completed，不应再查询设备
        assert!(sync.is_complete(&mut backend, v1));
        assert!(sync.is_complete(&mut backend, v2));
        assert_eq!(trace.borrow().completed_queries, queries);
    }

    #[test]
    #[should_panic(expected = "never been signaled")]
    fn test_query_unsignaled_value_panics() {
        let mut backend = headless();
        let mut sync = FrameSync::new();
        sync.is_complete(&mut backend, 5);
    }
}
