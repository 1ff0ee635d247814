//! GPU 资源状态跟踪与 barrier 去重
//!
//! 每个参与状态转换的 image 在这里登记一条记录：当前 usage 状态，
//! 以及（对支持 split barrier 的后端）尚未完成的转换目标。
//! 只有状态真正发生变化时才会产生 barrier。

use std::collections::HashMap;

use crate::handles::ResourceId;

/// 资源在命令流上的 usage 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// 尚未被任何命令使用（初始布局）
    Undefined,
    /// 作为 color attachment 写入
    RenderTarget,
    /// 作为 depth attachment 写入
    DepthWrite,
    /// 被 shader 采样读取
    ShaderRead,
    TransferSrc,
    TransferDst,
    ResolveSrc,
    ResolveDst,
    /// 等待呈现
    Present,
}

/// split barrier 的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitBarrier {
    /// 完整 barrier
    None,
    /// 只发出 begin 部分，转换尚未完成
    Begin,
    /// 结束一个先前 begin 过的转换
    End,
}

/// 一条待录制的 barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierDesc {
    pub resource: ResourceId,
    pub from: ResourceState,
    pub to: ResourceState,
    pub split: SplitBarrier,
}

/// 单个资源的跟踪记录
///
/// 不变量：`usage` 始终反映该资源在命令流上最后记录的状态
#[derive(Debug, Clone, Copy)]
pub struct GpuResourceState {
    pub usage: ResourceState,
    /// split barrier 已经 begin、尚未 end 的目标状态
    pub transitioning: Option<ResourceState>,
}

/// 所有已登记资源的状态表
///
/// 对未登记资源的任何转换请求都是引擎 bug，直接 panic。
#[derive(Default)]
pub struct ResourceStateTracker {
    states: HashMap<ResourceId, GpuResourceState>,
}

impl ResourceStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个资源及其初始状态
    pub fn register(&mut self, id: ResourceId, initial: ResourceState) {
        let old = self.states.insert(
            id,
            GpuResourceState {
                usage: initial,
                transitioning: None,
            },
        );
        assert!(old.is_none(), "resource {id:?} registered twice");
    }

    #[inline]
    pub fn usage(&self, id: ResourceId) -> ResourceState {
        self.entry(id).usage
    }

    /// 请求将资源转换到 `new_state`
    ///
    /// - 状态未变化时不产生 barrier
    /// - 若先前已对同一目标 begin 过 split barrier，则消耗标记，
    ///   产生 end-only barrier，而不是重复的完整 barrier
    pub fn transition(&mut self, id: ResourceId, new_state: ResourceState) -> Option<BarrierDesc> {
        let state = self.entry_mut(id);

        if state.transitioning == Some(new_state) {
            let from = state.usage;
            state.transitioning = None;
            state.usage = new_state;
            return Some(BarrierDesc {
                resource: id,
                from,
                to: new_state,
                split: SplitBarrier::End,
            });
        }

        if state.usage == new_state {
            return None;
        }

        let from = state.usage;
        state.usage = new_state;
        Some(BarrierDesc {
            resource: id,
            from,
            to: new_state,
            split: SplitBarrier::None,
        })
    }

    /// 提前开始一个转换（split barrier 的 begin 部分）
    ///
    /// usage 状态保持不变，直到配对的 [`Self::transition`] 结束转换。
    pub fn begin_transition(&mut self, id: ResourceId, new_state: ResourceState) -> Option<BarrierDesc> {
        let state = self.entry_mut(id);

        if state.usage == new_state || state.transitioning == Some(new_state) {
            return None;
        }

        state.transitioning = Some(new_state);
        Some(BarrierDesc {
            resource: id,
            from: state.usage,
            to: new_state,
            split: SplitBarrier::Begin,
        })
    }

    fn entry(&self, id: ResourceId) -> &GpuResourceState {
        self.states.get(&id).unwrap_or_else(|| panic!("transition on unregistered resource {id:?}"))
    }

    fn entry_mut(&mut self, id: ResourceId) -> &mut GpuResourceState {
        self.states.get_mut(&id).unwrap_or_else(|| panic!("transition on unregistered resource {id:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(id: ResourceId, state: ResourceState) -> ResourceStateTracker {
        let mut tracker = ResourceStateTracker::new();
        tracker.register(id, state);
        tracker
    }

    #[test]
    fn test_transition_records_single_barrier() {
        let id = ResourceId(1);
        let mut tracker = tracker_with(id, ResourceState::ShaderRead);

        let barrier = tracker.transition(id, ResourceState::RenderTarget);
        assert_eq!(
            barrier,
            Some(BarrierDesc {
                resource: id,
                from: ResourceState::ShaderRead,
                to: ResourceState::RenderTarget,
                split: SplitBarrier::None,
            })
        );
        assert_eq!(tracker.usage(id), ResourceState::RenderTarget);
    }

    #[test]
    fn test_transition_same_state_is_noop() {
        let id = ResourceId(1);
        let mut tracker = tracker_with(id, ResourceState::ShaderRead);

        assert!(tracker.transition(id, ResourceState::RenderTarget).is_some());
        // 第二次请求同一状态不再产生 barrier
        assert!(tracker.transition(id, ResourceState::RenderTarget).is_none());
        assert_eq!(tracker.usage(id), ResourceState::RenderTarget);
    }

    #[test]
    fn test_split_transition_consumes_begin_marker() {
        let id = ResourceId(2);
        let mut tracker = tracker_with(id, ResourceState::RenderTarget);

        let begin = tracker.begin_transition(id, ResourceState::ShaderRead).unwrap();
        assert_eq!(begin.split, SplitBarrier::Begin);
        // begin 之后 usage 尚未变化
        assert_eq!(tracker.usage(id), ResourceState::RenderTarget);

        // 重复 begin 不产生第二个 begin barrier
        assert!(tracker.begin_transition(id, ResourceState::ShaderRead).is_none());

        let end = tracker.transition(id, ResourceState::ShaderRead).unwrap();
        assert_eq!(end.split, SplitBarrier::End);
        assert_eq!(tracker.usage(id), ResourceState::ShaderRead);

        // 转换完成后再次请求是 no-op
        assert!(tracker.transition(id, ResourceState::ShaderRead).is_none());
    }

    #[test]
    #[should_panic(expected = "unregistered resource")]
    fn test_transition_unregistered_resource_panics() {
        let mut tracker = ResourceStateTracker::new();
        tracker.transition(ResourceId(42), ResourceState::Present);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_double_register_panics() {
        let mut tracker = tracker_with(ResourceId(1), ResourceState::Undefined);
        tracker.register(ResourceId(1), ResourceState::Undefined);
    }
}
