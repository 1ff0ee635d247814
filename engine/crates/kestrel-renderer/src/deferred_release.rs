//! fence 值门控的延迟释放队列
//!
//! 一件对象在 GPU 可能仍在引用它时不能销毁。入队时带上
//! "必须达到的 fence 值"，只有观测到该值完成后才会交还给调用方销毁。
//! 每帧的临时描述符堆和 upload buffer 都走这条队列。

use std::collections::VecDeque;

pub struct DeferredReleaseQueue<T> {
    entries: VecDeque<(u64, T)>,
}

impl<T> Default for DeferredReleaseQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredReleaseQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// 入队；`fence_value` 完成之前不会交还
    pub fn push(&mut self, fence_value: u64, item: T) {
        self.entries.push_back((fence_value, item));
    }

    /// 取出所有 fence 值 <= `completed_value` 的对象
    pub fn drain_completed(&mut self, completed_value: u64) -> Vec<T> {
        let mut released = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.entries.len());
        for (fence_value, item) in self.entries.drain(..) {
            if fence_value <= completed_value {
                released.push(item);
            } else {
                remaining.push_back((fence_value, item));
            }
        }
        self.entries = remaining;
        released
    }

    /// 取出全部对象；只应在最终 fence 等待之后调用
    pub fn drain_all(&mut self) -> Vec<T> {
        self.entries.drain(..).map(|(_, item)| item).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_held_until_fence_completes() {
        let mut queue = DeferredReleaseQueue::new();
        queue.push(1, "a");
        queue.push(2, "b");
        queue.push(3, "c");

        assert!(queue.drain_completed(0).is_empty());
        assert_eq!(queue.drain_completed(2), vec!["a", "b"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_completed(3), vec!["c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_all_empties_queue() {
        let mut queue = DeferredReleaseQueue::new();
        queue.push(7, 1u32);
        queue.push(9, 2u32);

        assert_eq!(queue.drain_all(), vec![1, 2]);
        assert!(queue.is_empty());
    }
}
