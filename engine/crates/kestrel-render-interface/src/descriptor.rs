//! 描述符池的容量账本
//!
//! 每种视图类型一个固定容量的池，初始化时一次性确定大小，
//! 之后只做 bump 分配。分配出去的 slot 不单独归还；
//! 池只在子系统销毁时整体重置。超出容量是引擎配置错误，直接断言。

/// 描述符堆的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorHeapKind {
    /// constant buffer view / shader resource view / unordered access view
    CbvSrvUav,
    Sampler,
    /// render target view
    Rtv,
    /// depth stencil view
    Dsv,
}

/// 一个已分配的描述符槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSlot {
    pub kind: DescriptorHeapKind,
    pub index: u32,
    /// CPU-only 堆（RTV / DSV）的 slot 对 shader 不可见
    pub shader_visible: bool,
}

/// 单一种类的描述符池
pub struct DescriptorPool {
    kind: DescriptorHeapKind,
    capacity: u32,
    next: u32,
    shader_visible: bool,
}

impl DescriptorPool {
    pub fn new(kind: DescriptorHeapKind, capacity: u32) -> Self {
        assert!(capacity > 0, "descriptor pool capacity must be non-zero");
        let shader_visible = matches!(kind, DescriptorHeapKind::CbvSrvUav | DescriptorHeapKind::Sampler);
        Self {
            kind,
            capacity,
            next: 0,
            shader_visible,
        }
    }

    /// bump 分配一个 slot
    ///
    /// 池耗尽说明初始化时的容量配置不够，属于引擎错误。
    pub fn allocate(&mut self) -> DescriptorSlot {
        assert!(
            self.next < self.capacity,
            "descriptor pool {:?} exhausted (capacity {})",
            self.kind,
            self.capacity
        );
        let index = self.next;
        self.next += 1;
        DescriptorSlot {
            kind: self.kind,
            index,
            shader_visible: self.shader_visible,
        }
    }

    #[inline]
    pub fn kind(&self) -> DescriptorHeapKind {
        self.kind
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn allocated(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_returns_sequential_slots() {
        let mut pool = DescriptorPool::new(DescriptorHeapKind::Rtv, 4);
        assert_eq!(pool.allocate().index, 0);
        assert_eq!(pool.allocate().index, 1);
        assert_eq!(pool.allocated(), 2);
        assert!(!pool.allocate().shader_visible);
    }

    #[test]
    fn test_cbv_slots_are_shader_visible() {
        let mut pool = DescriptorPool::new(DescriptorHeapKind::CbvSrvUav, 1);
        assert!(pool.allocate().shader_visible);
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn test_allocate_past_capacity_panics() {
        let mut pool = DescriptorPool::new(DescriptorHeapKind::Dsv, 2);
        pool.allocate();
        pool.allocate();
        pool.allocate();
    }
}
