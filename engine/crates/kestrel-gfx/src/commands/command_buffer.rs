use std::ffi::CString;
use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use crate::{
    commands::{barrier::GfxImageBarrier, command_pool::GfxCommandPool},
    foundation::device::GfxDevice,
};

/// 不能实现 Drop，因为需要通过 command pool 手动 free；
/// cmd 支持 clone，不应该在意外的地方 free
#[derive(Clone)]
pub struct GfxCommandBuffer {
    handle: vk::CommandBuffer,
    device: Rc<GfxDevice>,
}

// basic 命令
impl GfxCommandBuffer {
    pub fn new(device: Rc<GfxDevice>, command_pool: &GfxCommandPool, debug_name: &str) -> Self {
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool.handle())
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffer = unsafe { device.allocate_command_buffers(&info).unwrap()[0] };
        device.set_object_debug_name(command_buffer, debug_name);
        Self {
            handle: command_buffer,
            device,
        }
    }

    #[inline]
    pub fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }

    /// 释放 command buffer 在 command pool 中所占用的内存
    #[inline]
    pub fn free(self, command_pool: &GfxCommandPool) {
        unsafe {
            self.device.free_command_buffers(command_pool.handle(), std::slice::from_ref(&self.handle));
        }
    }

    /// 开始录制 command
    #[inline]
    pub fn begin(&self, usage_flag: vk::CommandBufferUsageFlags) {
        unsafe {
            self.device
                .begin_command_buffer(self.handle, &vk::CommandBufferBeginInfo::default().flags(usage_flag))
                .unwrap();
        }
    }

    /// 结束录制 command
    #[inline]
    pub fn end(&self) {
        unsafe { self.device.end_command_buffer(self.handle).unwrap() }
    }

    #[inline]
    pub fn reset(&self) {
        unsafe {
            self.device.reset_command_buffer(self.handle, vk::CommandBufferResetFlags::empty()).unwrap();
        }
    }
}

// transfer 类型的命令
impl GfxCommandBuffer {
    /// - command type: action
    /// - 支持的 queue：transfer，graphics，compute
    #[inline]
    pub fn cmd_copy_buffer(&self, src: vk::Buffer, dst: vk::Buffer, regions: &[vk::BufferCopy]) {
        unsafe {
            self.device.cmd_copy_buffer(self.handle, src, dst, regions);
        }
    }

    /// - command type: action
    /// - 支持的 queue：transfer，graphics，compute
    #[inline]
    pub fn cmd_copy_buffer_to_image(&self, copy_info: &vk::CopyBufferToImageInfo2) {
        unsafe { self.device.cmd_copy_buffer_to_image2(self.handle, copy_info) }
    }
}

// 绘制类型命令
impl GfxCommandBuffer {
    /// - command type: action, state
    /// - supported queue types: graphics
    #[inline]
    pub fn begin_rendering(&self, render_info: &vk::RenderingInfo) {
        unsafe {
            self.device.cmd_begin_rendering(self.handle, render_info);
        }
    }

    /// - command type: action, state
    /// - supported queue types: graphics
    #[inline]
    pub fn end_rendering(&self) {
        unsafe {
            self.device.cmd_end_rendering(self.handle);
        }
    }

    /// - command type: action
    /// - supported queue types: graphics
    #[inline]
    pub fn draw_indexed(
        &self,
        index_count: u32,
        first_index: u32,
        instance_count: u32,
        first_instance: u32,
        vertex_offset: i32,
    ) {
        unsafe {
            self.device.cmd_draw_indexed(
                self.handle,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }

    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn bind_descriptor_sets(
        &self,
        bind_point: vk::PipelineBindPoint,
        pipeline_layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
        dynamic_offsets: &[u32],
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.handle,
                bind_point,
                pipeline_layout,
                first_set,
                descriptor_sets,
                dynamic_offsets,
            );
        }
    }

    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        unsafe {
            self.device.cmd_bind_pipeline(self.handle, bind_point, pipeline);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn bind_vertex_buffers(&self, first_bind: u32, buffers: &[vk::Buffer], offsets: &[vk::DeviceSize]) {
        unsafe {
            self.device.cmd_bind_vertex_buffers(self.handle, first_bind, buffers, offsets);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn bind_index_buffer(&self, buffer: vk::Buffer, offset: vk::DeviceSize, index_type: vk::IndexType) {
        unsafe {
            self.device.cmd_bind_index_buffer(self.handle, buffer, offset, index_type);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn set_viewport(&self, first_viewport: u32, viewports: &[vk::Viewport]) {
        unsafe {
            self.device.cmd_set_viewport(self.handle, first_viewport, viewports);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn set_scissor(&self, first_scissor: u32, scissors: &[vk::Rect2D]) {
        unsafe {
            self.device.cmd_set_scissor(self.handle, first_scissor, scissors);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn set_depth_bias_enable(&self, enable: bool) {
        unsafe {
            self.device.cmd_set_depth_bias_enable(self.handle, enable);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn set_depth_bias(&self, constant_factor: f32, clamp: f32, slope_factor: f32) {
        unsafe {
            self.device.cmd_set_depth_bias(self.handle, constant_factor, clamp, slope_factor);
        }
    }

    /// MSAA 解析到单采样 image
    /// - command type: action
    /// - supported queue types: graphics
    #[inline]
    pub fn resolve_image(
        &self,
        src: vk::Image,
        src_layout: vk::ImageLayout,
        dst: vk::Image,
        dst_layout: vk::ImageLayout,
        regions: &[vk::ImageResolve],
    ) {
        unsafe {
            self.device.cmd_resolve_image(self.handle, src, src_layout, dst, dst_layout, regions);
        }
    }
}

// 同步命令
impl GfxCommandBuffer {
    /// - command type: synchronize
    /// - supported queue types: graphics, compute, transfer
    #[inline]
    pub fn image_memory_barrier(&self, dependency_flags: vk::DependencyFlags, barriers: &[GfxImageBarrier]) {
        let barriers = barriers.iter().map(|b| *b.inner()).collect_vec();
        let dependency_info =
            vk::DependencyInfo::default().image_memory_barriers(&barriers).dependency_flags(dependency_flags);
        unsafe {
            self.device.cmd_pipeline_barrier2(self.handle, &dependency_info);
        }
    }
}

// debug 相关的指令
impl GfxCommandBuffer {
    /// - command type: state, action
    /// - supported queue type: graphics, compute
    #[inline]
    pub fn begin_label(&self, label_name: &str) {
        let name = CString::new(label_name).unwrap();
        unsafe {
            self.device
                .debug_utils()
                .cmd_begin_debug_utils_label(self.handle, &vk::DebugUtilsLabelEXT::default().label_name(name.as_c_str()));
        }
    }

    /// - command type: state, action
    /// - supported queue type: graphics, compute
    #[inline]
    pub fn end_label(&self) {
        unsafe {
            self.device.debug_utils().cmd_end_debug_utils_label(self.handle);
        }
    }
}
