//! 设备门面
//!
//! 渲染的统一入口。帧生命周期是一个显式状态机：
//!
//! ```text
//! Idle -> Recording (reset_command_list)
//!      -> TargetBound (set_render_target / clear_screen，每个 pass 可重复)
//!      -> Drawing (draw，可重复)
//!      -> present -> Idle
//! ```
//!
//! 违反状态机属于调用方的引擎 bug，直接断言；环境级错误
//! （设备丢失）在 present 中致命退出。单渲染线程专用，
//! 内部没有任何同步。

use std::collections::{HashMap, HashSet};

use kestrel_render_interface::backend::{
    CreatedRenderTarget, DrawBindings, RenderBackend, RenderTargetDesc, ShaderDesc, TextureDesc,
};
use kestrel_render_interface::handles::{
    RenderTargetHandle, ResourceId, ShaderHandle, TextureHandle, TransientSetHandle, VertexBufferHandle,
};
use kestrel_render_interface::modes::{
    Anisotropy, BlendMode, ClearFlags, CullMode, DepthFunc, FillMode, PixelFormat, TextureFilter, TextureWrap,
};
use kestrel_render_interface::pipeline::PipelineKey;
use kestrel_render_interface::resource_state::{ResourceState, ResourceStateTracker};
use kestrel_render_interface::settings::{DefaultRenderSettings, RenderSettings};
use kestrel_render_interface::stats::{GpuMemoryInfo, RenderStatistics, StatisticsCollector};
use kestrel_render_interface::vertex::{Face, VertexData};

use crate::deferred_release::DeferredReleaseQueue;
use crate::frame_sync::FrameSync;
use crate::pipeline_cache::PipelineCache;

/// 帧生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Recording,
    TargetBound,
    Drawing,
}

pub struct RenderDevice {
    backend: Box<dyn RenderBackend>,

    frame_state: FrameState,
    states: ResourceStateTracker,
    pipeline_cache: PipelineCache,
    frame_sync: FrameSync,
    stats: StatisticsCollector,

    /// 本帧分配的临时描述符堆
    frame_transients: Vec<TransientSetHandle>,
    /// fence 门控的待销毁队列
    transient_release: DeferredReleaseQueue<TransientSetHandle>,
    /// 上一帧 signal 的 fence 值；回收临时池之前必须等到它
    prev_frame_fence: u64,

    render_targets: HashMap<RenderTargetHandle, CreatedRenderTarget>,
    textures: HashMap<TextureHandle, ResourceId>,
    shaders: HashSet<ShaderHandle>,

    bound_textures: [TextureHandle; DefaultRenderSettings::MAX_TEXTURE_SLOTS],
    default_texture: TextureHandle,
    current_target: Option<RenderTargetHandle>,

    clear_color: [f32; 4],
    released: bool,
}

// 创建与销毁
impl RenderDevice {
    pub fn new(mut backend: Box<dyn RenderBackend>) -> Self {
        let mut states = ResourceStateTracker::new();

        // swapchain image 的初始布局未定义，首次绑定时转换
        for resource in backend.backbuffer_resources() {
            states.register(resource, ResourceState::Undefined);
        }
        // MSAA 目标由后端在初始化命令中转换到位
        if let Some((color, depth)) = backend.msaa_resources() {
            states.register(color, ResourceState::RenderTarget);
            states.register(depth, ResourceState::DepthWrite);
        }

        // 默认白色纹理，每帧重置时回绑到所有槽位
        let white = [255u8; 4];
        let created = backend.create_texture(
            &TextureDesc {
                width: 1,
                height: 1,
                format: PixelFormat::Rgba8Unorm,
                mip_count: 1,
                is_cube: false,
                wrap: TextureWrap::Repeat,
                filter: TextureFilter::Nearest,
                anisotropy: Anisotropy::X1,
            },
            &white,
            "default-white",
        );
        states.register(created.resource, ResourceState::ShaderRead);

        let mut textures = HashMap::new();
        textures.insert(created.handle, created.resource);

        log::info!("render device ready, backend: {}", backend.kind_name());

        Self {
            backend,
            frame_state: FrameState::Idle,
            states,
            pipeline_cache: PipelineCache::new(),
            frame_sync: FrameSync::new(),
            stats: StatisticsCollector::new(),
            frame_transients: Vec::new(),
            transient_release: DeferredReleaseQueue::new(),
            prev_frame_fence: 0,
            render_targets: HashMap::new(),
            textures,
            shaders: HashSet::new(),
            bound_textures: [created.handle; DefaultRenderSettings::MAX_TEXTURE_SLOTS],
            default_texture: created.handle,
            current_target: None,
            clear_color: DefaultRenderSettings::DEFAULT_CLEAR_COLOR,
            released: false,
        }
    }

    /// 通过工厂一步创建
    pub fn init(
        kind: crate::backend::BackendKind,
        settings: &RenderSettings,
        window: Option<crate::backend::WindowHandles>,
    ) -> Self {
        Self::new(crate::backend::create_backend(kind, settings, window))
    }

    /// 按依赖顺序释放全部 GPU 对象
    ///
    /// 先用最终的 fence 等待排空所有在途工作，再销毁任何资源。
    pub fn release_gpu_objects(&mut self) {
        if self.released {
            return;
        }
        log::info!("releasing gpu objects");

        let last = self.frame_sync.last_signaled();
        self.frame_sync.wait_for(self.backend.as_mut(), last);

        for set in self.transient_release.drain_all() {
            self.backend.destroy_transient_set(set);
        }
        for set in std::mem::take(&mut self.frame_transients) {
            self.backend.destroy_transient_set(set);
        }

        self.pipeline_cache.clear();
        self.render_targets.clear();
        self.textures.clear();
        self.shaders.clear();

        self.backend.release_gpu_objects();
        self.released = true;
        self.frame_state = FrameState::Idle;
    }
}

impl Drop for RenderDevice {
    fn drop(&mut self) {
        if !self.released {
            self.release_gpu_objects();
        }
    }
}

// 资源创建入口
impl RenderDevice {
    pub fn create_vertex_buffer(
        &mut self,
        faces: &[Face],
        vertices: VertexData<'_>,
        name: &str,
    ) -> VertexBufferHandle {
        self.backend.create_vertex_buffer(faces, vertices, name)
    }

    pub fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8], name: &str) -> TextureHandle {
        let created = self.backend.create_texture(desc, pixels, name);
        self.states.register(created.resource, ResourceState::ShaderRead);
        self.textures.insert(created.handle, created.resource);
        created.handle
    }

    pub fn create_render_target(&mut self, desc: &RenderTargetDesc, name: &str) -> RenderTargetHandle {
        let created = self.backend.create_render_target(desc, name);
        self.states.register(created.color_resource, ResourceState::ShaderRead);
        self.states.register(created.depth_resource, ResourceState::DepthWrite);
        self.textures.insert(created.texture, created.color_resource);
        self.render_targets.insert(created.handle, created);
        created.handle
    }

    /// 渲染目标作为采样源时的纹理句柄
    pub fn render_target_texture(&self, target: RenderTargetHandle) -> TextureHandle {
        self.render_targets.get(&target).expect("unknown render target").texture
    }

    /// 渲染目标的尺寸，供拥有它的 camera / material 系统查询
    pub fn render_target_size(&self, target: RenderTargetHandle) -> (u32, u32) {
        assert!(self.render_targets.contains_key(&target), "unknown render target");
        self.backend.render_target_extent(target)
    }

    /// swapchain backbuffer 的尺寸
    pub fn backbuffer_size(&self) -> (u32, u32) {
        self.backend.backbuffer_extent()
    }

    pub fn create_shader(&mut self, vertex_spirv: &[u8], fragment_spirv: &[u8], name: &str) -> ShaderHandle {
        let handle = self.backend.create_shader(&ShaderDesc {
            vertex_spirv,
            fragment_spirv,
            name,
        });
        self.shaders.insert(handle);
        handle
    }
}

// 帧生命周期
impl RenderDevice {
    /// 开始录制新一帧
    pub fn reset_command_list(&mut self) {
        assert!(
            self.frame_state == FrameState::Idle,
            "reset_command_list while a frame is already recording"
        );
        self.stats.begin_frame();
        self.backend.reset_command_list();
        self.bound_textures = [self.default_texture; DefaultRenderSettings::MAX_TEXTURE_SLOTS];
        self.frame_state = FrameState::Recording;
    }

    /// 绑定渲染目标；`None` 表示 swapchain backbuffer
    ///
    /// 副作用：目标的 color 资源转换到 render-target-writable 状态
    pub fn set_render_target(&mut self, target: Option<RenderTargetHandle>, cube_face: u32) {
        assert!(
            self.frame_state != FrameState::Idle,
            "set_render_target before reset_command_list"
        );
        assert!(cube_face < 6, "invalid cube map face: {cube_face}");

        let resource = match target {
            Some(handle) => {
                let created = *self.render_targets.get(&handle).expect("unknown render target");
                if !self.backend.render_target_is_cube(handle) {
                    assert!(cube_face == 0, "cube face given for a 2d render target");
                }
                created.color_resource
            }
            // MSAA 开启时 backbuffer pass 实际写入 MSAA color
            None => match self.backend.msaa_resources() {
                Some((color, _)) => color,
                None => self.backend.current_backbuffer_resource(),
            },
        };
        self.transition(resource, ResourceState::RenderTarget);

        self.stats.inc_render_target_binds();
        self.backend.bind_render_target(target, cube_face);
        self.current_target = target;
        self.frame_state = FrameState::TargetBound;
    }

    /// 清除当前绑定目标；viewport/scissor 设为目标尺寸
    pub fn clear_screen(&mut self, flags: ClearFlags) {
        assert!(
            matches!(self.frame_state, FrameState::TargetBound | FrameState::Drawing),
            "clear_screen before set_render_target"
        );
        self.backend.clear_screen(flags, self.clear_color);
    }

    pub fn set_clear_color(&mut self, red: f32, green: f32, blue: f32) {
        self.clear_color = [red, green, blue, 1.0];
    }

    /// 固定槽位的纹理绑定；slot 越界是引擎 bug
    pub fn set_texture(&mut self, slot: usize, texture: TextureHandle) {
        assert!(
            slot < DefaultRenderSettings::MAX_TEXTURE_SLOTS,
            "texture slot {slot} out of range"
        );
        assert!(self.textures.contains_key(&texture), "unknown texture {texture:?}");
        self.bound_textures[slot] = texture;
    }

    /// uniform ring 前进一格并写入本次 draw 的 uniform 数据
    pub fn set_uniform_data(&mut self, data: &[u8]) {
        assert!(self.frame_state != FrameState::Idle, "set_uniform_data outside a frame");
        assert!(
            data.len() as u64 <= DefaultRenderSettings::UNIFORM_BUFFER_SIZE,
            "uniform data exceeds {} bytes",
            DefaultRenderSettings::UNIFORM_BUFFER_SIZE
        );
        self.backend.advance_uniform_ring();
        self.backend.write_current_uniforms(data);
        self.stats.inc_uniform_updates();
    }

    /// 按 `[start_face, end_face)` 的三角形范围发出 indexed draw
    pub fn draw(
        &mut self,
        vertex_buffer: VertexBufferHandle,
        start_face: u32,
        end_face: u32,
        shader: ShaderHandle,
        blend_mode: BlendMode,
        depth_func: DepthFunc,
        cull_mode: CullMode,
        fill_mode: FillMode,
    ) {
        assert!(
            matches!(self.frame_state, FrameState::TargetBound | FrameState::Drawing),
            "draw issued before a render target was bound this frame"
        );
        assert!(self.shaders.contains(&shader), "draw with unknown shader {shader:?}");

        let face_count = self.backend.vertex_buffer_face_count(vertex_buffer);
        assert!(
            start_face <= end_face && end_face <= face_count,
            "invalid face range [{start_face}, {end_face}) for buffer with {face_count} faces"
        );

        // 被采样的纹理必须先回到 shader-readable 状态
        for slot in 0..DefaultRenderSettings::MAX_TEXTURE_SLOTS {
            let resource = self.textures[&self.bound_textures[slot]];
            self.transition(resource, ResourceState::ShaderRead);
        }

        // 离屏目标不做 MSAA；backbuffer 跟随设备配置
        let (color_format, sample_count) = match self.current_target {
            Some(handle) => (self.backend.render_target_format(handle), 1),
            None => (self.backend.backbuffer_format(), self.backend.sample_count()),
        };
        let key = PipelineKey {
            vertex_format: self.backend.vertex_buffer_format(vertex_buffer),
            shader,
            blend_mode,
            depth_func,
            cull_mode,
            fill_mode,
            color_format,
            sample_count,
        };
        let (pipeline, built) = self.pipeline_cache.get_or_create(self.backend.as_mut(), &key);
        if built {
            self.stats.inc_pipeline_builds();
        }

        let descriptors = self.backend.write_draw_descriptors(&DrawBindings {
            textures: self.bound_textures,
        });
        self.frame_transients.push(descriptors);

        self.backend.draw_indexed(vertex_buffer, pipeline, descriptors, start_face, end_face);

        self.stats.inc_draw_calls();
        self.stats.inc_triangles(end_face - start_face);
        self.frame_state = FrameState::Drawing;
    }

    /// 结束一帧：MSAA 解析、backbuffer 转 present、提交并 signal、
    /// 呈现、等上一帧的 fence、回收临时池
    pub fn present(&mut self) {
        assert!(
            self.frame_state != FrameState::Idle,
            "present called twice without an intervening reset_command_list"
        );

        let backbuffer = self.backend.current_backbuffer_resource();
        if let Some((msaa_color, _)) = self.backend.msaa_resources() {
            self.transition(msaa_color, ResourceState::ResolveSrc);
            self.transition(backbuffer, ResourceState::ResolveDst);
            self.backend.resolve_msaa_to_backbuffer();
            self.transition(backbuffer, ResourceState::Present);
            self.transition(msaa_color, ResourceState::RenderTarget);
        } else {
            self.transition(backbuffer, ResourceState::Present);
        }

        let fence_value = self.frame_sync.execute_and_signal(self.backend.as_mut());
        self.stats.inc_fence_signals();

        if let Err(reason) = self.backend.present_frame() {
            log::error!("present failed: {reason}");
            panic!("present failed: {reason}");
        }

        // 等上一帧，然后回收所有 fence 已达成的临时池
        self.stats.inc_fence_waits();
        let prev = self.prev_frame_fence;
        self.frame_sync.wait_for(self.backend.as_mut(), prev);
        for set in self.transient_release.drain_completed(self.frame_sync.last_completed()) {
            self.backend.destroy_transient_set(set);
        }
        for set in std::mem::take(&mut self.frame_transients) {
            self.transient_release.push(fence_value, set);
        }
        self.prev_frame_fence = fence_value;

        self.current_target = None;
        self.frame_state = FrameState::Idle;
        self.stats.end_frame();
    }

    fn transition(&mut self, resource: ResourceId, new_state: ResourceState) {
        if let Some(barrier) = self.states.transition(resource, new_state) {
            self.backend.record_barrier(&barrier);
            self.stats.inc_barrier_calls();
        }
    }
}

// 调试与诊断
impl RenderDevice {
    pub fn push_group_marker(&mut self, name: &str) {
        self.backend.push_group_marker(name);
    }

    pub fn pop_group_marker(&mut self) {
        self.backend.pop_group_marker();
    }

    /// 不支持的后端上降级为 warn + no-op
    pub fn set_polygon_offset(&mut self, enable: bool, factor: f32, units: f32) {
        if !self.backend.supports_polygon_offset() {
            log::warn!("polygon offset is not supported by the {} backend", self.backend.kind_name());
            return;
        }
        self.backend.set_polygon_offset(enable, factor, units);
    }

    #[inline]
    pub fn statistics(&self) -> &RenderStatistics {
        self.stats.current()
    }

    pub fn statistics_string(&self) -> String {
        self.stats.overlay_string()
    }

    pub fn gpu_memory_usage(&self) -> GpuMemoryInfo {
        self.backend.gpu_memory_usage()
    }

    #[inline]
    pub fn frame_state(&self) -> FrameState {
        self.frame_state
    }

    #[inline]
    pub fn pipeline_count(&self) -> usize {
        self.pipeline_cache.len()
    }

    /// 资源当前的跟踪状态，用于诊断
    pub fn resource_usage(&self, resource: ResourceId) -> ResourceState {
        self.states.usage(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{HeadlessBackend, HeadlessTrace};
    use kestrel_render_interface::resource_state::SplitBarrier;
    use kestrel_render_interface::vertex::VertexPTC;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SPIRV: &[u8] = &[0u8; 8];

    fn device_with_trace(width: u32, height: u32) -> (RenderDevice, Rc<RefCell<HeadlessTrace>>) {
        let backend = HeadlessBackend::new(&RenderSettings::new("test", width, height));
        let trace = backend.trace();
        (RenderDevice::new(Box::new(backend)), trace)
    }

    fn triangle(device: &mut RenderDevice) -> VertexBufferHandle {
        let faces = [Face::new(0, 1, 2)];
        let vertices = [VertexPTC::default(); 3];
        device.create_vertex_buffer(&faces, VertexData::Ptc(&vertices), "triangle")
    }

    #[test]
    fn test_basic_frame_scenario() {
        let (mut device, trace) = device_with_trace(640, 480);
        let vb = triangle(&mut device);
        let shader = device.create_shader(SPIRV, SPIRV, "unlit");

        device.reset_command_list();
        device.set_render_target(None, 0);
        device.clear_screen(ClearFlags::COLOR | ClearFlags::DEPTH);
        device.draw(
            vb,
            0,
            1,
            shader,
            BlendMode::Off,
            DepthFunc::LessOrEqualWriteOn,
            CullMode::Back,
            FillMode::Solid,
        );

        assert_eq!(device.statistics().draw_calls, 1);
        assert_eq!(device.statistics().triangles, 1);

        device.present();
        assert_eq!(device.frame_state(), FrameState::Idle);
        assert_eq!(trace.borrow().presents, 1);
        // present 后 per-frame 计数清零
        assert_eq!(device.statistics().draw_calls, 0);
    }

    #[test]
    fn test_render_to_texture_roundtrip() {
        let (mut device, trace) = device_with_trace(640, 480);
        let vb = triangle(&mut device);
        let shader = device.create_shader(SPIRV, SPIRV, "unlit");
        let target = device.create_render_target(
            &RenderTargetDesc {
                width: 256,
                height: 256,
                format: PixelFormat::Rgba8Unorm,
                is_cube: false,
                wrap: TextureWrap::Clamp,
                filter: TextureFilter::Linear,
            },
            "offscreen",
        );
        let target_color = device.render_targets[&target].color_resource;

        device.reset_command_list();
        device.set_render_target(Some(target), 0);
        device.clear_screen(ClearFlags::COLOR | ClearFlags::DEPTH);
        device.draw(vb, 0, 1, shader, BlendMode::Off, DepthFunc::LessOrEqualWriteOn, CullMode::Back, FillMode::Solid);

        // 切回 backbuffer，把离屏目标当纹理采样
        device.set_render_target(None, 0);
        device.clear_screen(ClearFlags::COLOR | ClearFlags::DEPTH);
        let offscreen_texture = device.render_target_texture(target);
        device.set_texture(0, offscreen_texture);
        device.draw(vb, 0, 1, shader, BlendMode::Off, DepthFunc::LessOrEqualWriteOn, CullMode::Back, FillMode::Solid);

        // 离屏目标必须先转成 render-target-writable，
        // 再在被采样之前回到 shader-readable
        let barriers = trace.borrow().barriers.clone();
        let to_rt = barriers
            .iter()
            .position(|b| b.resource == target_color && b.to == ResourceState::RenderTarget)
            .expect("no render-target transition recorded");
        let to_read = barriers
            .iter()
            .position(|b| b.resource == target_color && b.to == ResourceState::ShaderRead)
            .expect("no shader-read transition recorded");
        assert!(to_rt < to_read);
        assert_eq!(device.resource_usage(target_color), ResourceState::ShaderRead);

        device.present();
    }

    #[test]
    fn test_repeated_binding_emits_single_barrier() {
        let (mut device, trace) = device_with_trace(640, 480);

        device.reset_command_list();
        device.set_render_target(None, 0);
        device.clear_screen(ClearFlags::COLOR);
        // 再绑一次同一个目标：状态未变，不应产生新的 barrier
        device.set_render_target(None, 0);
        device.clear_screen(ClearFlags::DEPTH);

        let backbuffer_barriers = trace
            .borrow()
            .barriers
            .iter()
            .filter(|b| b.to == ResourceState::RenderTarget && b.split == SplitBarrier::None)
            .count();
        assert_eq!(backbuffer_barriers, 1);
        device.present();
    }

    #[test]
    fn test_transients_recycled_after_fence() {
        let (mut device, trace) = device_with_trace(640, 480);
        let vb = triangle(&mut device);
        let shader = device.create_shader(SPIRV, SPIRV, "unlit");

        for _ in 0..3 {
            device.reset_command_list();
            device.set_render_target(None, 0);
            device.clear_screen(ClearFlags::COLOR | ClearFlags::DEPTH);
            device.draw(vb, 0, 1, shader, BlendMode::Off, DepthFunc::LessOrEqualWriteOn, CullMode::Back, FillMode::Solid);
            device.present();
        }

        {
            let trace = trace.borrow();
            assert_eq!(trace.transients_created, 3);
            // 第 N 帧的临时堆要等到第 N+1 帧的 present 才回收
            assert_eq!(trace.transients_destroyed, 2);
        }

        device.release_gpu_objects();
        assert_eq!(trace.borrow().transients_destroyed, 3);
        assert!(trace.borrow().released);
    }

    #[test]
    fn test_pipeline_reused_across_frames() {
        let (mut device, trace) = device_with_trace(640, 480);
        let vb = triangle(&mut device);
        let shader = device.create_shader(SPIRV, SPIRV, "unlit");

        for _ in 0..2 {
            device.reset_command_list();
            device.set_render_target(None, 0);
            device.clear_screen(ClearFlags::COLOR);
            device.draw(vb, 0, 1, shader, BlendMode::Off, DepthFunc::LessOrEqualWriteOn, CullMode::Back, FillMode::Solid);
            device.present();
        }

        assert_eq!(trace.borrow().pipelines_created, 1);
        assert_eq!(device.pipeline_count(), 1);
    }

    #[test]
    fn test_polygon_offset_degrades_to_noop() {
        let (mut device, _trace) = device_with_trace(64, 64);
        // headless 后端不支持 polygon offset；调用必须静默降级而不是 panic
        device.set_polygon_offset(true, 1.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "before a render target was bound")]
    fn test_draw_without_target_panics() {
        let (mut device, _trace) = device_with_trace(64, 64);
        let vb = triangle(&mut device);
        let shader = device.create_shader(SPIRV, SPIRV, "unlit");

        device.reset_command_list();
        device.draw(vb, 0, 1, shader, BlendMode::Off, DepthFunc::LessOrEqualWriteOn, CullMode::Back, FillMode::Solid);
    }

    #[test]
    #[should_panic(expected = "present called twice")]
    fn test_present_twice_panics() {
        let (mut device, _trace) = device_with_trace(64, 64);
        device.reset_command_list();
        device.set_render_target(None, 0);
        device.clear_screen(ClearFlags::COLOR);
        device.present();
        device.present();
    }

    #[test]
    #[should_panic(expected = "invalid cube map face")]
    fn test_out_of_range_cube_face_panics() {
        let (mut device, _trace) = device_with_trace(64, 64);
        let target = device.create_render_target(
            &RenderTargetDesc {
                width: 64,
                height: 64,
                format: PixelFormat::Rgba8Unorm,
                is_cube: true,
                wrap: TextureWrap::Clamp,
                filter: TextureFilter::Linear,
            },
            "cube",
        );
        device.reset_command_list();
        device.set_render_target(Some(target), 6);
    }

    #[test]
    #[should_panic(expected = "invalid face range")]
    fn test_out_of_range_faces_panic() {
        let (mut device, _trace) = device_with_trace(64, 64);
        let vb = triangle(&mut device);
        let shader = device.create_shader(SPIRV, SPIRV, "unlit");

        device.reset_command_list();
        device.set_render_target(None, 0);
        device.clear_screen(ClearFlags::COLOR);
        device.draw(vb, 0, 2, shader, BlendMode::Off, DepthFunc::LessOrEqualWriteOn, CullMode::Back, FillMode::Solid);
    }

    #[test]
    #[should_panic(expected = "unknown shader")]
    fn test_draw_with_unregistered_shader_panics() {
        let (mut device, _trace) = device_with_trace(64, 64);
        let vb = triangle(&mut device);

        device.reset_command_list();
        device.set_render_target(None, 0);
        device.draw(
            vb,
            0,
            1,
            ShaderHandle(9999),
            BlendMode::Off,
            DepthFunc::LessOrEqualWriteOn,
            CullMode::Back,
            FillMode::Solid,
        );
    }

    #[test]
    fn test_msaa_present_resolves_to_backbuffer() {
        let backend = HeadlessBackend::new(&RenderSettings::new("test", 640, 480).with_sample_count(4));
        let trace = backend.trace();
        let mut device = RenderDevice::new(Box::new(backend));

        device.reset_command_list();
        device.set_render_target(None, 0);
        device.clear_screen(ClearFlags::COLOR | ClearFlags::DEPTH);
        device.present();

        // resolve 序列：msaa -> ResolveSrc，backbuffer -> ResolveDst -> Present
        let barriers = trace.borrow().barriers.clone();
        assert!(barriers.iter().any(|b| b.to == ResourceState::ResolveSrc));
        assert!(barriers.iter().any(|b| b.to == ResourceState::ResolveDst));
        assert!(barriers.iter().any(|b| b.to == ResourceState::Present));
    }
}
