//! 无 GPU 的记录型后端
//!
//! 把命令流记录成计数与日志，供单元测试在 CPU 上检验门面层的
//! 状态机、barrier 去重、缓存与回收逻辑。GPU 完成进度可以手动控制，
//! 用于验证 fence 语义。

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use kestrel_render_interface::backend::{
    CreatedRenderTarget, CreatedTexture, DrawBindings, PresentError, RenderBackend, RenderTargetDesc, ShaderDesc,
    TextureDesc,
};
use kestrel_render_interface::handles::{
    PipelineHandle, RenderTargetHandle, ResourceId, ShaderHandle, TextureHandle, TransientSetHandle,
    VertexBufferHandle,
};
use kestrel_render_interface::modes::{ClearFlags, PixelFormat};
use kestrel_render_interface::pipeline::PipelineKey;
use kestrel_render_interface::resource_state::BarrierDesc;
use kestrel_render_interface::settings::{DefaultRenderSettings, RenderSettings};
use kestrel_render_interface::stats::GpuMemoryInfo;
use kestrel_render_interface::vertex::{Face, VertexData, VertexFormat};

/// 后端记录下来的全部观测值；测试侧在 box 之前 clone 一份 [`Rc`]
#[derive(Default)]
pub struct HeadlessTrace {
    pub barriers: Vec<BarrierDesc>,
    pub draws: Vec<(VertexBufferHandle, PipelineHandle, u32, u32)>,
    pub clears: Vec<ClearFlags>,
    pub resets: u32,
    pub presents: u32,
    pub submits: Vec<u64>,
    pub pipelines_created: u32,
    pub transients_created: u32,
    pub transients_destroyed: u32,
    pub completed_queries: u32,
    pub uniform_writes: u32,
    pub group_markers: u32,
    pub released: bool,

    /// GPU 侧已完成的 fence 值
    pub gpu_completed: u64,
    /// false 时提交即完成；true 时需要 [`HeadlessBackend::advance_gpu_to`]
    pub hold_gpu: bool,
}

struct HeadlessRenderTarget {
    desc: RenderTargetDesc,
    created: CreatedRenderTarget,
}

pub struct HeadlessBackend {
    trace: Rc<RefCell<HeadlessTrace>>,

    next_id: u64,
    vertex_buffers: HashMap<VertexBufferHandle, (VertexFormat, u32)>,
    textures: HashMap<TextureHandle, ResourceId>,
    render_targets: HashMap<RenderTargetHandle, HeadlessRenderTarget>,
    shaders: HashSet<ShaderHandle>,
    transients: HashSet<TransientSetHandle>,

    backbuffer_resources: [ResourceId; 2],
    backbuffer_index: usize,
    msaa_resources: Option<(ResourceId, ResourceId)>,
    extent: (u32, u32),
    sample_count: u32,

    uniform_index: u32,
    current_target: Option<RenderTargetHandle>,
}

impl HeadlessBackend {
    pub fn new(settings: &RenderSettings) -> Self {
        let mut next_id = 1;
        let mut mint = || {
            let id = next_id;
            next_id += 1;
            id
        };

        let backbuffer_resources = [ResourceId(mint()), ResourceId(mint())];
        let msaa_resources =
            (settings.sample_count > 1).then(|| (ResourceId(mint()), ResourceId(mint())));

        Self {
            trace: Rc::new(RefCell::new(HeadlessTrace::default())),
            next_id,
            vertex_buffers: HashMap::new(),
            textures: HashMap::new(),
            render_targets: HashMap::new(),
            shaders: HashSet::new(),
            transients: HashSet::new(),
            backbuffer_resources,
            backbuffer_index: 0,
            msaa_resources,
            extent: (settings.width, settings.height),
            sample_count: settings.sample_count,
            uniform_index: 0,
            current_target: None,
        }
    }

    /// 观测记录；测试在把后端交给门面之前 clone
    pub fn trace(&self) -> Rc<RefCell<HeadlessTrace>> {
        self.trace.clone()
    }

    /// true 时 GPU 停在原地，需要 [`Self::advance_gpu_to`] 推进
    pub fn hold_gpu(&mut self, hold: bool) {
        self.trace.borrow_mut().hold_gpu = hold;
    }

    /// 手动推进 GPU 完成进度
    pub fn advance_gpu_to(&mut self, value: u64) {
        let mut trace = self.trace.borrow_mut();
        trace.gpu_completed = trace.gpu_completed.max(value);
    }

    fn mint(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl RenderBackend for HeadlessBackend {
    fn kind_name(&self) -> &'static str {
        "headless"
    }

    fn create_vertex_buffer(&mut self, faces: &[Face], vertices: VertexData<'_>, _name: &str) -> VertexBufferHandle {
        assert!(!faces.is_empty(), "vertex buffer with no faces");
        assert!(vertices.vertex_count() > 0, "vertex buffer with no vertices");
        let handle = VertexBufferHandle(self.mint());
        self.vertex_buffers.insert(handle, (vertices.format(), faces.len() as u32));
        handle
    }

    fn vertex_buffer_face_count(&self, vertex_buffer: VertexBufferHandle) -> u32 {
        self.vertex_buffers.get(&vertex_buffer).expect("unknown vertex buffer").1
    }

    fn vertex_buffer_format(&self, vertex_buffer: VertexBufferHandle) -> VertexFormat {
        self.vertex_buffers.get(&vertex_buffer).expect("unknown vertex buffer").0
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8], _name: &str) -> CreatedTexture {
        assert!(desc.width > 0 && desc.height > 0, "texture with zero extent");
        assert!(!pixels.is_empty(), "texture with no pixel data");
        let handle = TextureHandle(self.mint());
        let resource = ResourceId(self.mint());
        self.textures.insert(handle, resource);
        CreatedTexture {
            handle,
            resource,
        }
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc, _name: &str) -> CreatedRenderTarget {
        let handle = RenderTargetHandle(self.mint());
        let texture = TextureHandle(self.mint());
        let color_resource = ResourceId(self.mint());
        let depth_resource = ResourceId(self.mint());
        let created = CreatedRenderTarget {
            handle,
            texture,
            color_resource,
            depth_resource,
        };
        self.textures.insert(texture, color_resource);
        self.render_targets.insert(
            handle,
            HeadlessRenderTarget {
                desc: *desc,
                created,
            },
        );
        created
    }

    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> ShaderHandle {
        assert!(
            !desc.vertex_spirv.is_empty() && !desc.fragment_spirv.is_empty(),
            "shader '{}' has no spirv bytes",
            desc.name
        );
        let handle = ShaderHandle(self.mint());
        self.shaders.insert(handle);
        handle
    }

    fn create_pipeline(&mut self, _key: &PipelineKey) -> PipelineHandle {
        self.trace.borrow_mut().pipelines_created += 1;
        PipelineHandle(self.mint())
    }

    fn backbuffer_resources(&self) -> Vec<ResourceId> {
        self.backbuffer_resources.to_vec()
    }

    fn current_backbuffer_resource(&self) -> ResourceId {
        self.backbuffer_resources[self.backbuffer_index]
    }

    fn msaa_resources(&self) -> Option<(ResourceId, ResourceId)> {
        self.msaa_resources
    }

    fn backbuffer_extent(&self) -> (u32, u32) {
        self.extent
    }

    fn backbuffer_format(&self) -> PixelFormat {
        RenderSettings::backbuffer_format()
    }

    fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn render_target_extent(&self, target: RenderTargetHandle) -> (u32, u32) {
        let rt = self.render_targets.get(&target).expect("unknown render target");
        (rt.desc.width, rt.desc.height)
    }

    fn render_target_format(&self, target: RenderTargetHandle) -> PixelFormat {
        self.render_targets.get(&target).expect("unknown render target").desc.format
    }

    fn render_target_is_cube(&self, target: RenderTargetHandle) -> bool {
        self.render_targets.get(&target).expect("unknown render target").desc.is_cube
    }

    fn reset_command_list(&mut self) {
        self.trace.borrow_mut().resets += 1;
        self.current_target = None;
    }

    fn record_barrier(&mut self, barrier: &BarrierDesc) {
        self.trace.borrow_mut().barriers.push(*barrier);
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>, cube_face: u32) {
        if let Some(target) = target {
            let rt = self.render_targets.get(&target).expect("unknown render target");
            if rt.desc.is_cube {
                assert!(cube_face < 6, "invalid cube map face: {cube_face}");
            }
        }
        self.current_target = target;
    }

    fn clear_screen(&mut self, flags: ClearFlags, _color: [f32; 4]) {
        self.trace.borrow_mut().clears.push(flags);
    }

    fn advance_uniform_ring(&mut self) {
        self.uniform_index = (self.uniform_index + 1) % DefaultRenderSettings::UNIFORM_RING_SIZE;
    }

    fn write_current_uniforms(&mut self, data: &[u8]) {
        assert!(data.len() as u64 <= DefaultRenderSettings::UNIFORM_BUFFER_SIZE, "uniform data too large");
        self.trace.borrow_mut().uniform_writes += 1;
    }

    fn write_draw_descriptors(&mut self, bindings: &DrawBindings) -> TransientSetHandle {
        for texture in bindings.textures {
            assert!(self.textures.contains_key(&texture), "draw binds unknown texture {texture:?}");
        }
        let handle = TransientSetHandle(self.mint());
        self.transients.insert(handle);
        self.trace.borrow_mut().transients_created += 1;
        handle
    }

    fn destroy_transient_set(&mut self, set: TransientSetHandle) {
        assert!(self.transients.remove(&set), "transient set {set:?} destroyed twice");
        self.trace.borrow_mut().transients_destroyed += 1;
    }

    fn draw_indexed(
        &mut self,
        vertex_buffer: VertexBufferHandle,
        pipeline: PipelineHandle,
        _descriptors: TransientSetHandle,
        start_face: u32,
        end_face: u32,
    ) {
        self.trace.borrow_mut().draws.push((vertex_buffer, pipeline, start_face, end_face));
    }

    fn resolve_msaa_to_backbuffer(&mut self) {
        assert!(self.msaa_resources.is_some(), "msaa resolve without msaa targets");
    }

    fn push_group_marker(&mut self, _name: &str) {
        self.trace.borrow_mut().group_markers += 1;
    }

    fn pop_group_marker(&mut self) {}

    fn submit_and_signal(&mut self, fence_value: u64) {
        let mut trace = self.trace.borrow_mut();
        if let Some(last) = trace.submits.last() {
            assert!(*last < fence_value, "fence values must increase in submission order");
        }
        trace.submits.push(fence_value);
        if !trace.hold_gpu {
            trace.gpu_completed = fence_value;
        }
    }

    fn completed_fence_value(&mut self) -> u64 {
        let mut trace = self.trace.borrow_mut();
        trace.completed_queries += 1;
        trace.gpu_completed
    }

    fn wait_fence(&mut self, fence_value: u64) {
        // 模拟阻塞等待：返回时 GPU 必然已经到达该值
        let mut trace = self.trace.borrow_mut();
        trace.gpu_completed = trace.gpu_completed.max(fence_value);
    }

    fn present_frame(&mut self) -> Result<(), PresentError> {
        self.trace.borrow_mut().presents += 1;
        self.backbuffer_index = (self.backbuffer_index + 1) % self.backbuffer_resources.len();
        Ok(())
    }

    fn supports_polygon_offset(&self) -> bool {
        false
    }

    fn set_polygon_offset(&mut self, _enable: bool, _factor: f32, _units: f32) {
        unreachable!("facade must gate polygon offset on supports_polygon_offset");
    }

    fn gpu_memory_usage(&self) -> GpuMemoryInfo {
        GpuMemoryInfo::default()
    }

    fn release_gpu_objects(&mut self) {
        assert!(self.transients.is_empty(), "transient sets leaked past release");
        self.vertex_buffers.clear();
        self.textures.clear();
        self.render_targets.clear();
        self.shaders.clear();
        self.trace.borrow_mut().released = true;
    }
}
