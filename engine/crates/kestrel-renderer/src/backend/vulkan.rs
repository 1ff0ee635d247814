//! Vulkan 后端
//!
//! 在 kestrel-gfx 的封装之上忠实执行门面层下发的命令。
//! 状态去重、管线缓存、fence 记账都在门面层；这里只负责：
//! - 对象创建（buffer / image / pipeline / 描述符）与上传
//! - 把 [`BarrierDesc`] 映射为 `vkCmdPipelineBarrier2`
//! - dynamic rendering 的惰性 begin/end（barrier 不能录制在 render pass 内）
//! - timeline semaphore 实现的 fence 计数
//!
//! 双缓冲帧录制：两套 command buffer 与 acquire/present 信号量按帧奇偶
//! 轮换；门面在 present 时等待上一帧的 fence，保证复用是安全的。

use std::collections::HashMap;
use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use kestrel_gfx::commands::barrier::GfxImageBarrier;
use kestrel_gfx::commands::command_buffer::GfxCommandBuffer;
use kestrel_gfx::commands::command_pool::GfxCommandPool;
use kestrel_gfx::commands::command_queue::GfxCommandQueue;
use kestrel_gfx::commands::semaphore::{GfxSemaphore, GfxTimelineSemaphore};
use kestrel_gfx::commands::submit_info::GfxSubmitInfo;
use kestrel_gfx::descriptors::descriptor_pool::GfxDescriptorPool;
use kestrel_gfx::descriptors::descriptor_set_layout::GfxDescriptorSetLayout;
use kestrel_gfx::foundation::device::GfxDevice;
use kestrel_gfx::foundation::instance::GfxInstance;
use kestrel_gfx::foundation::mem_allocator::GfxAllocator;
use kestrel_gfx::foundation::physical_device::GfxPhysicalDevice;
use kestrel_gfx::pipelines::graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo};
use kestrel_gfx::pipelines::pipeline_layout::GfxPipelineLayout;
use kestrel_gfx::pipelines::shader::GfxShaderModule;
use kestrel_gfx::resources::buffer::GfxBuffer;
use kestrel_gfx::resources::image::{GfxImage, GfxImageCreateInfo};
use kestrel_gfx::resources::image_view::GfxImageView;
use kestrel_gfx::resources::sampler::GfxSampler;
use kestrel_gfx::swapchain::surface::GfxSurface;
use kestrel_gfx::swapchain::swapchain::GfxSwapchain;

use kestrel_render_interface::backend::{
    CreatedRenderTarget, CreatedTexture, DrawBindings, PresentError, RenderBackend, RenderTargetDesc, ShaderDesc,
    TextureDesc,
};
use kestrel_render_interface::descriptor::{DescriptorHeapKind, DescriptorPool};
use kestrel_render_interface::handles::{
    PipelineHandle, RenderTargetHandle, ResourceId, ShaderHandle, TextureHandle, TransientSetHandle,
    VertexBufferHandle,
};
use kestrel_render_interface::modes::{
    Anisotropy, BlendMode, ClearFlags, CullMode, DepthFunc, FillMode, PixelFormat, TextureFilter, TextureWrap,
};
use kestrel_render_interface::pipeline::PipelineKey;
use kestrel_render_interface::resource_state::{BarrierDesc, ResourceState, SplitBarrier};
use kestrel_render_interface::settings::{DefaultRenderSettings, RenderSettings};
use kestrel_render_interface::stats::GpuMemoryInfo;
use kestrel_render_interface::vertex::{Face, VertexData, VertexFormat};

use crate::backend::WindowHandles;

/// 双缓冲：两套帧录制资源按帧奇偶轮换
const FRAME_OVERLAP: usize = 2;

const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

struct VulkanVertexBuffer {
    vertices: GfxBuffer,
    indices: GfxBuffer,
    format: VertexFormat,
    face_count: u32,
}

struct VulkanTexture {
    /// render target 的 color image 由目标拥有，这里只持有采样 view 的裸句柄
    _backing: Option<(GfxImage, GfxImageView)>,
    view: vk::ImageView,
    resource: ResourceId,
    wrap: TextureWrap,
    filter: TextureFilter,
    anisotropy: Anisotropy,
}

struct VulkanRenderTarget {
    desc: RenderTargetDesc,
    color: GfxImage,
    /// 采样用 view：2D 目标是 2D view，cube 目标是 cube view
    _sample_view: GfxImageView,
    /// attachment 用的 per-face view；2D 目标只有下标 0
    face_views: Vec<GfxImageView>,
    _depth: GfxImage,
    depth_view: GfxImageView,
}

/// shader 以 SPIR-V 字节保存；module 只在管线构建期间存活
struct VulkanShader {
    vertex_spirv: Vec<u8>,
    fragment_spirv: Vec<u8>,
    name: String,
}

/// MSAA 开启时 backbuffer pass 实际写入的多采样目标
struct MsaaTargets {
    color: GfxImage,
    color_view: GfxImageView,
    color_id: ResourceId,
    depth: GfxImage,
    depth_view: GfxImageView,
    depth_id: ResourceId,
}

/// barrier 录制所需的原生 image 信息
#[derive(Clone, Copy)]
struct ResourceImage {
    image: vk::Image,
    aspect: vk::ImageAspectFlags,
    layer_count: u32,
}

/// 当前绑定的 attachment 组
#[derive(Clone, Copy)]
struct BoundAttachments {
    color_view: vk::ImageView,
    depth_view: vk::ImageView,
    extent: vk::Extent2D,
}

pub struct VulkanBackend {
    instance: GfxInstance,
    surface: GfxSurface,
    _physical_device: GfxPhysicalDevice,
    device: Rc<GfxDevice>,
    allocator: Option<Rc<GfxAllocator>>,
    graphics_queue: GfxCommandQueue,

    swapchain: Option<GfxSwapchain>,
    swapchain_views: Vec<GfxImageView>,
    backbuffer_ids: Vec<ResourceId>,
    /// 单采样时 backbuffer pass 的 depth；MSAA 时不创建
    depth: Option<(GfxImage, GfxImageView)>,
    msaa: Option<MsaaTargets>,
    sample_count: u32,

    command_pool: Option<GfxCommandPool>,
    frame_commands: Vec<GfxCommandBuffer>,
    image_available: Vec<GfxSemaphore>,
    render_finished: Vec<GfxSemaphore>,
    timeline: Option<GfxTimelineSemaphore>,
    frame_index: u64,
    frame_parity: usize,

    set_layout: Option<GfxDescriptorSetLayout>,
    pipeline_layout: Option<GfxPipelineLayout>,
    /// 4 级各向异性 × {nearest, linear} × {repeat, clamp}
    samplers: Vec<GfxSampler>,

    uniform_ring: Option<GfxBuffer>,
    uniform_index: u32,

    /// 持久视图的容量账本，一种堆一个
    cbv_srv_uav_ledger: DescriptorPool,
    sampler_ledger: DescriptorPool,
    rtv_ledger: DescriptorPool,
    dsv_ledger: DescriptorPool,

    next_handle: u64,
    vertex_buffers: HashMap<VertexBufferHandle, VulkanVertexBuffer>,
    textures: HashMap<TextureHandle, VulkanTexture>,
    render_targets: HashMap<RenderTargetHandle, VulkanRenderTarget>,
    shaders: HashMap<ShaderHandle, VulkanShader>,
    pipelines: HashMap<PipelineHandle, GfxGraphicsPipeline>,
    transient_sets: HashMap<TransientSetHandle, (GfxDescriptorPool, vk::DescriptorSet)>,
    resource_images: HashMap<ResourceId, ResourceImage>,

    // 帧录制状态
    recording: bool,
    rendering_active: bool,
    pending_clear: Option<(ClearFlags, [f32; 4])>,
    bound: Option<BoundAttachments>,
    /// (enable, slope factor, constant units)
    depth_bias: (bool, f32, f32),
}

// 创建
impl VulkanBackend {
    pub fn new(settings: &RenderSettings, window: WindowHandles) -> Self {
        let _span = tracy_client::span!("VulkanBackend::new");

        let instance = GfxInstance::new(&settings.app_name, Some(window.display));
        let surface = GfxSurface::new(&instance, window.display, window.window);
        let physical_device = GfxPhysicalDevice::pick(&instance, Some(&surface));
        let device = Rc::new(GfxDevice::new(&instance, &physical_device));
        let allocator = Rc::new(GfxAllocator::new(&instance, &physical_device, &device));
        let graphics_queue =
            GfxCommandQueue::new(device.clone(), physical_device.graphics_queue_family, "graphics");

        // uniform ring 按 256 字节步进寻址
        assert!(
            DefaultRenderSettings::UNIFORM_BUFFER_SIZE % physical_device.min_ubo_offset_align() == 0,
            "uniform slot size violates the device's offset alignment"
        );

        let swapchain = GfxSwapchain::new(
            device.clone(),
            &physical_device,
            &surface,
            vk::Extent2D {
                width: settings.width,
                height: settings.height,
            },
        );
        let extent = swapchain.extent();

        let mut next_handle = 1_u64;
        let mut mint = || {
            let id = next_handle;
            next_handle += 1;
            id
        };

        let mut resource_images = HashMap::new();
        let mut swapchain_views = Vec::new();
        let mut backbuffer_ids = Vec::new();
        for (index, image) in swapchain.present_images().into_iter().enumerate() {
            swapchain_views.push(GfxImageView::new_2d(
                device.clone(),
                image,
                swapchain.color_format(),
                vk::ImageAspectFlags::COLOR,
                1,
                &format!("backbuffer-{index}"),
            ));
            let id = ResourceId(mint());
            resource_images.insert(
                id,
                ResourceImage {
                    image,
                    aspect: vk::ImageAspectFlags::COLOR,
                    layer_count: 1,
                },
            );
            backbuffer_ids.push(id);
        }

        // 描述符账本；uniform ring 的槽位预留在 CBV 池里
        let mut cbv_srv_uav_ledger =
            DescriptorPool::new(DescriptorHeapKind::CbvSrvUav, DefaultRenderSettings::CBV_SRV_UAV_POOL_CAPACITY);
        for _ in 0..DefaultRenderSettings::UNIFORM_RING_SIZE {
            cbv_srv_uav_ledger.allocate();
        }
        let mut sampler_ledger =
            DescriptorPool::new(DescriptorHeapKind::Sampler, DefaultRenderSettings::SAMPLER_POOL_CAPACITY);
        let mut rtv_ledger = DescriptorPool::new(DescriptorHeapKind::Rtv, DefaultRenderSettings::RTV_POOL_CAPACITY);
        let mut dsv_ledger = DescriptorPool::new(DescriptorHeapKind::Dsv, DefaultRenderSettings::DSV_POOL_CAPACITY);

        // backbuffer 的 depth 或 MSAA 目标
        let mut depth = None;
        let mut msaa = None;
        if settings.sample_count > 1 {
            let samples = sample_count_flags(settings.sample_count);
            let color = GfxImage::new(
                device.clone(),
                allocator.clone(),
                &GfxImageCreateInfo::new_2d(
                    extent,
                    swapchain.color_format(),
                    vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC,
                )
                .samples(samples),
                "msaa-color",
            );
            let color_view = GfxImageView::new_2d(
                device.clone(),
                color.handle(),
                swapchain.color_format(),
                vk::ImageAspectFlags::COLOR,
                1,
                "msaa-color",
            );
            let msaa_depth = GfxImage::new(
                device.clone(),
                allocator.clone(),
                &GfxImageCreateInfo::new_2d(extent, DEPTH_FORMAT, vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
                    .samples(samples),
                "msaa-depth",
            );
            let depth_view = GfxImageView::new_2d(
                device.clone(),
                msaa_depth.handle(),
                DEPTH_FORMAT,
                vk::ImageAspectFlags::DEPTH,
                1,
                "msaa-depth",
            );
            rtv_ledger.allocate();
            dsv_ledger.allocate();

            let color_id = ResourceId(mint());
            let depth_id = ResourceId(mint());
            resource_images.insert(
                color_id,
                ResourceImage {
                    image: color.handle(),
                    aspect: vk::ImageAspectFlags::COLOR,
                    layer_count: 1,
                },
            );
            resource_images.insert(
                depth_id,
                ResourceImage {
                    image: msaa_depth.handle(),
                    aspect: vk::ImageAspectFlags::DEPTH,
                    layer_count: 1,
                },
            );
            msaa = Some(MsaaTargets {
                color,
                color_view,
                color_id,
                depth: msaa_depth,
                depth_view,
                depth_id,
            });
        } else {
            let image = GfxImage::new(
                device.clone(),
                allocator.clone(),
                &GfxImageCreateInfo::new_2d(extent, DEPTH_FORMAT, vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT),
                "backbuffer-depth",
            );
            let view = GfxImageView::new_2d(
                device.clone(),
                image.handle(),
                DEPTH_FORMAT,
                vk::ImageAspectFlags::DEPTH,
                1,
                "backbuffer-depth",
            );
            dsv_ledger.allocate();
            depth = Some((image, view));
        }

        let command_pool = GfxCommandPool::new(
            device.clone(),
            physical_device.graphics_queue_family,
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            "frame-commands",
        );
        let frame_commands = (0..FRAME_OVERLAP)
            .map(|i| GfxCommandBuffer::new(device.clone(), &command_pool, &format!("frame-{i}")))
            .collect_vec();
        let image_available = (0..FRAME_OVERLAP)
            .map(|i| GfxSemaphore::new(device.clone(), &format!("image-available-{i}")))
            .collect_vec();
        let render_finished = (0..FRAME_OVERLAP)
            .map(|i| GfxSemaphore::new(device.clone(), &format!("render-finished-{i}")))
            .collect_vec();
        let timeline = GfxTimelineSemaphore::new(device.clone(), 0, "frame-fence");

        let set_layout = GfxDescriptorSetLayout::new_draw_layout(
            device.clone(),
            DefaultRenderSettings::MAX_TEXTURE_SLOTS as u32,
            "draw",
        );
        let pipeline_layout = GfxPipelineLayout::new(device.clone(), &[set_layout.handle()], "draw");

        // sampler 矩阵：4 级各向异性 × 2 种过滤 × 2 种 wrap
        let mut samplers = Vec::new();
        for anisotropy in [Anisotropy::X1, Anisotropy::X2, Anisotropy::X4, Anisotropy::X8] {
            for filter in [TextureFilter::Nearest, TextureFilter::Linear] {
                for wrap in [TextureWrap::Repeat, TextureWrap::Clamp] {
                    sampler_ledger.allocate();
                    samplers.push(GfxSampler::new(
                        device.clone(),
                        match filter {
                            TextureFilter::Nearest => vk::Filter::NEAREST,
                            TextureFilter::Linear => vk::Filter::LINEAR,
                        },
                        match wrap {
                            TextureWrap::Repeat => vk::SamplerAddressMode::REPEAT,
                            TextureWrap::Clamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
                        },
                        anisotropy.max_anisotropy(),
                        &format!("{anisotropy:?}-{filter:?}-{wrap:?}"),
                    ));
                }
            }
        }

        let uniform_ring = GfxBuffer::new(
            device.clone(),
            allocator.clone(),
            DefaultRenderSettings::UNIFORM_RING_SIZE as u64 * DefaultRenderSettings::UNIFORM_BUFFER_SIZE,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            true,
            "uniform-ring",
        );

        let backend = Self {
            instance,
            surface,
            _physical_device: physical_device,
            device,
            allocator: Some(allocator),
            graphics_queue,
            swapchain: Some(swapchain),
            swapchain_views,
            backbuffer_ids,
            depth,
            msaa,
            sample_count: settings.sample_count,
            command_pool: Some(command_pool),
            frame_commands,
            image_available,
            render_finished,
            timeline: Some(timeline),
            frame_index: 0,
            frame_parity: 0,
            set_layout: Some(set_layout),
            pipeline_layout: Some(pipeline_layout),
            samplers,
            uniform_ring: Some(uniform_ring),
            uniform_index: 0,
            cbv_srv_uav_ledger,
            sampler_ledger,
            rtv_ledger,
            dsv_ledger,
            next_handle,
            vertex_buffers: HashMap::new(),
            textures: HashMap::new(),
            render_targets: HashMap::new(),
            shaders: HashMap::new(),
            pipelines: HashMap::new(),
            transient_sets: HashMap::new(),
            resource_images,
            recording: false,
            rendering_active: false,
            pending_clear: None,
            bound: None,
            depth_bias: (false, 0.0, 0.0),
        };

        // depth / MSAA 目标的初始布局整备；
        // 门面按 RenderTarget / DepthWrite 状态登记 MSAA 资源
        backend.immediate_submit("init-layouts", |cmd| {
            let mut barriers = Vec::new();
            if let Some((image, _)) = &backend.depth {
                barriers.push(
                    GfxImageBarrier::new()
                        .image(image.handle())
                        .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
                        .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
                        .dst_mask(
                            vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS,
                            vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
                        )
                        .image_aspect_flag(vk::ImageAspectFlags::DEPTH),
                );
            }
            if let Some(msaa) = &backend.msaa {
                barriers.push(
                    GfxImageBarrier::new()
                        .image(msaa.color.handle())
                        .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                        .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
                        .dst_mask(
                            vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                            vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                        )
                        .image_aspect_flag(vk::ImageAspectFlags::COLOR),
                );
                barriers.push(
                    GfxImageBarrier::new()
                        .image(msaa.depth.handle())
                        .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
                        .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
                        .dst_mask(
                            vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS,
                            vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
                        )
                        .image_aspect_flag(vk::ImageAspectFlags::DEPTH),
                );
            }
            cmd.image_memory_barrier(vk::DependencyFlags::empty(), &barriers);
        });

        log::info!(
            "vulkan backend ready: {}x{}, {} backbuffers, msaa x{}",
            extent.width,
            extent.height,
            backend.backbuffer_ids.len(),
            settings.sample_count
        );
        backend
    }
}

// 内部工具
impl VulkanBackend {
    fn mint(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    #[inline]
    fn current_cmd(&self) -> &GfxCommandBuffer {
        &self.frame_commands[self.frame_parity]
    }

    /// 录制并同步提交一段一次性命令；只用于对象创建期的上传与布局整备
    fn immediate_submit(&self, debug_name: &str, record: impl FnOnce(&GfxCommandBuffer)) {
        let pool = self.command_pool.as_ref().unwrap();
        let cmd = GfxCommandBuffer::new(self.device.clone(), pool, debug_name);
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        record(&cmd);
        cmd.end();
        self.graphics_queue.submit(vec![GfxSubmitInfo::new(std::slice::from_ref(&cmd))], None);
        self.graphics_queue.wait_idle();
        cmd.free(pool);
    }

    /// 结束当前 render pass；尚未消费的 clear 以空 pass 落盘
    fn suspend_rendering(&mut self) {
        if self.rendering_active {
            self.current_cmd().end_rendering();
            self.rendering_active = false;
        } else if self.pending_clear.is_some() && self.bound.is_some() {
            self.begin_rendering();
            self.current_cmd().end_rendering();
            self.rendering_active = false;
        }
    }

    fn begin_rendering(&mut self) {
        let bound = self.bound.expect("no render target bound");
        let (clear_flags, clear_color) =
            self.pending_clear.take().unwrap_or((ClearFlags::empty(), DefaultRenderSettings::DEFAULT_CLEAR_COLOR));

        let load_op = |clear: bool| {
            if clear {
                vk::AttachmentLoadOp::CLEAR
            } else {
                vk::AttachmentLoadOp::LOAD
            }
        };
        let color_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(bound.color_view)
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .load_op(load_op(clear_flags.contains(ClearFlags::COLOR)))
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: clear_color,
                },
            });
        let depth_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(bound.depth_view)
            .image_layout(vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
            .load_op(load_op(clear_flags.contains(ClearFlags::DEPTH)))
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            });
        let render_area = vk::Rect2D {
            offset: vk::Offset2D {
                x: 0,
                y: 0,
            },
            extent: bound.extent,
        };
        let rendering_info = vk::RenderingInfo::default()
            .render_area(render_area)
            .layer_count(1)
            .color_attachments(std::slice::from_ref(&color_attachment))
            .depth_attachment(&depth_attachment);

        let cmd = self.current_cmd();
        cmd.begin_rendering(&rendering_info);
        // viewport / scissor 跟随当前目标的尺寸
        cmd.set_viewport(
            0,
            &[vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: bound.extent.width as f32,
                height: bound.extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            }],
        );
        cmd.set_scissor(0, &[render_area]);
        self.rendering_active = true;
    }

    /// backbuffer 的像素格式要用 swapchain 实际选择的格式
    fn vk_color_format(&self, format: PixelFormat) -> vk::Format {
        if format == self.backbuffer_format() {
            self.swapchain.as_ref().unwrap().color_format()
        } else {
            pixel_format_to_vk(format)
        }
    }

    fn sampler_for(&self, wrap: TextureWrap, filter: TextureFilter, anisotropy: Anisotropy) -> vk::Sampler {
        let filter_index = match filter {
            TextureFilter::Nearest => 0,
            TextureFilter::Linear => 1,
        };
        let wrap_index = match wrap {
            TextureWrap::Repeat => 0,
            TextureWrap::Clamp => 1,
        };
        self.samplers[anisotropy.sampler_index() * 4 + filter_index * 2 + wrap_index].handle()
    }
}

impl RenderBackend for VulkanBackend {
    fn kind_name(&self) -> &'static str {
        "vulkan"
    }

    // ------------------------------------------------------------------
    // 资源创建
    // ------------------------------------------------------------------

    fn create_vertex_buffer(&mut self, faces: &[Face], vertices: VertexData<'_>, name: &str) -> VertexBufferHandle {
        assert!(!faces.is_empty(), "vertex buffer '{name}' has no faces");
        assert!(vertices.vertex_count() > 0, "vertex buffer '{name}' has no vertices");

        let device = self.device.clone();
        let allocator = self.allocator.clone().unwrap();

        let index_bytes: &[u8] = bytemuck::cast_slice(faces);
        let vertex_bytes = vertices.bytes();

        let indices = GfxBuffer::new(
            device.clone(),
            allocator.clone(),
            index_bytes.len() as u64,
            vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            false,
            format!("{name}-indices"),
        );
        let vertex_buffer = GfxBuffer::new(
            device.clone(),
            allocator.clone(),
            vertex_bytes.len() as u64,
            vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            false,
            format!("{name}-vertices"),
        );

        let index_stage =
            GfxBuffer::new_stage_buffer(device.clone(), allocator.clone(), index_bytes.len() as u64, "stage-indices");
        index_stage.write_bytes(0, index_bytes);
        let vertex_stage =
            GfxBuffer::new_stage_buffer(device, allocator, vertex_bytes.len() as u64, "stage-vertices");
        vertex_stage.write_bytes(0, vertex_bytes);

        self.immediate_submit(&format!("upload-{name}"), |cmd| {
            cmd.cmd_copy_buffer(
                index_stage.vk_buffer(),
                indices.vk_buffer(),
                &[vk::BufferCopy {
                    src_offset: 0,
                    dst_offset: 0,
                    size: index_bytes.len() as u64,
                }],
            );
            cmd.cmd_copy_buffer(
                vertex_stage.vk_buffer(),
                vertex_buffer.vk_buffer(),
                &[vk::BufferCopy {
                    src_offset: 0,
                    dst_offset: 0,
                    size: vertex_bytes.len() as u64,
                }],
            );
        });

        let handle = VertexBufferHandle(self.mint());
        self.vertex_buffers.insert(
            handle,
            VulkanVertexBuffer {
                vertices: vertex_buffer,
                indices,
                format: vertices.format(),
                face_count: faces.len() as u32,
            },
        );
        handle
    }

    fn vertex_buffer_face_count(&self, vertex_buffer: VertexBufferHandle) -> u32 {
        self.vertex_buffers.get(&vertex_buffer).expect("unknown vertex buffer").face_count
    }

    fn vertex_buffer_format(&self, vertex_buffer: VertexBufferHandle) -> VertexFormat {
        self.vertex_buffers.get(&vertex_buffer).expect("unknown vertex buffer").format
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8], name: &str) -> CreatedTexture {
        assert!(desc.width > 0 && desc.height > 0, "texture '{name}' has zero extent");
        let layer_count: u32 = if desc.is_cube { 6 } else { 1 };
        if desc.is_cube {
            assert!(desc.mip_count == 1, "cube texture '{name}' must be single-mip");
        }
        let bytes_per_pixel = pixel_format_bytes(desc.format);
        let layer_bytes = desc.width as u64 * desc.height as u64 * bytes_per_pixel;
        assert_eq!(
            pixels.len() as u64,
            layer_bytes * layer_count as u64,
            "texture '{name}' pixel data size mismatch"
        );

        let device = self.device.clone();
        let allocator = self.allocator.clone().unwrap();
        let vk_format = pixel_format_to_vk(desc.format);
        let extent = vk::Extent2D {
            width: desc.width,
            height: desc.height,
        };
        let usage = vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST;

        let (image, view) = if desc.is_cube {
            let image = GfxImage::new(
                device.clone(),
                allocator.clone(),
                &GfxImageCreateInfo::new_cube(extent, vk_format, usage),
                name,
            );
            let view = GfxImageView::new_cube(device.clone(), image.handle(), vk_format, name);
            (image, view)
        } else {
            let image = GfxImage::new(
                device.clone(),
                allocator.clone(),
                &GfxImageCreateInfo::new_2d(extent, vk_format, usage).mip_levels(desc.mip_count.max(1)),
                name,
            );
            let view = GfxImageView::new_2d(
                device.clone(),
                image.handle(),
                vk_format,
                vk::ImageAspectFlags::COLOR,
                desc.mip_count.max(1),
                name,
            );
            (image, view)
        };

        // base mip 上传；转换覆盖所有 mip，结束于 shader-readable
        let stage = GfxBuffer::new_stage_buffer(device, allocator, pixels.len() as u64, "stage-texture");
        stage.write_bytes(0, pixels);
        self.immediate_submit(&format!("upload-{name}"), |cmd| {
            cmd.image_memory_barrier(
                vk::DependencyFlags::empty(),
                &[GfxImageBarrier::new()
                    .image(image.handle())
                    .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
                    .dst_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
                    .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                    .layer_range(0, layer_count)
                    .mip_range(0, desc.mip_count.max(1))],
            );
            let regions = (0..layer_count)
                .map(|layer| {
                    vk::BufferImageCopy2::default()
                        .buffer_offset(layer as u64 * layer_bytes)
                        .image_subresource(vk::ImageSubresourceLayers {
                            aspect_mask: vk::ImageAspectFlags::COLOR,
                            mip_level: 0,
                            base_array_layer: layer,
                            layer_count: 1,
                        })
                        .image_extent(vk::Extent3D {
                            width: desc.width,
                            height: desc.height,
                            depth: 1,
                        })
                })
                .collect_vec();
            cmd.cmd_copy_buffer_to_image(
                &vk::CopyBufferToImageInfo2::default()
                    .src_buffer(stage.vk_buffer())
                    .dst_image(image.handle())
                    .dst_image_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .regions(&regions),
            );
            cmd.image_memory_barrier(
                vk::DependencyFlags::empty(),
                &[GfxImageBarrier::new()
                    .image(image.handle())
                    .layout_transfer(vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                    .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
                    .dst_mask(vk::PipelineStageFlags2::FRAGMENT_SHADER, vk::AccessFlags2::SHADER_SAMPLED_READ)
                    .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                    .layer_range(0, layer_count)
                    .mip_range(0, desc.mip_count.max(1))],
            );
        });

        self.cbv_srv_uav_ledger.allocate();
        let handle = TextureHandle(self.mint());
        let resource = ResourceId(self.mint());
        self.resource_images.insert(
            resource,
            ResourceImage {
                image: image.handle(),
                aspect: vk::ImageAspectFlags::COLOR,
                layer_count,
            },
        );
        let view_handle = view.handle();
        self.textures.insert(
            handle,
            VulkanTexture {
                _backing: Some((image, view)),
                view: view_handle,
                resource,
                wrap: desc.wrap,
                filter: desc.filter,
                anisotropy: desc.anisotropy,
            },
        );
        CreatedTexture {
            handle,
            resource,
        }
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc, name: &str) -> CreatedRenderTarget {
        assert!(desc.width > 0 && desc.height > 0, "render target '{name}' has zero extent");

        let device = self.device.clone();
        let allocator = self.allocator.clone().unwrap();
        let vk_format = pixel_format_to_vk(desc.format);
        let extent = vk::Extent2D {
            width: desc.width,
            height: desc.height,
        };
        let layer_count: u32 = if desc.is_cube { 6 } else { 1 };
        let usage = vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED;

        let color = if desc.is_cube {
            GfxImage::new(
                device.clone(),
                allocator.clone(),
                &GfxImageCreateInfo::new_cube(extent, vk_format, usage),
                &format!("{name}-color"),
            )
        } else {
            GfxImage::new(
                device.clone(),
                allocator.clone(),
                &GfxImageCreateInfo::new_2d(extent, vk_format, usage),
                &format!("{name}-color"),
            )
        };
        let (sample_view, face_views) = if desc.is_cube {
            let sample_view = GfxImageView::new_cube(device.clone(), color.handle(), vk_format, name);
            let face_views = (0..6)
                .map(|face| {
                    GfxImageView::new_cube_face(
                        device.clone(),
                        color.handle(),
                        vk_format,
                        face,
                        &format!("{name}-face{face}"),
                    )
                })
                .collect_vec();
            (sample_view, face_views)
        } else {
            let sample_view = GfxImageView::new_2d(
                device.clone(),
                color.handle(),
                vk_format,
                vk::ImageAspectFlags::COLOR,
                1,
                name,
            );
            let face_view = GfxImageView::new_2d(
                device.clone(),
                color.handle(),
                vk_format,
                vk::ImageAspectFlags::COLOR,
                1,
                &format!("{name}-attach"),
            );
            (sample_view, vec![face_view])
        };

        let depth = GfxImage::new(
            device.clone(),
            allocator,
            &GfxImageCreateInfo::new_2d(extent, DEPTH_FORMAT, vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT),
            &format!("{name}-depth"),
        );
        let depth_view = GfxImageView::new_2d(
            device,
            depth.handle(),
            DEPTH_FORMAT,
            vk::ImageAspectFlags::DEPTH,
            1,
            &format!("{name}-depth"),
        );

        for _ in 0..face_views.len() {
            self.rtv_ledger.allocate();
        }
        self.dsv_ledger.allocate();
        self.cbv_srv_uav_ledger.allocate();

        // 门面按 ShaderRead / DepthWrite 登记，这里先把布局放到位
        self.immediate_submit(&format!("init-{name}"), |cmd| {
            cmd.image_memory_barrier(
                vk::DependencyFlags::empty(),
                &[
                    GfxImageBarrier::new()
                        .image(color.handle())
                        .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                        .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
                        .dst_mask(vk::PipelineStageFlags2::FRAGMENT_SHADER, vk::AccessFlags2::SHADER_SAMPLED_READ)
                        .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                        .layer_range(0, layer_count),
                    GfxImageBarrier::new()
                        .image(depth.handle())
                        .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
                        .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
                        .dst_mask(
                            vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS,
                            vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
                        )
                        .image_aspect_flag(vk::ImageAspectFlags::DEPTH),
                ],
            );
        });

        let handle = RenderTargetHandle(self.mint());
        let texture = TextureHandle(self.mint());
        let color_resource = ResourceId(self.mint());
        let depth_resource = ResourceId(self.mint());
        self.resource_images.insert(
            color_resource,
            ResourceImage {
                image: color.handle(),
                aspect: vk::ImageAspectFlags::COLOR,
                layer_count,
            },
        );
        self.resource_images.insert(
            depth_resource,
            ResourceImage {
                image: depth.handle(),
                aspect: vk::ImageAspectFlags::DEPTH,
                layer_count: 1,
            },
        );
        self.textures.insert(
            texture,
            VulkanTexture {
                _backing: None,
                view: sample_view.handle(),
                resource: color_resource,
                wrap: desc.wrap,
                filter: desc.filter,
                anisotropy: Anisotropy::X1,
            },
        );
        self.render_targets.insert(
            handle,
            VulkanRenderTarget {
                desc: *desc,
                color,
                _sample_view: sample_view,
                face_views,
                _depth: depth,
                depth_view,
            },
        );
        CreatedRenderTarget {
            handle,
            texture,
            color_resource,
            depth_resource,
        }
    }

    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> ShaderHandle {
        assert!(
            !desc.vertex_spirv.is_empty() && !desc.fragment_spirv.is_empty(),
            "shader '{}' has no spirv bytes",
            desc.name
        );
        assert!(
            desc.vertex_spirv.len() % 4 == 0 && desc.fragment_spirv.len() % 4 == 0,
            "shader '{}' bytes are not valid spirv",
            desc.name
        );
        let handle = ShaderHandle(self.mint());
        self.shaders.insert(
            handle,
            VulkanShader {
                vertex_spirv: desc.vertex_spirv.to_vec(),
                fragment_spirv: desc.fragment_spirv.to_vec(),
                name: desc.name.to_string(),
            },
        );
        handle
    }

    fn create_pipeline(&mut self, key: &PipelineKey) -> PipelineHandle {
        let shader = self
            .shaders
            .get(&key.shader)
            .unwrap_or_else(|| panic!("pipeline requested for unregistered shader {:?}", key.shader));

        let vertex_module =
            GfxShaderModule::new(self.device.clone(), &shader.vertex_spirv, &format!("{}-vert", shader.name));
        let fragment_module =
            GfxShaderModule::new(self.device.clone(), &shader.fragment_spirv, &format!("{}-frag", shader.name));

        let (bindings, attributes) = vertex_input_desc(key.vertex_format);
        let mut create_info = GfxGraphicsPipelineCreateInfo::default();
        create_info.attach_info(self.vk_color_format(key.color_format), Some(DEPTH_FORMAT));
        create_info.vertex_binding(bindings);
        create_info.vertex_attribute(attributes);
        create_info.color_blend_attach_state(blend_attachment_state(key.blend_mode));
        match key.depth_func {
            DepthFunc::LessOrEqualWriteOn => create_info.depth_state(true, true),
            DepthFunc::LessOrEqualWriteOff => create_info.depth_state(true, false),
            DepthFunc::NoneWriteOff => create_info.depth_state(false, false),
        };
        create_info.cull_mode(match key.cull_mode {
            CullMode::Off => vk::CullModeFlags::NONE,
            CullMode::Back => vk::CullModeFlags::BACK,
            CullMode::Front => vk::CullModeFlags::FRONT,
        });
        create_info.polygon_mode(match key.fill_mode {
            FillMode::Solid => vk::PolygonMode::FILL,
            FillMode::Wireframe => vk::PolygonMode::LINE,
        });
        create_info.msaa_samples(sample_count_flags(key.sample_count));

        let pipeline = GfxGraphicsPipeline::new(
            self.device.clone(),
            self.pipeline_layout.as_ref().unwrap().handle(),
            &vertex_module,
            &fragment_module,
            &create_info,
            &format!("{}-{:016x}", shader.name, key.hash64()),
        );
        vertex_module.destroy();
        fragment_module.destroy();

        let handle = PipelineHandle(self.mint());
        self.pipelines.insert(handle, pipeline);
        handle
    }

    // ------------------------------------------------------------------
    // swapchain 与静态信息
    // ------------------------------------------------------------------

    fn backbuffer_resources(&self) -> Vec<ResourceId> {
        self.backbuffer_ids.clone()
    }

    fn current_backbuffer_resource(&self) -> ResourceId {
        self.backbuffer_ids[self.swapchain.as_ref().unwrap().current_image_index()]
    }

    fn msaa_resources(&self) -> Option<(ResourceId, ResourceId)> {
        self.msaa.as_ref().map(|msaa| (msaa.color_id, msaa.depth_id))
    }

    fn backbuffer_extent(&self) -> (u32, u32) {
        let extent = self.swapchain.as_ref().unwrap().extent();
        (extent.width, extent.height)
    }

    fn backbuffer_format(&self) -> PixelFormat {
        match self.swapchain.as_ref().unwrap().color_format() {
            vk::Format::R8G8B8A8_SRGB => PixelFormat::Rgba8Srgb,
            vk::Format::R8G8B8A8_UNORM => PixelFormat::Rgba8Unorm,
            vk::Format::B8G8R8A8_SRGB => PixelFormat::Bgra8Srgb,
            vk::Format::B8G8R8A8_UNORM => PixelFormat::Bgra8Unorm,
            other => {
                log::warn!("unexpected swapchain format {other:?}, reporting as bgra8-unorm");
                PixelFormat::Bgra8Unorm
            }
        }
    }

    fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn render_target_extent(&self, target: RenderTargetHandle) -> (u32, u32) {
        let desc = &self.render_targets.get(&target).expect("unknown render target").desc;
        (desc.width, desc.height)
    }

    fn render_target_format(&self, target: RenderTargetHandle) -> PixelFormat {
        self.render_targets.get(&target).expect("unknown render target").desc.format
    }

    fn render_target_is_cube(&self, target: RenderTargetHandle) -> bool {
        self.render_targets.get(&target).expect("unknown render target").desc.is_cube
    }

    // ------------------------------------------------------------------
    // 帧录制
    // ------------------------------------------------------------------

    fn reset_command_list(&mut self) {
        assert!(!self.recording, "frame is already recording");
        self.frame_parity = (self.frame_index % FRAME_OVERLAP as u64) as usize;
        self.frame_index += 1;

        let cmd = &self.frame_commands[self.frame_parity];
        cmd.reset();
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        self.swapchain.as_mut().unwrap().acquire_next_image(self.image_available[self.frame_parity].handle());

        self.recording = true;
        self.rendering_active = false;
        self.pending_clear = None;
        self.bound = None;
    }

    fn record_barrier(&mut self, barrier: &BarrierDesc) {
        // Vulkan 没有 split barrier：begin 部分不落盘，
        // 配对的 end 会作为完整 barrier 录制
        if barrier.split == SplitBarrier::Begin {
            return;
        }
        // barrier 不能出现在 render pass 内部
        self.suspend_rendering();

        let info = *self
            .resource_images
            .get(&barrier.resource)
            .unwrap_or_else(|| panic!("barrier on unknown resource {:?}", barrier.resource));
        let (old_layout, src_stage, src_access) = resource_state_to_vk(barrier.from);
        let (new_layout, dst_stage, dst_access) = resource_state_to_vk(barrier.to);

        self.current_cmd().image_memory_barrier(
            vk::DependencyFlags::empty(),
            &[GfxImageBarrier::new()
                .image(info.image)
                .layout_transfer(old_layout, new_layout)
                .src_mask(src_stage, src_access)
                .dst_mask(dst_stage, dst_access)
                .image_aspect_flag(info.aspect)
                .layer_range(0, info.layer_count)],
        );
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>, cube_face: u32) {
        assert!(self.recording, "bind_render_target outside a frame");
        self.suspend_rendering();

        let bound = match target {
            Some(handle) => {
                let rt = self.render_targets.get(&handle).expect("unknown render target");
                let face_index = if rt.desc.is_cube {
                    assert!(cube_face < 6, "invalid cube map face: {cube_face}");
                    cube_face as usize
                } else {
                    0
                };
                BoundAttachments {
                    color_view: rt.face_views[face_index].handle(),
                    depth_view: rt.depth_view.handle(),
                    extent: vk::Extent2D {
                        width: rt.desc.width,
                        height: rt.desc.height,
                    },
                }
            }
            None => {
                let swapchain = self.swapchain.as_ref().unwrap();
                let (color_view, depth_view) = match &self.msaa {
                    Some(msaa) => (msaa.color_view.handle(), msaa.depth_view.handle()),
                    None => (
                        self.swapchain_views[swapchain.current_image_index()].handle(),
                        self.depth.as_ref().unwrap().1.handle(),
                    ),
                };
                BoundAttachments {
                    color_view,
                    depth_view,
                    extent: swapchain.extent(),
                }
            }
        };
        self.bound = Some(bound);
    }

    fn clear_screen(&mut self, flags: ClearFlags, color: [f32; 4]) {
        assert!(self.bound.is_some(), "clear_screen before a render target is bound");
        if self.rendering_active {
            self.current_cmd().end_rendering();
            self.rendering_active = false;
        }
        let merged = match self.pending_clear.take() {
            Some((pending, _)) => pending | flags,
            None => flags,
        };
        self.pending_clear = Some((merged, color));
    }

    fn advance_uniform_ring(&mut self) {
        self.uniform_index = (self.uniform_index + 1) % DefaultRenderSettings::UNIFORM_RING_SIZE;
    }

    fn write_current_uniforms(&mut self, data: &[u8]) {
        assert!(
            data.len() as u64 <= DefaultRenderSettings::UNIFORM_BUFFER_SIZE,
            "uniform data exceeds the slot size"
        );
        let offset = self.uniform_index as u64 * DefaultRenderSettings::UNIFORM_BUFFER_SIZE;
        self.uniform_ring.as_ref().unwrap().write_bytes(offset as usize, data);
    }

    fn write_draw_descriptors(&mut self, bindings: &DrawBindings) -> TransientSetHandle {
        // 每次 draw 一个独立的小描述符池，随帧的 fence 回收；
        // 对应原生 API 的 per-draw 临时堆
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::SAMPLED_IMAGE,
                descriptor_count: DefaultRenderSettings::MAX_TEXTURE_SLOTS as u32,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::SAMPLER,
                descriptor_count: 1,
            },
        ];
        let pool = GfxDescriptorPool::new(self.device.clone(), 1, &pool_sizes, "draw-transient");
        let set = pool.allocate_set(self.set_layout.as_ref().unwrap().handle(), "draw-transient");

        let uniform_offset = self.uniform_index as u64 * DefaultRenderSettings::UNIFORM_BUFFER_SIZE;
        let buffer_info = vk::DescriptorBufferInfo::default()
            .buffer(self.uniform_ring.as_ref().unwrap().vk_buffer())
            .offset(uniform_offset)
            .range(DefaultRenderSettings::UNIFORM_BUFFER_SIZE);

        let image_infos = bindings
            .textures
            .iter()
            .map(|texture| {
                let texture = self.textures.get(texture).expect("draw binds unknown texture");
                vk::DescriptorImageInfo::default()
                    .image_view(texture.view)
                    .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            })
            .collect_vec();

        // sampler 由 slot-0 纹理的采样参数决定
        let slot0 = self.textures.get(&bindings.textures[0]).expect("draw binds unknown texture");
        let sampler_info =
            vk::DescriptorImageInfo::default().sampler(self.sampler_for(slot0.wrap, slot0.filter, slot0.anisotropy));

        let mut writes = vec![
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(std::slice::from_ref(&buffer_info)),
        ];
        for (slot, image_info) in image_infos.iter().enumerate() {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(1 + slot as u32)
                    .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                    .image_info(std::slice::from_ref(image_info)),
            );
        }
        writes.push(
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(1 + DefaultRenderSettings::MAX_TEXTURE_SLOTS as u32)
                .descriptor_type(vk::DescriptorType::SAMPLER)
                .image_info(std::slice::from_ref(&sampler_info)),
        );
        unsafe {
            self.device.update_descriptor_sets(&writes, &[]);
        }

        let handle = TransientSetHandle(self.mint());
        self.transient_sets.insert(handle, (pool, set));
        handle
    }

    fn destroy_transient_set(&mut self, set: TransientSetHandle) {
        // 描述符集随池一起销毁
        self.transient_sets.remove(&set).expect("transient set destroyed twice");
    }

    fn draw_indexed(
        &mut self,
        vertex_buffer: VertexBufferHandle,
        pipeline: PipelineHandle,
        descriptors: TransientSetHandle,
        start_face: u32,
        end_face: u32,
    ) {
        if !self.rendering_active {
            self.begin_rendering();
        }

        let buffer = self.vertex_buffers.get(&vertex_buffer).expect("unknown vertex buffer");
        let pipeline = self.pipelines.get(&pipeline).expect("unknown pipeline");
        let (_, set) = self.transient_sets.get(&descriptors).expect("unknown transient set");

        let cmd = &self.frame_commands[self.frame_parity];
        cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, pipeline.handle());
        cmd.set_depth_bias_enable(self.depth_bias.0);
        cmd.set_depth_bias(self.depth_bias.2, 0.0, self.depth_bias.1);
        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.pipeline_layout.as_ref().unwrap().handle(),
            0,
            std::slice::from_ref(set),
            &[],
        );
        cmd.bind_vertex_buffers(0, &[buffer.vertices.vk_buffer()], &[0]);
        cmd.bind_index_buffer(buffer.indices.vk_buffer(), 0, vk::IndexType::UINT16);
        cmd.draw_indexed((end_face - start_face) * 3, start_face * 3, 1, 0, 0);
    }

    fn resolve_msaa_to_backbuffer(&mut self) {
        let msaa = self.msaa.as_ref().expect("msaa resolve without msaa targets");
        let swapchain = self.swapchain.as_ref().unwrap();
        let extent = swapchain.extent();

        let subresource = vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        };
        self.frame_commands[self.frame_parity].resolve_image(
            msaa.color.handle(),
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            swapchain.current_image(),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[vk::ImageResolve {
                src_subresource: subresource,
                src_offset: vk::Offset3D::default(),
                dst_subresource: subresource,
                dst_offset: vk::Offset3D::default(),
                extent: vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                },
            }],
        );
    }

    fn push_group_marker(&mut self, name: &str) {
        if self.recording {
            self.current_cmd().begin_label(name);
        }
    }

    fn pop_group_marker(&mut self) {
        if self.recording {
            self.current_cmd().end_label();
        }
    }

    // ------------------------------------------------------------------
    // 提交与同步
    // ------------------------------------------------------------------

    fn submit_and_signal(&mut self, fence_value: u64) {
        assert!(self.recording, "submit without a recorded frame");
        self.suspend_rendering();

        let cmd = &self.frame_commands[self.frame_parity];
        cmd.end();
        self.recording = false;

        let submit = GfxSubmitInfo::new(std::slice::from_ref(cmd))
            .wait(
                self.image_available[self.frame_parity].handle(),
                vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                None,
            )
            .signal(self.render_finished[self.frame_parity].handle(), vk::PipelineStageFlags2::ALL_COMMANDS, None)
            .signal(self.timeline.as_ref().unwrap().handle(), vk::PipelineStageFlags2::ALL_COMMANDS, Some(fence_value));
        self.graphics_queue.submit(vec![submit], None);
    }

    fn completed_fence_value(&mut self) -> u64 {
        self.timeline.as_ref().unwrap().value()
    }

    fn wait_fence(&mut self, fence_value: u64) {
        self.timeline.as_ref().unwrap().wait(fence_value, u64::MAX);
    }

    fn present_frame(&mut self) -> Result<(), PresentError> {
        let result = self
            .swapchain
            .as_ref()
            .unwrap()
            .present_image(&self.graphics_queue, &[self.render_finished[self.frame_parity].handle()]);
        match result {
            Ok(()) => Ok(()),
            Err(vk::Result::ERROR_DEVICE_LOST) => Err(PresentError::DeviceLost),
            Err(vk::Result::ERROR_SURFACE_LOST_KHR) => Err(PresentError::SurfaceLost),
            Err(other) => panic!("present failed: {other:?}"),
        }
    }

    // ------------------------------------------------------------------
    // 能力与诊断
    // ------------------------------------------------------------------

    fn supports_polygon_offset(&self) -> bool {
        true
    }

    fn set_polygon_offset(&mut self, enable: bool, factor: f32, units: f32) {
        self.depth_bias = (enable, factor, units);
    }

    fn gpu_memory_usage(&self) -> GpuMemoryInfo {
        let (used, budget) = self.allocator.as_ref().unwrap().memory_report();
        GpuMemoryInfo {
            used_mbytes: (used / (1024 * 1024)) as u32,
            budget_mbytes: (budget / (1024 * 1024)) as u32,
        }
    }

    fn release_gpu_objects(&mut self) {
        log::info!("releasing vulkan gpu objects");
        self.device.wait_idle();

        assert!(self.transient_sets.is_empty(), "transient sets leaked past release");

        // 消费者先于它们的设备销毁
        self.pipelines.clear();
        self.shaders.clear();
        self.textures.clear();
        self.render_targets.clear();
        self.vertex_buffers.clear();
        self.uniform_ring = None;
        self.samplers.clear();
        self.pipeline_layout = None;
        self.set_layout = None;

        for semaphore in self.image_available.drain(..) {
            semaphore.destroy();
        }
        for semaphore in self.render_finished.drain(..) {
            semaphore.destroy();
        }
        if let Some(timeline) = self.timeline.take() {
            timeline.destroy();
        }
        if let Some(pool) = self.command_pool.take() {
            for cmd in self.frame_commands.drain(..) {
                cmd.free(&pool);
            }
            pool.destroy();
        }

        self.swapchain_views.clear();
        self.depth = None;
        self.msaa = None;
        self.resource_images.clear();
        if let Some(swapchain) = self.swapchain.take() {
            swapchain.destroy();
        }

        // allocator 必须先于 device 销毁
        self.allocator = None;
        self.device.destroy();
        self.surface.destroy();
        self.instance.destroy();
    }
}

/// 资源状态到 Vulkan layout / stage / access 的映射
fn resource_state_to_vk(state: ResourceState) -> (vk::ImageLayout, vk::PipelineStageFlags2, vk::AccessFlags2) {
    match state {
        // Undefined 只作为 backbuffer 的首次使用出现；
        // stage 选 color attachment output，与 acquire 信号量的等待阶段衔接
        ResourceState::Undefined => (
            vk::ImageLayout::UNDEFINED,
            vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags2::empty(),
        ),
        ResourceState::RenderTarget => (
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
        ),
        ResourceState::DepthWrite => (
            vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
            vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
            vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ),
        ResourceState::ShaderRead => (
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::PipelineStageFlags2::FRAGMENT_SHADER,
            vk::AccessFlags2::SHADER_SAMPLED_READ,
        ),
        ResourceState::TransferSrc | ResourceState::ResolveSrc => (
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::PipelineStageFlags2::TRANSFER,
            vk::AccessFlags2::TRANSFER_READ,
        ),
        ResourceState::TransferDst | ResourceState::ResolveDst => (
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::PipelineStageFlags2::TRANSFER,
            vk::AccessFlags2::TRANSFER_WRITE,
        ),
        ResourceState::Present => (
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags2::empty(),
        ),
    }
}

fn pixel_format_to_vk(format: PixelFormat) -> vk::Format {
    match format {
        PixelFormat::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
        PixelFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
        PixelFormat::Bgra8Srgb => vk::Format::B8G8R8A8_SRGB,
        PixelFormat::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
        PixelFormat::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
        PixelFormat::Depth32Float => vk::Format::D32_SFLOAT,
    }
}

fn pixel_format_bytes(format: PixelFormat) -> u64 {
    match format {
        PixelFormat::Rgba8Srgb | PixelFormat::Rgba8Unorm | PixelFormat::Bgra8Srgb | PixelFormat::Bgra8Unorm => 4,
        PixelFormat::Rgba16Float => 8,
        PixelFormat::Depth32Float => 4,
    }
}

fn sample_count_flags(sample_count: u32) -> vk::SampleCountFlags {
    match sample_count {
        1 => vk::SampleCountFlags::TYPE_1,
        2 => vk::SampleCountFlags::TYPE_2,
        4 => vk::SampleCountFlags::TYPE_4,
        8 => vk::SampleCountFlags::TYPE_8,
        16 => vk::SampleCountFlags::TYPE_16,
        other => panic!("invalid sample count: {other}"),
    }
}

fn blend_attachment_state(mode: BlendMode) -> vk::PipelineColorBlendAttachmentState {
    let base = vk::PipelineColorBlendAttachmentState::default().color_write_mask(vk::ColorComponentFlags::RGBA);
    match mode {
        BlendMode::Off => base.blend_enable(false),
        BlendMode::AlphaBlend => base
            .blend_enable(true)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .alpha_blend_op(vk::BlendOp::ADD),
        BlendMode::Additive => base
            .blend_enable(true)
            .src_color_blend_factor(vk::BlendFactor::ONE)
            .dst_color_blend_factor(vk::BlendFactor::ONE)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ONE)
            .alpha_blend_op(vk::BlendOp::ADD),
    }
}

fn vertex_input_desc(
    format: VertexFormat,
) -> (Vec<vk::VertexInputBindingDescription>, Vec<vk::VertexInputAttributeDescription>) {
    let binding = vec![
        vk::VertexInputBindingDescription::default()
            .binding(0)
            .stride(format.stride())
            .input_rate(vk::VertexInputRate::VERTEX),
    ];

    let attribute = |location: u32, vk_format: vk::Format, offset: u32| {
        vk::VertexInputAttributeDescription::default()
            .binding(0)
            .location(location)
            .format(vk_format)
            .offset(offset)
    };
    let attributes = match format {
        VertexFormat::Ptc => vec![
            attribute(0, vk::Format::R32G32B32_SFLOAT, 0),
            attribute(1, vk::Format::R32G32_SFLOAT, 12),
            attribute(2, vk::Format::R32G32B32A32_SFLOAT, 20),
        ],
        VertexFormat::Ptn => vec![
            attribute(0, vk::Format::R32G32B32_SFLOAT, 0),
            attribute(1, vk::Format::R32G32_SFLOAT, 12),
            attribute(2, vk::Format::R32G32B32_SFLOAT, 20),
        ],
        VertexFormat::Ptntc => vec![
            attribute(0, vk::Format::R32G32B32_SFLOAT, 0),
            attribute(1, vk::Format::R32G32_SFLOAT, 12),
            attribute(2, vk::Format::R32G32B32_SFLOAT, 20),
            attribute(3, vk::Format::R32G32B32A32_SFLOAT, 32),
            attribute(4, vk::Format::R32G32B32A32_SFLOAT, 48),
        ],
    };
    (binding, attributes)
}
