use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};
use crate::pipelines::shader::GfxShaderModule;

pub struct GfxGraphicsPipelineCreateInfo {
    /// dynamic render 需要的 framebuffer 信息
    color_attach_format: vk::Format,
    /// dynamic render 需要的 framebuffer 信息
    depth_attach_format: vk::Format,

    vertex_binding_desc: Vec<vk::VertexInputBindingDescription>,
    vertex_attribute_desc: Vec<vk::VertexInputAttributeDescription>,

    rasterize_state_info: vk::PipelineRasterizationStateCreateInfo<'static>,

    msaa_sample: vk::SampleCountFlags,

    color_attach_blend_state: vk::PipelineColorBlendAttachmentState,

    depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo<'static>,

    dynamic_states: Vec<vk::DynamicState>,
}

impl Default for GfxGraphicsPipelineCreateInfo {
    fn default() -> Self {
        Self {
            color_attach_format: vk::Format::UNDEFINED,
            // format = undefined 表示不使用这个 attachment
            depth_attach_format: vk::Format::UNDEFINED,

            vertex_binding_desc: vec![],
            vertex_attribute_desc: vec![],

            rasterize_state_info: vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::BACK)
                // 按照 OpenGL 的传统，将 CCW 视为 front face
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false),
            msaa_sample: vk::SampleCountFlags::TYPE_1,

            color_attach_blend_state: vk::PipelineColorBlendAttachmentState::default()
                .blend_enable(false)
                .color_write_mask(vk::ColorComponentFlags::RGBA),

            depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(true)
                .depth_write_enable(true)
                .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false),
            // depth bias 走 dynamic state，polygon offset 不必进入管线 key
            dynamic_states: vec![
                vk::DynamicState::VIEWPORT,
                vk::DynamicState::SCISSOR,
                vk::DynamicState::DEPTH_BIAS_ENABLE,
                vk::DynamicState::DEPTH_BIAS,
            ],
        }
    }
}

impl GfxGraphicsPipelineCreateInfo {
    /// builder
    #[inline]
    pub fn attach_info(&mut self, color_format: vk::Format, depth_format: Option<vk::Format>) -> &mut Self {
        self.color_attach_format = color_format;
        self.depth_attach_format = depth_format.unwrap_or(vk::Format::UNDEFINED);
        self
    }

    /// builder
    #[inline]
    pub fn vertex_binding(&mut self, bindings: Vec<vk::VertexInputBindingDescription>) -> &mut Self {
        self.vertex_binding_desc = bindings;
        self
    }

    /// builder
    #[inline]
    pub fn vertex_attribute(&mut self, attributes: Vec<vk::VertexInputAttributeDescription>) -> &mut Self {
        self.vertex_attribute_desc = attributes;
        self
    }

    /// builder
    #[inline]
    pub fn color_blend_attach_state(&mut self, state: vk::PipelineColorBlendAttachmentState) -> &mut Self {
        self.color_attach_blend_state = state;
        self
    }

    /// builder
    #[inline]
    pub fn cull_mode(&mut self, cull_mode: vk::CullModeFlags) -> &mut Self {
        self.rasterize_state_info.cull_mode = cull_mode;
        self
    }

    /// builder
    #[inline]
    pub fn polygon_mode(&mut self, polygon_mode: vk::PolygonMode) -> &mut Self {
        self.rasterize_state_info.polygon_mode = polygon_mode;
        self
    }

    /// builder
    #[inline]
    pub fn depth_state(&mut self, test_enable: bool, write_enable: bool) -> &mut Self {
        self.depth_stencil_info.depth_test_enable = test_enable.into();
        self.depth_stencil_info.depth_write_enable = write_enable.into();
        self
    }

    /// builder
    #[inline]
    pub fn msaa_samples(&mut self, samples: vk::SampleCountFlags) -> &mut Self {
        self.msaa_sample = samples;
        self
    }
}

pub struct GfxGraphicsPipeline {
    pipeline: vk::Pipeline,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxGraphicsPipeline {
    fn debug_type_name() -> &'static str {
        "GfxGraphicsPipeline"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.pipeline
    }
}

impl Drop for GfxGraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
        }
    }
}

impl GfxGraphicsPipeline {
    /// 同步构建完整管线对象，昂贵
    ///
    /// pipeline layout 全局共享，不随管线创建
    pub fn new(
        device: Rc<GfxDevice>,
        pipeline_layout: vk::PipelineLayout,
        vertex_shader: &GfxShaderModule,
        fragment_shader: &GfxShaderModule,
        create_info: &GfxGraphicsPipelineCreateInfo,
        debug_name: &str,
    ) -> Self {
        let _span = tracy_client::span!("GfxGraphicsPipeline::new");

        // dynamic rendering 需要的 framebuffer 信息
        let color_formats = [create_info.color_attach_format];
        let mut attach_info = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&color_formats)
            .depth_attachment_format(create_info.depth_attach_format);

        let shader_stages_info = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_shader.handle())
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_shader.handle())
                .name(c"main"),
        ];

        // 顶点和 index
        let vertex_input_state_info = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&create_info.vertex_binding_desc)
            .vertex_attribute_descriptions(&create_info.vertex_attribute_desc);

        let input_assembly_info = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // viewport 和 scissor 具体值由 dynamic 决定，但是数量由该 create info 决定
        let viewport_info = vk::PipelineViewportStateCreateInfo {
            viewport_count: 1,
            scissor_count: 1,
            ..Default::default()
        };

        // MSAA 配置
        let msaa_info =
            vk::PipelineMultisampleStateCreateInfo::default().rasterization_samples(create_info.msaa_sample);

        // 混合设置
        let blend_states = [create_info.color_attach_blend_state];
        let color_blend_info =
            vk::PipelineColorBlendStateCreateInfo::default().logic_op_enable(false).attachments(&blend_states);

        let dynamic_states = create_info.dynamic_states.iter().copied().collect_vec();
        let dynamic_state_info = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages_info)
            .vertex_input_state(&vertex_input_state_info)
            .input_assembly_state(&input_assembly_info)
            .viewport_state(&viewport_info)
            .rasterization_state(&create_info.rasterize_state_info)
            .multisample_state(&msaa_info)
            .color_blend_state(&color_blend_info)
            .depth_stencil_state(&create_info.depth_stencil_info)
            .layout(pipeline_layout)
            .dynamic_state(&dynamic_state_info)
            .push_next(&mut attach_info);

        let pipeline = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&pipeline_info), None)
                .unwrap()[0]
        };

        let pipeline = Self {
            pipeline,
            device,
        };
        pipeline.device.set_debug_name(&pipeline, debug_name);
        pipeline
    }

    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}
