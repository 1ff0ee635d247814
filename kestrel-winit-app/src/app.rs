//! 演示应用
//!
//! 每帧两个 pass：先把旋转三角形画进一张 256x256 的离屏目标，
//! 再切回 backbuffer，把离屏结果作为纹理贴在全屏四边形上。
//! 这条路径覆盖了设备层的完整闭环：状态转换、管线缓存、
//! uniform ring、临时描述符回收与帧同步。

use std::path::PathBuf;
use std::time::Instant;

use glam::Mat4;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use kestrel_render_interface::backend::RenderTargetDesc;
use kestrel_render_interface::handles::{RenderTargetHandle, ShaderHandle, VertexBufferHandle};
use kestrel_render_interface::modes::{
    BlendMode, ClearFlags, CullMode, DepthFunc, FillMode, PixelFormat, TextureFilter, TextureWrap,
};
use kestrel_render_interface::settings::RenderSettings;
use kestrel_render_interface::vertex::{Face, VertexData, VertexPTC};
use kestrel_renderer::backend::{BackendKind, WindowHandles};
use kestrel_renderer::render_device::RenderDevice;

struct Scene {
    device: RenderDevice,
    triangle: VertexBufferHandle,
    quad: VertexBufferHandle,
    shader: ShaderHandle,
    offscreen: RenderTargetHandle,
    start: Instant,
    frame_count: u64,
}

pub struct DemoApp {
    shader_dir: PathBuf,
    window: Option<Window>,
    scene: Option<Scene>,
}

impl DemoApp {
    pub fn run(shader_dir: PathBuf) -> anyhow::Result<()> {
        tracy_client::Client::start();

        let event_loop = winit::event_loop::EventLoop::new()?;
        let mut app = Self {
            shader_dir,
            window: None,
            scene: None,
        };
        event_loop.run_app(&mut app)?;
        log::info!("demo finished");
        Ok(())
    }

    fn init_scene(&mut self, window: &Window) {
        let size = window.inner_size();
        let settings = RenderSettings::new("kestrel-demo", size.width, size.height);
        let handles = WindowHandles {
            display: window.display_handle().unwrap().as_raw(),
            window: window.window_handle().unwrap().as_raw(),
        };
        let mut device = RenderDevice::init(BackendKind::Vulkan, &settings, Some(handles));
        let (width, height) = device.backbuffer_size();
        log::info!("backbuffer: {width}x{height}");

        // 顶点色三角形
        let triangle_vertices = [
            VertexPTC::new(glam::vec3(-0.6, -0.5, 0.0), glam::vec2(0.0, 1.0), glam::vec4(1.0, 0.2, 0.2, 1.0)),
            VertexPTC::new(glam::vec3(0.6, -0.5, 0.0), glam::vec2(1.0, 1.0), glam::vec4(0.2, 1.0, 0.2, 1.0)),
            VertexPTC::new(glam::vec3(0.0, 0.6, 0.0), glam::vec2(0.5, 0.0), glam::vec4(0.2, 0.2, 1.0, 1.0)),
        ];
        let triangle =
            device.create_vertex_buffer(&[Face::new(0, 1, 2)], VertexData::Ptc(&triangle_vertices), "triangle");

        // 合成用的全屏四边形
        let quad_vertices = [
            VertexPTC::new(glam::vec3(-1.0, -1.0, 0.0), glam::vec2(0.0, 1.0), glam::Vec4::ONE),
            VertexPTC::new(glam::vec3(1.0, -1.0, 0.0), glam::vec2(1.0, 1.0), glam::Vec4::ONE),
            VertexPTC::new(glam::vec3(1.0, 1.0, 0.0), glam::vec2(1.0, 0.0), glam::Vec4::ONE),
            VertexPTC::new(glam::vec3(-1.0, 1.0, 0.0), glam::vec2(0.0, 0.0), glam::Vec4::ONE),
        ];
        let quad = device.create_vertex_buffer(
            &[Face::new(0, 1, 2), Face::new(0, 2, 3)],
            VertexData::Ptc(&quad_vertices),
            "fullscreen-quad",
        );

        // SPIR-V 由文件系统提供，缺失属于内容错误
        let vertex_spirv = std::fs::read(self.shader_dir.join("unlit.vert.spv"))
            .unwrap_or_else(|e| panic!("failed to read unlit.vert.spv from {:?}: {e}", self.shader_dir));
        let fragment_spirv = std::fs::read(self.shader_dir.join("unlit.frag.spv"))
            .unwrap_or_else(|e| panic!("failed to read unlit.frag.spv from {:?}: {e}", self.shader_dir));
        let shader = device.create_shader(&vertex_spirv, &fragment_spirv, "unlit");

        let offscreen = device.create_render_target(
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

        self.scene = Some(Scene {
            device,
            triangle,
            quad,
            shader,
            offscreen,
            start: Instant::now(),
            frame_count: 0,
        });
    }

    fn render_frame(&mut self) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let device = &mut scene.device;

        device.reset_command_list();

        // 离屏 pass：旋转三角形
        device.push_group_marker("offscreen");
        device.set_render_target(Some(scene.offscreen), 0);
        device.set_clear_color(0.08, 0.08, 0.12);
        device.clear_screen(ClearFlags::COLOR | ClearFlags::DEPTH);
        let angle = scene.start.elapsed().as_secs_f32();
        let mvp = Mat4::from_rotation_z(angle);
        device.set_uniform_data(bytemuck::bytes_of(&mvp.to_cols_array()));
        device.draw(
            scene.triangle,
            0,
            1,
            scene.shader,
            BlendMode::Off,
            DepthFunc::LessOrEqualWriteOn,
            CullMode::Off,
            FillMode::Solid,
        );
        device.pop_group_marker();

        // 合成 pass：把离屏结果贴到 backbuffer
        device.push_group_marker("composite");
        device.set_render_target(None, 0);
        device.set_clear_color(0.0, 0.0, 0.0);
        device.clear_screen(ClearFlags::COLOR | ClearFlags::DEPTH);
        let offscreen_texture = device.render_target_texture(scene.offscreen);
        device.set_texture(0, offscreen_texture);
        device.set_uniform_data(bytemuck::bytes_of(&Mat4::IDENTITY.to_cols_array()));
        device.draw(
            scene.quad,
            0,
            2,
            scene.shader,
            BlendMode::Off,
            DepthFunc::LessOrEqualWriteOn,
            CullMode::Off,
            FillMode::Solid,
        );
        device.pop_group_marker();

        device.present();
        tracy_client::frame_mark();

        scene.frame_count += 1;
        if scene.frame_count % 120 == 0 {
            log::info!("statistics:\n{}", device.statistics_string());
            let memory = device.gpu_memory_usage();
            log::info!("gpu memory: {} / {} MB", memory.used_mbytes, memory.budget_mbytes);
        }
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        assert!(self.window.is_none(), "window should be None when resumed");
        log::info!("winit event: resumed");

        let window = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title("Kestrel")
                    .with_inner_size(LogicalSize::new(1280.0, 720.0)),
            )
            .unwrap();
        self.init_scene(&window);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("loop exiting");
        // drop 时排空在途工作并按依赖顺序释放 GPU 对象
        self.scene = None;
    }
}
