/// Pulsar demo - two textured quads spinning over a depth buffer
///
/// Brings the whole stack up: winit window behind the
/// `PresentationWindow` seam, the Vulkan presenter behind
/// `FramePresenter`, a scene recorder supplying geometry, texture and
/// per-image uniforms, and the core frame loop driving it all. The
/// process exits 0 on a clean shutdown, 1 on a fatal setup error.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use pulsar_3d_renderer::engine_error;
use pulsar_3d_renderer::pulsar3d::render::{
    Config, FrameLoop, PresentationWindow, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH,
};
use pulsar_3d_renderer::pulsar3d::{Color, Error, Result};
use pulsar_3d_renderer_vulkan::ash::vk;
use pulsar_3d_renderer_vulkan::{
    compile_glsl, shaderc, CommandRecorder, GpuBuffer, GpuContext, GpuTexture, RecordContext,
    SceneDesc, SceneDescriptorSets, SceneSetLayout, VulkanPresenter,
};

const VERTEX_SHADER: &str = r#"
#version 450

layout(binding = 0) uniform UniformBufferObject {
    mat4 model;
    mat4 view;
    mat4 proj;
} ubo;

layout(location = 0) in vec3 inPosition;
layout(location = 1) in vec3 inColor;
layout(location = 2) in vec2 inTexCoord;

layout(location = 0) out vec3 fragColor;
layout(location = 1) out vec2 fragTexCoord;

void main() {
    gl_Position = ubo.proj * ubo.view * ubo.model * vec4(inPosition, 1.0);
    fragColor = inColor;
    fragTexCoord = inTexCoord;
}
"#;

const FRAGMENT_SHADER: &str = r#"
#version 450

layout(binding = 1) uniform sampler2D texSampler;

layout(location = 0) in vec3 fragColor;
layout(location = 1) in vec2 fragTexCoord;

layout(location = 0) out vec4 outColor;

void main() {
    outColor = vec4(fragColor, 1.0) * texture(texSampler, fragTexCoord);
}
"#;

// ============================================================================
// Vertex data
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: [f32; 3],
    uv: [f32; 2],
}

impl Vertex {
    fn bindings() -> Vec<vk::VertexInputBindingDescription> {
        vec![vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    fn attributes() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 24,
            },
        ]
    }
}

/// Two quads stacked along Z; the lower one proves the depth test.
const VERTICES: [Vertex; 8] = [
    Vertex { position: [-0.5, -0.5, 0.0], color: [1.0, 1.0, 1.0], uv: [1.0, 0.0] },
    Vertex { position: [0.5, -0.5, 0.0], color: [0.9, 0.6, 0.3], uv: [0.0, 0.0] },
    Vertex { position: [0.5, 0.5, 0.0], color: [1.0, 1.0, 1.0], uv: [0.0, 1.0] },
    Vertex { position: [-0.5, 0.5, 0.0], color: [0.3, 0.6, 0.9], uv: [1.0, 1.0] },
    Vertex { position: [-0.5, -0.5, -0.5], color: [1.0, 0.4, 0.4], uv: [1.0, 0.0] },
    Vertex { position: [0.5, -0.5, -0.5], color: [0.4, 1.0, 0.4], uv: [0.0, 0.0] },
    Vertex { position: [0.5, 0.5, -0.5], color: [0.4, 0.4, 1.0], uv: [0.0, 1.0] },
    Vertex { position: [-0.5, 0.5, -0.5], color: [1.0, 1.0, 0.6], uv: [1.0, 1.0] },
];

const INDICES: [u16; 12] = [0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4];

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct UniformData {
    model: glam::Mat4,
    view: glam::Mat4,
    proj: glam::Mat4,
}

/// Checkerboard pixels built from the color utility
fn checkerboard_pixels(size: u32, cell: u32) -> Vec<u8> {
    let light = Color::opaque(235, 235, 235);
    let dark = Color::opaque(40, 44, 60);

    let mut pixels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let even = ((x / cell) + (y / cell)) % 2 == 0;
            pixels.push(if even { light } else { dark });
        }
    }

    bytemuck::cast_slice(&pixels).to_vec()
}

// ============================================================================
// Scene recorder
// ============================================================================

/// Scene resources plus the command recording collaborator
///
/// Field order is teardown order: geometry and uniform buffers, then the
/// texture, then descriptor sets (pool), then the set layout.
struct DemoScene {
    gpu: Arc<GpuContext>,
    start: Instant,
    clear_color: Color,
    index_count: u32,
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    uniforms: Vec<GpuBuffer>,
    texture: GpuTexture,
    descriptor_sets: Option<SceneDescriptorSets>,
    set_layout: SceneSetLayout,
}

impl DemoScene {
    fn new(gpu: Arc<GpuContext>, max_anisotropy: f32) -> Result<Self> {
        let vertex_buffer = GpuBuffer::device_local(
            gpu.clone(),
            vk::BufferUsageFlags::VERTEX_BUFFER,
            bytemuck::cast_slice(&VERTICES),
        )?;
        let index_buffer = GpuBuffer::device_local(
            gpu.clone(),
            vk::BufferUsageFlags::INDEX_BUFFER,
            bytemuck::cast_slice(&INDICES),
        )?;

        let texture = GpuTexture::from_rgba8(
            gpu.clone(),
            256,
            256,
            &checkerboard_pixels(256, 32),
            max_anisotropy,
        )?;

        let set_layout = SceneSetLayout::new(gpu.clone())?;

        Ok(Self {
            gpu,
            start: Instant::now(),
            clear_color: Color::opaque(10, 12, 24),
            index_count: INDICES.len() as u32,
            vertex_buffer,
            index_buffer,
            uniforms: Vec::new(),
            texture,
            descriptor_sets: None,
            set_layout,
        })
    }

    fn set_layout_handle(&self) -> vk::DescriptorSetLayout {
        self.set_layout.layout
    }
}

impl CommandRecorder for DemoScene {
    fn on_generation(&mut self, image_count: usize, _extent: vk::Extent2D) -> Result<()> {
        // Per-image resources follow the image count of the generation.
        self.descriptor_sets = None;
        self.uniforms.clear();

        for _ in 0..image_count {
            self.uniforms.push(GpuBuffer::host_visible(
                self.gpu.clone(),
                std::mem::size_of::<UniformData>() as u64,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
            )?);
        }

        self.descriptor_sets = Some(SceneDescriptorSets::new(
            self.gpu.clone(),
            &self.set_layout,
            &self.uniforms,
            &self.texture,
        )?);

        Ok(())
    }

    fn prepare_frame(&mut self, image_index: usize, extent: vk::Extent2D) -> Result<()> {
        let elapsed = self.start.elapsed().as_secs_f32();
        let aspect = extent.width as f32 / extent.height.max(1) as f32;

        let mut proj =
            glam::Mat4::perspective_rh(45_f32.to_radians(), aspect, 0.1, 10.0);
        // GLSL clip space points Y down relative to glam's.
        proj.y_axis.y *= -1.0;

        let ubo = UniformData {
            model: glam::Mat4::from_rotation_z(elapsed * 90_f32.to_radians()),
            view: glam::Mat4::look_at_rh(
                glam::Vec3::new(2.0, 2.0, 2.0),
                glam::Vec3::ZERO,
                glam::Vec3::Z,
            ),
            proj,
        };

        self.uniforms[image_index].write(0, bytemuck::bytes_of(&ubo))
    }

    fn record(
        &mut self,
        ctx: &RecordContext<'_>,
        command_buffer: vk::CommandBuffer,
        image_index: usize,
    ) -> Result<()> {
        let sets = self
            .descriptor_sets
            .as_ref()
            .ok_or_else(|| Error::InvalidResource("descriptor sets not built".to_string()))?;

        let device = ctx.device;
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default();
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("begin_command_buffer: {:?}", e)))?;

            let mut clear_values = vec![vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [
                        self.clear_color.r as f32 / 255.0,
                        self.clear_color.g as f32 / 255.0,
                        self.clear_color.b as f32 / 255.0,
                        1.0,
                    ],
                },
            }];
            if ctx.has_depth {
                clear_values.push(vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
                });
            }

            let render_pass_begin = vk::RenderPassBeginInfo::default()
                .render_pass(ctx.render_pass)
                .framebuffer(ctx.framebuffer)
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent: ctx.extent,
                })
                .clear_values(&clear_values);

            device.cmd_begin_render_pass(
                command_buffer,
                &render_pass_begin,
                vk::SubpassContents::INLINE,
            );
            device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                ctx.pipeline,
            );
            device.cmd_bind_vertex_buffers(command_buffer, 0, &[self.vertex_buffer.buffer], &[0]);
            device.cmd_bind_index_buffer(
                command_buffer,
                self.index_buffer.buffer,
                0,
                vk::IndexType::UINT16,
            );
            device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                ctx.pipeline_layout,
                0,
                &[sets.sets[image_index]],
                &[],
            );
            device.cmd_draw_indexed(command_buffer, self.index_count, 1, 0, 0, 0);
            device.cmd_end_render_pass(command_buffer);

            device
                .end_command_buffer(command_buffer)
                .map_err(|e| Error::BackendError(format!("end_command_buffer: {:?}", e)))?;
        }

        Ok(())
    }
}

// ============================================================================
// Window adapter
// ============================================================================

/// Event sink fed by pump_app_events
#[derive(Default)]
struct EventSink {
    close_requested: bool,
    resized: bool,
}

impl ApplicationHandler for EventSink {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Resized(_) => self.resized = true,
            _ => {}
        }
    }
}

/// winit-backed implementation of the windowing collaborator
struct DemoWindow {
    event_loop: EventLoop<()>,
    window: Window,
    sink: EventSink,
}

impl DemoWindow {
    #[allow(deprecated)]
    fn create() -> Result<Self> {
        let event_loop = EventLoop::new().map_err(|e| {
            Error::InitializationFailed(format!("Failed to create event loop: {}", e))
        })?;

        let attrs = Window::default_attributes()
            .with_title("Pulsar")
            .with_inner_size(winit::dpi::LogicalSize::new(
                DEFAULT_WINDOW_WIDTH,
                DEFAULT_WINDOW_HEIGHT,
            ));

        let window = event_loop.create_window(attrs).map_err(|e| {
            Error::InitializationFailed(format!("Failed to create window: {}", e))
        })?;

        Ok(Self {
            event_loop,
            window,
            sink: EventSink::default(),
        })
    }

    fn window(&self) -> &Window {
        &self.window
    }

    /// Consume the pending resize notification, if any
    fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.sink.resized)
    }
}

impl PresentationWindow for DemoWindow {
    fn poll_events(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.sink);
        if let PumpStatus::Exit(_) = status {
            self.sink.close_requested = true;
        }
    }

    fn should_close(&self) -> bool {
        self.sink.close_requested
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

// ============================================================================
// Entry point
// ============================================================================

fn run() -> Result<()> {
    let mut window = DemoWindow::create()?;
    let config = Config::default();

    let mut presenter =
        VulkanPresenter::new(window.window(), &config, window.framebuffer_size())?;

    let scene = DemoScene::new(presenter.gpu().clone(), presenter.max_sampler_anisotropy())?;

    let vertex_spirv = compile_glsl(VERTEX_SHADER, shaderc::ShaderKind::Vertex, "demo.vert")?;
    let fragment_spirv =
        compile_glsl(FRAGMENT_SHADER, shaderc::ShaderKind::Fragment, "demo.frag")?;

    let set_layouts = vec![scene.set_layout_handle()];
    presenter.install_scene(
        SceneDesc {
            vertex_spirv,
            fragment_spirv,
            vertex_bindings: Vertex::bindings(),
            vertex_attributes: Vertex::attributes(),
            set_layouts,
            enable_depth: true,
        },
        Box::new(scene),
    )?;

    let mut frame_loop = FrameLoop::new();
    while !window.should_close() {
        window.poll_events();
        if window.take_resized() {
            frame_loop.notify_resized();
        }
        frame_loop.run_iteration(&mut presenter, &mut window)?;
    }

    frame_loop.shutdown(&mut presenter)
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            engine_error!("pulsar3d::demo", "Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_attribute_offsets_match_layout() {
        let attributes = Vertex::attributes();
        assert_eq!(attributes[0].offset, 0);
        assert_eq!(attributes[1].offset, 12);
        assert_eq!(attributes[2].offset, 24);
        assert_eq!(
            Vertex::bindings()[0].stride as usize,
            std::mem::size_of::<Vertex>()
        );
    }

    #[test]
    fn test_checkerboard_pixel_buffer_size() {
        let pixels = checkerboard_pixels(64, 8);
        assert_eq!(pixels.len(), 64 * 64 * 4);
    }

    #[test]
    fn test_checkerboard_alternates_cells() {
        let pixels = checkerboard_pixels(4, 2);
        // First texel of the first cell vs first texel of the next cell.
        let first = &pixels[0..4];
        let other = &pixels[(2 * 4)..(2 * 4 + 4)];
        assert_ne!(first, other);
    }

    #[test]
    fn test_uniform_data_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<UniformData>(), 3 * 64);
    }
}
