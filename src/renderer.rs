use std::sync::Arc;

use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::CameraUniform,
    global_uniform::GlobalUniformState,
    keycube::KeycubeState,
    mesh::{draw_mesh_instances, gather_instances, RenderMesh},
    passes::{
        background_pass::{BackgroundPass, BackgroundPassTextureViews},
        key_pass::{KeyPass, KeyPassTextureViews},
        pass::Pass,
    },
    render_common::RenderCommon,
    shader_loader::{PipelineCacheBuilder, ShaderLoader},
    texture::DepthTexture,
};

/// A frame whose scene content is recorded but not yet submitted; the HUD
/// still gets drawn on top before presenting.
pub struct FrameInFlight {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

struct ImguiRenderer {
    renderer: imgui_wgpu::Renderer,
}

impl ImguiRenderer {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture_format: wgpu::TextureFormat,
        context: &mut imgui::Context,
    ) -> Self {
        let config = imgui_wgpu::RendererConfig {
            texture_format,
            ..Default::default()
        };

        Self {
            renderer: imgui_wgpu::Renderer::new(context, device, queue, config),
        }
    }

    fn render(
        &mut self,
        view: &wgpu::TextureView,
        context: &mut imgui::Context,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Imgui render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let draw_data = context.render();

        // Workaround for memory safety related crash in imgui-rs
        // https://github.com/imgui-rs/imgui-rs/issues/325
        if draw_data.draw_lists_count() == 0 {
            return;
        }

        self.renderer
            .render(draw_data, queue, device, &mut render_pass)
            .expect("Rendering Imgui failed");
    }
}

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    render_meshes: Arena<RenderMesh>,

    camera_uniform: CameraUniform,

    shader_loader: ShaderLoader,

    background_pass: BackgroundPass,
    key_pass: KeyPass,

    imgui_renderer: ImguiRenderer,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        state: &KeycubeState,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .unwrap();

        let mut camera_uniform = CameraUniform::default();
        camera_uniform.update(size, &state.camera);
        let camera_uniform_buffer = camera_uniform.create_buffer(&device);

        let common = RenderCommon::new(&device, &adapter, &surface, size, camera_uniform_buffer);
        let common = Arc::new(common);

        let depth_texture = DepthTexture::new(
            &device,
            &common.output_surface_config.read().unwrap(),
            "Depth Texture",
        );

        let mut cache_builder = PipelineCacheBuilder::new();

        let background_pass = BackgroundPass::create(&device, common.clone(), &mut cache_builder)?;
        let key_pass = KeyPass::create(&device, common.clone(), &mut cache_builder)?;

        let shader_loader = ShaderLoader::new(device.clone(), cache_builder);

        let surface_format = common.output_surface_config.read().unwrap().format;
        let imgui_renderer = ImguiRenderer::new(&device, &queue, surface_format, imgui_context);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            render_meshes: Arena::new(),
            camera_uniform,
            shader_loader,
            background_pass,
            key_pass,
            imgui_renderer,
        })
    }

    /// Uploads every scene mesh to the GPU. Called once after scene build.
    pub fn load_meshes(&mut self, state: &mut KeycubeState) -> anyhow::Result<()> {
        for (_id, mesh) in &mut state.scene.meshes {
            let render_mesh = RenderMesh::from_mesh(&self.device, mesh);
            let render_mesh_id = self.render_meshes.alloc(render_mesh);
            mesh.render_mesh = Some(render_mesh_id);
            log::info!(
                "Loaded mesh {} with {} indices",
                mesh.name,
                mesh.indices.len()
            );
        }

        Ok(())
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;

        let mut config = self.common.output_surface_config.write().unwrap();
        config.width = new_size.width;
        config.height = new_size.height;

        self.surface.configure(&self.device, &config);
        self.depth_texture.resize(&self.device, &config);
    }

    pub fn render(&mut self, state: &KeycubeState) -> Result<FrameInFlight, wgpu::SurfaceError> {
        self.shader_loader
            .load_pending_shaders()
            .expect("Failed to load pending shaders");

        self.camera_uniform.update(self.size, &state.camera);
        self.camera_uniform
            .update_buffer(&self.queue, &self.common.camera_uniform_buffer);
        self.common.global_uniform.update(
            &self.queue,
            GlobalUniformState::new(self.size, state.start_time.elapsed().as_secs_f32()),
        );

        gather_instances(&state.scene, &mut self.render_meshes);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let pipeline_cache = &self.shader_loader.cache;

        self.background_pass.render(
            &BackgroundPassTextureViews { color: view.clone() },
            &mut encoder,
            pipeline_cache,
            |render_pass| {
                render_pass.draw(0..3, 0..1);
            },
        );

        self.key_pass.render(
            &KeyPassTextureViews {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
            },
            &mut encoder,
            pipeline_cache,
            |render_pass| {
                for (_id, render_mesh) in self.render_meshes.iter() {
                    if !render_mesh.instances.should_render() {
                        continue;
                    }

                    draw_mesh_instances(render_pass, &self.queue, render_mesh);
                }
            },
        );

        Ok(FrameInFlight {
            output,
            view,
            encoder,
        })
    }

    /// Draws the HUD on top of the frame, submits and presents it.
    pub fn finish_frame(&mut self, frame: FrameInFlight, imgui_context: &mut imgui::Context) {
        let FrameInFlight {
            output,
            view,
            mut encoder,
        } = frame;

        self.imgui_renderer
            .render(&view, imgui_context, &self.device, &self.queue, &mut encoder);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
