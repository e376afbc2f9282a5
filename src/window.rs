use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::Window,
};

use crate::{engine, keycube::KeycubeState, renderer::Renderer};

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    renderer: Option<Renderer>,
    state: KeycubeState,
    imgui: Option<ImguiState>,
    last_frame: Instant,
}

impl App {
    fn from_state(state: KeycubeState) -> Self {
        Self {
            renderer: None,
            state,
            imgui: None,
            last_frame: Instant::now(),
        }
    }

    fn setup_imgui(&mut self, window: &Window) {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // Disable INI support because it's broken in the published version of imgui
        context.set_ini_filename(None);

        self.imgui = Some(ImguiState { context, platform });
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title("keycube");
        let window = event_loop.create_window(window_attributes).unwrap();
        self.setup_imgui(&window);
        let renderer = pollster::block_on(Renderer::new(
            Arc::new(window),
            &self.state,
            &mut self.imgui.as_mut().unwrap().context,
        ))
        .unwrap();
        self.renderer = Some(renderer);

        self.renderer
            .as_mut()
            .unwrap()
            .load_meshes(&mut self.state)
            .unwrap();
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let imgui = self.imgui.as_mut().unwrap();

        // While a HUD widget captures the mouse, neither the orbit controls
        // nor the hover raycast should see pointer input.
        let hud_owns_mouse = imgui.context.io().want_capture_mouse;
        if !hud_owns_mouse {
            self.state.orbit.handle_event(&event, &mut self.state.camera);
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.renderer.as_mut().unwrap().resize(new_size);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.pointer = if hud_owns_mouse {
                    None
                } else {
                    Some(Vec2::new(position.x as f32, position.y as f32))
                };
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.pointer = None;
            }
            WindowEvent::RedrawRequested => {
                let delta_time = self.last_frame.elapsed();
                imgui.context.io_mut().update_delta_time(delta_time);
                self.last_frame = Instant::now();

                let renderer = self.renderer.as_mut().unwrap();
                renderer.window.request_redraw();

                imgui
                    .platform
                    .prepare_frame(imgui.context.io_mut(), &renderer.window)
                    .expect("Failed to prepare Imgui frame");

                let ui = imgui.context.new_frame();

                let resolution = Vec2::new(renderer.size.width as f32, renderer.size.height as f32);
                engine::update(&mut self.state, resolution, ui)
                    .expect("Error during engine::update");

                match renderer.render(&self.state) {
                    Ok(frame) => {
                        renderer.finish_frame(frame, &mut imgui.context);
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }
            }
            _ => (),
        }

        {
            let window = self.renderer.as_mut().unwrap().window.as_ref();
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                window,
                &Event::WindowEvent { window_id, event },
            );
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let state = KeycubeState::new();
    let mut app = App::from_state(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
