//! Aster renderer - main entry point.
//!
//! Creates a window, initializes the renderer with a small scene, and
//! drives the frame loop from winit events.

use std::path::PathBuf;

use anyhow::Result;
use glam::{Quat, Vec3};
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use aster_core::{FrameTimer, RenderSettings};
use aster_platform::Window;
use aster_render::{Renderer, SceneObjectDesc};
use aster_scene::Transform;

struct App {
    settings: RenderSettings,
    window: Option<Window>,
    renderer: Option<Renderer>,
    timer: FrameTimer,
}

impl App {
    fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            window: None,
            renderer: None,
            timer: FrameTimer::new(),
        }
    }

    fn scene() -> Vec<SceneObjectDesc> {
        vec![
            SceneObjectDesc {
                mesh: PathBuf::from("assets/models/viking_room.obj"),
                texture: PathBuf::from("assets/textures/viking_room.png"),
                transform: Transform::default(),
            },
            SceneObjectDesc {
                mesh: PathBuf::from("assets/models/viking_room.obj"),
                texture: PathBuf::from("assets/textures/viking_room.png"),
                transform: Transform {
                    translation: Vec3::new(1.5, 0.0, 0.0),
                    rotation: Quat::from_rotation_z(180.0_f32.to_radians()),
                    scale: Vec3::splat(0.5),
                },
            },
        ]
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = match Window::new(
                event_loop,
                self.settings.width,
                self.settings.height,
                &self.settings.title,
            ) {
                Ok(window) => window,
                Err(e) => {
                    error!("Failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };

            match Renderer::new(&window, &self.settings, &Self::scene()) {
                Ok(renderer) => {
                    info!("Initialization complete, entering main loop");
                    self.renderer = Some(renderer);
                    self.window = Some(window);
                }
                Err(e) => {
                    error!("Failed to create renderer: {:?}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut window) = self.window {
                    window.resize(size.width, size.height);
                }
                if let Some(ref mut renderer) = self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(ref mut renderer) = self.renderer {
                    let delta = self.timer.delta_secs();
                    renderer.update(delta);

                    if let Err(e) = renderer.render_frame() {
                        error!("Render error: {:?}", e);
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    aster_core::init_logging();
    info!("Starting Aster");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(RenderSettings::default());
    event_loop.run_app(&mut app)?;

    Ok(())
}
