//! Application runner and event loop.

use std::time::Instant;

use ash::vk;
use shapes_gpu::{AshContext, Renderer, ShaderCode};
use shapes_platform::{create_event_loop, create_window, framebuffer_extent};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::config::AppConfig;
use crate::error::{AppError, Result};

/// Run the renderer until the window closes.
///
/// Initializes logging, creates the window and the renderer, and presents
/// one frame per tick. The first fatal error stops the loop and is returned;
/// the caller turns it into an exit code.
pub fn run_app(config: AppConfig) -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("{} starting...", config.title);

    let event_loop = create_event_loop()?;

    let mut runner = AppRunner {
        config,
        state: None,
        error: None,
    };

    event_loop
        .run_app(&mut runner)
        .map_err(|e| shapes_platform::PlatformError::EventLoop(e.to_string()))?;

    match runner.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Internal application runner that implements winit's ApplicationHandler.
struct AppRunner {
    config: AppConfig,
    state: Option<AppState>,
    error: Option<AppError>,
}

/// Internal application state.
///
/// The renderer is declared first so it is torn down while the window it
/// presents to still exists.
struct AppState {
    renderer: Renderer<AshContext>,
    window: Window,
    started: Instant,
}

impl ApplicationHandler for AppRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.error.is_some() {
            return;
        }

        info!("Creating renderer...");

        match self.create_state(event_loop) {
            Ok(state) => {
                self.state = Some(state);
                info!("Application ready!");
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                if let Some(state) = self.state.take() {
                    state.shutdown();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let result = match &mut self.state {
                    Some(state) => state.renderer.draw_frame(),
                    None => Ok(()),
                };
                if let Err(e) = result {
                    self.fail(event_loop, e.into());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

impl AppRunner {
    fn create_state(&self, event_loop: &ActiveEventLoop) -> Result<AppState> {
        let window = create_window(event_loop, &self.config.platform())?;

        let context = AshContext::new(&self.config.title, self.config.validation, &window)?;

        let (width, height) = framebuffer_extent(&window);
        let shaders = ShaderCode {
            vertex: shapes_shaders::triangle_vertex(),
            fragment: shapes_shaders::triangle_fragment(),
        };
        let renderer = Renderer::new(context, vk::Extent2D { width, height }, shaders)?;

        info!("GPU: {}", renderer.device_name());

        Ok(AppState {
            renderer,
            window,
            started: Instant::now(),
        })
    }

    /// Record a fatal error, tear everything down and stop the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, e: AppError) {
        error!("{e}");
        // Release the GPU before the event loop winds down
        self.state = None;
        self.error.get_or_insert(e);
        event_loop.exit();
    }
}

impl AppState {
    fn shutdown(self) {
        let frames = self.renderer.frames_presented();
        let elapsed = self.started.elapsed().as_secs_f64();
        if frames > 0 && elapsed > 0.0 {
            info!(
                "Presented {frames} frames in {elapsed:.1}s ({:.1} FPS)",
                frames as f64 / elapsed
            );
        }
        info!("Starting cleanup...");
        drop(self);
        info!("Cleanup complete");
    }
}
