//! Platform layer for the Shapes renderer.
//!
//! Creates the window via winit and reports its framebuffer size. winit's
//! `Window` implements the `raw-window-handle` traits the renderer binds its
//! surface through.

use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::Window;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),
    #[error("Event loop error: {0}")]
    EventLoop(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Platform configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Shapes!??".to_string(),
            width: 800,
            height: 600,
            resizable: false,
        }
    }
}

impl PlatformConfig {
    /// Window attributes for this configuration.
    pub fn window_attributes(&self) -> winit::window::WindowAttributes {
        Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(PhysicalSize::new(self.width, self.height))
            .with_resizable(self.resizable)
    }
}

/// Create the event loop, polling so the frame loop runs continuously.
pub fn create_event_loop() -> Result<EventLoop<()>> {
    let event_loop = EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);
    Ok(event_loop)
}

/// Create the window.
pub fn create_window(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Result<Window> {
    let window = event_loop
        .create_window(config.window_attributes())
        .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;

    tracing::debug!(
        "Window created: \"{}\" {}x{}",
        config.title,
        config.width,
        config.height
    );

    Ok(window)
}

/// Framebuffer size in physical pixels.
pub fn framebuffer_extent(window: &Window) -> (u32, u32) {
    let size = window.inner_size();
    (size.width, size.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_fixed_size() {
        let config = PlatformConfig::default();
        assert_eq!(config.title, "Shapes!??");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.resizable);
    }
}
