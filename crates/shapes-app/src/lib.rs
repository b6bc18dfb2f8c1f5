//! Application shell for the Shapes renderer.
//!
//! Handles the boilerplate around the rendering core:
//! - Logging initialization
//! - Window creation and the event loop
//! - Building the renderer against the window's surface
//! - Driving one frame per tick until the window closes
//! - Mapping failures to process exit codes
//!
//! # Example
//!
//! ```no_run
//! use shapes_app::{run_app, AppConfig};
//!
//! fn main() -> std::process::ExitCode {
//!     match run_app(AppConfig::default()) {
//!         Ok(()) => std::process::ExitCode::SUCCESS,
//!         Err(e) => e.exit_code(),
//!     }
//! }
//! ```

mod config;
mod error;
mod runner;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use runner::run_app;
