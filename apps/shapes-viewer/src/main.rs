//! Shapes viewer
//!
//! Opens an 800x600 window and draws a single triangle every frame until the
//! window is closed.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p shapes-viewer -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `-h, --help`: Print help message
//!
//! ## Exit codes
//!
//! - `0`: window closed normally
//! - `1`: window or event loop could not be created
//! - `2`: a GPU resource could not be created
//! - `3`: no GPU meets the requirements
//! - `4`: acquiring, submitting or presenting a frame failed
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

use std::process::ExitCode;

use shapes_app::{run_app, AppConfig};

fn main() -> ExitCode {
    // Check for help flag before starting the app
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return ExitCode::SUCCESS;
    }

    match run_app(AppConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => e.exit_code(),
    }
}

fn print_help() {
    eprintln!(
        "Shapes viewer: draws a triangle with Vulkan

USAGE:
    cargo run -p shapes-viewer -- [OPTIONS]

OPTIONS:
    -h, --help              Print this help message

EXIT CODES:
    0                       Window closed normally
    1                       Window or event loop creation failed
    2                       GPU resource creation failed
    3                       No GPU meets the requirements
    4                       Frame acquire, submit or present failed

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
