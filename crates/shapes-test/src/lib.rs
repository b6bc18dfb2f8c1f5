//! Test harness for the Shapes renderer.
//!
//! Provides a recording mock driver so the full stage chain can be built,
//! driven and torn down without a GPU or a window.

pub mod mock;

pub use mock::{Call, MockDevice, MockGpu, MockInstance, MockPhysicalDevice, Recorder};

use ash::vk;
use shapes_gpu::{GpuError, Renderer, ShaderCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("Leaked handles: {0:?}")]
    Leaked(Vec<&'static str>),
    #[error("Invalid destroy calls: {0:?}")]
    InvalidDestroy(Vec<String>),
}

pub type Result<T> = std::result::Result<T, TestError>;

/// Window size the harness renders at unless a test says otherwise.
pub const FRAMEBUFFER: vk::Extent2D = vk::Extent2D {
    width: 800,
    height: 600,
};

/// The real triangle shaders.
pub fn triangle_shaders() -> ShaderCode<'static> {
    ShaderCode {
        vertex: shapes_shaders::triangle_vertex(),
        fragment: shapes_shaders::triangle_fragment(),
    }
}

/// Build a renderer over `gpu` at [`FRAMEBUFFER`] size.
pub fn build_renderer(gpu: MockGpu) -> (Result<Renderer<MockInstance>>, Recorder) {
    build_renderer_sized(gpu, FRAMEBUFFER)
}

/// Build a renderer over `gpu` for a window of `framebuffer` pixels.
pub fn build_renderer_sized(
    gpu: MockGpu,
    framebuffer: vk::Extent2D,
) -> (Result<Renderer<MockInstance>>, Recorder) {
    let (instance, recorder) = gpu.build();
    let renderer = Renderer::new(instance, framebuffer, triangle_shaders()).map_err(TestError::from);
    if let Err(e) = &renderer {
        tracing::debug!("Renderer construction failed: {e}");
    }
    (renderer, recorder)
}

/// Check that every handle was destroyed exactly once.
pub fn verify_clean_teardown(recorder: &Recorder) -> Result<()> {
    let live = recorder.live();
    if !live.is_empty() {
        return Err(TestError::Leaked(live));
    }
    let bad = recorder.bad_destroys();
    if !bad.is_empty() {
        return Err(TestError::InvalidDestroy(bad));
    }
    Ok(())
}
