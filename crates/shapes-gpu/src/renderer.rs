//! The renderer: every stage built in dependency order and torn down in
//! reverse.

use crate::command::{record_command_buffers, CommandPool};
use crate::device::{select_device, LogicalDevice};
use crate::driver::{DeviceDriver, InstanceDriver};
use crate::error::{GpuError, Result};
use crate::frame::FrameScheduler;
use crate::framebuffer::FramebufferSet;
use crate::handle::{DeviceObject, Scoped};
use crate::pipeline::Pipeline;
use crate::surface::SurfaceCapabilities;
use crate::swapchain::SwapchainState;
use crate::sync::SyncPrimitives;
use ash::vk;

/// SPIR-V for the two pipeline stages, as raw bytes.
#[derive(Debug, Clone, Copy)]
pub struct ShaderCode<'a> {
    pub vertex: &'a [u8],
    pub fragment: &'a [u8],
}

/// Owns the context, the device and every stage built on them.
///
/// Field order matters: `Drop` releases the stages explicitly, then the
/// device drops, then the context (surface, then instance).
pub struct Renderer<I: InstanceDriver> {
    swapchain: SwapchainState,
    pipeline: Pipeline,
    framebuffers: FramebufferSet,
    command_pool: CommandPool,
    sync: SyncPrimitives,
    scheduler: FrameScheduler,
    device: LogicalDevice<I::Device>,
    context: I,
}

impl<I: InstanceDriver> Renderer<I> {
    /// Select a device and build every stage on top of it.
    ///
    /// If a stage fails, everything built before it is released in reverse
    /// order before the error is returned.
    pub fn new(context: I, framebuffer_size: vk::Extent2D, shaders: ShaderCode<'_>) -> Result<Self> {
        let device = select_device(&context)?;
        let driver = device.driver();

        let surface_capabilities =
            unsafe { SurfaceCapabilities::query(&context, device.physical_device()) }
                .map_err(GpuError::creating("surface capabilities"))?;

        let swapchain = unsafe {
            let state =
                SwapchainState::new(&device, context.surface(), &surface_capabilities, framebuffer_size)?;
            Scoped::new(driver, state)
        };
        let extent = swapchain.extent();

        let pipeline = unsafe {
            let pipeline = Pipeline::build(
                driver,
                swapchain.format(),
                extent,
                shaders.vertex,
                shaders.fragment,
            )?;
            Scoped::new(driver, pipeline)
        };

        let framebuffers = unsafe {
            let set = FramebufferSet::new(driver, pipeline.render_pass, &swapchain.image_views, extent)?;
            Scoped::new(driver, set)
        };

        let command_pool = unsafe {
            let pool = CommandPool::new(driver, device.queue_families().graphics)?;
            Scoped::new(driver, pool)
        };
        let command_buffers = unsafe {
            record_command_buffers(driver, &command_pool, &pipeline, framebuffers.as_slice(), extent)?
        };

        let sync = unsafe { Scoped::new(driver, SyncPrimitives::new(driver)?) };

        let scheduler = FrameScheduler::new(
            swapchain.swapchain,
            device.graphics_queue(),
            device.present_queue(),
            &sync,
            command_buffers,
        );

        tracing::info!(
            "Renderer ready on {}: {}x{}, {} images",
            device.name(),
            extent.width,
            extent.height,
            swapchain.image_count()
        );

        Ok(Self {
            sync: sync.release(),
            command_pool: command_pool.release(),
            framebuffers: framebuffers.release(),
            pipeline: pipeline.release(),
            swapchain: swapchain.release(),
            scheduler,
            device,
            context,
        })
    }

    /// Render and present one frame.
    pub fn draw_frame(&mut self) -> Result<()> {
        // SAFETY: every handle the scheduler holds was created by this device
        // and lives until drop.
        unsafe { self.scheduler.draw_frame(self.device.driver())? };
        Ok(())
    }

    /// Swapchain image size in pixels.
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Number of swapchain images the driver created.
    pub fn image_count(&self) -> usize {
        self.swapchain.image_count()
    }

    /// Number of framebuffers.
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Number of recorded command buffers.
    pub fn command_buffer_count(&self) -> usize {
        self.scheduler.command_buffer_count()
    }

    /// Name of the selected GPU.
    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.scheduler.frames_presented()
    }

    /// The instance-level driver the renderer was built on.
    pub fn context(&self) -> &I {
        &self.context
    }
}

impl<I: InstanceDriver> Drop for Renderer<I> {
    fn drop(&mut self) {
        let driver = self.device.driver();

        if let Err(e) = unsafe { driver.queue_wait_idle(self.device.present_queue()) } {
            tracing::error!("Failed to wait for present queue before teardown: {e}");
        }

        tracing::info!(
            "Shutting down after {} frames",
            self.scheduler.frames_presented()
        );

        unsafe {
            self.sync.destroy(driver);
            self.command_pool.destroy(driver);
            self.framebuffers.destroy(driver);
            self.pipeline.destroy(driver);
            self.swapchain.destroy(driver);
        }
    }
}
