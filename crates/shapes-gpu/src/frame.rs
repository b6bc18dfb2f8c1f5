//! Per-tick frame scheduling: acquire, submit, present.

use crate::driver::DeviceDriver;
use crate::error::{GpuError, Result};
use crate::sync::SyncPrimitives;
use ash::vk;

/// Drives one frame per call to [`FrameScheduler::draw_frame`].
///
/// Holds copies of the handles it needs; ownership stays with the renderer.
pub struct FrameScheduler {
    swapchain: vk::SwapchainKHR,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    image_available: vk::Semaphore,
    render_finished: vk::Semaphore,
    command_buffers: Vec<vk::CommandBuffer>,
    frames_presented: u64,
}

impl FrameScheduler {
    /// Create a scheduler over pre-recorded command buffers, indexed by
    /// swapchain image.
    pub fn new(
        swapchain: vk::SwapchainKHR,
        graphics_queue: vk::Queue,
        present_queue: vk::Queue,
        sync: &SyncPrimitives,
        command_buffers: Vec<vk::CommandBuffer>,
    ) -> Self {
        Self {
            swapchain,
            graphics_queue,
            present_queue,
            image_available: sync.image_available,
            render_finished: sync.render_finished,
            command_buffers,
            frames_presented: 0,
        }
    }

    /// Render and present one frame. Returns the presented image index.
    ///
    /// Waits for the present queue to go idle first, so only one frame is
    /// ever in flight and the single semaphore pair is safe to reuse.
    ///
    /// # Safety
    /// `device` must own every handle given to [`FrameScheduler::new`].
    #[cfg_attr(feature = "profiling-tracy", tracing::instrument(level = "trace", skip_all))]
    pub unsafe fn draw_frame<D: DeviceDriver + ?Sized>(&mut self, device: &D) -> Result<u32> {
        unsafe { device.queue_wait_idle(self.present_queue) }.map_err(GpuError::Submit)?;

        let (image_index, suboptimal) = unsafe {
            device.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.image_available,
                vk::Fence::null(),
            )
        }
        .map_err(GpuError::Acquire)?;
        if suboptimal {
            tracing::debug!("Swapchain suboptimal on acquire (image {image_index})");
        }

        let command_buffer = self
            .command_buffers
            .get(image_index as usize)
            .copied()
            .ok_or(GpuError::ImageIndexOutOfRange {
                index: image_index,
                count: self.command_buffers.len(),
            })?;

        let wait_semaphores = [self.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [self.render_finished];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            device.queue_submit(
                self.graphics_queue,
                std::slice::from_ref(&submit_info),
                vk::Fence::null(),
            )
        }
        .map_err(GpuError::Submit)?;

        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let suboptimal = unsafe { device.queue_present(self.present_queue, &present_info) }
            .map_err(GpuError::Present)?;
        if suboptimal {
            tracing::debug!("Swapchain suboptimal on present (image {image_index})");
        }

        self.frames_presented += 1;
        Ok(image_index)
    }

    /// Number of command buffers, one per swapchain image.
    pub fn command_buffer_count(&self) -> usize {
        self.command_buffers.len()
    }

    /// Frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}
