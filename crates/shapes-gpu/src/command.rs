//! Command buffer management.

use crate::driver::DeviceDriver;
use crate::error::{GpuError, Result};
use crate::handle::DeviceObject;
use crate::pipeline::Pipeline;
use ash::vk;

/// Opaque black.
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Command pool for allocating command buffers.
///
/// Buffers allocated from the pool are freed with it.
pub struct CommandPool {
    pool: vk::CommandPool,
}

impl CommandPool {
    /// Create a new command pool.
    ///
    /// # Safety
    /// The device must be valid and the queue family must exist.
    pub unsafe fn new<D: DeviceDriver + ?Sized>(device: &D, queue_family: u32) -> Result<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::empty());

        let pool = unsafe { device.create_command_pool(&create_info) }
            .map_err(GpuError::creating("command pool"))?;

        Ok(Self { pool })
    }

    /// Get the raw pool handle.
    pub fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    /// Allocate multiple command buffers.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn allocate_command_buffers<D: DeviceDriver + ?Sized>(
        &self,
        device: &D,
        level: vk::CommandBufferLevel,
        count: u32,
    ) -> Result<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(level)
            .command_buffer_count(count);

        unsafe { device.allocate_command_buffers(&alloc_info) }
            .map_err(|e| GpuError::CommandRecording(format!("Allocation failed: {e}")))
    }
}

impl DeviceObject for CommandPool {
    unsafe fn destroy<D: DeviceDriver + ?Sized>(&self, device: &D) {
        unsafe { device.destroy_command_pool(self.pool) };
    }
}

/// Allocate and record one command buffer per framebuffer.
///
/// Every buffer clears its target to black and draws the fixed triangle.
/// Recorded once; the frame loop replays them as-is.
///
/// # Safety
/// All handles must be valid and belong to `device`.
pub unsafe fn record_command_buffers<D: DeviceDriver + ?Sized>(
    device: &D,
    pool: &CommandPool,
    pipeline: &Pipeline,
    framebuffers: &[vk::Framebuffer],
    extent: vk::Extent2D,
) -> Result<Vec<vk::CommandBuffer>> {
    let count = u32::try_from(framebuffers.len())
        .map_err(|_| GpuError::CommandRecording("Too many framebuffers".to_string()))?;
    let command_buffers =
        unsafe { pool.allocate_command_buffers(device, vk::CommandBufferLevel::PRIMARY, count)? };

    for (i, (&cmd, &framebuffer)) in command_buffers.iter().zip(framebuffers).enumerate() {
        unsafe { record_draw(device, cmd, pipeline, framebuffer, extent) }
            .map_err(|e| GpuError::CommandRecording(format!("Command buffer {i}: {e}")))?;
    }

    tracing::debug!("Recorded {} command buffers", command_buffers.len());

    Ok(command_buffers)
}

/// # Safety
/// All handles must be valid.
unsafe fn record_draw<D: DeviceDriver + ?Sized>(
    device: &D,
    cmd: vk::CommandBuffer,
    pipeline: &Pipeline,
    framebuffer: vk::Framebuffer,
    extent: vk::Extent2D,
) -> ash::prelude::VkResult<()> {
    let begin_info = vk::CommandBufferBeginInfo::default();

    let clear_values = [vk::ClearValue {
        color: vk::ClearColorValue {
            float32: CLEAR_COLOR,
        },
    }];

    let render_pass_info = vk::RenderPassBeginInfo::default()
        .render_pass(pipeline.render_pass)
        .framebuffer(framebuffer)
        .render_area(vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        })
        .clear_values(&clear_values);

    unsafe {
        device.begin_command_buffer(cmd, &begin_info)?;
        device.cmd_begin_render_pass(cmd, &render_pass_info, vk::SubpassContents::INLINE);
        device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline.pipeline);
        device.cmd_draw(cmd, 3, 1, 0, 0);
        device.cmd_end_render_pass(cmd);
        device.end_command_buffer(cmd)
    }
}
