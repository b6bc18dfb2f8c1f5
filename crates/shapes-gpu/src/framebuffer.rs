//! Presentation targets, one per swapchain image.

use crate::driver::DeviceDriver;
use crate::error::{GpuError, Result};
use crate::handle::{DeviceObject, Scoped};
use ash::vk;

/// One framebuffer per swapchain image view, indexed like the images.
pub struct FramebufferSet {
    framebuffers: Vec<vk::Framebuffer>,
}

impl FramebufferSet {
    /// Bind every image view to `render_pass`.
    ///
    /// # Safety
    /// The device, render pass and views must be valid.
    pub unsafe fn new<D: DeviceDriver + ?Sized>(
        device: &D,
        render_pass: vk::RenderPass,
        image_views: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let mut framebuffers = Vec::with_capacity(image_views.len());

        for view in image_views {
            let attachments = [*view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass)
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            let framebuffer = unsafe { device.create_framebuffer(&create_info) }
                .map_err(GpuError::creating("framebuffer"))?;
            framebuffers.push(unsafe { Scoped::new(device, framebuffer) });
        }

        tracing::debug!("Created {} framebuffers", framebuffers.len());

        Ok(Self {
            framebuffers: framebuffers.into_iter().map(Scoped::release).collect(),
        })
    }

    /// Framebuffers in swapchain image order.
    pub fn as_slice(&self) -> &[vk::Framebuffer] {
        &self.framebuffers
    }

    /// Number of framebuffers.
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }
}

impl DeviceObject for FramebufferSet {
    unsafe fn destroy<D: DeviceDriver + ?Sized>(&self, device: &D) {
        unsafe { self.framebuffers.destroy(device) };
    }
}
