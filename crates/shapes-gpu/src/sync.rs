//! Synchronization primitives.

use crate::driver::DeviceDriver;
use crate::error::{GpuError, Result};
use crate::handle::{DeviceObject, Scoped};
use ash::vk;

/// Create a semaphore.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_semaphore<D: DeviceDriver + ?Sized>(device: &D) -> Result<vk::Semaphore> {
    let create_info = vk::SemaphoreCreateInfo::default();
    unsafe { device.create_semaphore(&create_info) }.map_err(GpuError::creating("semaphore"))
}

/// The semaphore pair shared by every frame.
///
/// One pair is enough because the frame loop waits for the present queue to
/// go idle before reusing it.
pub struct SyncPrimitives {
    /// Signaled when the acquired image is ready to be rendered into.
    pub image_available: vk::Semaphore,
    /// Signaled when rendering is complete and the image may be presented.
    pub render_finished: vk::Semaphore,
}

impl SyncPrimitives {
    /// Create both semaphores.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn new<D: DeviceDriver + ?Sized>(device: &D) -> Result<Self> {
        let image_available = unsafe { Scoped::new(device, create_semaphore(device)?) };
        let render_finished = unsafe { create_semaphore(device)? };

        Ok(Self {
            image_available: image_available.release(),
            render_finished,
        })
    }
}

impl DeviceObject for SyncPrimitives {
    unsafe fn destroy<D: DeviceDriver + ?Sized>(&self, device: &D) {
        unsafe {
            device.destroy_semaphore(self.render_finished);
            device.destroy_semaphore(self.image_available);
        }
    }
}
