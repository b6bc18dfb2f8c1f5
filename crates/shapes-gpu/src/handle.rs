//! Scoped ownership of device objects.
//!
//! A [`Scoped`] guard binds something the device created to the device that
//! must release it. The release runs exactly once: when the guard goes out of
//! scope, unless ownership is moved out first with [`Scoped::release`].
//! Stage constructors build under guards so an early `?` never leaks the
//! objects created before it.

use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr;

use ash::vk;

use crate::driver::DeviceDriver;

/// Something that must be released through the device that created it.
pub trait DeviceObject {
    /// Release this object.
    ///
    /// # Safety
    /// `device` must be the device that created the object, the object must
    /// not be in use by the GPU, and this must be called at most once.
    unsafe fn destroy<D: DeviceDriver + ?Sized>(&self, device: &D);
}

macro_rules! device_object {
    ($($handle:ty => $destroy:ident),* $(,)?) => {
        $(
            impl DeviceObject for $handle {
                unsafe fn destroy<D: DeviceDriver + ?Sized>(&self, device: &D) {
                    unsafe { device.$destroy(*self) }
                }
            }
        )*
    };
}

device_object! {
    vk::SwapchainKHR => destroy_swapchain,
    vk::ImageView => destroy_image_view,
    vk::ShaderModule => destroy_shader_module,
    vk::RenderPass => destroy_render_pass,
    vk::PipelineLayout => destroy_pipeline_layout,
    vk::Pipeline => destroy_pipeline,
    vk::Framebuffer => destroy_framebuffer,
    vk::CommandPool => destroy_command_pool,
    vk::Semaphore => destroy_semaphore,
}

impl<T: DeviceObject> DeviceObject for Vec<T> {
    /// Release every element, first to last.
    unsafe fn destroy<D: DeviceDriver + ?Sized>(&self, device: &D) {
        for object in self {
            unsafe { object.destroy(device) };
        }
    }
}

/// Move-only guard releasing `object` through `device` on drop.
pub struct Scoped<'d, D: DeviceDriver + ?Sized, T: DeviceObject> {
    device: &'d D,
    object: T,
}

impl<'d, D: DeviceDriver + ?Sized, T: DeviceObject> Scoped<'d, D, T> {
    /// Take ownership of `object`.
    ///
    /// # Safety
    /// `object` must have been created by `device` and must not be owned by
    /// anything else.
    pub unsafe fn new(device: &'d D, object: T) -> Self {
        Self { device, object }
    }

    /// Transfer ownership out of the guard without releasing.
    #[must_use = "the released object leaks unless it is destroyed later"]
    pub fn release(self) -> T {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so `object` is moved out exactly once.
        unsafe { ptr::read(&this.object) }
    }
}

impl<D: DeviceDriver + ?Sized, T: DeviceObject> Deref for Scoped<'_, D, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.object
    }
}

impl<D: DeviceDriver + ?Sized, T: DeviceObject> Drop for Scoped<'_, D, T> {
    fn drop(&mut self) {
        // SAFETY: `new` guarantees the object belongs to `device`; drop runs once.
        unsafe { self.object.destroy(self.device) };
    }
}
