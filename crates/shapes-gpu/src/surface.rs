//! Surface binding for windowed rendering.
//!
//! Turns the windowing layer's raw handles into a Vulkan surface bound to the
//! instance, and queries what that surface supports on a given device.

use crate::driver::InstanceDriver;
use crate::error::{GpuError, Result};
use ash::prelude::VkResult;
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle};

/// Raw display handle of a window, needed before the instance exists.
pub fn display_handle<W: HasDisplayHandle>(window: &W) -> Result<RawDisplayHandle> {
    window
        .display_handle()
        .map(|display| display.as_raw())
        .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))
}

/// Bind a window to the instance as a presentation surface.
///
/// # Safety
/// The entry and instance must be valid and the window must outlive the
/// returned surface.
pub unsafe fn bind_surface<W>(
    entry: &ash::Entry,
    instance: &ash::Instance,
    window: &W,
) -> Result<(ash::khr::surface::Instance, vk::SurfaceKHR)>
where
    W: HasDisplayHandle + HasWindowHandle,
{
    let display = window
        .display_handle()
        .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?;
    let window_handle = window
        .window_handle()
        .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get window handle: {e}")))?;

    let surface = unsafe {
        ash_window::create_surface(
            entry,
            instance,
            display.as_raw(),
            window_handle.as_raw(),
            None,
        )
    }
    .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?;

    let surface_loader = ash::khr::surface::Instance::new(entry, instance);

    Ok((surface_loader, surface))
}

/// Surface capabilities query result.
#[derive(Debug, Clone)]
pub struct SurfaceCapabilities {
    /// Raw surface capabilities.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceCapabilities {
    /// Query what the bound surface supports on `physical_device`.
    ///
    /// # Safety
    /// `physical_device` must belong to `context`.
    pub unsafe fn query<I: InstanceDriver + ?Sized>(
        context: &I,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Self> {
        unsafe {
            Ok(Self {
                capabilities: context.surface_capabilities(physical_device)?,
                formats: context.surface_formats(physical_device)?,
                present_modes: context.surface_present_modes(physical_device)?,
            })
        }
    }
}
