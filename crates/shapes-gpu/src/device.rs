//! Physical device selection and logical device creation.

use crate::capabilities::{required_device_extensions, PhysicalDeviceCandidate};
use crate::driver::{DeviceDriver, InstanceDriver};
use crate::error::{GpuError, Result};
use ash::prelude::VkResult;
use ash::vk;
use std::ffi::c_char;

/// Queue family roles found on a physical device.
///
/// Both roles must resolve before a device can be created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyAssignment {
    /// First family with graphics support.
    pub graphics: Option<u32>,
    /// First family able to present to the bound surface.
    pub present: Option<u32>,
}

impl QueueFamilyAssignment {
    /// Scan `families` for the first graphics family and, independently, the
    /// first family `supports_present` accepts. One family may fill both roles.
    pub fn find<F>(families: &[vk::QueueFamilyProperties], mut supports_present: F) -> VkResult<Self>
    where
        F: FnMut(u32) -> VkResult<bool>,
    {
        let mut assignment = Self::default();

        for (i, family) in (0u32..).zip(families) {
            if assignment.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
            {
                assignment.graphics = Some(i);
            }
            if assignment.present.is_none() && supports_present(i)? {
                assignment.present = Some(i);
            }
        }

        Ok(assignment)
    }

    /// Require both roles.
    pub fn resolve(self) -> Result<QueueFamilies> {
        let graphics = self.graphics.ok_or(GpuError::NoGraphicsQueue)?;
        let present = self.present.ok_or(GpuError::NoPresentQueue)?;
        Ok(QueueFamilies { graphics, present })
    }
}

/// Resolved queue family indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    /// Distinct families, one queue is created per entry.
    pub fn unique(&self) -> Vec<u32> {
        if self.graphics == self.present {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }

    /// Whether graphics and present share one family.
    pub const fn is_shared(&self) -> bool {
        self.graphics == self.present
    }
}

/// The created device and its two queues.
///
/// The graphics and present queues alias when both roles share a family.
/// Dropping this destroys the device, so every child object must be
/// released first.
pub struct LogicalDevice<D: DeviceDriver> {
    device: D,
    physical_device: vk::PhysicalDevice,
    name: String,
    queue_families: QueueFamilies,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
}

impl<D: DeviceDriver> LogicalDevice<D> {
    /// Get the device driver.
    pub fn driver(&self) -> &D {
        &self.device
    }

    /// Get the physical device handle.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Name of the selected GPU.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the resolved queue families.
    pub fn queue_families(&self) -> QueueFamilies {
        self.queue_families
    }

    /// Get the graphics queue.
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Get the present queue.
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }
}

impl<D: DeviceDriver> Drop for LogicalDevice<D> {
    fn drop(&mut self) {
        unsafe { self.device.destroy_device() };
    }
}

/// Gather the ranking properties of every enumerated GPU.
///
/// # Safety
/// The context must be valid.
pub unsafe fn enumerate_candidates<I: InstanceDriver + ?Sized>(
    context: &I,
) -> Result<Vec<PhysicalDeviceCandidate>> {
    let devices = unsafe { context.enumerate_physical_devices()? };

    if devices.is_empty() {
        return Err(GpuError::NoDeviceFound);
    }

    devices
        .into_iter()
        .map(|handle| -> Result<PhysicalDeviceCandidate> {
            unsafe {
                let identity = context.device_identity(handle);
                Ok(PhysicalDeviceCandidate {
                    handle,
                    name: identity.name,
                    class: identity.class,
                    extensions: context.device_extensions(handle)?,
                    surface_formats: context.surface_formats(handle)?,
                    present_modes: context.surface_present_modes(handle)?,
                })
            }
        })
        .collect()
}

/// Pick the highest scoring candidate; among equal scores the first
/// enumerated wins. Disqualified candidates (score 0) are never picked.
pub fn pick_best(candidates: &[PhysicalDeviceCandidate]) -> Option<&PhysicalDeviceCandidate> {
    let mut best = None;
    let mut best_score = 0;

    for candidate in candidates {
        let score = candidate.score();
        if score > best_score {
            best_score = score;
            best = Some(candidate);
        }
    }

    best
}

/// Select the best GPU, resolve its queue families and create the device.
pub fn select_device<I: InstanceDriver + ?Sized>(context: &I) -> Result<LogicalDevice<I::Device>> {
    // SAFETY: the context owns a live instance for as long as it exists.
    let candidates = unsafe { enumerate_candidates(context)? };

    for (i, candidate) in candidates.iter().enumerate() {
        tracing::debug!("GPU {i}: {} -> score {}", candidate.summary(), candidate.score());
    }

    let chosen = pick_best(&candidates).ok_or(GpuError::NoSuitableDevice)?;
    tracing::info!("Selected GPU: {} ({})", chosen.name, chosen.class);

    let families = unsafe { context.queue_families(chosen.handle) };
    let queue_families = QueueFamilyAssignment::find(&families, |i| unsafe {
        context.surface_support(chosen.handle, i)
    })?
    .resolve()?;

    tracing::debug!(
        "Queue families: graphics={} present={}",
        queue_families.graphics,
        queue_families.present
    );

    let (device, graphics_queue, present_queue) =
        unsafe { create_device(context, chosen.handle, queue_families)? };

    Ok(LogicalDevice {
        device,
        physical_device: chosen.handle,
        name: chosen.name.clone(),
        queue_families,
        graphics_queue,
        present_queue,
    })
}

/// Create the logical device and retrieve queues.
///
/// # Safety
/// The context and physical device must be valid.
unsafe fn create_device<I: InstanceDriver + ?Sized>(
    context: &I,
    physical_device: vk::PhysicalDevice,
    queue_families: QueueFamilies,
) -> Result<(I::Device, vk::Queue, vk::Queue)> {
    let queue_priority = 1.0_f32;
    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = queue_families
        .unique()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(std::slice::from_ref(&queue_priority))
        })
        .collect();

    let extension_names: Vec<*const c_char> = required_device_extensions()
        .iter()
        .map(|ext| ext.as_ptr())
        .collect();

    let features = vk::PhysicalDeviceFeatures::default();

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .enabled_features(&features);

    let device = unsafe { context.create_device(physical_device, &device_create_info) }
        .map_err(GpuError::creating("logical device"))?;

    let graphics_queue = unsafe { device.get_device_queue(queue_families.graphics, 0) };
    let present_queue = unsafe { device.get_device_queue(queue_families.present, 0) };

    Ok((device, graphics_queue, present_queue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::DeviceClass;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn candidate(name: &str, class: DeviceClass) -> PhysicalDeviceCandidate {
        PhysicalDeviceCandidate {
            handle: vk::PhysicalDevice::null(),
            name: name.to_string(),
            class,
            extensions: vec!["VK_KHR_swapchain".to_string()],
            surface_formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        }
    }

    #[test]
    fn one_family_can_fill_both_roles() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)];
        let assignment = QueueFamilyAssignment::find(&families, |_| Ok(true)).unwrap();
        let resolved = assignment.resolve().unwrap();
        assert_eq!(resolved, QueueFamilies { graphics: 0, present: 0 });
        assert!(resolved.is_shared());
        assert_eq!(resolved.unique(), vec![0]);
    }

    #[test]
    fn roles_are_found_independently() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let assignment = QueueFamilyAssignment::find(&families, |i| Ok(i == 0 || i == 2)).unwrap();
        assert_eq!(assignment.graphics, Some(1));
        assert_eq!(assignment.present, Some(0));
        assert_eq!(assignment.resolve().unwrap().unique(), vec![1, 0]);
    }

    #[test]
    fn missing_roles_are_reported() {
        let compute_only = [family(vk::QueueFlags::COMPUTE)];
        let assignment = QueueFamilyAssignment::find(&compute_only, |_| Ok(true)).unwrap();
        assert!(matches!(assignment.resolve(), Err(GpuError::NoGraphicsQueue)));

        let graphics = [family(vk::QueueFlags::GRAPHICS)];
        let assignment = QueueFamilyAssignment::find(&graphics, |_| Ok(false)).unwrap();
        assert!(matches!(assignment.resolve(), Err(GpuError::NoPresentQueue)));
    }

    #[test]
    fn first_enumerated_wins_ties() {
        let candidates = [
            candidate("first", DeviceClass::Integrated),
            candidate("second", DeviceClass::Integrated),
        ];
        assert_eq!(pick_best(&candidates).unwrap().name, "first");
    }

    #[test]
    fn discrete_beats_earlier_integrated() {
        let candidates = [
            candidate("igpu", DeviceClass::Integrated),
            candidate("cpu", DeviceClass::Cpu),
            candidate("dgpu", DeviceClass::Discrete),
        ];
        assert_eq!(pick_best(&candidates).unwrap().name, "dgpu");
    }

    #[test]
    fn disqualified_devices_are_never_picked() {
        let mut broken = candidate("broken", DeviceClass::Discrete);
        broken.extensions.clear();
        assert!(pick_best(&[broken]).is_none());
    }
}
