//! GPU capability detection and scoring.

use std::ffi::CStr;
use std::fmt;

use ash::vk;

/// Base score of any device that passes every requirement.
pub const BASE_SCORE: u32 = 1;

/// Bonus for discrete GPUs; larger than any other contribution so a
/// discrete device always outranks a non-discrete one.
pub const DISCRETE_BONUS: u32 = 1000;

/// Device extensions the renderer cannot run without.
pub fn required_device_extensions() -> [&'static CStr; 1] {
    [ash::khr::swapchain::NAME]
}

/// Physical device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Any type the driver does not classify.
    Other,
    /// GPU sharing memory with the host, typically on the CPU die.
    Integrated,
    /// Dedicated GPU with its own memory. Preferred.
    Discrete,
    /// GPU exposed through a virtualization layer.
    Virtual,
    /// Software rasterizer running on the host CPU.
    Cpu,
}

impl DeviceClass {
    /// Classify a Vulkan device type.
    pub fn from_vk(device_type: vk::PhysicalDeviceType) -> Self {
        match device_type {
            vk::PhysicalDeviceType::INTEGRATED_GPU => Self::Integrated,
            vk::PhysicalDeviceType::DISCRETE_GPU => Self::Discrete,
            vk::PhysicalDeviceType::VIRTUAL_GPU => Self::Virtual,
            vk::PhysicalDeviceType::CPU => Self::Cpu,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Other => "other",
            Self::Integrated => "integrated",
            Self::Discrete => "discrete",
            Self::Virtual => "virtual",
            Self::Cpu => "CPU",
        })
    }
}

/// An enumerated GPU and the static properties the selector ranks it by.
#[derive(Debug, Clone)]
pub struct PhysicalDeviceCandidate {
    /// Physical device handle.
    pub handle: vk::PhysicalDevice,
    /// Device name
    pub name: String,
    /// Device class
    pub class: DeviceClass,
    /// Supported device extensions
    pub extensions: Vec<String>,
    /// Formats the bound surface supports on this device
    pub surface_formats: Vec<vk::SurfaceFormatKHR>,
    /// Present modes the bound surface supports on this device
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl PhysicalDeviceCandidate {
    /// Check whether every required device extension is available.
    pub fn supports_required_extensions(&self) -> bool {
        required_device_extensions()
            .iter()
            .all(|required| {
                self.extensions
                    .iter()
                    .any(|ext| ext.as_bytes() == required.to_bytes())
            })
    }

    /// Score this device. Zero means disqualified.
    ///
    /// Requirements are checked in order: required extensions, a non-empty
    /// surface format list, a non-empty present mode list.
    pub fn score(&self) -> u32 {
        if !self.supports_required_extensions() {
            return 0;
        }
        if self.surface_formats.is_empty() {
            return 0;
        }
        if self.present_modes.is_empty() {
            return 0;
        }

        let mut score = BASE_SCORE;
        if self.class == DeviceClass::Discrete {
            score += DISCRETE_BONUS;
        }
        score
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) - {} extensions, {} surface formats, {} present modes",
            self.name,
            self.class,
            self.extensions.len(),
            self.surface_formats.len(),
            self.present_modes.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(class: DeviceClass) -> PhysicalDeviceCandidate {
        PhysicalDeviceCandidate {
            handle: vk::PhysicalDevice::null(),
            name: "test".to_string(),
            class,
            extensions: vec!["VK_KHR_swapchain".to_string()],
            surface_formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        }
    }

    #[test]
    fn device_class_names() {
        assert_eq!(DeviceClass::from_vk(vk::PhysicalDeviceType::OTHER).to_string(), "other");
        assert_eq!(
            DeviceClass::from_vk(vk::PhysicalDeviceType::DISCRETE_GPU).to_string(),
            "discrete"
        );
        assert_eq!(DeviceClass::from_vk(vk::PhysicalDeviceType::CPU).to_string(), "CPU");
    }

    #[test]
    fn discrete_bonus_dominates() {
        assert_eq!(candidate(DeviceClass::Integrated).score(), BASE_SCORE);
        assert_eq!(
            candidate(DeviceClass::Discrete).score(),
            BASE_SCORE + DISCRETE_BONUS
        );
        for class in [
            DeviceClass::Other,
            DeviceClass::Integrated,
            DeviceClass::Virtual,
            DeviceClass::Cpu,
        ] {
            assert!(candidate(DeviceClass::Discrete).score() > candidate(class).score());
        }
    }

    #[test]
    fn missing_swapchain_extension_disqualifies() {
        let mut device = candidate(DeviceClass::Discrete);
        device.extensions = vec!["VK_KHR_maintenance1".to_string()];
        assert_eq!(device.score(), 0);
    }

    #[test]
    fn empty_surface_lists_disqualify() {
        let mut no_formats = candidate(DeviceClass::Discrete);
        no_formats.surface_formats.clear();
        assert_eq!(no_formats.score(), 0);

        let mut no_modes = candidate(DeviceClass::Discrete);
        no_modes.present_modes.clear();
        assert_eq!(no_modes.score(), 0);
    }
}
