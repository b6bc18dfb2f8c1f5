//! GPU error types.

use ash::vk;
use thiserror::Error;

/// Broad classification of a [`GpuError`].
///
/// The top-level driver uses this to pick a process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A driver call returned non-success while creating a resource.
    ResourceCreation,
    /// The hardware or surface cannot satisfy a requirement.
    CapabilityMismatch,
    /// A submission, acquire or present failed inside the frame loop.
    RuntimeSubmit,
}

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// The Vulkan loader could not be found or initialized.
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// A driver object could not be created.
    #[error("Failed to create {what}: {result}")]
    ResourceCreation {
        what: &'static str,
        result: vk::Result,
    },

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// The driver enumerated no physical devices at all.
    #[error("No Vulkan device found")]
    NoDeviceFound,

    /// No suitable GPU found.
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// The selected GPU has no graphics-capable queue family.
    #[error("No graphics queue family on the selected GPU")]
    NoGraphicsQueue,

    /// The selected GPU cannot present to the bound surface.
    #[error("No queue family can present to the surface")]
    NoPresentQueue,

    /// The surface reports no supported formats.
    #[error("Surface reports no supported formats")]
    NoSurfaceFormats,

    /// Graphics and present live in different queue families.
    #[error(
        "Graphics queue family {graphics} differs from present queue family {present}; \
         concurrent swapchain sharing is not supported"
    )]
    UnsupportedMultiQueueSharing { graphics: u32, present: u32 },

    /// Swapchain creation failed.
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreation(String),

    /// Shader module creation failed.
    #[error("Shader module creation failed: {0}")]
    ShaderModuleCreation(String),

    /// Pipeline creation failed.
    #[error("Pipeline creation failed: {0}")]
    PipelineCreation(String),

    /// Command buffer allocation or recording failed.
    #[error("Command recording failed: {0}")]
    CommandRecording(String),

    /// Queue submission failed.
    #[error("Queue submission failed: {0}")]
    Submit(vk::Result),

    /// Acquiring the next swapchain image failed.
    #[error("Swapchain image acquisition failed: {0}")]
    Acquire(vk::Result),

    /// Presenting a swapchain image failed.
    #[error("Presentation failed: {0}")]
    Present(vk::Result),

    /// The driver handed back an image with no recorded command buffer.
    #[error("Acquired swapchain image {index}, but only {count} command buffers are recorded")]
    ImageIndexOutOfRange { index: u32, count: usize },
}

impl GpuError {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoDeviceFound
            | Self::NoSuitableDevice
            | Self::NoGraphicsQueue
            | Self::NoPresentQueue
            | Self::NoSurfaceFormats
            | Self::UnsupportedMultiQueueSharing { .. } => ErrorKind::CapabilityMismatch,
            Self::Submit(_)
            | Self::Acquire(_)
            | Self::Present(_)
            | Self::ImageIndexOutOfRange { .. } => ErrorKind::RuntimeSubmit,
            Self::Vulkan(_)
            | Self::Loading(_)
            | Self::ResourceCreation { .. }
            | Self::SurfaceCreation(_)
            | Self::SwapchainCreation(_)
            | Self::ShaderModuleCreation(_)
            | Self::PipelineCreation(_)
            | Self::CommandRecording(_) => ErrorKind::ResourceCreation,
        }
    }

    pub(crate) fn creating(what: &'static str) -> impl Fn(vk::Result) -> Self {
        move |result| Self::ResourceCreation { what, result }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_errors_are_classified() {
        assert_eq!(GpuError::NoDeviceFound.kind(), ErrorKind::CapabilityMismatch);
        assert_eq!(
            GpuError::UnsupportedMultiQueueSharing {
                graphics: 0,
                present: 1
            }
            .kind(),
            ErrorKind::CapabilityMismatch
        );
    }

    #[test]
    fn runtime_errors_are_classified() {
        assert_eq!(
            GpuError::Submit(vk::Result::ERROR_DEVICE_LOST).kind(),
            ErrorKind::RuntimeSubmit
        );
        assert_eq!(
            GpuError::Acquire(vk::Result::ERROR_OUT_OF_DATE_KHR).kind(),
            ErrorKind::RuntimeSubmit
        );
        assert_eq!(
            GpuError::ImageIndexOutOfRange { index: 3, count: 2 }.kind(),
            ErrorKind::RuntimeSubmit
        );
    }

    #[test]
    fn resource_error_names_the_stage() {
        let err = GpuError::creating("framebuffer")(vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        assert_eq!(err.kind(), ErrorKind::ResourceCreation);
        assert!(err.to_string().contains("framebuffer"));
    }
}
