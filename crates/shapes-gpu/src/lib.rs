//! Vulkan rendering core for Shapes.
//!
//! This crate provides:
//! - GPU capability scoring and device selection
//! - Surface binding and swapchain management
//! - The fixed triangle pipeline, its framebuffers and command buffers
//! - The acquire/submit/present frame loop
//!
//! Every driver call goes through [`InstanceDriver`] / [`DeviceDriver`], so
//! the whole stage chain can run against a recording driver in tests.

pub mod capabilities;
pub mod command;
pub mod context;
pub mod device;
pub mod driver;
pub mod error;
pub mod frame;
pub mod framebuffer;
pub mod handle;
pub mod instance;
pub mod pipeline;
pub mod renderer;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use capabilities::{DeviceClass, PhysicalDeviceCandidate};
pub use command::{record_command_buffers, CommandPool};
pub use context::{AshContext, AshDevice};
pub use device::{select_device, LogicalDevice, QueueFamilies, QueueFamilyAssignment};
pub use driver::{DeviceDriver, DeviceIdentity, InstanceDriver};
pub use error::{ErrorKind, GpuError, Result};
pub use frame::FrameScheduler;
pub use framebuffer::FramebufferSet;
pub use handle::{DeviceObject, Scoped};
pub use pipeline::Pipeline;
pub use renderer::{Renderer, ShaderCode};
pub use surface::SurfaceCapabilities;
pub use swapchain::{SwapchainConfiguration, SwapchainState};
pub use sync::SyncPrimitives;
