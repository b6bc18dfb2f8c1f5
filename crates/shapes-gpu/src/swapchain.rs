//! Swapchain management.

use crate::device::LogicalDevice;
use crate::driver::DeviceDriver;
use crate::error::{GpuError, Result};
use crate::handle::{DeviceObject, Scoped};
use crate::surface::SurfaceCapabilities;
use ash::vk;

/// Current-extent value meaning "the swapchain decides the size".
const ADAPTIVE_EXTENT: u32 = u32::MAX;

/// Format, mode, size and image count chosen for the swapchain.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainConfiguration {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
}

impl SwapchainConfiguration {
    /// Derive the configuration from what the surface supports and the
    /// window's framebuffer size in pixels.
    pub fn choose(surface: &SurfaceCapabilities, framebuffer: vk::Extent2D) -> Result<Self> {
        let surface_format =
            select_surface_format(&surface.formats).ok_or(GpuError::NoSurfaceFormats)?;

        Ok(Self {
            surface_format,
            present_mode: select_present_mode(&surface.present_modes),
            extent: calculate_extent(&surface.capabilities, framebuffer.width, framebuffer.height),
            image_count: select_image_count(&surface.capabilities),
        })
    }
}

/// The swapchain, its images and one view per image.
///
/// Images belong to the swapchain; the views are ours and go first.
pub struct SwapchainState {
    pub swapchain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub config: SwapchainConfiguration,
}

impl SwapchainState {
    /// Create the swapchain and its image views.
    ///
    /// Fails with [`GpuError::UnsupportedMultiQueueSharing`] before touching
    /// the driver when graphics and present use different queue families.
    ///
    /// # Safety
    /// `surface` must be the surface the device was selected against.
    pub unsafe fn new<D: DeviceDriver>(
        device: &LogicalDevice<D>,
        surface: vk::SurfaceKHR,
        surface_capabilities: &SurfaceCapabilities,
        framebuffer: vk::Extent2D,
    ) -> Result<Self> {
        let families = device.queue_families();
        if !families.is_shared() {
            return Err(GpuError::UnsupportedMultiQueueSharing {
                graphics: families.graphics,
                present: families.present,
            });
        }

        let config = SwapchainConfiguration::choose(surface_capabilities, framebuffer)?;
        let driver = device.driver();

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(config.image_count)
            .image_format(config.surface_format.format)
            .image_color_space(config.surface_format.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(surface_capabilities.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let swapchain = unsafe {
            let handle = driver
                .create_swapchain(&create_info)
                .map_err(|e| GpuError::SwapchainCreation(e.to_string()))?;
            Scoped::new(driver, handle)
        };

        // The driver may hand back more images than requested
        let images = unsafe { driver.get_swapchain_images(*swapchain) }
            .map_err(|e| GpuError::SwapchainCreation(format!("Failed to get images: {e}")))?;

        let mut image_views = Vec::with_capacity(images.len());
        for &image in &images {
            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(config.surface_format.format)
                .components(vk::ComponentMapping::default())
                .subresource_range(
                    vk::ImageSubresourceRange::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .base_mip_level(0)
                        .level_count(1)
                        .base_array_layer(0)
                        .layer_count(1),
                );

            let view = unsafe { driver.create_image_view(&view_info) }
                .map_err(GpuError::creating("swapchain image view"))?;
            image_views.push(unsafe { Scoped::new(driver, view) });
        }

        tracing::info!(
            "Swapchain created: {}x{} ({} images, {:?}, {:?})",
            config.extent.width,
            config.extent.height,
            images.len(),
            config.surface_format.format,
            config.present_mode,
        );

        Ok(Self {
            image_views: image_views.into_iter().map(Scoped::release).collect(),
            swapchain: swapchain.release(),
            images,
            config,
        })
    }

    /// Get the image format.
    pub fn format(&self) -> vk::Format {
        self.config.surface_format.format
    }

    /// Get the image extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.config.extent
    }

    /// Number of images the driver actually created.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl DeviceObject for SwapchainState {
    unsafe fn destroy<D: DeviceDriver + ?Sized>(&self, device: &D) {
        unsafe {
            self.image_views.destroy(device);
            device.destroy_swapchain(self.swapchain);
        }
    }
}

/// Select the surface format.
///
/// 8-bit BGRA sRGB with the sRGB non-linear color space if offered,
/// otherwise whatever the surface lists first.
pub fn select_surface_format(available: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    available
        .iter()
        .find(|format| {
            format.format == vk::Format::B8G8R8A8_SRGB
                && format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| available.first())
        .copied()
}

/// Select the present mode. FIFO is always supported and always chosen.
pub fn select_present_mode(_available: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    vk::PresentModeKHR::FIFO
}

/// Calculate swapchain extent.
pub fn calculate_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    desired_width: u32,
    desired_height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != ADAPTIVE_EXTENT {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: desired_width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: desired_height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// One more image than the minimum, capped by a nonzero maximum.
pub fn select_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let mut image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && image_count > capabilities.max_image_count {
        image_count = capabilities.max_image_count;
    }
    image_count
}
