//! Driver abstraction.
//!
//! Every GPU call the renderer makes goes through [`InstanceDriver`] or
//! [`DeviceDriver`]. [`crate::AshContext`] and [`crate::AshDevice`] forward to
//! Vulkan through `ash`; test harnesses substitute a recording driver.
//!
//! All methods share ash's contract: every handle passed in must have been
//! created by this driver and still be alive, and create-info structs must be
//! fully valid for the duration of the call.

use ash::prelude::VkResult;
use ash::vk;

use crate::capabilities::DeviceClass;

/// Static identity of a physical device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Human-readable device name.
    pub name: String,
    /// Device class (discrete, integrated, ...).
    pub class: DeviceClass,
}

/// Instance-level driver: a loaded instance with one bound surface.
pub trait InstanceDriver {
    /// Device-level driver produced by [`InstanceDriver::create_device`].
    type Device: DeviceDriver;

    /// The surface this context presents to.
    fn surface(&self) -> vk::SurfaceKHR;

    /// # Safety
    /// The instance must be valid.
    unsafe fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>>;

    /// # Safety
    /// `physical_device` must come from [`InstanceDriver::enumerate_physical_devices`].
    unsafe fn device_identity(&self, physical_device: vk::PhysicalDevice) -> DeviceIdentity;

    /// Names of the device extensions the physical device supports.
    ///
    /// # Safety
    /// `physical_device` must be valid.
    unsafe fn device_extensions(&self, physical_device: vk::PhysicalDevice)
        -> VkResult<Vec<String>>;

    /// # Safety
    /// `physical_device` must be valid.
    unsafe fn queue_families(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties>;

    /// Whether `queue_family` can present to [`InstanceDriver::surface`].
    ///
    /// # Safety
    /// `physical_device` must be valid.
    unsafe fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family: u32,
    ) -> VkResult<bool>;

    /// # Safety
    /// `physical_device` must be valid.
    unsafe fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;

    /// # Safety
    /// `physical_device` must be valid.
    unsafe fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;

    /// # Safety
    /// `physical_device` must be valid.
    unsafe fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;

    /// Create a logical device.
    ///
    /// # Safety
    /// `physical_device` must be valid and `create_info` must be fully valid.
    unsafe fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo<'_>,
    ) -> VkResult<Self::Device>;
}

/// Device-level driver.
///
/// Object lifetimes are the caller's responsibility; [`crate::handle::Scoped`]
/// pairs each created handle with its destroy call.
#[allow(clippy::missing_safety_doc)]
pub trait DeviceDriver {
    unsafe fn get_device_queue(&self, queue_family: u32, queue_index: u32) -> vk::Queue;

    unsafe fn create_swapchain(
        &self,
        create_info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR>;
    unsafe fn get_swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;
    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);

    unsafe fn create_image_view(
        &self,
        create_info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView>;
    unsafe fn destroy_image_view(&self, view: vk::ImageView);

    unsafe fn create_shader_module(
        &self,
        create_info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule>;
    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule);

    unsafe fn create_render_pass(
        &self,
        create_info: &vk::RenderPassCreateInfo<'_>,
    ) -> VkResult<vk::RenderPass>;
    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass);

    unsafe fn create_pipeline_layout(
        &self,
        create_info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout>;
    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

    unsafe fn create_graphics_pipeline(
        &self,
        create_info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline>;
    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline);

    unsafe fn create_framebuffer(
        &self,
        create_info: &vk::FramebufferCreateInfo<'_>,
    ) -> VkResult<vk::Framebuffer>;
    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    unsafe fn create_command_pool(
        &self,
        create_info: &vk::CommandPoolCreateInfo<'_>,
    ) -> VkResult<vk::CommandPool>;
    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool);
    unsafe fn allocate_command_buffers(
        &self,
        allocate_info: &vk::CommandBufferAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::CommandBuffer>>;

    unsafe fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        begin_info: &vk::CommandBufferBeginInfo<'_>,
    ) -> VkResult<()>;
    unsafe fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()>;
    unsafe fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        begin_info: &vk::RenderPassBeginInfo<'_>,
        contents: vk::SubpassContents,
    );
    unsafe fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer);
    unsafe fn cmd_bind_pipeline(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    );
    unsafe fn cmd_draw(
        &self,
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );

    unsafe fn create_semaphore(
        &self,
        create_info: &vk::SemaphoreCreateInfo<'_>,
    ) -> VkResult<vk::Semaphore>;
    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    unsafe fn queue_wait_idle(&self, queue: vk::Queue) -> VkResult<()>;
    unsafe fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout_ns: u64,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
    ) -> VkResult<(u32, bool)>;
    unsafe fn queue_submit(
        &self,
        queue: vk::Queue,
        submits: &[vk::SubmitInfo<'_>],
        fence: vk::Fence,
    ) -> VkResult<()>;
    unsafe fn queue_present(
        &self,
        queue: vk::Queue,
        present_info: &vk::PresentInfoKHR<'_>,
    ) -> VkResult<bool>;

    /// Destroy the logical device itself. Every child object must already be gone.
    unsafe fn destroy_device(&self);
}
