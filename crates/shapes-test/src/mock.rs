//! Recording GPU driver.
//!
//! [`MockInstance`] and [`MockDevice`] implement the driver traits without a
//! GPU. Every device call is appended to a shared log, every created handle is
//! tracked until it is destroyed, and any operation can be made to fail.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use parking_lot::Mutex;
use shapes_gpu::{DeviceClass, DeviceDriver, DeviceIdentity, InstanceDriver};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Operation name, e.g. `create_framebuffer`.
    pub op: &'static str,
    /// Arguments worth asserting on; empty for most calls.
    pub detail: String,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            f.write_str(self.op)
        } else {
            write!(f, "{} {}", self.op, self.detail)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    op: &'static str,
    skip: usize,
    result: vk::Result,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    next_handle: u64,
    live: BTreeMap<u64, &'static str>,
    bad_destroys: Vec<String>,
    failures: Vec<Failure>,
    swapchain_images: u32,
    acquire_range: u32,
    next_image: u32,
}

impl State {
    fn record(&mut self, op: &'static str, detail: String) -> VkResult<()> {
        self.calls.push(Call { op, detail });
        for failure in &mut self.failures {
            if failure.op != op {
                continue;
            }
            if failure.skip == 0 {
                return Err(failure.result);
            }
            failure.skip -= 1;
        }
        Ok(())
    }

    fn track(&mut self, kind: &'static str) -> u64 {
        self.next_handle += 1;
        self.live.insert(self.next_handle, kind);
        self.next_handle
    }

    fn create<H: Handle>(&mut self, op: &'static str, kind: &'static str) -> VkResult<H> {
        self.record(op, String::new())?;
        Ok(H::from_raw(self.track(kind)))
    }

    fn destroy<H: Handle>(&mut self, op: &'static str, kind: &'static str, handle: H) {
        self.calls.push(Call {
            op,
            detail: String::new(),
        });
        let raw = handle.as_raw();
        match self.live.remove(&raw) {
            Some(found) if found == kind => {}
            Some(found) => {
                self.live.insert(raw, found);
                self.bad_destroys
                    .push(format!("{op} on {found} #{raw}"));
            }
            None => self.bad_destroys.push(format!("{op} on dead #{raw}")),
        }
    }
}

/// Read access to the shared call log, usable after the driver is gone.
#[derive(Clone)]
pub struct Recorder(Arc<Mutex<State>>);

impl Recorder {
    /// Every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().calls.clone()
    }

    /// Operation names of every call so far.
    pub fn ops(&self) -> Vec<&'static str> {
        self.0.lock().calls.iter().map(|call| call.op).collect()
    }

    /// Position in the log, for [`Recorder::ops_since`].
    pub fn mark(&self) -> usize {
        self.0.lock().calls.len()
    }

    /// Operation names recorded after `mark`.
    pub fn ops_since(&self, mark: usize) -> Vec<&'static str> {
        self.0.lock().calls[mark..].iter().map(|call| call.op).collect()
    }

    /// Calls recorded after `mark`.
    pub fn calls_since(&self, mark: usize) -> Vec<Call> {
        self.0.lock().calls[mark..].to_vec()
    }

    /// How many times `op` was called.
    pub fn count(&self, op: &str) -> usize {
        self.0.lock().calls.iter().filter(|call| call.op == op).count()
    }

    /// Kinds of every handle created and not yet destroyed.
    pub fn live(&self) -> Vec<&'static str> {
        self.0.lock().live.values().copied().collect()
    }

    /// Destroy calls on handles that were already gone or of the wrong kind.
    pub fn bad_destroys(&self) -> Vec<String> {
        self.0.lock().bad_destroys.clone()
    }
}

/// A fake physical device.
#[derive(Debug, Clone)]
pub struct MockPhysicalDevice {
    pub name: String,
    pub class: DeviceClass,
    pub extensions: Vec<String>,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    /// Families able to present to the surface.
    pub present_families: Vec<u32>,
    pub surface_formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl MockPhysicalDevice {
    /// A fully capable device: one graphics+present family, swapchain
    /// support, BGRA8 sRGB and FIFO.
    pub fn new(name: &str, class: DeviceClass) -> Self {
        Self {
            name: name.to_string(),
            class,
            extensions: vec!["VK_KHR_swapchain".to_string()],
            queue_families: vec![vk::QueueFamilyProperties {
                queue_flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
                queue_count: 1,
                ..Default::default()
            }],
            present_families: vec![0],
            surface_formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        }
    }

    pub fn discrete(name: &str) -> Self {
        Self::new(name, DeviceClass::Discrete)
    }

    pub fn integrated(name: &str) -> Self {
        Self::new(name, DeviceClass::Integrated)
    }

    /// Drop swapchain support.
    #[must_use]
    pub fn without_swapchain(mut self) -> Self {
        self.extensions.clear();
        self
    }

    /// Replace the queue families and which of them can present.
    #[must_use]
    pub fn with_queue_families(
        mut self,
        families: Vec<vk::QueueFamilyProperties>,
        present_families: Vec<u32>,
    ) -> Self {
        self.queue_families = families;
        self.present_families = present_families;
        self
    }

    /// Replace the surface format list.
    #[must_use]
    pub fn with_surface_formats(mut self, formats: Vec<vk::SurfaceFormatKHR>) -> Self {
        self.surface_formats = formats;
        self
    }

    /// Replace the present mode list.
    #[must_use]
    pub fn with_present_modes(mut self, modes: Vec<vk::PresentModeKHR>) -> Self {
        self.present_modes = modes;
        self
    }
}

/// Builder for a [`MockInstance`].
pub struct MockGpu {
    devices: Vec<MockPhysicalDevice>,
    capabilities: vk::SurfaceCapabilitiesKHR,
    swapchain_images: u32,
    acquire_range: Option<u32>,
    failures: Vec<Failure>,
}

impl Default for MockGpu {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 0,
                current_extent: vk::Extent2D {
                    width: 800,
                    height: 600,
                },
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                max_image_array_layers: 1,
                supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
                supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            },
            swapchain_images: 2,
            acquire_range: None,
            failures: Vec::new(),
        }
    }
}

impl MockGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// One capable discrete GPU.
    pub fn single_discrete() -> Self {
        Self::new().with_device(MockPhysicalDevice::discrete("Mock Discrete GPU"))
    }

    /// Append a physical device; enumeration order is insertion order.
    #[must_use]
    pub fn with_device(mut self, device: MockPhysicalDevice) -> Self {
        self.devices.push(device);
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: vk::SurfaceCapabilitiesKHR) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Number of images the swapchain hands back, whatever was requested.
    #[must_use]
    pub fn with_swapchain_images(mut self, count: u32) -> Self {
        self.swapchain_images = count;
        self
    }

    /// Cycle acquired image indices through `0..count` instead of the
    /// swapchain's own image count.
    #[must_use]
    pub fn with_acquire_range(mut self, count: u32) -> Self {
        self.acquire_range = Some(count);
        self
    }

    /// Make every call to `op` fail with `result`.
    #[must_use]
    pub fn fail(self, op: &'static str, result: vk::Result) -> Self {
        self.fail_after(op, 0, result)
    }

    /// Let `skip` calls to `op` succeed, then fail every later one.
    #[must_use]
    pub fn fail_after(mut self, op: &'static str, skip: usize, result: vk::Result) -> Self {
        self.failures.push(Failure { op, skip, result });
        self
    }

    /// Create the instance and its surface.
    pub fn build(self) -> (MockInstance, Recorder) {
        let mut state = State {
            swapchain_images: self.swapchain_images,
            acquire_range: self.acquire_range.unwrap_or(self.swapchain_images),
            failures: self.failures,
            ..State::default()
        };
        state.calls.push(Call {
            op: "create_instance",
            detail: String::new(),
        });
        state.calls.push(Call {
            op: "create_surface",
            detail: String::new(),
        });
        let surface = vk::SurfaceKHR::from_raw(state.track("surface"));

        let state = Arc::new(Mutex::new(state));
        let instance = MockInstance {
            devices: self.devices,
            capabilities: self.capabilities,
            surface,
            state: Arc::clone(&state),
        };
        (instance, Recorder(state))
    }
}

/// Instance-level mock driver.
pub struct MockInstance {
    devices: Vec<MockPhysicalDevice>,
    capabilities: vk::SurfaceCapabilitiesKHR,
    surface: vk::SurfaceKHR,
    state: Arc<Mutex<State>>,
}

impl MockInstance {
    fn device(&self, physical_device: vk::PhysicalDevice) -> &MockPhysicalDevice {
        &self.devices[(physical_device.as_raw() - 1) as usize]
    }
}

impl InstanceDriver for MockInstance {
    type Device = MockDevice;

    fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    unsafe fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        self.state
            .lock()
            .record("enumerate_physical_devices", String::new())?;
        Ok((1..=self.devices.len() as u64)
            .map(vk::PhysicalDevice::from_raw)
            .collect())
    }

    unsafe fn device_identity(&self, physical_device: vk::PhysicalDevice) -> DeviceIdentity {
        let device = self.device(physical_device);
        DeviceIdentity {
            name: device.name.clone(),
            class: device.class,
        }
    }

    unsafe fn device_extensions(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<String>> {
        Ok(self.device(physical_device).extensions.clone())
    }

    unsafe fn queue_families(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.device(physical_device).queue_families.clone()
    }

    unsafe fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family: u32,
    ) -> VkResult<bool> {
        Ok(self
            .device(physical_device)
            .present_families
            .contains(&queue_family))
    }

    unsafe fn surface_capabilities(
        &self,
        _physical_device: vk::PhysicalDevice,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        Ok(self.capabilities)
    }

    unsafe fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        Ok(self.device(physical_device).surface_formats.clone())
    }

    unsafe fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        Ok(self.device(physical_device).present_modes.clone())
    }

    unsafe fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo<'_>,
    ) -> VkResult<MockDevice> {
        let mut state = self.state.lock();
        state.record(
            "create_device",
            format!(
                "{} ({} queue families)",
                self.device(physical_device).name,
                create_info.queue_create_info_count
            ),
        )?;
        let raw = state.track("device");
        Ok(MockDevice {
            raw,
            state: Arc::clone(&self.state),
        })
    }
}

impl Drop for MockInstance {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.destroy("destroy_surface", "surface", self.surface);
        state.calls.push(Call {
            op: "destroy_instance",
            detail: String::new(),
        });
    }
}

/// Device-level mock driver.
pub struct MockDevice {
    raw: u64,
    state: Arc<Mutex<State>>,
}

impl DeviceDriver for MockDevice {
    unsafe fn get_device_queue(&self, queue_family: u32, _queue_index: u32) -> vk::Queue {
        vk::Queue::from_raw(0x1000 + u64::from(queue_family))
    }

    unsafe fn create_swapchain(
        &self,
        create_info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR> {
        let mut state = self.state.lock();
        state.record(
            "create_swapchain",
            format!(
                "{}x{} min {} images",
                create_info.image_extent.width,
                create_info.image_extent.height,
                create_info.min_image_count
            ),
        )?;
        state.next_image = 0;
        Ok(vk::SwapchainKHR::from_raw(state.track("swapchain")))
    }

    unsafe fn get_swapchain_images(&self, _swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        let mut state = self.state.lock();
        state.record("get_swapchain_images", String::new())?;
        // Images belong to the swapchain and are never destroyed individually
        Ok((0..u64::from(state.swapchain_images))
            .map(|i| vk::Image::from_raw(0x2000 + i))
            .collect())
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        self.state
            .lock()
            .destroy("destroy_swapchain", "swapchain", swapchain);
    }

    unsafe fn create_image_view(
        &self,
        _create_info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView> {
        self.state.lock().create("create_image_view", "image view")
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        self.state
            .lock()
            .destroy("destroy_image_view", "image view", view);
    }

    unsafe fn create_shader_module(
        &self,
        _create_info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule> {
        self.state
            .lock()
            .create("create_shader_module", "shader module")
    }

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule) {
        self.state
            .lock()
            .destroy("destroy_shader_module", "shader module", module);
    }

    unsafe fn create_render_pass(
        &self,
        _create_info: &vk::RenderPassCreateInfo<'_>,
    ) -> VkResult<vk::RenderPass> {
        self.state.lock().create("create_render_pass", "render pass")
    }

    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.state
            .lock()
            .destroy("destroy_render_pass", "render pass", render_pass);
    }

    unsafe fn create_pipeline_layout(
        &self,
        _create_info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout> {
        self.state
            .lock()
            .create("create_pipeline_layout", "pipeline layout")
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.state
            .lock()
            .destroy("destroy_pipeline_layout", "pipeline layout", layout);
    }

    unsafe fn create_graphics_pipeline(
        &self,
        _create_info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline> {
        self.state
            .lock()
            .create("create_graphics_pipeline", "pipeline")
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.state
            .lock()
            .destroy("destroy_pipeline", "pipeline", pipeline);
    }

    unsafe fn create_framebuffer(
        &self,
        _create_info: &vk::FramebufferCreateInfo<'_>,
    ) -> VkResult<vk::Framebuffer> {
        self.state.lock().create("create_framebuffer", "framebuffer")
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.state
            .lock()
            .destroy("destroy_framebuffer", "framebuffer", framebuffer);
    }

    unsafe fn create_command_pool(
        &self,
        _create_info: &vk::CommandPoolCreateInfo<'_>,
    ) -> VkResult<vk::CommandPool> {
        self.state.lock().create("create_command_pool", "command pool")
    }

    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.state
            .lock()
            .destroy("destroy_command_pool", "command pool", pool);
    }

    unsafe fn allocate_command_buffers(
        &self,
        allocate_info: &vk::CommandBufferAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        let mut state = self.state.lock();
        let count = allocate_info.command_buffer_count;
        state.record("allocate_command_buffers", format!("{count}"))?;
        // Freed with their pool, so not tracked
        Ok((0..u64::from(count))
            .map(|i| vk::CommandBuffer::from_raw(0x3000 + i))
            .collect())
    }

    unsafe fn begin_command_buffer(
        &self,
        _command_buffer: vk::CommandBuffer,
        _begin_info: &vk::CommandBufferBeginInfo<'_>,
    ) -> VkResult<()> {
        self.state
            .lock()
            .record("begin_command_buffer", String::new())
    }

    unsafe fn end_command_buffer(&self, _command_buffer: vk::CommandBuffer) -> VkResult<()> {
        self.state.lock().record("end_command_buffer", String::new())
    }

    unsafe fn cmd_begin_render_pass(
        &self,
        _command_buffer: vk::CommandBuffer,
        begin_info: &vk::RenderPassBeginInfo<'_>,
        _contents: vk::SubpassContents,
    ) {
        let area = begin_info.render_area.extent;
        let _ = self.state.lock().record(
            "cmd_begin_render_pass",
            format!("{}x{}", area.width, area.height),
        );
    }

    unsafe fn cmd_end_render_pass(&self, _command_buffer: vk::CommandBuffer) {
        let _ = self
            .state
            .lock()
            .record("cmd_end_render_pass", String::new());
    }

    unsafe fn cmd_bind_pipeline(
        &self,
        _command_buffer: vk::CommandBuffer,
        _bind_point: vk::PipelineBindPoint,
        _pipeline: vk::Pipeline,
    ) {
        let _ = self
            .state
            .lock()
            .record("cmd_bind_pipeline", String::new());
    }

    unsafe fn cmd_draw(
        &self,
        _command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        let _ = self.state.lock().record(
            "cmd_draw",
            format!("{vertex_count} {instance_count} {first_vertex} {first_instance}"),
        );
    }

    unsafe fn create_semaphore(
        &self,
        _create_info: &vk::SemaphoreCreateInfo<'_>,
    ) -> VkResult<vk::Semaphore> {
        self.state.lock().create("create_semaphore", "semaphore")
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.state
            .lock()
            .destroy("destroy_semaphore", "semaphore", semaphore);
    }

    unsafe fn queue_wait_idle(&self, _queue: vk::Queue) -> VkResult<()> {
        self.state.lock().record("queue_wait_idle", String::new())
    }

    unsafe fn acquire_next_image(
        &self,
        _swapchain: vk::SwapchainKHR,
        _timeout_ns: u64,
        _semaphore: vk::Semaphore,
        _fence: vk::Fence,
    ) -> VkResult<(u32, bool)> {
        let mut state = self.state.lock();
        let image = state.next_image;
        state.record("acquire_next_image", format!("image {image}"))?;
        state.next_image = (image + 1) % state.acquire_range.max(1);
        Ok((image, false))
    }

    unsafe fn queue_submit(
        &self,
        _queue: vk::Queue,
        submits: &[vk::SubmitInfo<'_>],
        _fence: vk::Fence,
    ) -> VkResult<()> {
        let submit = &submits[0];
        self.state.lock().record(
            "queue_submit",
            format!(
                "{} wait, {} signal",
                submit.wait_semaphore_count, submit.signal_semaphore_count
            ),
        )
    }

    unsafe fn queue_present(
        &self,
        _queue: vk::Queue,
        present_info: &vk::PresentInfoKHR<'_>,
    ) -> VkResult<bool> {
        // SAFETY: the scheduler always presents exactly one image
        let image = unsafe { *present_info.p_image_indices };
        self.state
            .lock()
            .record("queue_present", format!("image {image}"))?;
        Ok(false)
    }

    unsafe fn destroy_device(&self) {
        let raw = self.raw;
        self.state.lock().destroy(
            "destroy_device",
            "device",
            vk::Device::from_raw(raw),
        );
    }
}
