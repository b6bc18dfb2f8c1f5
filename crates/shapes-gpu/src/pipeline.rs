//! Render pass and fixed graphics pipeline.

use std::io::Cursor;

use crate::driver::DeviceDriver;
use crate::error::{GpuError, Result};
use crate::handle::{DeviceObject, Scoped};
use ash::vk;

/// Render pass, layout and pipeline for the fixed triangle draw.
pub struct Pipeline {
    pub render_pass: vk::RenderPass,
    pub layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
}

impl Pipeline {
    /// Build the render pass and graphics pipeline from two SPIR-V blobs.
    ///
    /// Both shader modules are destroyed before this returns, whether or not
    /// pipeline creation succeeded.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn build<D: DeviceDriver + ?Sized>(
        device: &D,
        format: vk::Format,
        extent: vk::Extent2D,
        vertex_code: &[u8],
        fragment_code: &[u8],
    ) -> Result<Self> {
        let render_pass = unsafe { Scoped::new(device, create_render_pass(device, format)?) };

        let vert_module = unsafe { create_shader_module(device, "vertex", vertex_code)? };
        let frag_module = unsafe { create_shader_module(device, "fragment", fragment_code)? };

        // Shader stages
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(*vert_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(*frag_module)
                .name(c"main"),
        ];

        // Positions come from the vertex shader itself
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Viewport and scissor are baked in
        let viewports = [vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }];
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        }];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false)
            .line_width(1.0);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .sample_shading_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::RGBA)];

        let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let layout_info = vk::PipelineLayoutCreateInfo::default();
        let layout = unsafe {
            let handle = device
                .create_pipeline_layout(&layout_info)
                .map_err(|e| GpuError::PipelineCreation(format!("Layout: {e}")))?;
            Scoped::new(device, handle)
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisampling)
            .color_blend_state(&color_blending)
            .layout(*layout)
            .render_pass(*render_pass)
            .subpass(0);

        let pipeline = unsafe { device.create_graphics_pipeline(&pipeline_info) }
            .map_err(|e| GpuError::PipelineCreation(e.to_string()))?;

        tracing::info!(
            "Graphics pipeline built ({:?}, {}x{})",
            format,
            extent.width,
            extent.height
        );

        // Shader modules drop here; the pipeline no longer needs them
        Ok(Self {
            render_pass: render_pass.release(),
            layout: layout.release(),
            pipeline,
        })
    }
}

impl DeviceObject for Pipeline {
    unsafe fn destroy<D: DeviceDriver + ?Sized>(&self, device: &D) {
        unsafe {
            device.destroy_pipeline(self.pipeline);
            device.destroy_pipeline_layout(self.layout);
            device.destroy_render_pass(self.render_pass);
        }
    }
}

/// Decode a SPIR-V byte buffer into words.
///
/// `stage` names the shader in the error message.
pub fn decode_spirv(stage: &str, code: &[u8]) -> Result<Vec<u32>> {
    if code.is_empty() {
        return Err(GpuError::ShaderModuleCreation(format!("{stage}: empty code")));
    }
    ash::util::read_spv(&mut Cursor::new(code))
        .map_err(|e| GpuError::ShaderModuleCreation(format!("{stage}: {e}")))
}

/// # Safety
/// The device must be valid.
unsafe fn create_shader_module<'d, D: DeviceDriver + ?Sized>(
    device: &'d D,
    stage: &str,
    code: &[u8],
) -> Result<Scoped<'d, D, vk::ShaderModule>> {
    let words = decode_spirv(stage, code)?;

    let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
    let module = unsafe { device.create_shader_module(&create_info) }
        .map_err(|e| GpuError::ShaderModuleCreation(format!("{stage}: {e}")))?;

    Ok(unsafe { Scoped::new(device, module) })
}

/// # Safety
/// The device must be valid.
unsafe fn create_render_pass<D: DeviceDriver + ?Sized>(
    device: &D,
    format: vk::Format,
) -> Result<vk::RenderPass> {
    let attachments = [vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)];

    let color_refs = [vk::AttachmentReference {
        attachment: 0,
        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    }];

    let subpasses = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)];

    // Wait for the acquired image before writing to it
    let dependencies = [vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    unsafe { device.create_render_pass(&create_info) }.map_err(GpuError::creating("render pass"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spirv_words_are_little_endian() {
        let words = decode_spirv("vertex", &[0x03, 0x02, 0x23, 0x07, 1, 0, 0, 0]).unwrap();
        assert_eq!(words, vec![0x0723_0203, 1]);
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(matches!(
            decode_spirv("vertex", &[]),
            Err(GpuError::ShaderModuleCreation(_))
        ));
    }

    #[test]
    fn misaligned_code_is_rejected() {
        assert!(matches!(
            decode_spirv("fragment", &[0x03, 0x02, 0x23]),
            Err(GpuError::ShaderModuleCreation(_))
        ));
    }
}
