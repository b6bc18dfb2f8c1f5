//! Pipeline construction against the mock driver.

use ash::vk;
use shapes_gpu::{ErrorKind, GpuError, Pipeline, Renderer, ShaderCode};
use shapes_test::{
    build_renderer, triangle_shaders, verify_clean_teardown, MockGpu, TestError, FRAMEBUFFER,
};

#[test]
fn shader_modules_are_released_after_a_successful_build() {
    let (renderer, recorder) = build_renderer(MockGpu::single_discrete());
    let _renderer = renderer.unwrap();

    assert_eq!(recorder.count("create_shader_module"), 2);
    assert_eq!(recorder.count("destroy_shader_module"), 2);
    assert!(!recorder.live().contains(&"shader module"));
}

#[test]
fn shader_modules_are_released_when_the_pipeline_fails() {
    let gpu = MockGpu::single_discrete()
        .fail("create_graphics_pipeline", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
    let (renderer, recorder) = build_renderer(gpu);

    let err = renderer.err().unwrap();
    assert!(matches!(err, TestError::Gpu(GpuError::PipelineCreation(_))));
    assert_eq!(recorder.count("destroy_shader_module"), 2);
    assert_eq!(recorder.count("destroy_pipeline_layout"), 1);
    assert_eq!(recorder.count("destroy_render_pass"), 1);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn fragment_module_failure_releases_the_vertex_module() {
    let gpu = MockGpu::single_discrete().fail_after(
        "create_shader_module",
        1,
        vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    );
    let (renderer, recorder) = build_renderer(gpu);

    match renderer.err().unwrap() {
        TestError::Gpu(e @ GpuError::ShaderModuleCreation(_)) => {
            assert!(e.to_string().contains("fragment"), "{e}");
            assert_eq!(e.kind(), ErrorKind::ResourceCreation);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(recorder.count("destroy_shader_module"), 1);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn malformed_shader_bytes_never_reach_the_driver() {
    let (instance, recorder) = MockGpu::single_discrete().build();
    let shaders = ShaderCode {
        vertex: &[0x03, 0x02, 0x23],
        fragment: triangle_shaders().fragment,
    };

    let err = Renderer::new(instance, FRAMEBUFFER, shaders).err().unwrap();
    assert!(matches!(err, GpuError::ShaderModuleCreation(_)));
    assert_eq!(recorder.count("create_shader_module"), 0);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn pipeline_objects_are_destroyed_in_reverse() {
    let (instance, recorder) = MockGpu::single_discrete().build();
    let device = shapes_gpu::select_device(&instance).unwrap();
    let shaders = triangle_shaders();

    let pipeline = unsafe {
        Pipeline::build(
            device.driver(),
            vk::Format::B8G8R8A8_SRGB,
            FRAMEBUFFER,
            shaders.vertex,
            shaders.fragment,
        )
    }
    .unwrap();

    let mark = recorder.mark();
    unsafe { shapes_gpu::DeviceObject::destroy(&pipeline, device.driver()) };
    assert_eq!(
        recorder.ops_since(mark),
        ["destroy_pipeline", "destroy_pipeline_layout", "destroy_render_pass"]
    );
}
