//! End-to-end renderer lifecycle against the mock driver.

use ash::vk;
use shapes_gpu::{select_device, ErrorKind, FramebufferSet, GpuError, InstanceDriver, Renderer};
use shapes_test::{
    build_renderer, triangle_shaders, verify_clean_teardown, MockGpu, TestError, FRAMEBUFFER,
};

#[test]
fn two_images_give_two_framebuffers_and_command_buffers() {
    let (renderer, recorder) = build_renderer(MockGpu::single_discrete());
    let renderer = renderer.unwrap();

    assert_eq!(renderer.device_name(), "Mock Discrete GPU");
    assert_eq!(renderer.image_count(), 2);
    assert_eq!(renderer.framebuffer_count(), 2);
    assert_eq!(renderer.command_buffer_count(), 2);
    assert_eq!(recorder.count("create_semaphore"), 2);
    assert_eq!(renderer.frames_presented(), 0);
}

#[test]
fn construction_order() {
    let (renderer, recorder) = build_renderer(MockGpu::single_discrete());
    let _renderer = renderer.unwrap();

    insta::assert_snapshot!(recorder.ops().join("\n"), @r"
    create_instance
    create_surface
    enumerate_physical_devices
    create_device
    create_swapchain
    get_swapchain_images
    create_image_view
    create_image_view
    create_render_pass
    create_shader_module
    create_shader_module
    create_pipeline_layout
    create_graphics_pipeline
    destroy_shader_module
    destroy_shader_module
    create_framebuffer
    create_framebuffer
    create_command_pool
    allocate_command_buffers
    begin_command_buffer
    cmd_begin_render_pass
    cmd_bind_pipeline
    cmd_draw
    cmd_end_render_pass
    end_command_buffer
    begin_command_buffer
    cmd_begin_render_pass
    cmd_bind_pipeline
    cmd_draw
    cmd_end_render_pass
    end_command_buffer
    create_semaphore
    create_semaphore
    ");
}

#[test]
fn every_command_buffer_draws_one_triangle_over_the_full_extent() {
    let (renderer, recorder) = build_renderer(MockGpu::single_discrete());
    let _renderer = renderer.unwrap();

    let calls = recorder.calls();
    let draws: Vec<_> = calls.iter().filter(|call| call.op == "cmd_draw").collect();
    assert_eq!(draws.len(), 2);
    assert!(draws.iter().all(|call| call.detail == "3 1 0 0"));

    let passes: Vec<_> = calls
        .iter()
        .filter(|call| call.op == "cmd_begin_render_pass")
        .collect();
    assert!(passes.iter().all(|call| call.detail == "800x600"));
}

#[test]
fn each_frame_waits_acquires_submits_and_presents_once() {
    let (renderer, recorder) = build_renderer(MockGpu::single_discrete());
    let mut renderer = renderer.unwrap();

    for frame in 0..3u32 {
        let mark = recorder.mark();
        renderer.draw_frame().unwrap();

        let calls = recorder.calls_since(mark);
        let ops: Vec<_> = calls.iter().map(|call| call.op).collect();
        assert_eq!(
            ops,
            ["queue_wait_idle", "acquire_next_image", "queue_submit", "queue_present"]
        );
        assert_eq!(calls[2].detail, "1 wait, 1 signal");
        assert_eq!(calls[3].detail, format!("image {}", frame % 2));
    }
    assert_eq!(renderer.frames_presented(), 3);
}

#[test]
fn teardown_releases_everything_in_reverse() {
    let (renderer, recorder) = build_renderer(MockGpu::single_discrete());
    let mut renderer = renderer.unwrap();
    renderer.draw_frame().unwrap();

    let mark = recorder.mark();
    drop(renderer);

    insta::assert_snapshot!(recorder.ops_since(mark).join("\n"), @r"
    queue_wait_idle
    destroy_semaphore
    destroy_semaphore
    destroy_command_pool
    destroy_framebuffer
    destroy_framebuffer
    destroy_pipeline
    destroy_pipeline_layout
    destroy_render_pass
    destroy_image_view
    destroy_image_view
    destroy_swapchain
    destroy_device
    destroy_surface
    destroy_instance
    ");
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn submit_failure_is_a_runtime_error() {
    let gpu = MockGpu::single_discrete().fail("queue_submit", vk::Result::ERROR_DEVICE_LOST);
    let (renderer, recorder) = build_renderer(gpu);
    let mut renderer = renderer.unwrap();

    let err = renderer.draw_frame().unwrap_err();
    assert!(matches!(err, GpuError::Submit(vk::Result::ERROR_DEVICE_LOST)));
    assert_eq!(err.kind(), ErrorKind::RuntimeSubmit);
    assert_eq!(recorder.count("queue_present"), 0);
    assert_eq!(renderer.frames_presented(), 0);

    drop(renderer);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn acquire_and_present_failures_are_runtime_errors() {
    let gpu = MockGpu::single_discrete().fail("acquire_next_image", vk::Result::ERROR_SURFACE_LOST_KHR);
    let (renderer, _recorder) = build_renderer(gpu);
    let err = renderer.unwrap().draw_frame().unwrap_err();
    assert!(matches!(err, GpuError::Acquire(_)));
    assert_eq!(err.kind(), ErrorKind::RuntimeSubmit);

    let gpu = MockGpu::single_discrete().fail("queue_present", vk::Result::ERROR_OUT_OF_DATE_KHR);
    let (renderer, _recorder) = build_renderer(gpu);
    let err = renderer.unwrap().draw_frame().unwrap_err();
    assert!(matches!(err, GpuError::Present(_)));
    assert_eq!(err.kind(), ErrorKind::RuntimeSubmit);
}

#[test]
fn failed_teardown_wait_still_releases_everything() {
    // Waits succeed until the one issued by teardown
    let gpu = MockGpu::single_discrete().fail_after("queue_wait_idle", 1, vk::Result::ERROR_DEVICE_LOST);
    let (renderer, recorder) = build_renderer(gpu);
    let mut renderer = renderer.unwrap();
    renderer.draw_frame().unwrap();

    drop(renderer);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn failing_stage_releases_earlier_stages() {
    let gpu = MockGpu::single_discrete().fail_after(
        "create_framebuffer",
        1,
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
    );
    let (renderer, recorder) = build_renderer(gpu);

    match renderer.err().unwrap() {
        TestError::Gpu(e) => {
            assert_eq!(e.kind(), ErrorKind::ResourceCreation);
            assert!(e.to_string().contains("framebuffer"), "{e}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(recorder.count("destroy_framebuffer"), 1);
    assert_eq!(recorder.count("create_command_pool"), 0);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn late_failure_unwinds_every_stage_in_reverse() {
    let gpu = MockGpu::single_discrete().fail_after(
        "create_semaphore",
        1,
        vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    );
    let (renderer, recorder) = build_renderer(gpu);
    let mark = recorder.mark();
    assert!(renderer.is_err());

    // The context is dropped with the failed build, so the whole unwind is
    // already recorded
    let ops = recorder.ops();
    let unwind_start = ops
        .iter()
        .rposition(|op| *op == "create_semaphore")
        .unwrap()
        + 1;
    insta::assert_snapshot!(ops[unwind_start..mark].join("\n"), @r"
    destroy_semaphore
    destroy_command_pool
    destroy_framebuffer
    destroy_framebuffer
    destroy_pipeline
    destroy_pipeline_layout
    destroy_render_pass
    destroy_image_view
    destroy_image_view
    destroy_swapchain
    destroy_device
    destroy_surface
    destroy_instance
    ");
}

#[test]
fn renderer_presents_to_the_bound_surface() {
    let (instance, recorder) = MockGpu::single_discrete().build();
    let surface = instance.surface();

    let renderer = Renderer::new(instance, FRAMEBUFFER, triangle_shaders()).unwrap();
    assert_eq!(renderer.context().surface(), surface);

    drop(renderer);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn failed_recording_releases_the_command_pool() {
    // The second buffer fails to close
    let gpu = MockGpu::single_discrete().fail_after(
        "end_command_buffer",
        1,
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
    );
    let (renderer, recorder) = build_renderer(gpu);

    match renderer.err().unwrap() {
        TestError::Gpu(e) => {
            assert!(matches!(e, GpuError::CommandRecording(_)), "{e}");
            assert_eq!(e.kind(), ErrorKind::ResourceCreation);
            assert!(e.to_string().contains("Command buffer 1"), "{e}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(recorder.count("begin_command_buffer"), 2);
    assert_eq!(recorder.count("destroy_command_pool"), 1);
    assert_eq!(recorder.count("create_semaphore"), 0);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn failed_allocation_is_a_recording_error() {
    let gpu = MockGpu::single_discrete().fail(
        "allocate_command_buffers",
        vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    );
    let (renderer, recorder) = build_renderer(gpu);

    let err = renderer.err().unwrap();
    assert!(matches!(err, TestError::Gpu(GpuError::CommandRecording(_))), "{err}");
    assert_eq!(recorder.count("begin_command_buffer"), 0);
    assert_eq!(recorder.count("destroy_command_pool"), 1);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn unknown_image_index_stops_before_submit() {
    let gpu = MockGpu::single_discrete().with_acquire_range(3);
    let (renderer, recorder) = build_renderer(gpu);
    let mut renderer = renderer.unwrap();

    renderer.draw_frame().unwrap();
    renderer.draw_frame().unwrap();
    let err = renderer.draw_frame().unwrap_err();

    assert!(
        matches!(err, GpuError::ImageIndexOutOfRange { index: 2, count: 2 }),
        "{err}"
    );
    assert_eq!(err.kind(), ErrorKind::RuntimeSubmit);
    assert_eq!(recorder.count("queue_submit"), 2);
    assert_eq!(renderer.frames_presented(), 2);

    drop(renderer);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn framebuffer_set_follows_the_view_list() {
    let (instance, recorder) = MockGpu::single_discrete().build();
    let device = select_device(&instance).unwrap();

    let set = unsafe {
        FramebufferSet::new(device.driver(), vk::RenderPass::null(), &[], FRAMEBUFFER)
    }
    .unwrap();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert_eq!(recorder.count("create_framebuffer"), 0);
}
