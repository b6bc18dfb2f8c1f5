//! Device selection against the mock driver.

use ash::vk;
use shapes_gpu::{select_device, DeviceClass, ErrorKind, GpuError};
use shapes_test::{build_renderer, verify_clean_teardown, MockGpu, MockPhysicalDevice};

#[test]
fn discrete_gpu_wins_over_earlier_integrated() {
    let gpu = MockGpu::new()
        .with_device(MockPhysicalDevice::integrated("Integrated"))
        .with_device(MockPhysicalDevice::new("Software", DeviceClass::Cpu))
        .with_device(MockPhysicalDevice::discrete("Discrete"));

    let (renderer, recorder) = build_renderer(gpu);
    let renderer = renderer.unwrap();
    assert_eq!(renderer.device_name(), "Discrete");

    drop(renderer);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn first_enumerated_wins_a_tie() {
    let gpu = MockGpu::new()
        .with_device(MockPhysicalDevice::integrated("First"))
        .with_device(MockPhysicalDevice::integrated("Second"));
    let (instance, _recorder) = gpu.build();

    let device = select_device(&instance).unwrap();
    assert_eq!(device.name(), "First");
}

#[test]
fn no_devices_fails_before_scoring() {
    let (renderer, recorder) = build_renderer(MockGpu::new());
    let err = renderer.err().unwrap();
    assert!(matches!(err, shapes_test::TestError::Gpu(GpuError::NoDeviceFound)));
    assert_eq!(recorder.count("create_device"), 0);
    verify_clean_teardown(&recorder).unwrap();
}

#[test]
fn devices_without_swapchain_are_unsuitable() {
    let gpu = MockGpu::new()
        .with_device(MockPhysicalDevice::discrete("Headless").without_swapchain())
        .with_device(MockPhysicalDevice::integrated("Also headless").without_swapchain());
    let (instance, recorder) = gpu.build();

    let err = select_device(&instance).err().unwrap();
    assert!(matches!(err, GpuError::NoSuitableDevice));
    assert_eq!(err.kind(), ErrorKind::CapabilityMismatch);
    assert_eq!(recorder.count("create_device"), 0);
}

#[test]
fn device_without_formats_is_skipped() {
    let gpu = MockGpu::new()
        .with_device(MockPhysicalDevice::discrete("No formats").with_surface_formats(vec![]))
        .with_device(MockPhysicalDevice::integrated("Usable"));
    let (instance, _recorder) = gpu.build();

    let device = select_device(&instance).unwrap();
    assert_eq!(device.name(), "Usable");
}

#[test]
fn one_queue_is_created_for_a_shared_family() {
    let (instance, recorder) = MockGpu::single_discrete().build();
    let device = select_device(&instance).unwrap();

    let families = device.queue_families();
    assert_eq!((families.graphics, families.present), (0, 0));
    assert_eq!(device.graphics_queue(), device.present_queue());

    let create = recorder
        .calls()
        .into_iter()
        .find(|call| call.op == "create_device")
        .unwrap();
    assert_eq!(create.detail, "Mock Discrete GPU (1 queue families)");
}

#[test]
fn missing_graphics_family_is_reported() {
    let compute_only = vk::QueueFamilyProperties {
        queue_flags: vk::QueueFlags::COMPUTE,
        queue_count: 1,
        ..Default::default()
    };
    let gpu = MockGpu::new().with_device(
        MockPhysicalDevice::discrete("Compute card").with_queue_families(vec![compute_only], vec![0]),
    );
    let (instance, _recorder) = gpu.build();

    let err = select_device(&instance).err().unwrap();
    assert!(matches!(err, GpuError::NoGraphicsQueue));
}

#[test]
fn device_creation_failure_is_a_resource_error() {
    let gpu = MockGpu::single_discrete().fail("create_device", vk::Result::ERROR_INITIALIZATION_FAILED);
    let (instance, _recorder) = gpu.build();

    let err = select_device(&instance).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ResourceCreation);
    assert!(err.to_string().contains("logical device"));
}

#[test]
fn device_without_present_modes_is_skipped() {
    let gpu = MockGpu::new()
        .with_device(MockPhysicalDevice::discrete("No modes").with_present_modes(vec![]))
        .with_device(MockPhysicalDevice::integrated("Usable"));
    let (instance, _recorder) = gpu.build();

    let device = select_device(&instance).unwrap();
    assert_eq!(device.name(), "Usable");

    let gpu = MockGpu::new()
        .with_device(MockPhysicalDevice::discrete("No modes").with_present_modes(vec![]));
    let (instance, recorder) = gpu.build();
    let err = select_device(&instance).err().unwrap();
    assert!(matches!(err, GpuError::NoSuitableDevice));
    assert_eq!(recorder.count("create_device"), 0);
}

#[test]
fn missing_present_family_is_reported() {
    let graphics = vk::QueueFamilyProperties {
        queue_flags: vk::QueueFlags::GRAPHICS,
        queue_count: 1,
        ..Default::default()
    };
    let gpu = MockGpu::new().with_device(
        MockPhysicalDevice::discrete("Offscreen card").with_queue_families(vec![graphics], vec![]),
    );
    let (instance, recorder) = gpu.build();

    let err = select_device(&instance).err().unwrap();
    assert!(matches!(err, GpuError::NoPresentQueue));
    assert_eq!(err.kind(), ErrorKind::CapabilityMismatch);
    assert_eq!(recorder.count("create_device"), 0);
}
