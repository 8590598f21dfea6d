use downshift_core::{CapabilityProbe, CapabilityReport};
use downshift_probe::WgpuProbe;

// The probe must give a clean boolean answer on every machine, including
// ones with no GPU at all. We can't assert which answer, only that it
// arrives without panicking and is stable across calls.
#[test]
fn probe_never_panics_and_is_idempotent() {
    let probe = WgpuProbe::new();
    let first = pollster::block_on(probe.probe());
    let second = pollster::block_on(probe.probe());
    assert_eq!(first, second);
}

#[test]
fn describe_matches_probe_verdict() {
    let probe = WgpuProbe::new();
    let usable = pollster::block_on(probe.probe());
    let report = pollster::block_on(probe.describe());
    // A usable device implies a describable one; without a device the
    // report degrades to an error message rather than a panic.
    if usable {
        assert!(report.is_ok());
    }
}

#[test]
fn report_renders_all_limits() {
    let report = CapabilityReport {
        adapter_name: "Test Adapter".to_string(),
        backend: "Vulkan".to_string(),
        device_type: "DiscreteGpu".to_string(),
        driver: "test".to_string(),
        driver_info: "1.0".to_string(),
        max_buffer_size: 256 * 1024 * 1024,
        max_compute_invocations_per_workgroup: 256,
        max_storage_buffer_binding_size: 128 * 1024 * 1024,
    };
    let text = report.to_string();
    assert!(text.contains("Test Adapter"));
    assert!(text.contains("256 MiB"));
    assert!(text.contains("max compute invocations:         256"));
    assert!(text.contains("128 MiB"));
}
