/// Snapshot of GPU adapter and device properties. Display only; values
/// are valid at query time and hardware changes are not tracked.
#[derive(Clone, Debug)]
pub struct CapabilityReport {
    pub adapter_name: String,
    pub backend: String,
    pub device_type: String,
    pub driver: String,
    pub driver_info: String,
    pub max_buffer_size: u64,
    pub max_compute_invocations_per_workgroup: u32,
    pub max_storage_buffer_binding_size: u32,
}

impl std::fmt::Display for CapabilityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "GPU information:")?;
        writeln!(f, "  adapter:     {}", self.adapter_name)?;
        writeln!(f, "  backend:     {}", self.backend)?;
        writeln!(f, "  device type: {}", self.device_type)?;
        if !self.driver.is_empty() {
            writeln!(f, "  driver:      {} {}", self.driver, self.driver_info)?;
        }
        writeln!(
            f,
            "  max buffer size:                 {} MiB",
            self.max_buffer_size / (1024 * 1024)
        )?;
        writeln!(
            f,
            "  max compute invocations:         {}",
            self.max_compute_invocations_per_workgroup
        )?;
        write!(
            f,
            "  max storage buffer binding size: {} MiB",
            u64::from(self.max_storage_buffer_binding_size) / (1024 * 1024)
        )
    }
}
