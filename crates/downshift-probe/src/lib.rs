//! GPU capability probing.
//!
//! Answers two questions about the current environment: "is there a usable
//! GPU at all" (a boolean, for the session upgrade decision) and "what is
//! it" (a descriptive report, for display only).

use anyhow::{Context, Result};
use downshift_core::{CapabilityProbe, CapabilityReport};
use tracing::debug;

fn instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

async fn request_adapter(instance: &wgpu::Instance) -> Option<wgpu::Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok()
}

/// Probes the platform GPU API fresh on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct WgpuProbe;

impl WgpuProbe {
    pub fn new() -> Self {
        Self
    }

    /// Descriptive snapshot of the adapter and device, for display.
    /// Errors here are rendered as text by the caller; nothing aborts.
    pub async fn describe(&self) -> Result<CapabilityReport> {
        let instance = instance();
        let adapter = request_adapter(&instance)
            .await
            .context("no GPU adapter found")?;
        let info = adapter.get_info();

        let (device, _queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .context("failed to create GPU device")?;
        let limits = device.limits();

        Ok(CapabilityReport {
            adapter_name: info.name,
            backend: info.backend.to_str().to_string(),
            device_type: format!("{:?}", info.device_type),
            driver: info.driver,
            driver_info: info.driver_info,
            max_buffer_size: limits.max_buffer_size,
            max_compute_invocations_per_workgroup: limits.max_compute_invocations_per_workgroup,
            max_storage_buffer_binding_size: limits.max_storage_buffer_binding_size,
        })
    }
}

impl CapabilityProbe for WgpuProbe {
    /// True only if an adapter is found and yields a logical device.
    /// Every failure mode folds into `false`; a missing GPU is a normal
    /// condition across environments, not an error to propagate.
    async fn probe(&self) -> bool {
        let instance = instance();
        let Some(adapter) = request_adapter(&instance).await else {
            debug!("no GPU adapter found");
            return false;
        };

        match adapter.request_device(&wgpu::DeviceDescriptor::default()).await {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "GPU device creation failed");
                false
            }
        }
    }
}
