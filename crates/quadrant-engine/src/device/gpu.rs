use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};

use crate::sync::WgpuFence;

use super::select::{AdapterProbe, select_adapter};
use super::GpuInit;

/// Owns the wgpu instance, the selected adapter and the logical device.
///
/// Presentation lives in `present`; this type only hands out the device,
/// queue and fences built on them.
pub struct Gpu {
    /// Kept alive for the lifetime of every surface created from it.
    instance: wgpu::Instance,

    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Reason reported by the device-lost callback, once it fires.
    lost: Arc<OnceLock<String>>,
}

impl Gpu {
    /// Creates the instance surfaces are created from before adapter selection.
    pub fn create_instance(init: &GpuInit) -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        })
    }

    /// Selects a hardware adapter able to present to `surface` and opens a
    /// device on it.
    ///
    /// Adapter and device acquisition are asynchronous under wgpu.
    pub async fn new(
        instance: wgpu::Instance,
        surface: &wgpu::Surface<'_>,
        init: &GpuInit,
    ) -> Result<Self> {
        let adapters = instance.enumerate_adapters(init.backends).await;
        log::debug!("{} adapter(s) enumerated", adapters.len());

        let presentable = adapters
            .into_iter()
            .filter(|adapter| adapter.is_surface_supported(surface));

        let adapter = select_adapter(presentable, init.capability).with_context(|| {
            format!(
                "no hardware adapter meets {:?} and can present to the window",
                init.capability
            )
        })?;

        let summary = adapter.summary();
        log::info!("using adapter \"{}\" ({:?})", summary.name, summary.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("quadrant device"),
                required_features: wgpu::Features::empty(),
                required_limits: init.capability.limits(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let lost = Arc::new(OnceLock::new());
        let lost_cb = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            log::error!("device lost ({reason:?}): {message}");
            let _ = lost_cb.set(format!("{reason:?}: {message}"));
        });

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            lost,
        })
    }

    /// Creates a fence over this device's queue, starting at value 0.
    pub fn create_fence(&self) -> WgpuFence {
        WgpuFence::new(self.device.clone(), self.queue.clone(), Arc::clone(&self.lost))
    }

    /// Reason the device was lost, if it has been.
    pub fn lost_reason(&self) -> Option<&str> {
        self.lost.get().map(String::as_str)
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
