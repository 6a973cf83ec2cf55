use std::sync::Arc;

use anyhow::{anyhow, Context};
use wgpu::{Adapter, Device, DeviceDescriptor, Instance, Limits, Queue, Surface};
use winit::window::Window;

/// Device and queue shared by whatever presents to the window
///
/// Cloning is cheap (Arc).
#[derive(Clone)]
pub struct GpuContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
}

/// A window surface together with the context and adapter that own it
pub struct WindowTarget {
    pub gpu: GpuContext,
    pub surface: Surface<'static>,
    pub adapter: Adapter,
}

impl GpuContext {
    /// Create the surface first so the adapter is picked for it
    pub async fn for_window(window: Arc<Window>) -> anyhow::Result<WindowTarget> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("no adapter compatible with the window: {e:?}"))?;

        let (device, queue) = Self::request_device(&adapter).await?;
        log::info!("using adapter {}", adapter.get_info().name);

        Ok(WindowTarget {
            gpu: Self {
                device: Arc::new(device),
                queue: Arc::new(queue),
            },
            surface,
            adapter,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    async fn request_device(adapter: &Adapter) -> anyhow::Result<(Device, Queue)> {
        // Board textures reach 2000x2000 and beyond; take what the adapter allows
        let limits = Limits {
            max_texture_dimension_2d: adapter.limits().max_texture_dimension_2d,
            ..Limits::downlevel_defaults()
        };

        adapter
            .request_device(&DeviceDescriptor {
                label: Some("Canvas Device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| anyhow!("failed to create device: {e:?}"))
    }
}
