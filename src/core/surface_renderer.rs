use std::sync::Arc;

use anyhow::bail;
use wgpu::{BindGroup, Device, RenderPipeline, Sampler, Surface, SurfaceConfiguration, Texture, TextureFormat};
use winit::window::Window;

use super::gpu_context::{GpuContext, WindowTarget};
use super::render_loop::FrameScheduler;
use super::surface::SoftwareSurface;

/// Presents a `SoftwareSurface` frame on a window
///
/// The frame is already composed at physical resolution, so presentation
/// is a single texture upload and a fullscreen triangle with a nearest
/// sampler. No smoothing is ever applied to board cells.
pub struct WindowPresenter {
    gpu: GpuContext,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    render_pipeline: RenderPipeline,
    texture: Texture,
    texture_format: TextureFormat,
    sampler: Sampler,
    bind_group: BindGroup,
}

impl WindowPresenter {
    pub fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let WindowTarget { gpu, surface, adapter } = pollster::block_on(GpuContext::for_window(window))?;

        let caps = surface.get_capabilities(&adapter);
        let Some(&fallback_format) = caps.formats.first() else {
            bail!("window surface reports no supported formats");
        };
        let surface_format = caps.formats.iter().copied().find(|f| f.is_srgb()).unwrap_or(fallback_format);

        // Palette bytes are sRGB; decode on sample when the surface re-encodes
        let texture_format = if surface_format.is_srgb() {
            TextureFormat::Rgba8UnormSrgb
        } else {
            TextureFormat::Rgba8Unorm
        };

        let width = size.width.max(1);
        let height = size.height.max(1);
        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &surface_config);

        let sampler = gpu.device().create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Frame Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture = Self::create_frame_texture(gpu.device(), texture_format, width, height);
        let render_pipeline = Self::create_render_pipeline(gpu.device(), surface_format);
        let bind_group = Self::create_bind_group(gpu.device(), &render_pipeline, &texture, &sampler);

        Ok(Self {
            gpu,
            surface,
            surface_config,
            render_pipeline,
            texture,
            texture_format,
            sampler,
            bind_group,
        })
    }

    /// Copy a composed frame into the frame texture
    pub fn upload(&self, frame: &SoftwareSurface) -> anyhow::Result<()> {
        let (width, height) = frame.physical_size();
        if (width, height) != self.dimensions() {
            bail!(
                "frame {}x{} does not match window surface {}x{}",
                width,
                height,
                self.surface_config.width,
                self.surface_config.height
            );
        }

        self.gpu.queue().write_texture(
            self.texture.as_image_copy(),
            frame.frame_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Draw the frame texture to the window. Blocks on vsync with Fifo.
    pub fn present(&self) -> anyhow::Result<()> {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Present Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.gpu.queue().submit(Some(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resize to a new physical size; zero sizes (minimized) are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(self.gpu.device(), &self.surface_config);

        self.texture = Self::create_frame_texture(self.gpu.device(), self.texture_format, width, height);
        self.bind_group = Self::create_bind_group(self.gpu.device(), &self.render_pipeline, &self.texture, &self.sampler);
    }

    /// Current physical surface size
    pub fn dimensions(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    fn create_frame_texture(device: &Device, format: TextureFormat, width: u32, height: u32) -> Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_render_pipeline(device: &Device, surface_format: TextureFormat) -> RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Display Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../display.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Display Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Display Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_bind_group(device: &Device, pipeline: &RenderPipeline, texture: &Texture, sampler: &Sampler) -> BindGroup {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

/// The window redraws itself when asked
impl FrameScheduler for Arc<Window> {
    fn request_frame(&self) {
        self.request_redraw();
    }
}
