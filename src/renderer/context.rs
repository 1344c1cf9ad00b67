//! Window presenter
//!
//! Uploads the software framebuffer into a GPU texture each frame and draws
//! it with a fullscreen triangle, letterboxed so the canvas keeps its aspect
//! ratio whatever the window size.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::core::EngineError;

use super::{FrameTexture, SoftwareCanvas};

/// Uniform buffer for the letterbox transform
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct ViewportUniform {
    scale: [f32; 2],
    _padding: [f32; 2],
}

impl ViewportUniform {
    fn new(window: (u32, u32), canvas: (u32, u32)) -> Self {
        Self {
            scale: letterbox_scale(window, canvas),
            _padding: [0.0; 2],
        }
    }
}

/// Clip-space scale fitting a canvas inside a window without distortion.
///
/// One axis is always 1; the other shrinks to leave bars on both sides.
#[must_use]
pub fn letterbox_scale(window: (u32, u32), canvas: (u32, u32)) -> [f32; 2] {
    let window_aspect = window.0.max(1) as f32 / window.1.max(1) as f32;
    let canvas_aspect = canvas.0.max(1) as f32 / canvas.1.max(1) as f32;
    if window_aspect > canvas_aspect {
        [canvas_aspect / window_aspect, 1.0]
    } else {
        [1.0, window_aspect / canvas_aspect]
    }
}

/// Presents a [`SoftwareCanvas`] on a window surface with wgpu
pub struct Presenter {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    frame: FrameTexture,
    bind_group: wgpu::BindGroup,
    viewport: ViewportUniform,
    viewport_buffer: wgpu::Buffer,
    viewport_bind_group: wgpu::BindGroup,
    size: (u32, u32),
    /// Color behind the frame when the window aspect differs
    pub clear_color: wgpu::Color,
}

impl Presenter {
    /// Create a presenter for a window, with a frame texture of the canvas size
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Platform`] if no surface, adapter or device
    /// can be created
    pub async fn new(
        window: Arc<Window>,
        vsync: bool,
        canvas_size: (u32, u32),
    ) -> Result<Self, EngineError> {
        let size = window.inner_size();
        let size = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| EngineError::Platform(format!("create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| EngineError::Platform("no compatible GPU adapter".into()))?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Sprout Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| EngineError::Platform(format!("request device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| EngineError::Platform("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0,
            height: size.1,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("blit.wgsl").into()),
        });

        let bind_group_layout = FrameTexture::bind_group_layout(&device);

        let viewport = ViewportUniform::new(size, canvas_size);
        let viewport_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Viewport Buffer"),
            contents: bytemuck::cast_slice(&[viewport]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let viewport_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Viewport Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Viewport Bind Group"),
            layout: &viewport_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout, &viewport_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
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
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let frame = FrameTexture::new(&device, canvas_size.0, canvas_size.1);
        let bind_group = frame.create_bind_group(&device, &bind_group_layout);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_group_layout,
            frame,
            bind_group,
            viewport,
            viewport_buffer,
            viewport_bind_group,
            size,
            clear_color: wgpu::Color::BLACK,
        })
    }

    /// Window surface size
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Resize the window surface
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.update_viewport();
            log::debug!("Resized to {}x{}", width, height);
        }
    }

    fn update_viewport(&mut self) {
        let viewport = ViewportUniform::new(self.size, (self.frame.width(), self.frame.height()));
        if viewport != self.viewport {
            self.viewport = viewport;
            self.queue
                .write_buffer(&self.viewport_buffer, 0, bytemuck::cast_slice(&[viewport]));
        }
    }

    /// Upload the canvas and draw it letterboxed on the surface
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Platform`] on unrecoverable surface errors
    pub fn present(&mut self, canvas: &SoftwareCanvas) -> Result<(), EngineError> {
        let (width, height) = canvas.frame().dimensions();
        if (width, height) != (self.frame.width(), self.frame.height()) {
            self.frame = FrameTexture::new(&self.device, width, height);
            self.bind_group = self
                .frame
                .create_bind_group(&self.device, &self.bind_group_layout);
            self.update_viewport();
        }
        self.frame.upload(&self.queue, canvas.as_bytes())?;

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timeout, frame skipped");
                return Ok(());
            }
            Err(e) => return Err(EngineError::Platform(format!("surface: {e}"))),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blit Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_bind_group(1, &self.viewport_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("size", &self.size)
            .field("format", &self.config.format)
            .field("frame", &(self.frame.width(), self.frame.height()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_matching_aspect_fills_window() {
        assert_eq!(letterbox_scale((1600, 800), (800, 400)), [1.0, 1.0]);
    }

    #[test]
    fn test_letterbox_bars_on_the_long_axis() {
        assert_eq!(letterbox_scale((1600, 400), (800, 400)), [0.5, 1.0]);
        assert_eq!(letterbox_scale((800, 800), (800, 400)), [1.0, 0.5]);
    }

    #[test]
    fn test_viewport_uniform_is_sixteen_bytes() {
        let uniform = ViewportUniform::new((800, 400), (800, 400));
        assert_eq!(bytemuck::bytes_of(&uniform).len(), 16);
    }
}
