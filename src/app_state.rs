// src/app_state.rs
// Native wgpu renderer: turns a recorded frame into GPU draws.
use std::sync::Arc;

use bevy_color::{ColorToComponents, LinearRgba, Srgba};
use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::models::{CircleInstance, ColorVertex, ScreenUniform, Vertex2D};
use crate::style::RadialGradient;
use crate::surface::{CommandList, DrawCommand};

const LINES_WGSL: &str = include_str!("./shaders/lines.wgsl");
const CIRCLES_WGSL: &str = include_str!("./shaders/circles.wgsl");

/// Fog is tessellated into this many cells per side.
const FOG_CELLS: usize = 24;
const CLEAR_COLOR: Srgba = Srgba::rgb(18.0 / 255.0, 18.0 / 255.0, 18.0 / 255.0);
const INITIAL_BUFFER_BYTES: u64 = 64 * 1024;

pub struct State {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    /// False until the first non-zero resize; rendering is skipped before that.
    pub is_surface_configured: bool,

    /// Logical viewport size in pixels, shared by every pipeline.
    pub screen_uniform: ScreenUniform,
    pub screen_buffer: wgpu::Buffer,
    pub screen_bind_group: wgpu::BindGroup,
    /// Set when a recorded `Configure` changed the uniform.
    pub screen_needs_update: bool,

    pub fog_render_pipeline: wgpu::RenderPipeline, // triangle list
    pub line_render_pipeline: wgpu::RenderPipeline, // line list
    pub circle_render_pipeline: wgpu::RenderPipeline, // instanced quads

    /// Fog wash tessellated into `FOG_CELLS`² vertex-coloured quads.
    pub fog_vertices: Vec<ColorVertex>,
    pub fog_vertex_buffer: wgpu::Buffer,

    /// Two vertices per stroked edge.
    pub line_vertices: Vec<ColorVertex>,
    pub line_vertex_buffer: wgpu::Buffer,

    /// One instance per sample point.
    pub circle_instances: Vec<CircleInstance>,
    pub circle_instance_buffer: wgpu::Buffer,
    pub quad_vertex_buffer: wgpu::Buffer,
    pub quad_index_buffer: wgpu::Buffer,
}

fn linear(color: Srgba) -> [f32; 4] {
    LinearRgba::from(color).to_f32_array()
}

fn vertex_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: INITIAL_BUFFER_BYTES,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Grows `buffer` if needed, then uploads `data`.
fn upload(device: &wgpu::Device, queue: &wgpu::Queue, buffer: &mut wgpu::Buffer, label: &str, data: &[u8]) {
    if data.is_empty() {
        return;
    }
    if buffer.size() < data.len() as u64 {
        *buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: data,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
    } else {
        queue.write_buffer(buffer, 0, data);
    }
}

/// Colour-per-vertex pipeline over `lines.wgsl`.
fn color_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[ColorVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

/// Triangles covering `size`, coloured by sampling `gradient` at each corner.
pub fn tessellate_fog(gradient: &RadialGradient, size: Vec2, cells: usize, out: &mut Vec<ColorVertex>) {
    let cells = cells.max(1);
    let step = size / cells as f32;
    let corner = |i: usize, j: usize| {
        let p = Vec2::new(i as f32, j as f32) * step;
        ColorVertex { position: p.into(), color: linear(gradient.sample(p)) }
    };
    for j in 0..cells {
        for i in 0..cells {
            let (a, b, c, d) = (corner(i, j), corner(i + 1, j), corner(i + 1, j + 1), corner(i, j + 1));
            out.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }
}

impl State {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<State> {
        let size = window.inner_size();

        let gpu = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = gpu.create_surface(window)?;

        let adapter = gpu
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let texture_format = surface_caps.formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;
        if !texture_format.is_srgb() {
            log::warn!("No sRGB surface format found, falling back to {:?}", texture_format);
        }

        let needs_shader_srgb_output_conversion = !texture_format.is_srgb();

        log::info!(
            "Using {} ({:?}, Target Format: {:?}), Needs Shader sRGB Output Conversion: {}",
            adapter_info.name,
            adapter_info.backend,
            texture_format,
            needs_shader_srgb_output_conversion
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: texture_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let screen_uniform = ScreenUniform {
            size: [size.width.max(1) as f32, size.height.max(1) as f32],
            needs_srgb_output_conversion: needs_shader_srgb_output_conversion as u32,
            _padding: 0,
        };

        let screen_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Screen Buffer"),
                contents: bytemuck::cast_slice(&[screen_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }
        );

        let screen_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }
            ],
            label: Some("Screen Bind Group Layout"),
        });

        let screen_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &screen_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: screen_buffer.as_entire_binding(),
                }
            ],
            label: Some("Screen Bind Group"),
        });

        let lines_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lines Shader"),
            source: wgpu::ShaderSource::Wgsl(LINES_WGSL.into()),
        });

        let circles_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Circles Shader"),
            source: wgpu::ShaderSource::Wgsl(CIRCLES_WGSL.into()),
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[
                &screen_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let fog_render_pipeline = color_pipeline(
            &device,
            &render_pipeline_layout,
            &lines_shader_module,
            texture_format,
            wgpu::PrimitiveTopology::TriangleList,
            "Fog Render Pipeline",
        );

        let line_render_pipeline = color_pipeline(
            &device,
            &render_pipeline_layout,
            &lines_shader_module,
            texture_format,
            wgpu::PrimitiveTopology::LineList,
            "Line Render Pipeline",
        );

        let circle_render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Circle Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &circles_shader_module,
                entry_point: Some("vs_main"),
                buffers: &[
                    Vertex2D::layout(),
                    CircleInstance::layout(),
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &circles_shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // screen space is y-down, so quad winding flips
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let quad_vertex_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Quad Vertex Buffer"),
                contents: bytemuck::cast_slice(Vertex2D::QUAD_VERTICES.as_slice()),
                usage: wgpu::BufferUsages::VERTEX,
            }
        );

        let quad_index_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Quad Index Buffer"),
                contents: bytemuck::cast_slice(Vertex2D::QUAD_INDICES.as_slice()),
                usage: wgpu::BufferUsages::INDEX,
            }
        );

        let fog_vertex_buffer = vertex_buffer(&device, "Fog Vertex Buffer");
        let line_vertex_buffer = vertex_buffer(&device, "Line Vertex Buffer");
        let circle_instance_buffer = vertex_buffer(&device, "Circle Instance Buffer");

        Ok(Self {
            surface, device, queue, config, is_surface_configured: false,
            screen_uniform, screen_buffer, screen_bind_group, screen_needs_update: true,
            fog_render_pipeline, line_render_pipeline, circle_render_pipeline,
            fog_vertices: Vec::new(), fog_vertex_buffer,
            line_vertices: Vec::new(), line_vertex_buffer,
            circle_instances: Vec::new(), circle_instance_buffer, quad_vertex_buffer, quad_index_buffer,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            log::info!("Resize surface {}, {}", width, height);
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.is_surface_configured = true;
        }
    }

    /// Converts a recorded frame into vertex data and uploads it.
    pub fn upload_frame(&mut self, frame: &CommandList) {
        for command in frame.commands() {
            match command {
                DrawCommand::Configure(viewport) => {
                    self.screen_uniform.size = [viewport.width.max(1.0), viewport.height.max(1.0)];
                    self.screen_needs_update = true;
                }
                DrawCommand::Clear { .. } => {
                    self.fog_vertices.clear();
                    self.line_vertices.clear();
                    self.circle_instances.clear();
                }
                DrawCommand::FillGradient { gradient, size } => {
                    tessellate_fog(gradient, *size, FOG_CELLS, &mut self.fog_vertices);
                }
                DrawCommand::StrokeLine { from, to, color, .. } => {
                    // wgpu lines are always one pixel wide
                    let color = linear(*color);
                    self.line_vertices.push(ColorVertex { position: (*from).into(), color });
                    self.line_vertices.push(ColorVertex { position: (*to).into(), color });
                }
                DrawCommand::FillCircle { center, radius, color } => {
                    self.circle_instances.push(CircleInstance {
                        position: (*center).into(),
                        radius: *radius,
                        color: linear(*color),
                    });
                }
            }
        }
        self.update_gpu_buffers();
    }

    fn update_gpu_buffers(&mut self) {
        upload(&self.device, &self.queue, &mut self.fog_vertex_buffer, "Fog Vertex Buffer (Resized)",
            bytemuck::cast_slice(&self.fog_vertices));
        upload(&self.device, &self.queue, &mut self.line_vertex_buffer, "Line Vertex Buffer (Resized)",
            bytemuck::cast_slice(&self.line_vertices));
        upload(&self.device, &self.queue, &mut self.circle_instance_buffer, "Circle Instance Buffer (Resized)",
            bytemuck::cast_slice(&self.circle_instances));
    }

    pub fn update(&mut self) -> bool {
        if self.screen_needs_update {
            self.queue.write_buffer(
                &self.screen_buffer,
                0,
                bytemuck::cast_slice(&[self.screen_uniform]),
            );
            self.screen_needs_update = false;
            return true;
        }
        false
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let clear = LinearRgba::from(CLEAR_COLOR);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.red as f64,
                            g: clear.green as f64,
                            b: clear.blue as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.screen_bind_group, &[]);

            // fog, then edges, then points
            if !self.fog_vertices.is_empty() {
                render_pass.set_pipeline(&self.fog_render_pipeline);
                render_pass.set_vertex_buffer(0, self.fog_vertex_buffer.slice(..));
                render_pass.draw(0..self.fog_vertices.len() as u32, 0..1);
            }

            if !self.line_vertices.is_empty() {
                render_pass.set_pipeline(&self.line_render_pipeline);
                render_pass.set_vertex_buffer(0, self.line_vertex_buffer.slice(..));
                render_pass.draw(0..self.line_vertices.len() as u32, 0..1);
            }

            if !self.circle_instances.is_empty() {
                render_pass.set_pipeline(&self.circle_render_pipeline);
                render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.circle_instance_buffer.slice(..));
                render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(
                    0..Vertex2D::QUAD_INDICES.len() as u32,
                    0,
                    0..self.circle_instances.len() as u32,
                );
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Viewport;
    use crate::style::FogStyle;

    #[test]
    fn fog_covers_the_viewport() {
        let viewport = Viewport::new(300.0, 200.0, 1.0);
        let gradient = FogStyle::DEFAULT.gradient(&viewport);
        let mut out = Vec::new();
        tessellate_fog(&gradient, Vec2::new(300.0, 200.0), 4, &mut out);

        assert_eq!(out.len(), 4 * 4 * 6);
        let max = out.iter().fold(Vec2::ZERO, |m, v| m.max(Vec2::from(v.position)));
        let min = out.iter().fold(Vec2::splat(f32::MAX), |m, v| m.min(Vec2::from(v.position)));
        assert_eq!(min, Vec2::ZERO);
        assert!((max - Vec2::new(300.0, 200.0)).length() < 1e-3);
        // alpha never exceeds the outer stop
        let corner_alpha = out.iter().map(|v| v.color[3]).fold(0.0f32, f32::max);
        assert!(corner_alpha <= 0.40 + 1e-5);
    }
}
