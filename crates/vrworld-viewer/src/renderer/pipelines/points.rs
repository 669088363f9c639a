//! Instanced billboard quads for the data points.
//!
//! Each point attribute lives in its own instance buffer so a refresh that
//! only flips selection flags re-uploads just that buffer.

use crate::plot::PointBuffer;
use wgpu::util::DeviceExt;

const POINTS_WGSL: &str = r#"
struct View {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> u_view: View;

struct VsIn {
    @location(0) corner: vec2<f32>,
    @location(1) center: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) size: f32,
    @location(4) selected: f32,
};

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) corner: vec2<f32>,
};

@vertex
fn vs_main(v: VsIn) -> VsOut {
    // Camera right/up are the first two rows of the view rotation.
    let right = vec3<f32>(u_view.view[0][0], u_view.view[1][0], u_view.view[2][0]);
    let up = vec3<f32>(u_view.view[0][1], u_view.view[1][1], u_view.view[2][1]);
    let half_size = v.size * mix(0.5, 0.75, v.selected);
    let world = v.center + (right * v.corner.x + up * v.corner.y) * half_size;

    var out: VsOut;
    out.clip = u_view.view_proj * vec4<f32>(world, 1.0);
    out.color = mix(v.color, vec3<f32>(1.0, 1.0, 1.0), v.selected);
    out.corner = v.corner;
    return out;
}

@fragment
fn fs_main(v: VsOut) -> @location(0) vec4<f32> {
    if (dot(v.corner, v.corner) > 1.0) {
        discard;
    }
    return vec4<f32>(v.color, 1.0);
}
"#;

struct InstanceBuffers {
    position: wgpu::Buffer,
    color: wgpu::Buffer,
    size: wgpu::Buffer,
    selected: wgpu::Buffer,
    len: u32,
}

pub struct PointsPipeline {
    pipeline: wgpu::RenderPipeline,
    quad_vb: wgpu::Buffer,
    instances: Option<InstanceBuffers>,
}

fn single_attr(
    location: u32,
    format: wgpu::VertexFormat,
) -> [wgpu::VertexAttribute; 1] {
    [wgpu::VertexAttribute {
        shader_location: location,
        offset: 0,
        format,
    }]
}

impl PointsPipeline {
    pub fn new(
        device: &wgpu::Device,
        view_layout: &wgpu::BindGroupLayout,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Points WGSL"),
            source: wgpu::ShaderSource::Wgsl(POINTS_WGSL.into()),
        });

        // Two triangles spanning [-1, 1]^2.
        let quad_corners: [[f32; 2]; 6] = [
            [-1.0, -1.0],
            [1.0, -1.0],
            [1.0, 1.0],
            [-1.0, -1.0],
            [1.0, 1.0],
            [-1.0, 1.0],
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Points Quad VB"),
            contents: bytemuck::cast_slice(&quad_corners),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let corner_attr = single_attr(0, wgpu::VertexFormat::Float32x2);
        let position_attr = single_attr(1, wgpu::VertexFormat::Float32x3);
        let color_attr = single_attr(2, wgpu::VertexFormat::Float32x3);
        let size_attr = single_attr(3, wgpu::VertexFormat::Float32);
        let selected_attr = single_attr(4, wgpu::VertexFormat::Float32);

        let f32_size = std::mem::size_of::<f32>() as u64;
        let vbuf_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: 2 * f32_size,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &corner_attr,
            },
            wgpu::VertexBufferLayout {
                array_stride: 3 * f32_size,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &position_attr,
            },
            wgpu::VertexBufferLayout {
                array_stride: 3 * f32_size,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &color_attr,
            },
            wgpu::VertexBufferLayout {
                array_stride: f32_size,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &size_attr,
            },
            wgpu::VertexBufferLayout {
                array_stride: f32_size,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &selected_attr,
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Points PipelineLayout"),
            bind_group_layouts: &[view_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_fmt,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            quad_vb,
            instances: None,
        }
    }

    /// Mirrors `buffer` to the GPU. A cloud of a new length gets fresh
    /// buffers; otherwise only attributes flagged dirty are written.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, buffer: &PointBuffer) {
        let len = buffer.len() as u32;
        if len == 0 {
            self.instances = None;
            return;
        }

        let stale = self.instances.as_ref().map_or(true, |inst| inst.len != len);
        if stale {
            let create = |label: &str, data: &[f32]| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(data),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                })
            };
            self.instances = Some(InstanceBuffers {
                position: create("Point Positions", buffer.positions()),
                color: create("Point Colors", buffer.colors()),
                size: create("Point Sizes", buffer.sizes()),
                selected: create("Point Selection", buffer.selected()),
                len,
            });
            log::debug!("Allocated GPU buffers for {} points", len);
            return;
        }
        let Some(inst) = &self.instances else {
            return;
        };

        let dirty = buffer.dirty();
        if !dirty.any() {
            return;
        }
        if dirty.position {
            queue.write_buffer(&inst.position, 0, bytemuck::cast_slice(buffer.positions()));
        }
        if dirty.color {
            queue.write_buffer(&inst.color, 0, bytemuck::cast_slice(buffer.colors()));
        }
        if dirty.size {
            queue.write_buffer(&inst.size, 0, bytemuck::cast_slice(buffer.sizes()));
        }
        if dirty.selected {
            queue.write_buffer(&inst.selected, 0, bytemuck::cast_slice(buffer.selected()));
        }
    }

    /// Drops the GPU copy, e.g. when the scene has no point cloud.
    pub fn clear(&mut self) {
        self.instances = None;
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, view: &'a wgpu::BindGroup) {
        let Some(inst) = &self.instances else {
            return;
        };
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, view, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, inst.position.slice(..));
        rpass.set_vertex_buffer(2, inst.color.slice(..));
        rpass.set_vertex_buffer(3, inst.size.slice(..));
        rpass.set_vertex_buffer(4, inst.selected.slice(..));
        rpass.draw(0..6, 0..inst.len);
    }
}
