//! Per-view uniform buffers: one for the window view and one per eye.

use crate::data::types::ViewUniform;

pub struct ViewSlot {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ViewSlot {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<ViewUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, uniform: &ViewUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }
}

pub struct ViewBindings {
    pub layout: wgpu::BindGroupLayout,
    pub mono: ViewSlot,
    pub left: ViewSlot,
    pub right: ViewSlot,
}

impl ViewBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("View UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ViewUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        Self {
            mono: ViewSlot::new(device, &layout, "Mono View UBO"),
            left: ViewSlot::new(device, &layout, "Left Eye UBO"),
            right: ViewSlot::new(device, &layout, "Right Eye UBO"),
            layout,
        }
    }
}
