//! Core data types for the viewer, focused on GPU data representation.

/// Per-view uniform buffer data, respecting std140 layout.
/// Must match the layout of `View` in the point and line shaders.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// View matrix alone, used to billboard point sprites.
    pub view: [[f32; 4]; 4],
}

/// One end of a line segment, uploaded to the line pipeline's vertex buffer.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

// Compile-time check against the WGSL-side struct size.
const _: [(); 128] = [(); core::mem::size_of::<ViewUniform>()];
