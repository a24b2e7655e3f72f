use vulkano::{buffer::BufferContents, pipeline::graphics::vertex_input::Vertex};

/// Position + normal, matched by name against the teapot vertex shader inputs.
#[derive(BufferContents, Vertex, Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct NormalVertex {
    #[format(R32G32B32_SFLOAT)]
    pub position: [f32; 3],
    #[format(R32G32B32_SFLOAT)]
    pub vertex_normal: [f32; 3],
}

/// Position only. The field carries the triangle shader's attribute name.
#[allow(non_snake_case)]
#[derive(BufferContents, Vertex, Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct PositionVertex {
    #[format(R32G32B32_SFLOAT)]
    pub aPos: [f32; 3],
}
