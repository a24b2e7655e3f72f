use vulkano::buffer::Subbuffer;

use crate::{
    geometry::triangle::triangle,
    render_system::{vertex::PositionVertex, RenderSystem},
    shaders::{ClipSpace, CompilePolicy, PipelineOptions, ShaderProgram},
};

use super::{compile_shader_pair, Scene};

pub const TITLE: &str = "Butterfly Effect";

/// A single static yellow triangle. Any shader compile failure ends the
/// process before the first frame.
#[derive(Default)]
pub struct TriangleScene {
    program: Option<ShaderProgram>,
    vertex_buffer: Option<Subbuffer<[PositionVertex]>>,
}

impl TriangleScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipeline_options() -> PipelineOptions {
        PipelineOptions::alpha_blended()
    }
}

impl Scene for TriangleScene {
    fn setup(&mut self, render_system: &mut RenderSystem) -> anyhow::Result<()> {
        let (vertex, fragment) = compile_shader_pair(
            ClipSpace::YUp,
            "triangle.vert",
            "triangle.frag",
        )?;

        self.program = ShaderProgram::link_with_policy::<PositionVertex>(
            CompilePolicy::FailFast,
            render_system.device(),
            render_system.subpass()?,
            &vertex,
            &fragment,
            &Self::pipeline_options(),
        )?;

        self.vertex_buffer = Some(render_system.vertex_buffer(triangle())?);

        Ok(())
    }

    fn update(&mut self) {}

    fn draw(&mut self, render_system: &mut RenderSystem) -> anyhow::Result<()> {
        let (Some(program), Some(vertex_buffer)) = (&self.program, &self.vertex_buffer) else {
            return Ok(());
        };

        render_system.draw(program.pipeline(), None, vertex_buffer)
    }
}
