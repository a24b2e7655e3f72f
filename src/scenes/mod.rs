pub mod teapot;
pub mod triangle;

use crate::{
    config,
    render_system::RenderSystem,
    shaders::{ClipSpace, ShaderCompiler, ShaderObject, ShaderSource, ShaderStage},
};

/// One demo program: built once, then updated and drawn every frame.
pub trait Scene {
    fn setup(&mut self, render_system: &mut RenderSystem) -> anyhow::Result<()>;

    /// Advance by exactly one tick.
    fn update(&mut self);

    fn draw(&mut self, render_system: &mut RenderSystem) -> anyhow::Result<()>;
}

/// Load and compile a vertex/fragment pair from the shader asset directory.
/// Compile failures are returned inside the objects, not as errors.
pub fn compile_shader_pair(
    clip_space: ClipSpace,
    vertex_file: &str,
    fragment_file: &str,
) -> anyhow::Result<(ShaderObject, ShaderObject)> {
    let dir = config::shader_dir();
    let vertex_source = ShaderSource::load(&dir, vertex_file)?;
    let fragment_source = ShaderSource::load(&dir, fragment_file)?;

    let mut compiler = ShaderCompiler::for_clip_space(clip_space)?;
    let vertex = compiler.compile(ShaderStage::Vertex, &vertex_source);
    let fragment = compiler.compile(ShaderStage::Fragment, &fragment_source);

    Ok((vertex, fragment))
}
