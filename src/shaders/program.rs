use std::sync::Arc;

use anyhow::{anyhow, Context};
use vulkano::{
    device::Device,
    pipeline::{
        graphics::{
            color_blend::{AttachmentBlend, BlendFactor, BlendOp, ColorBlendState},
            depth_stencil::{CompareOp, DepthStencilState},
            input_assembly::InputAssemblyState,
            rasterization::{CullMode, RasterizationState},
            vertex_input::Vertex,
            viewport::ViewportState,
        },
        GraphicsPipeline, StateMode,
    },
    render_pass::Subpass,
    shader::ShaderModule,
};

use super::{CompilePolicy, ShaderError, ShaderObject, ShaderStage};

/// Fixed pipeline state that the GL programs set with `glEnable` and friends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    /// Depth test with the given comparison, or no depth test at all.
    pub depth_compare: Option<CompareOp>,
    /// `glBlendFunc(GL_SRC_ALPHA, GL_ONE_MINUS_SRC_ALPHA)`.
    pub alpha_blend: bool,
}

impl PipelineOptions {
    pub fn depth_tested(compare_op: CompareOp) -> Self {
        PipelineOptions {
            depth_compare: Some(compare_op),
            alpha_blend: false,
        }
    }

    pub fn alpha_blended() -> Self {
        PipelineOptions {
            depth_compare: None,
            alpha_blend: true,
        }
    }

    fn depth_stencil_state(&self) -> Option<DepthStencilState> {
        let compare_op = self.depth_compare?;
        let mut state = DepthStencilState::simple_depth_test();
        if let Some(depth) = state.depth.as_mut() {
            depth.compare_op = StateMode::Fixed(compare_op);
        }
        Some(state)
    }

    fn blend(&self) -> Option<AttachmentBlend> {
        self.alpha_blend.then_some(AttachmentBlend {
            color_op: BlendOp::Add,
            color_source: BlendFactor::SrcAlpha,
            color_destination: BlendFactor::OneMinusSrcAlpha,
            alpha_op: BlendOp::Add,
            alpha_source: BlendFactor::SrcAlpha,
            alpha_destination: BlendFactor::OneMinusSrcAlpha,
        })
    }
}

/// A linked vertex + fragment pair. Owns both shader modules for as long as
/// the pipeline built from them is alive.
pub struct ShaderProgram {
    _vertex: Arc<ShaderModule>,
    _fragment: Arc<ShaderModule>,
    pipeline: Arc<GraphicsPipeline>,
}

impl ShaderProgram {
    /// Attach both stages and link them into a graphics pipeline for
    /// vertices of type `V`.
    pub fn link<V: Vertex>(
        device: Arc<Device>,
        subpass: Subpass,
        vertex: &ShaderObject,
        fragment: &ShaderObject,
        options: &PipelineOptions,
    ) -> anyhow::Result<Self> {
        expect_stage(vertex, ShaderStage::Vertex)?;
        expect_stage(fragment, ShaderStage::Fragment)?;

        let vertex_module = create_module(device.clone(), vertex)?;
        let fragment_module = create_module(device.clone(), fragment)?;

        let vertex_entry = vertex_module
            .entry_point("main")
            .ok_or_else(|| anyhow!("`{}` has no `main` entry point", vertex.name()))?;
        let fragment_entry = fragment_module
            .entry_point("main")
            .ok_or_else(|| anyhow!("`{}` has no `main` entry point", fragment.name()))?;

        let mut builder = GraphicsPipeline::start()
            .vertex_input_state(V::per_vertex())
            .vertex_shader(vertex_entry, ())
            .input_assembly_state(InputAssemblyState::new())
            .viewport_state(ViewportState::viewport_dynamic_scissor_irrelevant())
            .fragment_shader(fragment_entry, ())
            .rasterization_state(RasterizationState::new().cull_mode(CullMode::None));

        if let Some(depth_stencil) = options.depth_stencil_state() {
            builder = builder.depth_stencil_state(depth_stencil);
        }

        if let Some(blend) = options.blend() {
            builder = builder
                .color_blend_state(ColorBlendState::new(subpass.num_color_attachments()).blend(blend));
        }

        let pipeline = builder
            .render_pass(subpass)
            .build(device)
            .with_context(|| format!("failed to link `{}` with `{}`", vertex.name(), fragment.name()))?;

        log::info!("linked shader program `{}` + `{}`", vertex.name(), fragment.name());

        Ok(ShaderProgram {
            _vertex: vertex_module,
            _fragment: fragment_module,
            pipeline,
        })
    }

    /// Link under a compile policy. With `CompilePolicy::Unchecked` a stage
    /// that failed to compile leaves the program absent instead of stopping
    /// the process.
    pub fn link_with_policy<V: Vertex>(
        policy: CompilePolicy,
        device: Arc<Device>,
        subpass: Subpass,
        vertex: &ShaderObject,
        fragment: &ShaderObject,
        options: &PipelineOptions,
    ) -> anyhow::Result<Option<Self>> {
        policy.enforce(vertex);
        policy.enforce(fragment);

        if let Some(failed) = [vertex, fragment].into_iter().find(|s| !s.compile_status()) {
            log::warn!(
                "{} shader `{}` did not compile, nothing will be drawn with it:\n{}",
                failed.stage(),
                failed.name(),
                failed.info_log()
            );
            return Ok(None);
        }

        Self::link::<V>(device, subpass, vertex, fragment, options).map(Some)
    }

    pub fn pipeline(&self) -> &Arc<GraphicsPipeline> {
        &self.pipeline
    }
}

fn expect_stage(shader: &ShaderObject, expected: ShaderStage) -> Result<(), ShaderError> {
    if shader.stage() != expected {
        return Err(ShaderError::StageMismatch {
            name: shader.name().to_owned(),
            expected,
            actual: shader.stage(),
        });
    }
    Ok(())
}

fn create_module(device: Arc<Device>, shader: &ShaderObject) -> anyhow::Result<Arc<ShaderModule>> {
    let words = shader.spirv()?;

    // SAFETY: the words come straight out of shaderc for this stage.
    let module = unsafe { ShaderModule::from_words(device, words) }
        .with_context(|| format!("failed to create shader module for `{}`", shader.name()))?;

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{ShaderCompiler, ShaderSource};

    #[test]
    fn depth_tested_options_use_the_given_compare_op() {
        let options = PipelineOptions::depth_tested(CompareOp::LessOrEqual);
        assert!(!options.alpha_blend);
        assert!(options.blend().is_none());

        let state = options.depth_stencil_state().unwrap();
        let depth = state.depth.unwrap();
        assert!(matches!(depth.compare_op, StateMode::Fixed(CompareOp::LessOrEqual)));
    }

    #[test]
    fn alpha_blended_options_skip_the_depth_test() {
        let options = PipelineOptions::alpha_blended();
        assert!(options.depth_stencil_state().is_none());

        let blend = options.blend().unwrap();
        assert!(matches!(blend.color_source, BlendFactor::SrcAlpha));
        assert!(matches!(blend.color_destination, BlendFactor::OneMinusSrcAlpha));
        assert!(matches!(blend.color_op, BlendOp::Add));
    }

    #[test]
    fn stage_mismatch_is_rejected() {
        let mut compiler = ShaderCompiler::new().unwrap();
        let fragment = compiler.compile(
            ShaderStage::Fragment,
            &ShaderSource::from_text(
                "solid.frag",
                "#version 450\nlayout(location = 0) out vec4 c;\nvoid main() { c = vec4(1.0); }\n",
            ),
        );

        let err = expect_stage(&fragment, ShaderStage::Vertex).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::StageMismatch {
                expected: ShaderStage::Vertex,
                actual: ShaderStage::Fragment,
                ..
            }
        ));
    }
}
