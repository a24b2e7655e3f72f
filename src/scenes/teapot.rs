use nalgebra_glm::vec3;
use vulkano::{buffer::Subbuffer, pipeline::graphics::depth_stencil::CompareOp};

use crate::{
    geometry::teapot::solid_teapot,
    render_system::{
        fixed_function::FixedFunctionState, model::Model, vertex::NormalVertex, RenderSystem,
    },
    shaders::{ClipSpace, CompilePolicy, PipelineOptions, ShaderProgram},
    simulation::{self, TeapotState},
};

use super::{compile_shader_pair, Scene};

pub const TITLE: &str = "Vibrant";

const TEAPOT_SIZE: f32 = 1.0;

const FIELD_OF_VIEW: f32 = 45.0;
const NEAR_CLIP: f32 = 0.1;
const FAR_CLIP: f32 = 100.0;

const FRONT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A solid teapot lit by two orbiting lights, drifting away from the camera
/// while it turns. Its shader compile status is never checked.
pub struct TeapotScene {
    state: TeapotState,
    teapot: Model<NormalVertex>,
    program: Option<ShaderProgram>,
    vertex_buffer: Option<Subbuffer<[NormalVertex]>>,
}

impl Default for TeapotScene {
    fn default() -> Self {
        Self::new()
    }
}

impl TeapotScene {
    pub fn new() -> Self {
        TeapotScene {
            state: TeapotState::default(),
            teapot: Model::new(solid_teapot(TEAPOT_SIZE)),
            program: None,
            vertex_buffer: None,
        }
    }

    pub fn state(&self) -> &TeapotState {
        &self.state
    }

    pub fn pipeline_options() -> PipelineOptions {
        PipelineOptions::depth_tested(CompareOp::LessOrEqual)
    }

    /// Everything the shaders read for the current tick: projection, lights
    /// placed with an identity model-view, then the camera transform.
    pub fn frame_state(&mut self, aspect_ratio: f32) -> FixedFunctionState {
        let mut ff = FixedFunctionState::new();
        ff.set_perspective(FIELD_OF_VIEW, aspect_ratio, NEAR_CLIP, FAR_CLIP);

        ff.load_identity();
        for (index, light) in self.state.lights.iter().enumerate() {
            ff.set_light(index, light.light_source());
        }

        let camera = &self.state.camera;
        self.teapot.reset_translation();
        self.teapot.zero_rotation();
        self.teapot.translate(vec3(0.0, 0.0, -camera.distance as f32));
        self.teapot.rotate((camera.angle as f32).to_radians(), vec3(0.0, 1.0, 0.0));

        let (model_view, normals) = self.teapot.model_matrices();
        ff.set_model_view(model_view, normals);

        ff.color = FRONT_COLOR;
        ff.time = self.state.time();
        ff
    }
}

impl Scene for TeapotScene {
    fn setup(&mut self, render_system: &mut RenderSystem) -> anyhow::Result<()> {
        let (vertex, fragment) = compile_shader_pair(
            ClipSpace::Vulkan,
            "teapot.vert",
            "teapot.frag",
        )?;

        self.program = ShaderProgram::link_with_policy::<NormalVertex>(
            CompilePolicy::Unchecked,
            render_system.device(),
            render_system.subpass()?,
            &vertex,
            &fragment,
            &Self::pipeline_options(),
        )?;

        self.vertex_buffer = Some(render_system.vertex_buffer(self.teapot.data().iter().copied())?);
        log::info!("uploaded teapot ({} vertices)", self.teapot.vertex_count());

        Ok(())
    }

    fn update(&mut self) {
        simulation::update(&mut self.state, 1);
    }

    fn draw(&mut self, render_system: &mut RenderSystem) -> anyhow::Result<()> {
        let frame = self.frame_state(render_system.aspect_ratio());

        let (Some(program), Some(vertex_buffer)) = (&self.program, &self.vertex_buffer) else {
            return Ok(());
        };

        let pipeline = program.pipeline().clone();
        let uniforms = render_system.uniform_buffer(frame.data())?;
        let descriptor_set = render_system.descriptor_set(&pipeline, 0, uniforms)?;

        render_system.draw(&pipeline, Some(descriptor_set), vertex_buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::{identity, rotate_normalized_axis, translate, TMat4};
    use std::f32::consts::FRAC_PI_4;

    fn assert_close(a: &TMat4<f32>, b: &TMat4<f32>) {
        assert!((a - b).norm() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn teapot_is_depth_tested_with_less_or_equal() {
        let options = TeapotScene::pipeline_options();
        assert_eq!(options.depth_compare, Some(CompareOp::LessOrEqual));
        assert!(!options.alpha_blend);
    }

    #[test]
    fn first_frame_after_one_tick() {
        let mut scene = TeapotScene::new();
        scene.update();

        assert!((scene.state().lights[0].angle - 0.02).abs() < 1e-9);
        assert!((scene.state().lights[1].angle - (std::f64::consts::FRAC_PI_4 - 0.03)).abs() < 1e-9);

        let frame = scene.frame_state(800.0 / 600.0);

        let expected = rotate_normalized_axis(
            &translate(&identity(), &vec3(0.0, 0.0, -8.01)),
            0.5f32.to_radians(),
            &vec3(0.0, 1.0, 0.0),
        );
        assert_close(&frame.model_view, &expected);
        assert_eq!(frame.color, FRONT_COLOR);
    }

    #[test]
    fn lights_are_placed_in_eye_space_before_the_camera_moves() {
        let mut scene = TeapotScene::new();
        let frame = scene.frame_state(800.0 / 600.0);

        // light0 starts on +x, light1 at 45 degrees with z copying y
        assert_eq!(frame.lights[0].position, [2.0, 0.0, 0.0, 1.0]);
        let [x, y, z, w] = frame.lights[1].position;
        let r = 2.0 * FRAC_PI_4.sin();
        assert!((x - r).abs() < 1e-5 && (y - r).abs() < 1e-5 && (z - r).abs() < 1e-5);
        assert_eq!(w, 1.0);

        assert_eq!(frame.lights[0].diffuse, [0.8, 0.8, 0.8, 1.0]);
        assert_eq!(frame.lights[1].specular, [0.8, 0.8, 0.8, 1.0]);
    }

    #[test]
    fn camera_transform_does_not_accumulate_between_frames() {
        let mut scene = TeapotScene::new();
        let first = scene.frame_state(1.0).model_view;
        let second = scene.frame_state(1.0).model_view;
        assert_close(&first, &second);
        assert_close(&first, &translate(&identity(), &vec3(0.0, 0.0, -8.0)));
    }

    #[test]
    fn projection_uses_the_true_window_aspect() {
        use crate::config::{HEIGHT, WIDTH};

        let mut scene = TeapotScene::new();
        let aspect = WIDTH as f32 / HEIGHT as f32;
        let projection = scene.frame_state(aspect).projection;

        // x is squeezed by 3/4 relative to y, not left square
        let ratio = projection[(0, 0)] / -projection[(1, 1)];
        assert!((ratio - 0.75).abs() < 1e-5, "ratio {ratio}");
    }

    #[test]
    fn time_uniform_tracks_ticks() {
        let mut scene = TeapotScene::new();
        for _ in 0..30 {
            scene.update();
        }
        assert!((scene.frame_state(1.0).time - 0.5).abs() < 1e-6);
    }
}
