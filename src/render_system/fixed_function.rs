use nalgebra_glm::{identity, perspective, vec4, TMat4};
use vulkano::buffer::BufferContents;

use super::lighting::LightSource;

/// Number of light slots the shaders read.
pub const MAX_LIGHTS: usize = 2;

/// `gl_LightSource[i]` as laid out in the `FixedFunction` uniform block.
#[derive(BufferContents, Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct LightSourceData {
    pub position: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

/// std140 image of the `FixedFunction` block in `teapot.vert`/`teapot.frag`.
#[derive(BufferContents, Clone, Copy, Debug)]
#[repr(C)]
pub struct FixedFunctionData {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub light_source: [LightSourceData; MAX_LIGHTS],
    pub color: [f32; 4],
    pub time: f32,
    pub _padding: [f32; 3],
}

impl From<&LightSource> for LightSourceData {
    fn from(light: &LightSource) -> Self {
        LightSourceData {
            position: light.position,
            diffuse: light.diffuse,
            specular: light.specular,
        }
    }
}

/// Maps GL clip space (y up, z in [-w, w]) onto Vulkan's (y down, z in [0, w]).
fn clip_correction() -> TMat4<f32> {
    TMat4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, -1.0, 0.0, 0.0, //
        0.0, 0.0, 0.5, 0.5, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// The slice of legacy GL state the teapot shaders consume: both matrix
/// stacks, the light table, the current colour and elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFunctionState {
    pub projection: TMat4<f32>,
    pub model_view: TMat4<f32>,
    pub normal_matrix: TMat4<f32>,
    pub lights: [LightSource; MAX_LIGHTS],
    pub color: [f32; 4],
    pub time: f32,
}

impl Default for FixedFunctionState {
    fn default() -> Self {
        FixedFunctionState {
            projection: identity(),
            model_view: identity(),
            normal_matrix: identity(),
            lights: [LightSource::default(); MAX_LIGHTS],
            color: [1.0, 1.0, 1.0, 1.0],
            time: 0.0,
        }
    }
}

impl FixedFunctionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `gluPerspective`, already corrected for Vulkan clip space.
    pub fn set_perspective(&mut self, fovy_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.projection = clip_correction() * perspective(aspect, fovy_degrees.to_radians(), near, far);
    }

    pub fn load_identity(&mut self) {
        self.model_view = identity();
        self.normal_matrix = identity();
    }

    pub fn set_model_view(&mut self, model_view: TMat4<f32>, normal_matrix: TMat4<f32>) {
        self.model_view = model_view;
        self.normal_matrix = normal_matrix;
    }

    /// Like `glLightfv(GL_POSITION)`, the position is stored in eye space
    /// using the model-view matrix current at the time of the call.
    pub fn set_light(&mut self, index: usize, light: LightSource) {
        let Some(slot) = self.lights.get_mut(index) else {
            log::warn!("ignoring light {index}, only {MAX_LIGHTS} are supported");
            return;
        };

        let [x, y, z, w] = light.position;
        let eye = self.model_view * vec4(x, y, z, w);

        *slot = LightSource {
            position: [eye.x, eye.y, eye.z, eye.w],
            ..light
        };
    }

    pub fn data(&self) -> FixedFunctionData {
        FixedFunctionData {
            model_view: self.model_view.into(),
            projection: self.projection.into(),
            normal_matrix: self.normal_matrix.into(),
            light_source: [(&self.lights[0]).into(), (&self.lights[1]).into()],
            color: self.color,
            time: self.time,
            _padding: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::{translate, vec3};

    #[test]
    fn uniform_block_matches_std140_size() {
        assert_eq!(std::mem::size_of::<LightSourceData>(), 48);
        assert_eq!(std::mem::size_of::<FixedFunctionData>(), 320);
    }

    #[test]
    fn perspective_targets_vulkan_clip_space() {
        let mut state = FixedFunctionState::new();
        let aspect = 800.0 / 600.0;
        state.set_perspective(45.0, aspect, 0.1, 100.0);

        let p = state.projection;
        assert!(p[(1, 1)] < 0.0, "y must point down");
        assert!((p[(0, 0)] / -p[(1, 1)] - 1.0 / aspect).abs() < 1e-5);

        // near plane lands on depth 0, far plane on depth 1
        let near = p * vec4(0.0, 0.0, -0.1, 1.0);
        let far = p * vec4(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn light_position_follows_current_model_view() {
        let mut state = FixedFunctionState::new();
        let light = LightSource {
            position: [1.0, 2.0, 3.0, 1.0],
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
        };

        state.set_light(0, light);
        assert_eq!(state.lights[0], light);

        state.model_view = translate(&identity(), &vec3(0.0, 0.0, -5.0));
        state.set_light(1, light);
        assert_eq!(state.lights[1].position, [1.0, 2.0, -2.0, 1.0]);
        assert_eq!(state.lights[1].diffuse, light.diffuse);
    }

    #[test]
    fn out_of_range_light_is_ignored() {
        let mut state = FixedFunctionState::new();
        state.set_light(MAX_LIGHTS, LightSource::default());
        assert_eq!(state, FixedFunctionState::new());
    }

    #[test]
    fn data_copies_matrices_column_major() {
        let mut state = FixedFunctionState::new();
        state.model_view = translate(&identity(), &vec3(1.0, 2.0, 3.0));
        state.time = 0.5;

        let data = state.data();
        // translation lives in the last column
        assert_eq!(data.model_view[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(data.color, [1.0; 4]);
        assert_eq!(data.time, 0.5);
    }
}
