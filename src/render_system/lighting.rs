/// One `GL_LIGHTi`: homogeneous position plus its colour terms.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub position: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}
