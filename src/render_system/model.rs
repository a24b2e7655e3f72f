use nalgebra_glm::{identity, inverse_transpose, rotate_normalized_axis, translate, TMat4, TVec3};

/// CPU-side mesh plus the transform it is drawn with.
///
/// Transforms accumulate the way `glTranslatef`/`glRotatef` do: each call
/// post-multiplies, and nothing is recomputed until `model_matrices` is asked
/// for.
pub struct Model<V> {
    data: Vec<V>,
    translation: TMat4<f32>,
    rotation: TMat4<f32>,
    model: TMat4<f32>,
    normals: TMat4<f32>,
    requires_update: bool,
}

impl<V: Clone> Model<V> {
    pub fn new(data: Vec<V>) -> Self {
        Model {
            data,
            translation: identity(),
            rotation: identity(),
            model: identity(),
            normals: identity(),
            requires_update: false,
        }
    }

    pub fn data(&self) -> &[V] {
        &self.data
    }

    pub fn vertex_count(&self) -> usize {
        self.data.len()
    }

    /// The model matrix and the matrix its normals are transformed with.
    pub fn model_matrices(&mut self) -> (TMat4<f32>, TMat4<f32>) {
        if self.requires_update {
            self.model = self.translation * self.rotation;
            self.normals = inverse_transpose(self.model);
            self.requires_update = false;
        }
        (self.model, self.normals)
    }

    pub fn rotate(&mut self, radians: f32, v: TVec3<f32>) {
        self.rotation = rotate_normalized_axis(&self.rotation, radians, &v);
        self.requires_update = true;
    }

    pub fn translate(&mut self, v: TVec3<f32>) {
        self.translation = translate(&self.translation, &v);
        self.requires_update = true;
    }

    pub fn reset_translation(&mut self) {
        self.translation = identity();
        self.requires_update = true;
    }

    /// Return the model's rotation to 0
    pub fn zero_rotation(&mut self) {
        self.rotation = identity();
        self.requires_update = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::{vec3, vec4};

    fn model() -> Model<[f32; 3]> {
        Model::new(vec![[0.0; 3]; 3])
    }

    #[test]
    fn fresh_model_is_untransformed() {
        let mut m = model();
        let (model, normals) = m.model_matrices();
        assert_eq!(model, identity());
        assert_eq!(normals, identity());
        assert_eq!(m.vertex_count(), 3);
    }

    #[test]
    fn translation_is_applied_after_rotation() {
        let mut m = model();
        m.translate(vec3(0.0, 0.0, -8.0));
        m.rotate(std::f32::consts::FRAC_PI_2, vec3(0.0, 1.0, 0.0));

        let (model, _) = m.model_matrices();
        let p = model * vec4(1.0, 0.0, 0.0, 1.0);

        // +x swings to -z, then the whole thing moves back by 8
        assert!(p.x.abs() < 1e-6);
        assert!((p.z + 9.0).abs() < 1e-6);
    }

    #[test]
    fn resets_return_to_identity() {
        let mut m = model();
        m.translate(vec3(1.0, 2.0, 3.0));
        m.rotate(1.0, vec3(0.0, 1.0, 0.0));
        let _ = m.model_matrices();

        m.reset_translation();
        m.zero_rotation();
        let (model, normals) = m.model_matrices();
        assert_eq!(model, identity());
        assert_eq!(normals, identity());
    }

    #[test]
    fn normal_matrix_ignores_translation() {
        let mut m = model();
        m.translate(vec3(5.0, -3.0, 2.0));
        let (_, normals) = m.model_matrices();

        let n = normals * vec4(0.0, 1.0, 0.0, 0.0);
        assert!((n - vec4(0.0, 1.0, 0.0, 0.0)).norm() < 1e-6);
    }
}
