//! Frame-count driven state of the teapot demo.
//!
//! Nothing here looks at wall-clock time: one call to [`update`] with
//! `ticks = 1` is one frame, and playback speed follows the frame rate.

use std::f64::consts::FRAC_PI_4;

use nalgebra_glm::{vec3, TVec3};

use crate::render_system::lighting::LightSource;

pub const TICKS_PER_SECOND: f64 = 60.0;

pub const LIGHT_RADIUS: f64 = 2.0;

pub const CAMERA_START_DISTANCE: f64 = 8.0;
pub const CAMERA_DISTANCE_STEP: f64 = 0.01;
/// Degrees per tick.
pub const CAMERA_ANGLE_STEP: f64 = 0.5;

/// A light circling the origin at a fixed radius.
#[derive(Debug, Clone, PartialEq)]
pub struct LightState {
    /// Radians, unbounded.
    pub angle: f64,
    pub angular_step: f64,
    pub radius: f64,
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl LightState {
    pub fn step(&mut self) {
        self.angle += self.angular_step;
    }

    pub fn position(&self) -> TVec3<f32> {
        orbit_position(self.angle, self.radius)
    }

    /// Homogeneous point light at the current orbit position.
    pub fn light_source(&self) -> LightSource {
        let p = self.position();
        LightSource {
            position: [p.x, p.y, p.z, 1.0],
            diffuse: self.diffuse,
            specular: self.specular,
        }
    }
}

/// Orbit position for `angle`. The sine term is used for both y and z, so
/// the orbit is a tilted ellipse rather than a circle in one plane.
pub fn orbit_position(angle: f64, radius: f64) -> TVec3<f32> {
    let x = radius * angle.cos();
    let y = radius * angle.sin();
    let z = radius * angle.sin();
    vec3(x as f32, y as f32, z as f32)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    /// Distance from the eye to the teapot; only ever grows.
    pub distance: f64,
    /// Degrees about y, no wraparound.
    pub angle: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        CameraState {
            distance: CAMERA_START_DISTANCE,
            angle: 0.0,
        }
    }
}

impl CameraState {
    pub fn step(&mut self) {
        self.distance += CAMERA_DISTANCE_STEP;
        self.angle += CAMERA_ANGLE_STEP;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeapotState {
    pub lights: [LightState; 2],
    pub camera: CameraState,
    pub ticks: u64,
}

impl Default for TeapotState {
    fn default() -> Self {
        TeapotState {
            lights: [
                LightState {
                    angle: 0.0,
                    angular_step: 0.02,
                    radius: LIGHT_RADIUS,
                    diffuse: [0.8, 0.8, 0.8, 1.0],
                    specular: [1.0, 1.0, 1.0, 1.0],
                },
                LightState {
                    angle: FRAC_PI_4,
                    angular_step: -0.03,
                    radius: LIGHT_RADIUS,
                    diffuse: [0.6, 0.6, 0.6, 1.0],
                    specular: [0.8, 0.8, 0.8, 1.0],
                },
            ],
            camera: CameraState::default(),
            ticks: 0,
        }
    }
}

impl TeapotState {
    /// Seconds as seen by the fragment shader, assuming 60 ticks a second.
    pub fn time(&self) -> f32 {
        (self.ticks as f64 / TICKS_PER_SECOND) as f32
    }
}

/// Advance `state` by `ticks` single steps.
pub fn update(state: &mut TeapotState, ticks: u32) {
    for _ in 0..ticks {
        for light in state.lights.iter_mut() {
            light.step();
        }
        state.camera.step();
        state.ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn initial_state() {
        let state = TeapotState::default();
        assert_eq!(state.lights[0].angle, 0.0);
        assert_eq!(state.lights[1].angle, FRAC_PI_4);
        assert_eq!(state.camera.distance, 8.0);
        assert_eq!(state.camera.angle, 0.0);
        assert_eq!(state.time(), 0.0);
    }

    #[test]
    fn one_tick() {
        let mut state = TeapotState::default();
        update(&mut state, 1);

        assert!((state.lights[0].angle - 0.02).abs() < EPSILON);
        assert!((state.lights[1].angle - (FRAC_PI_4 - 0.03)).abs() < EPSILON);
        assert!((state.camera.distance - 8.01).abs() < EPSILON);
        assert!((state.camera.angle - 0.5).abs() < EPSILON);
    }

    #[test]
    fn fifty_ticks_moves_light0_one_radian() {
        let mut state = TeapotState::default();
        update(&mut state, 50);
        assert!((state.lights[0].angle - 1.0).abs() < 1e-9);
    }

    #[test]
    fn angles_accumulate_linearly_per_light() {
        for n in [0u32, 1, 7, 60, 1000] {
            let mut state = TeapotState::default();
            update(&mut state, n);

            let n = n as f64;
            assert!((state.lights[0].angle - 0.02 * n).abs() < 1e-9);
            assert!((state.lights[1].angle - (FRAC_PI_4 - 0.03 * n)).abs() < 1e-9);
        }
    }

    #[test]
    fn camera_recedes_and_turns_without_wrapping() {
        for n in [0u32, 1, 100, 720, 1000] {
            let mut state = TeapotState::default();
            update(&mut state, n);

            let n = n as f64;
            assert!((state.camera.distance - (8.0 + 0.01 * n)).abs() < 1e-9);
            assert!((state.camera.angle - 0.5 * n).abs() < 1e-9);
        }

        let mut state = TeapotState::default();
        update(&mut state, 1000);
        assert!(state.camera.angle > 360.0);
    }

    #[test]
    fn batched_update_matches_single_steps() {
        let mut batched = TeapotState::default();
        update(&mut batched, 25);

        let mut stepped = TeapotState::default();
        for _ in 0..25 {
            update(&mut stepped, 1);
        }

        assert_eq!(batched, stepped);
    }

    #[test]
    fn time_follows_tick_count() {
        let mut state = TeapotState::default();
        update(&mut state, 90);
        assert_eq!(state.ticks, 90);
        assert!((state.time() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn orbit_position_reuses_sine_for_z() {
        for angle in [0.0, 0.3, FRAC_PI_4, 2.0, -1.1] {
            let p = orbit_position(angle, LIGHT_RADIUS);
            assert!((p.x as f64 - 2.0 * angle.cos()).abs() < 1e-6);
            assert!((p.y as f64 - 2.0 * angle.sin()).abs() < 1e-6);
            // z duplicates y instead of lying on a circle in one plane
            assert_eq!(p.y, p.z);
        }
    }

    #[test]
    fn light_source_is_a_point_light() {
        let mut state = TeapotState::default();
        update(&mut state, 1);

        let light = state.lights[1].light_source();
        let p = state.lights[1].position();
        assert_eq!(light.position, [p.x, p.y, p.z, 1.0]);
        assert_eq!(light.diffuse, [0.6, 0.6, 0.6, 1.0]);
        assert_eq!(light.specular, [0.8, 0.8, 0.8, 1.0]);
    }
}
