//! The GLUT solid teapot: Newell's Bézier patches, mirrored into a full
//! surface and tessellated on a fixed grid.

use nalgebra_glm::{cross, length, normalize, vec3, TVec3, U3};

use crate::render_system::vertex::NormalVertex;

/// Grid resolution per patch, as used by `glutSolidTeapot`.
pub const SUBDIVISIONS: usize = 14;

/// The first six patch definitions are quarter surfaces mirrored four ways;
/// the handle and spout are halves mirrored across y only.
const QUARTER_PATCHES: usize = 6;

/// Number of patches after mirroring.
pub const PATCH_COUNT: usize = QUARTER_PATCHES * 4 + (10 - QUARTER_PATCHES) * 2;

/// Tangents shorter than this mean the patch row collapsed to a point.
const DEGENERATE_EPSILON: f32 = 1.0e-4;

/// Parameter offset used to step off a collapsed row.
const DEGENERATE_OFFSET: f32 = 1.0e-3;

pub type ControlGrid = [[TVec3<f32>; 4]; 4];

const PATCHES: [[usize; 16]; 10] = [
    // rim
    [102, 103, 104, 105, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    // body
    [12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27],
    [24, 25, 26, 27, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40],
    // lid
    [96, 96, 96, 96, 97, 98, 99, 100, 101, 101, 101, 101, 0, 1, 2, 3],
    [0, 1, 2, 3, 106, 107, 108, 109, 110, 111, 112, 113, 114, 115, 116, 117],
    // bottom
    [118, 118, 118, 118, 124, 122, 119, 121, 123, 126, 125, 120, 40, 39, 38, 37],
    // handle
    [41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56],
    [53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 28, 65, 66, 67],
    // spout
    [68, 69, 70, 71, 72, 73, 74, 75, 76, 77, 78, 79, 80, 81, 82, 83],
    [80, 81, 82, 83, 84, 85, 86, 87, 88, 89, 90, 91, 92, 93, 94, 95],
];

const CONTROL_POINTS: [[f32; 3]; 127] = [
    [0.2, 0.0, 2.7], [0.2, -0.112, 2.7], [0.112, -0.2, 2.7], [0.0, -0.2, 2.7],
    [1.3375, 0.0, 2.53125], [1.3375, -0.749, 2.53125], [0.749, -1.3375, 2.53125],
    [0.0, -1.3375, 2.53125], [1.4375, 0.0, 2.53125], [1.4375, -0.805, 2.53125],
    [0.805, -1.4375, 2.53125], [0.0, -1.4375, 2.53125], [1.5, 0.0, 2.4], [1.5, -0.84, 2.4],
    [0.84, -1.5, 2.4], [0.0, -1.5, 2.4], [1.75, 0.0, 1.875], [1.75, -0.98, 1.875],
    [0.98, -1.75, 1.875], [0.0, -1.75, 1.875], [2.0, 0.0, 1.35], [2.0, -1.12, 1.35],
    [1.12, -2.0, 1.35], [0.0, -2.0, 1.35], [2.0, 0.0, 0.9], [2.0, -1.12, 0.9],
    [1.12, -2.0, 0.9], [0.0, -2.0, 0.9], [-2.0, 0.0, 0.9], [2.0, 0.0, 0.45], [2.0, -1.12, 0.45],
    [1.12, -2.0, 0.45], [0.0, -2.0, 0.45], [1.5, 0.0, 0.225], [1.5, -0.84, 0.225],
    [0.84, -1.5, 0.225], [0.0, -1.5, 0.225], [1.5, 0.0, 0.15], [1.5, -0.84, 0.15],
    [0.84, -1.5, 0.15], [0.0, -1.5, 0.15], [-1.6, 0.0, 2.025], [-1.6, -0.3, 2.025],
    [-1.5, -0.3, 2.25], [-1.5, 0.0, 2.25], [-2.3, 0.0, 2.025], [-2.3, -0.3, 2.025],
    [-2.5, -0.3, 2.25], [-2.5, 0.0, 2.25], [-2.7, 0.0, 2.025], [-2.7, -0.3, 2.025],
    [-3.0, -0.3, 2.25], [-3.0, 0.0, 2.25], [-2.7, 0.0, 1.8], [-2.7, -0.3, 1.8],
    [-3.0, -0.3, 1.8], [-3.0, 0.0, 1.8], [-2.7, 0.0, 1.575], [-2.7, -0.3, 1.575],
    [-3.0, -0.3, 1.35], [-3.0, 0.0, 1.35], [-2.5, 0.0, 1.125], [-2.5, -0.3, 1.125],
    [-2.65, -0.3, 0.9375], [-2.65, 0.0, 0.9375], [-2.0, -0.3, 0.9], [-1.9, -0.3, 0.6],
    [-1.9, 0.0, 0.6], [1.7, 0.0, 1.425], [1.7, -0.66, 1.425], [1.7, -0.66, 0.6],
    [1.7, 0.0, 0.6], [2.6, 0.0, 1.425], [2.6, -0.66, 1.425], [3.1, -0.66, 0.825],
    [3.1, 0.0, 0.825], [2.3, 0.0, 2.1], [2.3, -0.25, 2.1], [2.4, -0.25, 2.025],
    [2.4, 0.0, 2.025], [2.7, 0.0, 2.4], [2.7, -0.25, 2.4], [3.3, -0.25, 2.4], [3.3, 0.0, 2.4],
    [2.8, 0.0, 2.475], [2.8, -0.25, 2.475], [3.525, -0.25, 2.49375], [3.525, 0.0, 2.49375],
    [2.9, 0.0, 2.475], [2.9, -0.15, 2.475], [3.45, -0.15, 2.5125], [3.45, 0.0, 2.5125],
    [2.8, 0.0, 2.4], [2.8, -0.15, 2.4], [3.2, -0.15, 2.4], [3.2, 0.0, 2.4], [0.0, 0.0, 3.15],
    [0.8, 0.0, 3.15], [0.8, -0.45, 3.15], [0.45, -0.8, 3.15], [0.0, -0.8, 3.15],
    [0.0, 0.0, 2.85], [1.4, 0.0, 2.4], [1.4, -0.784, 2.4], [0.784, -1.4, 2.4], [0.0, -1.4, 2.4],
    [0.4, 0.0, 2.55], [0.4, -0.224, 2.55], [0.224, -0.4, 2.55], [0.0, -0.4, 2.55],
    [1.3, 0.0, 2.55], [1.3, -0.728, 2.55], [0.728, -1.3, 2.55], [0.0, -1.3, 2.55],
    [1.3, 0.0, 2.4], [1.3, -0.728, 2.4], [0.728, -1.3, 2.4], [0.0, -1.3, 2.4], [0.0, 0.0, 0.0],
    [1.425, -0.798, 0.0], [1.5, 0.0, 0.075], [1.425, 0.0, 0.0], [0.798, -1.425, 0.0],
    [0.0, -1.5, 0.075], [0.0, -1.425, 0.0], [1.5, -0.84, 0.075], [0.84, -1.5, 0.075],
];

/// Triangulated teapot of the given size, y up, spout along +x.
pub fn solid_teapot(size: f32) -> Vec<NormalVertex> {
    let mut vertices = Vec::with_capacity(PATCH_COUNT * SUBDIVISIONS * SUBDIVISIONS * 6);

    for grid in patches() {
        tessellate(&grid, SUBDIVISIONS, size, &mut vertices);
    }

    log::debug!("tessellated teapot: {} vertices", vertices.len());

    vertices
}

/// All control grids of the teapot in its native z-up frame.
pub fn patches() -> Vec<ControlGrid> {
    let mut grids = Vec::with_capacity(PATCH_COUNT);

    for (index, patch) in PATCHES.iter().enumerate() {
        grids.push(mirrored(patch, false, false));
        grids.push(mirrored(patch, false, true));

        if index < QUARTER_PATCHES {
            grids.push(mirrored(patch, true, false));
            grids.push(mirrored(patch, true, true));
        }
    }

    grids
}

// A single-axis mirror flips handedness, so the column order is reversed to
// keep every patch facing outward.
fn mirrored(patch: &[usize; 16], flip_x: bool, flip_y: bool) -> ControlGrid {
    let reverse = flip_x != flip_y;
    let mut grid = [[vec3(0.0, 0.0, 0.0); 4]; 4];

    for (row, points) in grid.iter_mut().enumerate() {
        for (column, point) in points.iter_mut().enumerate() {
            let source = if reverse { 3 - column } else { column };
            let [x, y, z] = CONTROL_POINTS[patch[row * 4 + source]];
            *point = vec3(
                if flip_x { -x } else { x },
                if flip_y { -y } else { y },
                z,
            );
        }
    }

    grid
}

fn bernstein(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

fn bernstein_derivative(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [
        -3.0 * s * s,
        3.0 * s * s - 6.0 * t * s,
        6.0 * t * s - 3.0 * t * t,
        3.0 * t * t,
    ]
}

/// Point on the patch; `u` runs along rows, `v` along columns.
pub fn evaluate(grid: &ControlGrid, u: f32, v: f32) -> TVec3<f32> {
    let bu = bernstein(u);
    let bv = bernstein(v);

    let mut point = vec3(0.0, 0.0, 0.0);
    for row in 0..4 {
        for column in 0..4 {
            point += grid[row][column] * (bu[row] * bv[column]);
        }
    }
    point
}

fn partials(grid: &ControlGrid, u: f32, v: f32) -> (TVec3<f32>, TVec3<f32>) {
    let bu = bernstein(u);
    let bv = bernstein(v);
    let du = bernstein_derivative(u);
    let dv = bernstein_derivative(v);

    let mut d_u = vec3(0.0, 0.0, 0.0);
    let mut d_v = vec3(0.0, 0.0, 0.0);
    for row in 0..4 {
        for column in 0..4 {
            d_u += grid[row][column] * (du[row] * bv[column]);
            d_v += grid[row][column] * (bu[row] * dv[column]);
        }
    }
    (d_u, d_v)
}

/// Outward unit normal at `(u, v)`.
pub fn surface_normal(grid: &ControlGrid, u: f32, v: f32) -> TVec3<f32> {
    let (d_u, d_v) = partials(grid, u, v);
    if length(&d_u) > DEGENERATE_EPSILON && length(&d_v) > DEGENERATE_EPSILON {
        return normalize(&cross::<f32, U3>(&d_v, &d_u));
    }

    // Collapsed row (lid knob, bottom centre): step just inside the patch.
    let u = u.clamp(DEGENERATE_OFFSET, 1.0 - DEGENERATE_OFFSET);
    let v = v.clamp(DEGENERATE_OFFSET, 1.0 - DEGENERATE_OFFSET);
    let (d_u, d_v) = partials(grid, u, v);
    normalize(&cross::<f32, U3>(&d_v, &d_u))
}

// glutSolidTeapot draws under rotate(270, x) * scale(size / 2) * translate(0, 0, -1.5).
fn place(point: &TVec3<f32>, size: f32) -> [f32; 3] {
    let scale = 0.5 * size;
    [scale * point.x, scale * (point.z - 1.5), -scale * point.y]
}

fn orient(normal: &TVec3<f32>) -> [f32; 3] {
    [normal.x, normal.z, -normal.y]
}

pub fn tessellate(
    grid: &ControlGrid,
    subdivisions: usize,
    size: f32,
    vertices: &mut Vec<NormalVertex>,
) {
    let step = 1.0 / subdivisions as f32;
    let stride = subdivisions + 1;

    let mut lattice = Vec::with_capacity(stride * stride);
    for i in 0..stride {
        let u = i as f32 * step;
        for j in 0..stride {
            let v = j as f32 * step;
            lattice.push(NormalVertex {
                position: place(&evaluate(grid, u, v), size),
                vertex_normal: orient(&surface_normal(grid, u, v)),
            });
        }
    }

    for i in 0..subdivisions {
        for j in 0..subdivisions {
            let a = lattice[i * stride + j];
            let b = lattice[(i + 1) * stride + j];
            let c = lattice[(i + 1) * stride + j + 1];
            let d = lattice[i * stride + j + 1];
            vertices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }
}
