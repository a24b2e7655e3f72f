use crate::render_system::vertex::PositionVertex;

/// Object-space corners of the single triangle, already in device coordinates.
pub const CORNERS: [[f32; 3]; 3] = [[-0.6, -0.5, 0.0], [0.6, -0.5, 0.0], [0.0, 0.5, 0.0]];

pub fn triangle() -> Vec<PositionVertex> {
    CORNERS
        .iter()
        .map(|&corner| PositionVertex { aPos: corner })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_keeps_corner_order() {
        let vertices = triangle();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0].aPos, [-0.6, -0.5, 0.0]);
        assert_eq!(vertices[1].aPos, [0.6, -0.5, 0.0]);
        assert_eq!(vertices[2].aPos, [0.0, 0.5, 0.0]);
    }
}
