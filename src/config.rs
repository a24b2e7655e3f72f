use std::path::PathBuf;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

/// Present with FIFO (vsync) rather than Immediate.
pub const VSYNC: bool = true;

/// Window parameters for one demo program. Everything except the caption is
/// fixed across both programs.
#[derive(Debug, Clone)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl WindowSettings {
    pub fn new(title: &str) -> Self {
        WindowSettings {
            title: title.to_owned(),
            width: WIDTH,
            height: HEIGHT,
            vsync: VSYNC,
        }
    }
}

/// Directory the shader assets are loaded from at startup.
pub fn shader_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("resources")
        .join("shaders")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_fixed_800_by_600() {
        let settings = WindowSettings::new("Vibrant");
        assert_eq!(settings.title, "Vibrant");
        assert_eq!((settings.width, settings.height), (800, 600));
        assert!(settings.vsync);
    }

    #[test]
    fn shader_dir_points_at_resources() {
        let dir = shader_dir();
        assert!(dir.ends_with("resources/shaders"));
        assert!(dir.join("teapot.vert").is_file());
    }
}
