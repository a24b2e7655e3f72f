pub mod config;
pub mod geometry;
pub mod host;
pub mod logging;
pub mod render_system;
pub mod scenes;
pub mod shaders;
pub mod simulation;
