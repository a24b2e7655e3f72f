use vibrant_demos::{
    config::WindowSettings,
    host, logging,
    scenes::triangle::{TriangleScene, TITLE},
};

fn main() -> anyhow::Result<()> {
    logging::init(logging::default_level());

    let result = host::run(WindowSettings::new(TITLE), TriangleScene::new());
    logging::flush();
    result
}
