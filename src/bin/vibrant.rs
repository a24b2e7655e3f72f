use vibrant_demos::{
    config::WindowSettings,
    host, logging,
    scenes::teapot::{TeapotScene, TITLE},
};

fn main() -> anyhow::Result<()> {
    logging::init(logging::default_level());

    let result = host::run(WindowSettings::new(TITLE), TeapotScene::new());
    logging::flush();
    result
}
