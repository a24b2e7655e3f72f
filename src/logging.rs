use log::LevelFilter;

/// Default verbosity: everything in debug builds, milestones in release.
pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Install the console logger. Called once at the top of each binary.
pub fn init(level: LevelFilter) {
    if let Err(e) = fast_log::init(fast_log::Config::new().console().level(level)) {
        eprintln!("failed to initialise logging: {e}");
    }
}

/// Drain the async log channel. Needed before `std::process::exit`, which
/// skips destructors.
pub fn flush() {
    log::logger().flush();
}
