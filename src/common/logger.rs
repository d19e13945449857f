use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

/// Installs the crate's `env_logger` backend once per process.
///
/// Levels default to `Info` and can be overridden with `RUST_LOG`, e.g.
/// `RUST_LOG=flightgroup::concurrency=trace` to follow leader/follower hand-off.
pub fn initialize_logger() {
    // Use call_once_force to recover if an earlier initialization attempt panicked.
    INIT.call_once_force(|_| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Info)
            .filter_module("flightgroup", LevelFilter::Info)
            .filter_module("flightgroup::concurrency", LevelFilter::Info)
            .filter_module("flightgroup::network", LevelFilter::Info)
            .format_timestamp_millis()
            .parse_default_env();

        // Avoid panicking if the logger was already initialized elsewhere.
        let _ = builder.try_init();
    });
}
