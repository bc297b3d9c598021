//! Configuration loading
//!
//! `clock.toml` is compiled into the image and validated by `build.rs`, so
//! a parse failure here means the reader and the build script disagree.
//! The clock still boots on the reference defaults in that case.

use defmt::*;

use railclock_core::config::{parse_config, ClockConfig};

/// Embedded configuration; edit clock.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../clock.toml");

/// Parse the embedded configuration, falling back to defaults
pub fn load() -> ClockConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using reference defaults");
            ClockConfig::default()
        }
    }
}

/// Log the values that are easy to get wrong on a new build
pub fn log_summary(config: &ClockConfig) {
    info!(
        "Drive: {} steps/rev over {} um, {} steps/mm",
        config.drive.steps_per_rev(),
        config.drive.travel_per_rev_um,
        config.drive.position_to_steps(1000)
    );
    info!(
        "Track: home {} mm, dial {}-{} mm, right limit {} mm",
        config.track.home_mm,
        config.track.start_mm,
        config.track.end_mm(),
        config.track.right_limit_mm
    );
    info!("UTC offset: {} min", config.utc_offset_minutes);
}
