//! Clock configuration
//!
//! The firmware embeds a `clock.toml` at build time and reads it with
//! [`parse_config`] at boot.

mod parse;
mod types;

pub use parse::{parse_config, ParseError, ParseErrorKind};
pub use types::{
    AxisHwConfig, BridgeConfig, ClockConfig, ClockTiming, ConfigError, SpeedProfile,
    StatusConfig, MAX_UTC_OFFSET_MINUTES,
};
