//! RP2040-specific HAL for the rail clock firmware
//!
//! Implements the `railclock-hal` traits on top of `embassy-rp` and
//! `embassy-time`:
//!
//! - GPIO output wrappers for the driver and status lines
//! - A tick alarm driven by an `embassy_time::Ticker` task
//! - Limit switch edge watching with the level kept in an atomic
//! - An uptime-backed wall clock

#![no_std]
#![deny(unsafe_code)]

pub mod alarm;
pub mod gpio;
pub mod limit;
pub mod wall_clock;

pub use alarm::{AlarmArm, TickAlarm};
pub use gpio::RpOutput;
pub use limit::{LimitInput, LimitLevel};
pub use wall_clock::UptimeClock;
