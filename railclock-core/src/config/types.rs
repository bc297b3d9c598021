//! Configuration type definitions
//!
//! Everything the clock needs to know about its mechanics, speeds and
//! wiring polarity. Defaults describe the reference build: a 600 mm dial on
//! a 660 mm rail, GT2 belt pulleys travelling 40 mm per revolution and
//! 1/16 microstepping.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motion::{DriveGeometry, StepTiming, TrackGeometry};

/// Largest accepted UTC offset magnitude, in minutes (±18 h)
pub const MAX_UTC_OFFSET_MINUTES: i16 = 18 * 60;

/// Step frequencies for each kind of move, in full steps per second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpeedProfile {
    /// Seeking the left limit switches at boot
    pub homing_hz: u32,
    /// Moving both hands to a newly set time
    pub set_time_hz: u32,
    /// Parking and the half-day return moves
    pub normal_hz: u32,
    /// Regular minute advance
    pub minute_hz: u32,
    /// Minute hand returning at the top of the hour
    pub minute_return_hz: u32,
    /// Hour hand stepping forward one hour, timed to land with the minute hand
    pub hour_advance_hz: u32,
    /// Hour hand moving over the whole dial at noon/midnight
    pub hour_slow_hz: u32,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        let minute_return_hz = 800;
        Self {
            homing_hz: 3000,
            set_time_hz: 3000,
            normal_hz: 800,
            minute_hz: 800,
            minute_return_hz,
            hour_advance_hz: Self::hour_advance_for(minute_return_hz),
            hour_slow_hz: 400,
        }
    }
}

impl SpeedProfile {
    /// Hour speed that covers one hour mark while the minute hand covers
    /// the whole dial at `minute_return_hz`
    pub fn hour_advance_for(minute_return_hz: u32) -> u32 {
        (minute_return_hz / 12).max(1)
    }

    fn all(&self) -> [u32; 7] {
        [
            self.homing_hz,
            self.set_time_hz,
            self.normal_hz,
            self.minute_hz,
            self.minute_return_hz,
            self.hour_advance_hz,
            self.hour_slow_hz,
        ]
    }
}

/// Delays and pauses, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockTiming {
    /// Driver enable/disable settle time around each move
    pub settle_ms: u32,
    /// Longest silence on an axis event queue during a move
    pub event_timeout_ms: u32,
    /// Orchestrator poll period
    pub poll_interval_ms: u32,
    /// Pause after the big sweeps in the rollover choreographies
    pub long_pause_ms: u32,
    /// Pause between the return moves of the half-day rollover
    pub short_pause_ms: u32,
}

impl Default for ClockTiming {
    fn default() -> Self {
        Self {
            settle_ms: 20,
            event_timeout_ms: 1000,
            poll_interval_ms: 1000,
            long_pause_ms: 2000,
            short_pause_ms: 1000,
        }
    }
}

impl ClockTiming {
    /// Timing handed to the step generators
    pub fn step_timing(&self) -> StepTiming {
        StepTiming {
            settle_ms: self.settle_ms,
            event_timeout_ms: self.event_timeout_ms,
        }
    }
}

/// Wiring polarity of one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisHwConfig {
    /// Driver enable input is active-low (A4988/TMC style)
    pub enable_active_low: bool,
    /// Limit switches pull the input low when pressed
    pub limit_active_low: bool,
    /// Direction line high moves the carriage away from the left limit
    pub forward_is_increasing: bool,
}

impl Default for AxisHwConfig {
    fn default() -> Self {
        Self {
            enable_active_low: true,
            limit_active_low: false,
            forward_is_increasing: true,
        }
    }
}

/// Fault indicator output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusConfig {
    /// Indicator lights when the line is driven low
    pub active_low: bool,
}

/// Wireless bridge module link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BridgeConfig {
    /// UART baud rate
    pub baud_rate: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self { baud_rate: 115_200 }
    }
}

/// Complete clock configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockConfig {
    /// Stepper drive train
    pub drive: DriveGeometry,
    /// Rail landmarks
    pub track: TrackGeometry,
    /// Move speeds
    pub speeds: SpeedProfile,
    /// Delays and pauses
    pub timing: ClockTiming,
    /// Hour carriage wiring
    pub hour_axis: AxisHwConfig,
    /// Minute carriage wiring
    pub minute_axis: AxisHwConfig,
    /// Fault indicator wiring
    pub status: StatusConfig,
    /// Bridge UART
    pub bridge: BridgeConfig,
    /// Local time offset from UTC, in minutes
    pub utc_offset_minutes: i16,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            drive: DriveGeometry::default(),
            track: TrackGeometry::default(),
            speeds: SpeedProfile::default(),
            timing: ClockTiming::default(),
            hour_axis: AxisHwConfig::default(),
            minute_axis: AxisHwConfig::default(),
            status: StatusConfig::default(),
            bridge: BridgeConfig::default(),
            // Japan Standard Time
            utc_offset_minutes: 9 * 60,
        }
    }
}

/// Inconsistent configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A drive factor is zero
    ZeroDriveFactor,
    /// A speed is zero
    ZeroSpeed,
    /// Landmarks are not ordered home ≤ start < end ≤ right limit
    TrackOrder,
    /// The homing seek cannot reach the left limit from the right limit
    SeekTooShort,
    /// A timing value is zero where a positive one is required
    ZeroTiming,
    /// UTC offset outside ±18 hours
    UtcOffsetOutOfRange,
    /// Bridge baud rate is zero
    ZeroBaudRate,
}

impl ClockConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let drive = &self.drive;
        if drive.timer_resolution_hz == 0
            || drive.full_steps_per_rev == 0
            || drive.microsteps == 0
            || drive.travel_per_rev_um == 0
        {
            return Err(ConfigError::ZeroDriveFactor);
        }

        if self.speeds.all().contains(&0) {
            return Err(ConfigError::ZeroSpeed);
        }

        let track = &self.track;
        if track.home_mm < 0
            || track.home_mm > track.start_mm
            || track.length_mm <= 0
            || track.end_mm() > track.right_limit_mm
        {
            return Err(ConfigError::TrackOrder);
        }
        if track.seek_mm < track.right_limit_mm {
            return Err(ConfigError::SeekTooShort);
        }

        if self.timing.event_timeout_ms == 0 || self.timing.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroTiming);
        }

        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::UtcOffsetOutOfRange);
        }

        if self.bridge.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }

        Ok(())
    }
}
