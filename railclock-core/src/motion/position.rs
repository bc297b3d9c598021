//! Position model
//!
//! Pure arithmetic between clock readings, rail positions and motor steps.
//! Rail positions are signed micrometres measured from the left limit
//! switch; axis positions are signed full steps from the same origin.
//!
//! # Rounding
//!
//! Every conversion rounds toward negative infinity. Going steps → µm →
//! steps therefore loses at most one step, and µm → steps → µm lands at most
//! one step's travel *below* the input, never above it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Micrometres per millimetre
pub const UM_PER_MM: i32 = 1000;

/// Hours shown on the dial
pub const HOURS_PER_DIAL: u8 = 12;

/// Minutes shown on the dial
pub const MINUTES_PER_DIAL: u8 = 60;

/// Stepper drive train parameters shared by both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriveGeometry {
    /// Alarm tick rate (ticks per second)
    pub timer_resolution_hz: u32,
    /// Full steps per motor revolution (200 for 1.8° motors)
    pub full_steps_per_rev: u32,
    /// Driver microstep divisor
    pub microsteps: u32,
    /// Carriage travel per motor revolution in micrometres
    pub travel_per_rev_um: u32,
}

impl Default for DriveGeometry {
    fn default() -> Self {
        Self {
            timer_resolution_hz: 1_000_000,
            full_steps_per_rev: 200,
            microsteps: 16,
            travel_per_rev_um: 40_000,
        }
    }
}

impl DriveGeometry {
    /// Steps per motor revolution, microstepping included
    pub fn steps_per_rev(&self) -> u32 {
        self.full_steps_per_rev.saturating_mul(self.microsteps).max(1)
    }

    /// Alarm period for a target step frequency
    ///
    /// One step needs two toggles, so the alarm runs at twice the step rate:
    /// `resolution / (2 × frequency)`, never less than one tick.
    pub fn tick_period(&self, step_hz: u32) -> u32 {
        let divisor = step_hz.saturating_mul(2).max(1);
        (self.timer_resolution_hz / divisor).max(1)
    }

    /// Whole steps needed to cover an unsigned distance
    pub fn distance_to_steps(&self, distance_um: u32) -> u32 {
        let steps = u64::from(distance_um) * u64::from(self.steps_per_rev())
            / u64::from(self.travel_per_rev_um.max(1));
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    /// Absolute step position for a rail position
    pub fn position_to_steps(&self, position_um: i32) -> i32 {
        let steps = (i64::from(position_um) * i64::from(self.steps_per_rev()))
            .div_euclid(i64::from(self.travel_per_rev_um.max(1)));
        clamp_i32(steps)
    }

    /// Rail position of an absolute step position
    pub fn steps_to_position(&self, steps: i32) -> i32 {
        let position = (i64::from(steps) * i64::from(self.travel_per_rev_um))
            .div_euclid(i64::from(self.steps_per_rev()));
        clamp_i32(position)
    }

    /// Travel covered by a single step, rounded up to whole micrometres
    pub fn step_travel_um(&self) -> i32 {
        let spr = self.steps_per_rev();
        clamp_i32(i64::from(self.travel_per_rev_um.div_ceil(spr)))
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Fixed landmarks along the rail, in millimetres from the left limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackGeometry {
    /// Parking position after homing, before the time is known
    pub home_mm: i32,
    /// Position of 0 hours / 0 minutes
    pub start_mm: i32,
    /// Length of the 12 hour / 60 minute scale
    pub length_mm: i32,
    /// Furthest commanded position, just short of the right limit switch
    pub right_limit_mm: i32,
    /// Distance driven left when seeking the left limit switch
    pub seek_mm: i32,
}

impl Default for TrackGeometry {
    fn default() -> Self {
        Self {
            home_mm: 10,
            start_mm: 35,
            length_mm: 600,
            right_limit_mm: 660,
            seek_mm: 700,
        }
    }
}

impl TrackGeometry {
    /// Position of the 12 hour / 60 minute mark
    pub fn end_mm(&self) -> i32 {
        self.start_mm + self.length_mm
    }

    /// Rail position of an hour-of-12
    ///
    /// `track_start + hour × track_length / 12`; hours wrap at 12.
    pub fn hour_position_um(&self, hour: u8) -> i32 {
        let hour = i64::from(hour % HOURS_PER_DIAL);
        let offset = hour * i64::from(self.length_mm) * i64::from(UM_PER_MM)
            / i64::from(HOURS_PER_DIAL);
        mm_to_um(self.start_mm) + clamp_i32(offset)
    }

    /// Rail position of a minute
    ///
    /// `track_start + minute × track_length / 60`; minutes wrap at 60.
    pub fn minute_position_um(&self, minute: u8) -> i32 {
        let minute = i64::from(minute % MINUTES_PER_DIAL);
        let offset = minute * i64::from(self.length_mm) * i64::from(UM_PER_MM)
            / i64::from(MINUTES_PER_DIAL);
        mm_to_um(self.start_mm) + clamp_i32(offset)
    }
}

/// Convert millimetres to micrometres
pub fn mm_to_um(mm: i32) -> i32 {
    mm.saturating_mul(UM_PER_MM)
}
