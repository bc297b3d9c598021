//! Wall-clock readings
//!
//! Converts a Unix epoch into the hour-of-12 / minute pair the hands show,
//! and classifies how far the hands need to move between two readings.

use crate::motion::position::{HOURS_PER_DIAL, MINUTES_PER_DIAL};

const SECONDS_PER_DAY: i64 = 86_400;

/// Local time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
    /// 0-59
    pub second: u8,
}

impl TimeOfDay {
    /// Local time of a Unix epoch, `utc_offset_minutes` east of UTC
    pub fn from_epoch(epoch: u64, utc_offset_minutes: i16) -> Self {
        let epoch = i64::try_from(epoch).unwrap_or(i64::MAX);
        let local = epoch.saturating_add(i64::from(utc_offset_minutes) * 60);
        let seconds = local.rem_euclid(SECONDS_PER_DAY);
        // All three fit in u8 after rem_euclid
        Self {
            hour: (seconds / 3600) as u8,
            minute: (seconds / 60 % 60) as u8,
            second: (seconds % 60) as u8,
        }
    }
}

/// What the hands show: hour-of-12 and minute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockReading {
    /// 0-11
    pub hour: u8,
    /// 0-59
    pub minute: u8,
}

impl ClockReading {
    /// Reading with both fields wrapped onto the dial
    pub fn new(hour: u8, minute: u8) -> Self {
        Self {
            hour: hour % HOURS_PER_DIAL,
            minute: minute % MINUTES_PER_DIAL,
        }
    }

    /// Dial reading of a Unix epoch
    pub fn from_epoch(epoch: u64, utc_offset_minutes: i16) -> Self {
        let time = TimeOfDay::from_epoch(epoch, utc_offset_minutes);
        Self::new(time.hour, time.minute)
    }

    /// How the hands have to move to get from `previous` to `self`
    pub fn advance_from(&self, previous: &ClockReading) -> Advance {
        if self.hour != previous.hour {
            if self.hour == 0 {
                Advance::HalfDay
            } else {
                Advance::Hour
            }
        } else if self.minute != previous.minute {
            Advance::Minute
        } else {
            Advance::None
        }
    }
}

/// Kind of hand movement between two readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Advance {
    /// Nothing to do
    None,
    /// Minute hand moves within the hour
    Minute,
    /// Hour boundary other than 11→0
    Hour,
    /// 11→0 wraparound
    HalfDay,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // 2024-01-01T00:00:00Z
    const NEW_YEAR: u64 = 1_704_067_200;

    #[test]
    fn test_utc_reading() {
        let time = TimeOfDay::from_epoch(NEW_YEAR + 15 * 3600 + 42 * 60 + 7, 0);
        assert_eq!(time, TimeOfDay { hour: 15, minute: 42, second: 7 });
        assert_eq!(
            ClockReading::from_epoch(NEW_YEAR + 15 * 3600 + 42 * 60, 0),
            ClockReading { hour: 3, minute: 42 }
        );
    }

    #[test]
    fn test_offset_wraps_across_midnight() {
        // 23:30 UTC is 08:30 in +09:00 and 18:30 in -05:00
        let epoch = NEW_YEAR + 23 * 3600 + 30 * 60;
        assert_eq!(ClockReading::from_epoch(epoch, 540), ClockReading::new(8, 30));
        assert_eq!(ClockReading::from_epoch(epoch, -300), ClockReading::new(6, 30));
        // Just after the epoch with a negative offset is the previous evening
        assert_eq!(TimeOfDay::from_epoch(60, -120).hour, 22);
    }

    #[test]
    fn test_advance_classification() {
        let at = ClockReading::new;
        assert_eq!(at(3, 15).advance_from(&at(3, 15)), Advance::None);
        assert_eq!(at(3, 16).advance_from(&at(3, 15)), Advance::Minute);
        assert_eq!(at(4, 0).advance_from(&at(3, 59)), Advance::Hour);
        assert_eq!(at(0, 0).advance_from(&at(11, 59)), Advance::HalfDay);
        // Noon and midnight look the same on the dial
        assert_eq!(ClockReading::new(12, 0), at(0, 0));
    }

    proptest! {
        #[test]
        fn test_reading_always_on_dial(epoch in any::<u64>(), offset in -1080i16..=1080) {
            let reading = ClockReading::from_epoch(epoch, offset);
            prop_assert!(reading.hour < 12);
            prop_assert!(reading.minute < 60);
        }
    }
}
