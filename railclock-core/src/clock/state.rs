//! Clock lifecycle state
//!
//! The orchestrator owns the state, but the time-set and emergency-stop
//! entry points change it from other tasks, so it lives in an atomic and
//! every transition is a compare-and-swap.

use portable_atomic::{AtomicU8, Ordering};

/// Clock lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockState {
    /// Power-on, axes not yet homed
    Uninitialized = 0,
    /// Seeking the left limit switches
    Homing = 1,
    /// Parked, waiting for the first time-set
    AwaitingTimeSync = 2,
    /// Moving both hands to a newly set time
    SettingTime = 3,
    /// Following the wall clock
    Running = 4,
    /// Hour boundary choreography
    AdvancingMinuteRollover = 5,
    /// 11→0 choreography
    AdvancingHalfDayRollover = 6,
    /// Motion stopped until restart
    Fault = 7,
}

impl ClockState {
    /// Wire code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// State for a wire code
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Uninitialized,
            1 => Self::Homing,
            2 => Self::AwaitingTimeSync,
            3 => Self::SettingTime,
            4 => Self::Running,
            5 => Self::AdvancingMinuteRollover,
            6 => Self::AdvancingHalfDayRollover,
            7 => Self::Fault,
            _ => return None,
        })
    }

    /// A time-set request is honoured in this state
    pub fn accepts_time_set(&self) -> bool {
        matches!(self, Self::AwaitingTimeSync | Self::Running)
    }

    /// The hands show (or are moving to show) the wall clock
    pub fn shows_time(&self) -> bool {
        matches!(
            self,
            Self::SettingTime
                | Self::Running
                | Self::AdvancingMinuteRollover
                | Self::AdvancingHalfDayRollover
        )
    }

    /// Check if this is the fault state
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault)
    }
}

/// Clock state shared between the orchestrator and the command interface
pub struct SharedState {
    code: AtomicU8,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    /// Start in `Uninitialized`
    pub const fn new() -> Self {
        Self {
            code: AtomicU8::new(ClockState::Uninitialized as u8),
        }
    }

    /// Current state
    pub fn get(&self) -> ClockState {
        ClockState::from_code(self.code.load(Ordering::Acquire)).unwrap_or(ClockState::Fault)
    }

    /// Move from `from` to `to` if nothing else changed the state meanwhile
    ///
    /// Returns `false` when the state is no longer `from`. Nothing leaves
    /// `Fault` this way.
    pub fn advance(&self, from: ClockState, to: ClockState) -> bool {
        if from.is_fault() {
            return false;
        }
        self.code
            .compare_exchange(from.code(), to.code(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Enter `SettingTime` if the current state accepts a time-set
    pub fn begin_time_set(&self) -> bool {
        self.code
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |code| {
                ClockState::from_code(code)
                    .filter(ClockState::accepts_time_set)
                    .map(|_| ClockState::SettingTime.code())
            })
            .is_ok()
    }

    /// Enter `Fault` unconditionally
    pub fn force_fault(&self) {
        self.code.store(ClockState::Fault.code(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip() {
        for code in 0..=7 {
            let state = ClockState::from_code(code).unwrap();
            assert_eq!(state.code(), code);
        }
        assert_eq!(ClockState::from_code(8), None);
    }

    #[test]
    fn test_advance_requires_expected_state() {
        let state = SharedState::new();
        assert!(state.advance(ClockState::Uninitialized, ClockState::Homing));
        assert!(!state.advance(ClockState::Uninitialized, ClockState::Homing));
        assert_eq!(state.get(), ClockState::Homing);
    }

    #[test]
    fn test_time_set_only_when_armed() {
        let state = SharedState::new();
        assert!(!state.begin_time_set());

        state.advance(ClockState::Uninitialized, ClockState::AwaitingTimeSync);
        assert!(state.begin_time_set());
        assert_eq!(state.get(), ClockState::SettingTime);

        // A second request while the first is still moving is refused
        assert!(!state.begin_time_set());

        state.advance(ClockState::SettingTime, ClockState::Running);
        assert!(state.begin_time_set());
    }

    #[test]
    fn test_fault_is_sticky() {
        let state = SharedState::new();
        state.advance(ClockState::Uninitialized, ClockState::Running);
        state.force_fault();
        assert!(!state.advance(ClockState::Fault, ClockState::Running));
        assert!(!state.advance(ClockState::Running, ClockState::Running));
        assert!(!state.begin_time_set());
        assert!(state.get().is_fault());
    }
}
