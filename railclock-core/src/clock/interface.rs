//! Entry points for the wireless command interface
//!
//! These run on the bridge task, not the orchestrator's. Each one is a
//! non-blocking state flip plus at most a queue send, so no lock is needed
//! beyond the atomic clock state.

use super::state::{ClockState, SharedState};
use super::WallClock;
use crate::axis::AxisControl;

/// Single-byte device commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceCommand {
    /// Full device restart
    Restart = 1,
    /// Abort both axes and latch `Fault`
    EmergencyStop = 2,
}

impl TryFrom<u8> for DeviceCommand {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Restart),
            2 => Ok(Self::EmergencyStop),
            other => Err(other),
        }
    }
}

/// What the caller has to do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandOutcome {
    /// Reset the device once the reply is out
    RestartRequested,
    /// Both axes aborted and the clock is in `Fault`
    Stopped,
    /// Code not recognised; nothing happened
    Unknown(u8),
}

/// Time-set, command and read-back handlers
pub struct CommandInterface<'a, H, N, C> {
    hour: &'a H,
    minute: &'a N,
    clock: &'a C,
    shared: &'a SharedState,
}

impl<'a, H, N, C> CommandInterface<'a, H, N, C>
where
    H: AxisControl,
    N: AxisControl,
    C: WallClock,
{
    /// Create the interface over the same axes, clock and state the
    /// orchestrator uses
    pub fn new(hour: &'a H, minute: &'a N, clock: &'a C, shared: &'a SharedState) -> Self {
        Self {
            hour,
            minute,
            clock,
            shared,
        }
    }

    /// Apply a new wall-clock time
    ///
    /// Accepted only while parked waiting for time or running. The state
    /// flips to `SettingTime` before the clock is set, so the orchestrator
    /// moves the hands on its next cycle and does nothing else meanwhile.
    pub fn on_time_set(&self, epoch: u64) -> bool {
        if !self.shared.begin_time_set() {
            return false;
        }
        self.clock.set_epoch(epoch);
        true
    }

    /// Handle a command byte
    pub fn on_command(&self, code: u8) -> CommandOutcome {
        match DeviceCommand::try_from(code) {
            Ok(DeviceCommand::Restart) => CommandOutcome::RestartRequested,
            Ok(DeviceCommand::EmergencyStop) => {
                self.emergency_stop();
                CommandOutcome::Stopped
            }
            Err(code) => CommandOutcome::Unknown(code),
        }
    }

    /// Abort any running move on both axes and latch `Fault`
    ///
    /// Valid in every state and idempotent.
    pub fn emergency_stop(&self) {
        self.shared.force_fault();
        self.hour.request_abort();
        self.minute.request_abort();
    }

    /// Wall-clock epoch while the hands show time, `None` otherwise
    pub fn current_epoch(&self) -> Option<u64> {
        self.shared
            .get()
            .shows_time()
            .then(|| self.clock.now_epoch())
    }

    /// Current clock state
    pub fn state(&self) -> ClockState {
        self.shared.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fault::Hand;
    use crate::clock::sim::{at, Journal, ManualClock, ScriptedAxis};

    #[test]
    fn test_command_codes() {
        assert_eq!(DeviceCommand::try_from(1), Ok(DeviceCommand::Restart));
        assert_eq!(DeviceCommand::try_from(2), Ok(DeviceCommand::EmergencyStop));
        assert_eq!(DeviceCommand::try_from(0), Err(0));
    }

    #[test]
    fn test_emergency_stop_from_any_state() {
        let journal = Journal::default();
        let shared = SharedState::new();
        let clock = ManualClock::default();
        let hour = ScriptedAxis::new(Hand::Hour, &journal, &shared);
        let minute = ScriptedAxis::new(Hand::Minute, &journal, &shared);
        let interface = CommandInterface::new(&hour, &minute, &clock, &shared);

        assert_eq!(interface.on_command(2), CommandOutcome::Stopped);
        assert_eq!(interface.state(), ClockState::Fault);
        assert_eq!((hour.aborts(), minute.aborts()), (1, 1));

        // Idempotent
        assert_eq!(interface.on_command(2), CommandOutcome::Stopped);
        assert_eq!(interface.state(), ClockState::Fault);
        assert!(!interface.on_time_set(at(3, 15)));
    }

    #[test]
    fn test_restart_and_unknown_leave_state_alone() {
        let journal = Journal::default();
        let shared = SharedState::new();
        let clock = ManualClock::default();
        let hour = ScriptedAxis::new(Hand::Hour, &journal, &shared);
        let minute = ScriptedAxis::new(Hand::Minute, &journal, &shared);
        let interface = CommandInterface::new(&hour, &minute, &clock, &shared);
        shared.advance(ClockState::Uninitialized, ClockState::Running);

        assert_eq!(interface.on_command(1), CommandOutcome::RestartRequested);
        assert_eq!(interface.on_command(9), CommandOutcome::Unknown(9));
        assert_eq!(interface.state(), ClockState::Running);
        assert_eq!(hour.aborts(), 0);
    }

    #[test]
    fn test_epoch_readable_only_while_showing_time() {
        let journal = Journal::default();
        let shared = SharedState::new();
        let clock = ManualClock::default();
        let hour = ScriptedAxis::new(Hand::Hour, &journal, &shared);
        let minute = ScriptedAxis::new(Hand::Minute, &journal, &shared);
        let interface = CommandInterface::new(&hour, &minute, &clock, &shared);
        shared.advance(ClockState::Uninitialized, ClockState::AwaitingTimeSync);
        assert_eq!(interface.current_epoch(), None);

        assert!(interface.on_time_set(at(3, 15)));
        assert_eq!(interface.current_epoch(), Some(at(3, 15)));

        shared.force_fault();
        assert_eq!(interface.current_epoch(), None);
    }
}
