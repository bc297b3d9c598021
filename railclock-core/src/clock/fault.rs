//! Orchestrator faults
//!
//! Every unexpected move outcome becomes a [`ClockFault`] naming where in
//! the choreography it happened and which hand was involved.

use crate::axis::AxisError;
use crate::motion::MoveResult;

/// Which carriage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hand {
    Hour,
    Minute,
}

/// Choreography step that was running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Seeking the left limits at boot
    Homing,
    /// Moving to the home position after the seek
    Parking,
    /// Moving to a newly set time
    SettingTime,
    /// Regular minute step
    MinuteAdvance,
    /// Hour boundary choreography
    HourAdvance,
    /// 11→0 choreography
    HalfDayRollover,
}

/// Why a move was not what the orchestrator expected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveFault {
    /// A limit switch stopped a positioning move
    LimitReachedUnexpectedly,
    /// A seek ran out of steps without finding its limit
    LimitNotReached,
    /// No event within the receive window (dropped tick or stuck driver)
    QueueStall,
    /// Cancelled by an emergency stop
    Aborted,
    /// The axis refused the command
    Rejected(AxisError),
    /// The clock was forced into `Fault` before the move was issued
    Halted,
}

impl MoveFault {
    /// Compare a result with the one expected
    ///
    /// Returns `None` when they match.
    pub fn check(result: MoveResult, expected: MoveResult) -> Option<Self> {
        if result == expected {
            return None;
        }
        Some(match result {
            MoveResult::Completed => Self::LimitNotReached,
            MoveResult::HitLeftLimit | MoveResult::HitRightLimit => Self::LimitReachedUnexpectedly,
            MoveResult::Aborted => Self::Aborted,
            MoveResult::Error => Self::QueueStall,
        })
    }
}

/// An orchestration failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockFault {
    /// Step that failed
    pub phase: Phase,
    /// Carriage that failed, if it was one in particular
    pub hand: Option<Hand>,
    /// What went wrong
    pub cause: MoveFault,
}

impl ClockFault {
    /// Fault raised by one hand
    pub fn on(phase: Phase, hand: Hand, cause: MoveFault) -> Self {
        Self {
            phase,
            hand: Some(hand),
            cause,
        }
    }

    /// Fault not tied to a hand
    pub fn halted(phase: Phase) -> Self {
        Self {
            phase,
            hand: None,
            cause: MoveFault::Halted,
        }
    }
}
