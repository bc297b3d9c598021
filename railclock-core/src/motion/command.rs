//! Motion command and result types
//!
//! These types are the whole vocabulary between the orchestrator, the axis
//! workers and the step generator. A [`MotionCommand`] goes in, exactly one
//! [`MoveResult`] comes back.

/// Direction of travel along the rail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Away from the left limit (position grows)
    Increasing,
    /// Toward the left limit (position shrinks)
    Decreasing,
}

impl Direction {
    /// Direction needed to cover a signed step delta
    ///
    /// A zero delta maps to `Increasing`, which never trips the left
    /// limit pre-check when parked at home.
    pub fn toward(delta: i32) -> Self {
        if delta < 0 {
            Self::Decreasing
        } else {
            Self::Increasing
        }
    }

    /// Sign applied to step counts travelled in this direction
    pub fn sign(self) -> i32 {
        match self {
            Self::Increasing => 1,
            Self::Decreasing => -1,
        }
    }

    /// Limit switch that ends travel in this direction
    pub fn limit(self) -> Limit {
        match self {
            Self::Increasing => Limit::Right,
            Self::Decreasing => Limit::Left,
        }
    }
}

/// One of the two end-of-travel switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Limit {
    /// Switch at position zero
    Left,
    /// Switch at the far end of the rail
    Right,
}

impl Limit {
    /// Result reported when a move stops on this switch
    pub fn result(self) -> MoveResult {
        match self {
            Self::Left => MoveResult::HitLeftLimit,
            Self::Right => MoveResult::HitRightLimit,
        }
    }
}

/// A single move for one axis
///
/// Immutable once built; consumed by exactly one axis worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionCommand {
    /// Direction of travel
    pub direction: Direction,
    /// Alarm period between step line toggles, in alarm ticks
    pub tick_period: u32,
    /// Number of full steps to take
    pub step_count: u32,
}

impl MotionCommand {
    /// Create a new motion command
    pub const fn new(direction: Direction, tick_period: u32, step_count: u32) -> Self {
        Self {
            direction,
            tick_period,
            step_count,
        }
    }

    /// Step line toggles needed to finish (two per physical step)
    pub fn half_steps(&self) -> u64 {
        u64::from(self.step_count) * 2
    }
}

/// Outcome of a single move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveResult {
    /// All requested steps were taken
    Completed,
    /// Stopped on the right limit switch
    HitRightLimit,
    /// Stopped on the left limit switch
    HitLeftLimit,
    /// Stopped by an abort request
    Aborted,
    /// No event arrived within the receive window (stalled alarm or driver)
    Error,
}

impl MoveResult {
    /// Check if the move ran to completion
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Check if the move ended on a limit switch
    pub fn is_limit(&self) -> bool {
        matches!(self, Self::HitLeftLimit | Self::HitRightLimit)
    }

    /// Check if the axis position can still be trusted after this result
    pub fn keeps_position(&self) -> bool {
        !matches!(self, Self::Aborted | Self::Error)
    }
}

/// Events delivered to a running step generator
///
/// Posted from interrupt handlers or other tasks; consumed by the axis
/// that owns the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisEvent {
    /// Alarm period elapsed, toggle the step line
    Tick,
    /// Left limit input changed
    LeftLimitEdge,
    /// Right limit input changed
    RightLimitEdge,
    /// Stop the current move now
    Abort,
}

impl AxisEvent {
    /// Limit switch this event reports on, if any
    pub fn limit(&self) -> Option<Limit> {
        match self {
            Self::LeftLimitEdge => Some(Limit::Left),
            Self::RightLimitEdge => Some(Limit::Right),
            Self::Tick | Self::Abort => None,
        }
    }
}
