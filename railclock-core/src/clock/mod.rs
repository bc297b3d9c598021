//! Clock orchestration
//!
//! ```text
//!                ┌──────────────┐
//!                │Uninitialized │
//!                └──────┬───────┘
//!                       ▼
//!                ┌──────────────┐  seek/park fails
//!                │   Homing     ├──────────────────────┐
//!                └──────┬───────┘                      │
//!                       ▼                              ▼
//!              ┌────────────────┐               ┌────────────┐
//!              │AwaitingTimeSync│               │   Fault    │◀── emergency stop
//!              └──────┬─────────┘               └────────────┘     (any state)
//!            time-set │      ▲ any unexpected result   ▲
//!                     ▼      │                         │
//!              ┌────────────────┐  time-set            │
//!              │  SettingTime   │◀─────────┐           │
//!              └──────┬─────────┘          │           │
//!                     ▼                    │           │
//!              ┌────────────────┐──────────┘           │
//!              │    Running     │──────────────────────┤
//!              └─┬───────────┬──┘                      │
//!    hour change │           │ 11 → 0                  │
//!                ▼           ▼                         │
//!   AdvancingMinuteRollover  AdvancingHalfDayRollover ─┘
//!          (back to Running when the choreography completes)
//! ```

pub mod fault;
pub mod interface;
pub mod orchestrator;
pub mod reading;
pub mod state;

#[cfg(test)]
mod sim;

pub use fault::{ClockFault, Hand, MoveFault, Phase};
pub use interface::{CommandInterface, CommandOutcome, DeviceCommand};
pub use orchestrator::{CycleReport, Orchestrator};
pub use reading::{Advance, ClockReading, TimeOfDay};
pub use state::{ClockState, SharedState};

/// Settable wall clock (Unix epoch seconds)
///
/// Shared by the orchestrator, which reads it every poll, and the command
/// interface, which sets it.
pub trait WallClock {
    /// Current Unix time in seconds
    fn now_epoch(&self) -> u64;

    /// Set the current Unix time
    fn set_epoch(&self, epoch: u64);
}
