//! Statics shared between tasks
//!
//! Everything here is reachable from interrupt-driven tasks, the axis
//! workers, the orchestrator and the bridge, so all of it is built on
//! `CriticalSectionRawMutex` or atomics.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use railclock_core::axis::AxisLink;
use railclock_core::clock::SharedState;
use railclock_hal_rp2040::{AlarmArm, LimitLevel, UptimeClock};

/// Command/result link for one axis
pub type Link = AxisLink<CriticalSectionRawMutex>;

/// Hour carriage link (orchestrator, hour worker, hour alarm and limits)
pub static HOUR_AXIS: Link = AxisLink::new();

/// Minute carriage link
pub static MINUTE_AXIS: Link = AxisLink::new();

/// Clock state, written by the orchestrator and the bridge
pub static CLOCK_STATE: SharedState = SharedState::new();

/// Wall clock, set over the bridge
pub static WALL_CLOCK: UptimeClock = UptimeClock::new();

/// Step alarm arming for each axis
pub static HOUR_ALARM: AlarmArm = AlarmArm::new();
pub static MINUTE_ALARM: AlarmArm = AlarmArm::new();

/// Debounced limit switch levels
pub static HOUR_LEFT_LIMIT: LimitLevel = LimitLevel::new();
pub static HOUR_RIGHT_LIMIT: LimitLevel = LimitLevel::new();
pub static MINUTE_LEFT_LIMIT: LimitLevel = LimitLevel::new();
pub static MINUTE_RIGHT_LIMIT: LimitLevel = LimitLevel::new();
