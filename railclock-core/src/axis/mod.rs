//! Axis command/result protocol and the per-axis worker
//!
//! ```text
//!  orchestrator ──submit──▶ AxisLink ──commands──▶ AxisWorker ──▶ StepGenerator
//!       ▲                    │   ▲                                     │
//!       └──── MoveHandle ◀───┘   └──── events (alarm, limits, abort) ◀─┘
//! ```

pub mod link;
pub mod worker;

pub use link::{AxisControl, AxisError, AxisLink, MoveHandle, COMMAND_QUEUE_DEPTH, EVENT_QUEUE_DEPTH};
pub use worker::{AxisWorker, MoveReport, QueuedEvents};
