//! Embassy async tasks
//!
//! Each task runs independently and communicates through the statics in
//! [`crate::channels`].

pub mod alarm;
pub mod axis;
pub mod bridge;
pub mod limits;
pub mod orchestrator;

pub use alarm::alarm_task;
pub use axis::{axis_task, AxisStepper};
pub use bridge::bridge_task;
pub use limits::limit_task;
pub use orchestrator::orchestrator_task;
