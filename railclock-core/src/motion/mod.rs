//! Motion: command types, position model and the step generator

pub mod command;
pub mod position;
pub mod step_generator;

pub use command::{AxisEvent, Direction, Limit, MotionCommand, MoveResult};
pub use position::{mm_to_um, DriveGeometry, TrackGeometry, UM_PER_MM};
pub use step_generator::{AxisPins, EventSource, MoveExecutor, StepGenerator, StepTiming};
