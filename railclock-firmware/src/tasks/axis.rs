//! Axis worker task
//!
//! One instance per carriage. Owns that axis's step generator and runs
//! the commands the orchestrator queues on its link, one at a time.

use defmt::*;
use embassy_time::Delay;

use railclock_core::axis::AxisWorker;
use railclock_core::clock::Hand;
use railclock_core::motion::{MoveResult, StepGenerator};
use railclock_hal::Polarity;
use railclock_hal_rp2040::{LimitInput, RpOutput, TickAlarm};

use crate::channels::Link;

/// Step generator as wired on the board
pub type AxisStepper = StepGenerator<
    Polarity<RpOutput<'static>>,
    RpOutput<'static>,
    RpOutput<'static>,
    LimitInput<'static>,
    LimitInput<'static>,
    TickAlarm<'static>,
    Delay,
>;

/// Axis worker task
#[embassy_executor::task(pool_size = 2)]
pub async fn axis_task(hand: Hand, link: &'static Link, stepper: AxisStepper) {
    info!("{:?} axis task started", hand);

    let mut worker = AxisWorker::new(link, stepper, Delay);

    loop {
        let report = worker.process_next().await;

        match report.result {
            MoveResult::Completed | MoveResult::HitLeftLimit | MoveResult::HitRightLimit => {
                debug!(
                    "{:?} move: {:?} after {} steps, now at {}",
                    hand, report.result, report.steps, report.position_steps
                );
            }
            MoveResult::Aborted => {
                warn!("{:?} move aborted after {} steps", hand, report.steps);
            }
            MoveResult::Error => {
                error!(
                    "{:?} move stalled after {} of {} steps",
                    hand, report.steps, report.command.step_count
                );
            }
        }
    }
}
