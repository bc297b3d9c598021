//! Clock orchestrator task
//!
//! Runs the state machine once per poll interval and logs what each cycle
//! did. Homing, time-setting and rollovers run inside a single cycle.

use defmt::*;
use embassy_time::Delay;

use railclock_core::clock::{ClockState, Orchestrator, TimeOfDay, WallClock};
use railclock_core::config::ClockConfig;
use railclock_hal_rp2040::RpOutput;

use crate::channels::{CLOCK_STATE, HOUR_AXIS, MINUTE_AXIS, WALL_CLOCK};

/// Orchestrator task
///
/// The axis worker tasks must already be spawned.
#[embassy_executor::task]
pub async fn orchestrator_task(config: ClockConfig, status: RpOutput<'static>) {
    info!("Orchestrator task started");

    let offset = config.utc_offset_minutes;
    let mut orchestrator = Orchestrator::new(
        &HOUR_AXIS,
        &MINUTE_AXIS,
        &WALL_CLOCK,
        &CLOCK_STATE,
        Delay,
        status,
        config,
    );
    let mut shown = None;

    loop {
        let report = orchestrator.cycle().await;

        if report.changed() {
            info!("Clock state: {:?} -> {:?}", report.from, report.to);
            if report.to == ClockState::Running {
                let time = TimeOfDay::from_epoch(WALL_CLOCK.now_epoch(), offset);
                info!("Local time {:?}", time);
            }
        }

        if let Some(fault) = report.fault {
            error!(
                "Clock fault in {:?} ({:?}): {:?}",
                fault.phase, fault.hand, fault.cause
            );
        }

        if report.shown != shown {
            if let Some(reading) = report.shown {
                debug!("Hands at {:?}", reading);
            }
            shown = report.shown;
        }

        orchestrator.idle().await;
    }
}
