//! Step alarm task
//!
//! Turns the periods armed by an axis's [`railclock_hal_rp2040::TickAlarm`]
//! into `Tick` events on that axis's link.

use defmt::*;

use railclock_core::clock::Hand;
use railclock_core::motion::AxisEvent;
use railclock_hal_rp2040::alarm::{drive, AlarmArm};

use crate::channels::Link;

/// Alarm task for one axis
#[embassy_executor::task(pool_size = 2)]
pub async fn alarm_task(hand: Hand, arm: &'static AlarmArm, link: &'static Link) {
    info!("{:?} alarm task started", hand);

    let mut dropped: u32 = 0;
    drive(arm, || {
        // A full queue means the worker fell behind; the step generator's
        // receive timeout catches a worker that stopped altogether
        if !link.post_event(AxisEvent::Tick) {
            dropped = dropped.wrapping_add(1);
            if dropped.is_power_of_two() {
                warn!("{:?} event queue full, {} ticks dropped", hand, dropped);
            }
        }
    })
    .await
}
