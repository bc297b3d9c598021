//! Limit switch tasks
//!
//! Four instances, one per switch. Each keeps the debounced level that the
//! step generator reads and posts an edge event to the owning axis.

use defmt::*;
use embassy_rp::gpio::Input;

use railclock_core::clock::Hand;
use railclock_core::motion::{AxisEvent, Limit};
use railclock_hal_rp2040::limit::{watch, LimitLevel};

use crate::channels::Link;

/// Where a limit switch reports to
pub struct LimitWiring {
    /// Axis the switch belongs to
    pub hand: Hand,
    /// End of travel it marks
    pub limit: Limit,
    /// Switch pulls the line low when pressed
    pub active_low: bool,
    /// Debounced level read by the step generator
    pub level: &'static LimitLevel,
    /// Queue its edges go to
    pub link: &'static Link,
}

/// Limit switch watcher task
#[embassy_executor::task(pool_size = 4)]
pub async fn limit_task(input: Input<'static>, wiring: LimitWiring) {
    let LimitWiring {
        hand,
        limit,
        active_low,
        level,
        link,
    } = wiring;

    let event = match limit {
        Limit::Left => AxisEvent::LeftLimitEdge,
        Limit::Right => AxisEvent::RightLimitEdge,
    };

    info!("{:?} {:?} limit watcher started", hand, limit);

    watch(input, active_low, level, |active| {
        trace!("{:?} {:?} limit {}", hand, limit, if active { "pressed" } else { "released" });
        if !link.post_event(event) {
            warn!("{:?} event queue full, {:?} limit edge dropped", hand, limit);
        }
    })
    .await
}
