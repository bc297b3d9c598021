//! Step alarm
//!
//! The step generator arms a [`TickAlarm`]; a separate task runs [`drive`],
//! which owns the `Ticker` and calls the tick callback it was given at
//! spawn time. The callback normally posts `AxisEvent::Tick` into that
//! axis's event queue.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, TICK_HZ};
use railclock_hal::AlarmTimer;

/// Arm/disarm requests for one alarm task
///
/// `Some(period)` runs the alarm every `period` ticks, `None` stops it.
pub struct AlarmArm {
    period: Signal<CriticalSectionRawMutex, Option<u32>>,
}

impl Default for AlarmArm {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmArm {
    /// Disarmed alarm, usable in a `static`
    pub const fn new() -> Self {
        Self {
            period: Signal::new(),
        }
    }
}

/// Step generator side of an alarm
pub struct TickAlarm<'a> {
    arm: &'a AlarmArm,
}

impl<'a> TickAlarm<'a> {
    /// Control the alarm task listening on `arm`
    pub fn new(arm: &'a AlarmArm) -> Self {
        Self { arm }
    }
}

impl AlarmTimer for TickAlarm<'_> {
    fn resolution_hz(&self) -> u32 {
        u32::try_from(TICK_HZ).unwrap_or(u32::MAX)
    }

    fn start(&mut self, tick_period: u32) {
        self.arm.period.signal(Some(tick_period.max(1)));
    }

    fn stop(&mut self) {
        self.arm.period.signal(None);
    }
}

/// Run the alarm, calling `on_tick` once per period while armed
pub async fn drive(arm: &AlarmArm, mut on_tick: impl FnMut()) -> ! {
    let mut armed = None;
    loop {
        let Some(period) = armed else {
            armed = arm.period.wait().await;
            continue;
        };

        let mut ticker = Ticker::every(Duration::from_ticks(u64::from(period)));
        armed = loop {
            match select(ticker.next(), arm.period.wait()).await {
                Either::First(()) => on_tick(),
                Either::Second(next) => break next,
            }
        };
    }
}
