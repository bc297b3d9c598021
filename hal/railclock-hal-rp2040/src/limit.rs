//! Limit switch inputs
//!
//! Each switch is watched by its own task. The task keeps the debounced
//! level in a [`LimitLevel`] the step generator reads for its pre-check and
//! edge filtering, and reports every level change through a callback.

use embassy_rp::gpio::Input;
use embassy_time::Timer;
use portable_atomic::{AtomicBool, Ordering};
use railclock_hal::InputPin;

/// Settle time after an edge before the level is sampled
pub const DEBOUNCE_MS: u64 = 2;

/// Debounced switch level shared between the watcher and the axis
pub struct LimitLevel {
    active: AtomicBool,
}

impl Default for LimitLevel {
    fn default() -> Self {
        Self::new()
    }
}

impl LimitLevel {
    /// Released switch, usable in a `static`
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
        }
    }

    /// Check if the switch is pressed
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn set(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }
}

/// Step generator view of a limit switch: high means pressed
pub struct LimitInput<'a>(&'a LimitLevel);

impl<'a> LimitInput<'a> {
    /// Read `level`
    pub fn new(level: &'a LimitLevel) -> Self {
        Self(level)
    }
}

impl InputPin for LimitInput<'_> {
    fn is_high(&self) -> bool {
        self.0.is_active()
    }
}

/// Watch one switch forever
///
/// # Arguments
///
/// * `input` - the switch GPIO
/// * `active_low` - switch pulls the line low when pressed
/// * `level` - where the debounced level is kept
/// * `on_change` - called after every level change
pub async fn watch(
    mut input: Input<'_>,
    active_low: bool,
    level: &LimitLevel,
    mut on_change: impl FnMut(bool),
) -> ! {
    level.set(input.is_high() != active_low);

    loop {
        input.wait_for_any_edge().await;
        Timer::after_millis(DEBOUNCE_MS).await;

        let active = input.is_high() != active_low;
        if active != level.is_active() {
            level.set(active);
            on_change(active);
        }
    }
}
