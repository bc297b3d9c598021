//! Wall clock kept as an offset from uptime

use embassy_time::Instant;
use portable_atomic::{AtomicU64, Ordering};
use railclock_core::clock::WallClock;

/// Unix time derived from the embassy uptime counter
///
/// Setting the time stores the epoch of boot in milliseconds; reading adds
/// the uptime. Before the first set it reads seconds since boot.
pub struct UptimeClock {
    boot_epoch_ms: AtomicU64,
}

impl Default for UptimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl UptimeClock {
    /// Clock reading seconds since boot, usable in a `static`
    pub const fn new() -> Self {
        Self {
            boot_epoch_ms: AtomicU64::new(0),
        }
    }
}

impl WallClock for UptimeClock {
    fn now_epoch(&self) -> u64 {
        let uptime_ms = Instant::now().as_millis();
        self.boot_epoch_ms
            .load(Ordering::Acquire)
            .saturating_add(uptime_ms)
            / 1000
    }

    fn set_epoch(&self, epoch: u64) {
        let uptime_ms = Instant::now().as_millis();
        self.boot_epoch_ms.store(
            epoch.saturating_mul(1000).saturating_sub(uptime_ms),
            Ordering::Release,
        );
    }
}
