//! Periodic alarm abstraction
//!
//! The step generator needs one callback per half-step. The alarm only has
//! to be armed and disarmed; where its ticks go is decided when the
//! platform wires the alarm up, not through this trait.

/// A free-running alarm firing at a programmable period
pub trait AlarmTimer {
    /// Tick rate the period is expressed in (ticks per second)
    fn resolution_hz(&self) -> u32;

    /// Arm the alarm to fire every `tick_period` ticks
    ///
    /// Re-arming while running replaces the period.
    fn start(&mut self, tick_period: u32);

    /// Disarm the alarm
    ///
    /// No callback is started after this returns. Callbacks already queued
    /// by the platform may still be delivered and must be tolerated.
    fn stop(&mut self);
}
