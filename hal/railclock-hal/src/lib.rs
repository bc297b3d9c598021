//! Railclock Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the clock logic is
//! written against. Chip-specific crates implement them; the host test
//! suites implement them with simulated pins and timers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  railclock-core / railclock-firmware    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  railclock-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!           ┌───────────────────┐
//!           │ railclock-hal-    │
//!           │      rp2040       │
//!           └───────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`alarm::AlarmTimer`] - Periodic hardware alarm driving step pulses

#![no_std]
#![deny(unsafe_code)]

pub mod alarm;
pub mod gpio;

// Re-export key traits at crate root for convenience
pub use alarm::AlarmTimer;
pub use gpio::{ActiveLow, InputPin, OutputPin, Polarity};
