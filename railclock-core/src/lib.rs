//! Board-agnostic core logic for the linear rail clock
//!
//! This crate contains everything that does not depend on a particular
//! microcontroller:
//!
//! - Motion command types, the position model and the step generator
//! - The per-axis command/result link and worker
//! - The clock state machine, orchestrator and command interface
//! - Configuration types and the `clock.toml` reader
//!
//! All of it runs on the host under `cargo test`.

#![no_std]
#![deny(unsafe_code)]

pub mod axis;
pub mod clock;
pub mod config;
pub mod motion;
