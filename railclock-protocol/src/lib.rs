//! Railclock bridge protocol
//!
//! The wireless (BLE GATT) side of the clock lives on a small bridge module.
//! It forwards the time value and command byte to the controller over UART
//! and asks for read-backs. This crate is the byte layout on that UART.
//!
//! # Frame
//!
//! ```text
//! ┌──────┬────────┬──────┬─────────────┬──────────┐
//! │ SYNC │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B   │ 1B     │ 1B   │ 0-16B       │ 1B       │
//! └──────┴────────┴──────┴─────────────┴──────────┘
//! ```
//!
//! The checksum is the XOR of LENGTH, TYPE and every PAYLOAD byte.

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;

pub use frame::{Frame, FrameDecoder, FrameError, MAX_FRAME_LEN, MAX_PAYLOAD, SYNC};
pub use messages::{BridgeRequest, ClockReply, MessageError};
