//! Message types carried in frames
//!
//! - Bridge → clock: [`BridgeRequest`], type bytes `0x01..=0x04`
//! - Clock → bridge: [`ClockReply`], type bytes `0x81..=0x84`
//!
//! Multi-byte values are big-endian, matching the GATT characteristic the
//! bridge exposes.

use crate::frame::Frame;

// Bridge → clock
pub const MSG_SET_TIME: u8 = 0x01;
pub const MSG_COMMAND: u8 = 0x02;
pub const MSG_READ_TIME: u8 = 0x03;
pub const MSG_READ_STATE: u8 = 0x04;

// Clock → bridge
pub const MSG_TIME: u8 = 0x81;
pub const MSG_STATE: u8 = 0x82;
pub const MSG_ACK: u8 = 0x83;
pub const MSG_NACK: u8 = 0x84;

/// Frame did not hold a valid message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Type byte not defined for this direction
    UnknownKind(u8),
    /// Payload length wrong for the type
    BadPayload { kind: u8, len: usize },
}

/// Requests from the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeRequest {
    /// New wall-clock time, Unix seconds
    SetTime(u64),
    /// Device command byte (1 = restart, 2 = emergency stop)
    Command(u8),
    /// Ask for the current time
    ReadTime,
    /// Ask for the clock state code
    ReadState,
}

impl BridgeRequest {
    /// Type byte for this request
    pub fn kind(&self) -> u8 {
        match self {
            Self::SetTime(_) => MSG_SET_TIME,
            Self::Command(_) => MSG_COMMAND,
            Self::ReadTime => MSG_READ_TIME,
            Self::ReadState => MSG_READ_STATE,
        }
    }

    /// Decode a request frame
    pub fn from_frame(frame: &Frame) -> Result<Self, MessageError> {
        let payload = frame.payload.as_slice();
        let bad = || MessageError::BadPayload {
            kind: frame.kind,
            len: payload.len(),
        };
        match frame.kind {
            MSG_SET_TIME => {
                let bytes: [u8; 8] = payload.try_into().map_err(|_| bad())?;
                Ok(Self::SetTime(u64::from_be_bytes(bytes)))
            }
            MSG_COMMAND => match payload {
                [code] => Ok(Self::Command(*code)),
                _ => Err(bad()),
            },
            MSG_READ_TIME if payload.is_empty() => Ok(Self::ReadTime),
            MSG_READ_STATE if payload.is_empty() => Ok(Self::ReadState),
            MSG_READ_TIME | MSG_READ_STATE => Err(bad()),
            other => Err(MessageError::UnknownKind(other)),
        }
    }

    /// Encode as a frame (bridge side and tests)
    pub fn to_frame(&self) -> Frame {
        let mut frame = Frame::empty(self.kind());
        // Payloads here are at most 8 bytes
        let _ = match self {
            Self::SetTime(epoch) => frame.payload.extend_from_slice(&epoch.to_be_bytes()),
            Self::Command(code) => frame.payload.push(*code).map_err(|_| ()),
            Self::ReadTime | Self::ReadState => Ok(()),
        };
        frame
    }
}

/// Replies from the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockReply {
    /// Current time, Unix seconds; 0 while the clock is not showing time
    Time(u64),
    /// Clock state code
    State(u8),
    /// Request accepted; carries the request type
    Ack(u8),
    /// Request refused or malformed; carries the request type
    Nack(u8),
}

impl ClockReply {
    /// Type byte for this reply
    pub fn kind(&self) -> u8 {
        match self {
            Self::Time(_) => MSG_TIME,
            Self::State(_) => MSG_STATE,
            Self::Ack(_) => MSG_ACK,
            Self::Nack(_) => MSG_NACK,
        }
    }

    /// Encode as a frame
    pub fn to_frame(&self) -> Frame {
        let mut frame = Frame::empty(self.kind());
        let _ = match self {
            Self::Time(epoch) => frame.payload.extend_from_slice(&epoch.to_be_bytes()),
            Self::State(code) | Self::Ack(code) | Self::Nack(code) => {
                frame.payload.push(*code).map_err(|_| ())
            }
        };
        frame
    }

    /// Decode a reply frame (bridge side and tests)
    pub fn from_frame(frame: &Frame) -> Result<Self, MessageError> {
        let payload = frame.payload.as_slice();
        let bad = || MessageError::BadPayload {
            kind: frame.kind,
            len: payload.len(),
        };
        match (frame.kind, payload) {
            (MSG_TIME, _) => {
                let bytes: [u8; 8] = payload.try_into().map_err(|_| bad())?;
                Ok(Self::Time(u64::from_be_bytes(bytes)))
            }
            (MSG_STATE, [code]) => Ok(Self::State(*code)),
            (MSG_ACK, [code]) => Ok(Self::Ack(*code)),
            (MSG_NACK, [code]) => Ok(Self::Nack(*code)),
            (MSG_STATE | MSG_ACK | MSG_NACK, _) => Err(bad()),
            (other, _) => Err(MessageError::UnknownKind(other)),
        }
    }
}
