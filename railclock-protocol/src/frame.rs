//! Frame encoding and byte-at-a-time decoding

use heapless::Vec;

/// Start-of-frame marker
pub const SYNC: u8 = 0x5A;

/// Largest payload any message needs
pub const MAX_PAYLOAD: usize = 16;

/// SYNC + LENGTH + TYPE + payload + CHECKSUM
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD + 4;

/// Framing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload longer than [`MAX_PAYLOAD`]
    PayloadTooLarge,
    /// LENGTH byte out of range; the decoder resynchronised
    BadLength(u8),
    /// Checksum mismatch; the frame was dropped
    BadChecksum { expected: u8, found: u8 },
    /// Output buffer too small to encode into
    BufferTooSmall,
}

/// One frame: a type byte and its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type
    pub kind: u8,
    /// Type-specific payload
    pub payload: Vec<u8, MAX_PAYLOAD>,
}

impl Frame {
    /// Frame with a payload
    pub fn new(kind: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { kind, payload })
    }

    /// Frame without a payload
    pub fn empty(kind: u8) -> Self {
        Self {
            kind,
            payload: Vec::new(),
        }
    }

    /// Encoded length in bytes
    pub fn encoded_len(&self) -> usize {
        self.payload.len() + 4
    }

    /// Write the frame into `out`, returning the number of bytes written
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, FrameError> {
        let len = self.encoded_len();
        let out = out.get_mut(..len).ok_or(FrameError::BufferTooSmall)?;
        let (header, rest) = out.split_at_mut(3);
        let (body, tail) = rest.split_at_mut(self.payload.len());

        // Payload is bounded by MAX_PAYLOAD, so the length fits a byte
        let length = self.payload.len() as u8;
        header.copy_from_slice(&[SYNC, length, self.kind]);
        body.copy_from_slice(&self.payload);
        tail[0] = checksum(length, self.kind, &self.payload);
        Ok(len)
    }

    /// Encode into an owned buffer
    pub fn to_bytes(&self) -> Vec<u8, MAX_FRAME_LEN> {
        let mut bytes = Vec::new();
        let _ = bytes.resize(self.encoded_len(), 0);
        // Always fits: MAX_FRAME_LEN covers the largest frame
        let _ = self.encode(&mut bytes);
        bytes
    }
}

fn checksum(length: u8, kind: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(length ^ kind, |acc, byte| acc ^ byte)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Hunting for SYNC
    Sync,
    /// Next byte is LENGTH
    Length,
    /// Next byte is TYPE
    Kind { length: u8 },
    /// Collecting payload bytes
    Payload { length: u8, kind: u8 },
    /// Next byte is CHECKSUM
    Checksum { length: u8, kind: u8 },
}

/// Incremental decoder fed straight from the UART
///
/// Bytes outside a frame are skipped, so the decoder picks up again at the
/// next SYNC after line noise or a dropped byte.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    stage: Stage,
    payload: Vec<u8, MAX_PAYLOAD>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Decoder waiting for SYNC
    pub const fn new() -> Self {
        Self {
            stage: Stage::Sync,
            payload: Vec::new(),
        }
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.stage = Stage::Sync;
        self.payload.clear();
    }

    /// Feed one byte
    ///
    /// Returns `Ok(Some(frame))` when the byte completes a valid frame and
    /// `Ok(None)` while more bytes are needed.
    pub fn push(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        self.stage = match self.stage {
            Stage::Sync => {
                if byte == SYNC {
                    Stage::Length
                } else {
                    Stage::Sync
                }
            }
            Stage::Length => {
                if usize::from(byte) > MAX_PAYLOAD {
                    // A SYNC here may be the real start of the next frame
                    self.stage = if byte == SYNC { Stage::Length } else { Stage::Sync };
                    return Err(FrameError::BadLength(byte));
                }
                Stage::Kind { length: byte }
            }
            Stage::Kind { length } => {
                self.payload.clear();
                if length == 0 {
                    Stage::Checksum { length, kind: byte }
                } else {
                    Stage::Payload { length, kind: byte }
                }
            }
            Stage::Payload { length, kind } => {
                // Length was range-checked, so this cannot overflow
                let _ = self.payload.push(byte);
                if self.payload.len() == usize::from(length) {
                    Stage::Checksum { length, kind }
                } else {
                    Stage::Payload { length, kind }
                }
            }
            Stage::Checksum { length, kind } => {
                let expected = checksum(length, kind, &self.payload);
                let payload = core::mem::take(&mut self.payload);
                self.stage = Stage::Sync;
                if byte != expected {
                    return Err(FrameError::BadChecksum {
                        expected,
                        found: byte,
                    });
                }
                return Ok(Some(Frame { kind, payload }));
            }
        };
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Result<Frame, FrameError>, 8> {
        let mut out = Vec::new();
        for &byte in bytes {
            match decoder.push(byte) {
                Ok(Some(frame)) => out.push(Ok(frame)).unwrap(),
                Ok(None) => {}
                Err(err) => out.push(Err(err)).unwrap(),
            }
        }
        out
    }

    #[test]
    fn test_encode_layout() {
        let frame = Frame::new(0x02, &[0x02]).unwrap();
        assert_eq!(frame.to_bytes().as_slice(), [SYNC, 1, 0x02, 0x02, 1 ^ 0x02 ^ 0x02]);

        let empty = Frame::empty(0x04);
        assert_eq!(empty.to_bytes().as_slice(), [SYNC, 0, 0x04, 0x04]);
    }

    #[test]
    fn test_encode_into_short_buffer() {
        let frame = Frame::new(0x01, &[0; 8]).unwrap();
        let mut out = [0u8; 11];
        assert_eq!(frame.encode(&mut out), Err(FrameError::BufferTooSmall));
        let mut out = [0u8; 12];
        assert_eq!(frame.encode(&mut out), Ok(12));
    }

    #[test]
    fn test_payload_limit() {
        assert!(Frame::new(0x01, &[0; MAX_PAYLOAD]).is_ok());
        assert_eq!(
            Frame::new(0x01, &[0; MAX_PAYLOAD + 1]),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_decoder_skips_noise_between_frames() {
        let first = Frame::new(0x01, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let second = Frame::empty(0x03);
        let mut stream: Vec<u8, 64> = Vec::new();
        stream.extend_from_slice(&[0x00, 0xFF, 0x13]).unwrap();
        stream.extend_from_slice(&first.to_bytes()).unwrap();
        stream.extend_from_slice(&[0x42]).unwrap();
        stream.extend_from_slice(&second.to_bytes()).unwrap();

        let mut decoder = FrameDecoder::new();
        let frames = decode_all(&mut decoder, &stream);
        assert_eq!(frames.as_slice(), [Ok(first), Ok(second)]);
    }

    #[test]
    fn test_bad_checksum_drops_frame_and_recovers() {
        let frame = Frame::new(0x02, &[0x01]).unwrap();
        let mut corrupt = frame.to_bytes();
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF;

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &corrupt);
        assert!(matches!(results[0], Err(FrameError::BadChecksum { .. })));

        let results = decode_all(&mut decoder, &frame.to_bytes());
        assert_eq!(results.as_slice(), [Ok(frame)]);
    }

    #[test]
    fn test_bad_length_resyncs_on_sync() {
        let frame = Frame::empty(0x04);
        let mut stream: Vec<u8, 16> = Vec::new();
        // SYNC followed by an impossible length that is itself SYNC
        stream.extend_from_slice(&[SYNC]).unwrap();
        stream.extend_from_slice(&frame.to_bytes()).unwrap();

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &stream);
        assert_eq!(results.as_slice(), [Err(FrameError::BadLength(SYNC)), Ok(frame)]);
    }

    proptest! {
        #[test]
        fn test_decoder_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut decoder = FrameDecoder::new();
            for byte in bytes {
                let _ = decoder.push(byte);
            }
        }

        #[test]
        fn test_any_frame_decodes(kind in any::<u8>(), payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD)) {
            let frame = Frame::new(kind, &payload).unwrap();
            let mut decoder = FrameDecoder::new();
            let mut decoded = None;
            for &byte in frame.to_bytes().iter() {
                if let Some(f) = decoder.push(byte).unwrap() {
                    decoded = Some(f);
                }
            }
            prop_assert_eq!(decoded, Some(frame));
        }
    }
}
