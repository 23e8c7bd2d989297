//! C3: the bit-stream framer, plus C4, the frame validator.
//!
//! The framer assembles a preamble, a run of start-bit-separated bytes, and an
//! end bit into a byte frame. The validator is a single XOR fold and lives here
//! because it is only ever invoked immediately after a framer `Success`.

use heapless::Vec;

use crate::classifier::Bit;
use crate::error::DecoderError;

/// Maximum number of data bytes (including the trailing checksum) a frame can hold.
pub const MAX_FRAME_BYTES: usize = 8;

/// A fully-assembled, not-yet-validated byte frame.
pub type Frame = Vec<u8, MAX_FRAME_BYTES>;

/// Minimum number of consecutive `1` bits required before the preamble's
/// terminating `0` is accepted.
const MIN_PREAMBLE_ONES: u32 = 13;

#[derive(Clone, Copy)]
enum State {
    InPreamble { ones: u32 },
    InByte { byte: u8, bit_count: u8 },
    AfterByte,
}

/// Result of feeding one bit to the framer.
pub enum FramerStatus {
    /// More bits are needed.
    Continue,
    /// The framer detected an ill-formed frame and has reset to `InPreamble`.
    /// Either [`DecoderError::ShortPreamble`] (the preamble's terminating `0`
    /// arrived after 12 or fewer one-bits) or [`DecoderError::FrameTooLong`]
    /// (a byte was received after the frame buffer was already full).
    Failure(DecoderError),
    /// A complete frame was assembled; the framer has reset to `InPreamble`.
    Success(Frame),
}

/// Bit-stream framer: preamble → bytes+start bits → end bit.
pub struct Framer {
    state: State,
    bytes: Frame,
}

impl Framer {
    pub const fn new() -> Self {
        Self {
            state: State::InPreamble { ones: 0 },
            bytes: Vec::new(),
        }
    }

    /// Resets to the initial `InPreamble` state, discarding any partial frame.
    pub fn reset(&mut self) {
        self.state = State::InPreamble { ones: 0 };
        self.bytes.clear();
    }

    /// Feeds one classified bit.
    pub fn feed(&mut self, bit: Bit) -> FramerStatus {
        match self.state {
            State::InPreamble { ones } => match bit {
                Bit::One => {
                    self.state = State::InPreamble { ones: ones + 1 };
                    FramerStatus::Continue
                }
                Bit::Zero => {
                    if ones <= 12 {
                        self.reset();
                        FramerStatus::Failure(DecoderError::ShortPreamble)
                    } else {
                        self.state = State::InByte {
                            byte: 0,
                            bit_count: 0,
                        };
                        FramerStatus::Continue
                    }
                }
            },
            State::InByte { byte, bit_count } => {
                let b = matches!(bit, Bit::One) as u8;
                let byte = byte | (b << (7 - bit_count));
                let bit_count = bit_count + 1;
                if bit_count == 8 {
                    if self.bytes.push(byte).is_err() {
                        self.reset();
                        return FramerStatus::Failure(DecoderError::FrameTooLong);
                    }
                    self.state = State::AfterByte;
                } else {
                    self.state = State::InByte { byte, bit_count };
                }
                FramerStatus::Continue
            }
            State::AfterByte => match bit {
                Bit::Zero => {
                    self.state = State::InByte {
                        byte: 0,
                        bit_count: 0,
                    };
                    FramerStatus::Continue
                }
                Bit::One => {
                    let frame = self.bytes.clone();
                    self.reset();
                    FramerStatus::Success(frame)
                }
            },
        }
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

/// C4: validates that the last byte of `frame` is the XOR of the preceding bytes.
///
/// On success, returns `frame` unchanged (checksum byte included) — the packet
/// parser (C5) is handed the whole frame, checksum and all, exactly as the
/// validator received it; see `DESIGN.md` for why the checksum byte is not
/// stripped before parsing.
pub fn validate(frame: &[u8]) -> Result<&[u8], DecoderError> {
    let (checksum, data) = frame.split_last().ok_or(DecoderError::ChecksumMismatch)?;
    let computed = data.iter().fold(0u8, |acc, b| acc ^ b);
    if computed == *checksum {
        Ok(frame)
    } else {
        Err(DecoderError::ChecksumMismatch)
    }
}

/// Feeds an entire sequence of bits through a fresh [`Framer`] and returns the
/// status of the last bit fed. Handy for tests that assert on a whole packet's
/// worth of bits at once; not used by the decoder façade, which feeds one bit
/// at a time.
#[cfg(test)]
fn feed_all(framer: &mut Framer, bits: &[Bit]) -> FramerStatus {
    let mut last = FramerStatus::Continue;
    for &bit in bits {
        last = framer.feed(bit);
    }
    last
}
