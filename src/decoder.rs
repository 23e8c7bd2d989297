//! C6: the decoder façade — the single entry point orchestrating C2 → C3 → C4 → C5.

use crate::classifier::{BitClassifier, ClassifierStatus};
use crate::error::Hooks;
use crate::framer::{Framer, FramerStatus, validate};
use crate::packet::{self, Packet};

/// Construction-time configuration for a [`Decoder`].
#[derive(Clone, Copy, Default)]
pub struct DecoderOptions {
    /// The per-decoder FL-control-mode CV, forwarded by the caller. `false`
    /// selects the 5-bit speed field in baseline speed-and-direction packets;
    /// `true` selects the 4-bit field with a dedicated headlight (`FL`) bit.
    ///
    /// CV storage itself is out of scope for this crate (see SPEC_FULL.md §1);
    /// the caller reads its own CV29 and passes the result in here.
    pub fl_control: bool,
    /// Advisory error/debug hooks. Defaults to no-ops.
    pub hooks: Hooks,
}

/// Result of feeding one timestamp to the façade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// No frame is ready yet; keep feeding timestamps.
    Continue,
    /// A recoverable error occurred; the classifier or framer has already
    /// resynchronised itself. Keep feeding timestamps.
    Failure,
    /// A frame was validated and parsed.
    Success(Packet),
}

/// Owns the classifier and framer state and drives one timestamp through the
/// whole C2→C3→C4→C5 pipeline per call to [`Decoder::decode`].
pub struct Decoder {
    classifier: BitClassifier,
    framer: Framer,
    options: DecoderOptions,
}

impl Decoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            classifier: BitClassifier::new(),
            framer: Framer::new(),
            options,
        }
    }

    /// Feeds one microsecond timestamp through the pipeline.
    pub fn decode(&mut self, signal: u32) -> DecodeOutcome {
        let bit = match self.classifier.feed(signal) {
            ClassifierStatus::Continue => return DecodeOutcome::Continue,
            ClassifierStatus::Failure(e) => {
                // Masked to `Continue` at the façade: the framer, not the
                // caller, is what resynchronises the stream (§4.6 step 1).
                self.options.hooks.error(e);
                return DecodeOutcome::Continue;
            }
            ClassifierStatus::Success(bit) => bit,
        };

        let frame = match self.framer.feed(bit) {
            FramerStatus::Continue => return DecodeOutcome::Continue,
            FramerStatus::Failure(e) => {
                self.options.hooks.error(e);
                return DecodeOutcome::Failure;
            }
            FramerStatus::Success(frame) => frame,
        };

        let validated = match validate(&frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.options.hooks.error(e);
                return DecodeOutcome::Failure;
            }
        };

        match packet::parse(validated) {
            Ok(packet) => DecodeOutcome::Success(packet),
            Err(e) => {
                self.options.hooks.error(e);
                DecodeOutcome::Failure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{Direction, LocomotiveSpeed, Speed5Bit};

    fn bits_for_byte(byte: u8) -> [bool; 8] {
        let mut out = [false; 8];
        for (i, bit) in out.iter_mut().enumerate() {
            *bit = byte & (1 << (7 - i)) != 0;
        }
        out
    }

    /// Turns a frame's bytes into the timestamp stream that would classify and
    /// frame to exactly those bytes: a 15-bit preamble, a `0` start bit, each
    /// byte MSB-first with a `0` separator between bytes, and a final `1`.
    fn timestamps_for_frame(bytes: &[u8]) -> std::vec::Vec<u32> {
        let mut bits = std::vec::Vec::new();
        for _ in 0..15 {
            bits.push(true);
        }
        bits.push(false);
        for (i, &byte) in bytes.iter().enumerate() {
            if i > 0 {
                bits.push(false);
            }
            bits.extend_from_slice(&bits_for_byte(byte));
        }
        bits.push(true);

        let mut t = 0u32;
        let mut timestamps = std::vec::Vec::new();
        timestamps.push(t);
        for bit in bits {
            let half = if bit { 58 } else { 100 };
            t += half;
            timestamps.push(t);
            t += half;
            timestamps.push(t);
        }
        timestamps
    }

    #[test]
    fn decodes_a_full_baseline_speed_and_direction_packet() {
        let mut decoder = Decoder::new(DecoderOptions::default());
        let timestamps = timestamps_for_frame(&[0x01, 0x6A, 0x6B]);

        let mut successes = std::vec::Vec::new();
        for t in timestamps {
            if let DecodeOutcome::Success(packet) = decoder.decode(t) {
                successes.push(packet);
            }
        }

        assert_eq!(successes.len(), 1);
        assert_eq!(
            successes[0],
            Packet::SpeedAndDirectionForLocomotive {
                address: 1,
                direction: Direction::Forward,
                speed: LocomotiveSpeed::FiveBit {
                    speed: Speed5Bit::Step(17)
                },
            }
        );
    }

    #[test]
    fn decodes_reset_for_all_decoders() {
        let mut decoder = Decoder::new(DecoderOptions::default());
        let timestamps = timestamps_for_frame(&[0x00, 0x00, 0x00]);

        let mut successes = std::vec::Vec::new();
        for t in timestamps {
            if let DecodeOutcome::Success(packet) = decoder.decode(t) {
                successes.push(packet);
            }
        }
        assert_eq!(successes, std::vec![Packet::ResetForAllDecoders]);
    }

    #[test]
    fn checksum_mismatch_is_reported_as_failure_and_recovers() {
        let mut decoder = Decoder::new(DecoderOptions::default());
        let mut timestamps = timestamps_for_frame(&[0x00, 0x00, 0x01]); // bad checksum
        timestamps.extend(timestamps_for_frame(&[0x00, 0x00, 0x00]));

        let mut saw_failure = false;
        let mut successes = std::vec::Vec::new();
        for t in timestamps {
            match decoder.decode(t) {
                DecodeOutcome::Failure => saw_failure = true,
                DecodeOutcome::Success(packet) => successes.push(packet),
                DecodeOutcome::Continue => {}
            }
        }

        assert!(saw_failure);
        assert_eq!(successes, std::vec![Packet::ResetForAllDecoders]);
    }
}
