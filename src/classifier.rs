//! C2: the signal-stream bit classifier.
//!
//! Turns timestamp triples into logical bits by measuring the two half-bit
//! periods they imply. Constants and bands are the NMRA-conformant "received"
//! timing windows, not the looser "sent" windows a command station is allowed to
//! transmit.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::DecoderError;

/// Minimum half-bit period, in microseconds, classified as a `1`.
pub const MIN_ONE_HALF_BIT_US: u32 = 52;
/// Maximum half-bit period, in microseconds, classified as a `1`.
pub const MAX_ONE_HALF_BIT_US: u32 = 64;
/// Maximum allowed difference between a `1` bit's two half-bit periods.
pub const MAX_ONE_HALF_BIT_DIFF_US: u32 = 6;
/// Minimum half-bit period, in microseconds, classified as a `0`.
pub const MIN_ZERO_HALF_BIT_US: u32 = 90;
/// Maximum half-bit period, in microseconds, classified as a `0`.
pub const MAX_ZERO_HALF_BIT_US: u32 = 10_000;
/// Maximum combined period of a (possibly stretched) `0` bit's two halves.
pub const MAX_STRETCHED_ZERO_US: u32 = 12_000;

/// A decoded DCC bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bit {
    Zero,
    One,
}

/// Result of feeding one timestamp to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierStatus {
    /// Not enough timestamps retained yet to form a candidate pair.
    Continue,
    /// A candidate pair was evaluated and matched neither timing band; the
    /// window has been slid by one and the classifier is ready for the next
    /// timestamp. Always [`DecoderError::SignalPairMismatch`].
    Failure(DecoderError),
    /// A bit was produced.
    Success(Bit),
}

#[derive(Clone, Copy)]
enum Retained {
    Empty,
    One(u32),
    Two(u32, u32),
}

/// Streaming classifier: retains up to two timestamps between calls.
pub struct BitClassifier {
    retained: Retained,
}

impl BitClassifier {
    pub const fn new() -> Self {
        Self {
            retained: Retained::Empty,
        }
    }

    /// Feeds the next timestamp and advances the classifier's internal window.
    pub fn feed(&mut self, timestamp: u32) -> ClassifierStatus {
        match self.retained {
            Retained::Empty => {
                self.retained = Retained::One(timestamp);
                ClassifierStatus::Continue
            }
            Retained::One(t0) => {
                self.retained = Retained::Two(t0, timestamp);
                ClassifierStatus::Continue
            }
            Retained::Two(t0, t1) => {
                let p1 = t1.wrapping_sub(t0);
                let p2 = timestamp.wrapping_sub(t1);
                match classify(p1, p2) {
                    Some(bit) => {
                        self.retained = Retained::One(timestamp);
                        ClassifierStatus::Success(bit)
                    }
                    None => {
                        self.retained = Retained::Two(t1, timestamp);
                        ClassifierStatus::Failure(DecoderError::SignalPairMismatch)
                    }
                }
            }
        }
    }
}

impl Default for BitClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(p1: u32, p2: u32) -> Option<Bit> {
    let is_one = (MIN_ONE_HALF_BIT_US..=MAX_ONE_HALF_BIT_US).contains(&p1)
        && p1.abs_diff(p2) <= MAX_ONE_HALF_BIT_DIFF_US;
    if is_one {
        return Some(Bit::One);
    }

    let is_zero = (MIN_ZERO_HALF_BIT_US..=MAX_ZERO_HALF_BIT_US).contains(&p1)
        && (MIN_ZERO_HALF_BIT_US..=MAX_ZERO_HALF_BIT_US).contains(&p2)
        && p1 + p2 <= MAX_STRETCHED_ZERO_US;
    if is_zero { Some(Bit::Zero) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_one_bit_pair_classifies_as_one() {
        assert_eq!(classify(58, 58), Some(Bit::One));
    }

    #[test]
    fn mismatched_one_candidate_fails() {
        assert_eq!(classify(51, 58), None);
    }

    #[test]
    fn stretched_zero_pair_classifies_as_zero() {
        assert_eq!(classify(100, 9000), Some(Bit::Zero));
    }

    #[test]
    fn gap_between_bands_is_rejected() {
        assert_eq!(classify(70, 70), None);
        assert_eq!(classify(80, 80), None);
    }

    #[test]
    fn feeding_two_timestamps_only_continues() {
        let mut c = BitClassifier::new();
        assert_eq!(c.feed(0), ClassifierStatus::Continue);
        assert_eq!(c.feed(58), ClassifierStatus::Continue);
    }

    #[test]
    fn feeding_a_full_one_run_produces_two_bits_in_order() {
        let mut c = BitClassifier::new();
        assert_eq!(c.feed(0), ClassifierStatus::Continue);
        assert_eq!(c.feed(58), ClassifierStatus::Continue);
        assert_eq!(c.feed(116), ClassifierStatus::Success(Bit::One));
        assert_eq!(c.feed(174), ClassifierStatus::Continue);
        assert_eq!(c.feed(232), ClassifierStatus::Success(Bit::One));
    }

    #[test]
    fn bad_pair_recovers_by_sliding_the_window() {
        let mut c = BitClassifier::new();
        assert_eq!(c.feed(1), ClassifierStatus::Continue);
        assert_eq!(c.feed(52), ClassifierStatus::Continue);
        assert_eq!(
            c.feed(110),
            ClassifierStatus::Failure(DecoderError::SignalPairMismatch)
        );
    }
}
