//! Error taxonomy for the decoding pipeline and the advisory logging hooks.
//!
//! Every recoverable condition the pipeline can hit is represented here. None of
//! these ever panics the decoder; they are returned to the caller (or folded into
//! `Continue`/`Failure` at the façade) and, if a hook is installed, also reported
//! through it for diagnostics.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Something the decoding pipeline could not make sense of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderError {
    /// The signal ring buffer was full when a producer tried to write into it.
    #[error("signal ring buffer is full")]
    BufferOverflow,
    /// Two consecutive half-bit periods matched neither the `1` nor the `0` timing band.
    #[error("half-bit periods did not classify as 0 or 1")]
    SignalPairMismatch,
    /// The preamble ended (a `0` arrived) after 12 or fewer one-bits.
    #[error("preamble shorter than the required 13 one-bits")]
    ShortPreamble,
    /// A frame grew past the framer's fixed-size byte buffer.
    #[error("frame exceeded the byte buffer capacity")]
    FrameTooLong,
    /// The trailing checksum byte did not equal the XOR of the preceding bytes.
    #[error("checksum mismatch")]
    ChecksumMismatch,
    /// A validated frame matched none of the known packet recognisers.
    #[error("frame matched no known packet variant")]
    UnrecognisedPacket,
}

/// Process-wide advisory hooks, installed once at decoder construction.
///
/// Neither hook may influence decoding: they exist purely so a caller can surface
/// diagnostics (counters, traces, an assertion handler) without the core depending
/// on any particular logging framework. See [`crate::decoder::DecoderOptions`].
#[derive(Clone, Copy)]
pub struct Hooks {
    /// Invoked whenever the pipeline reports a [`DecoderError`].
    pub on_error: Option<fn(DecoderError)>,
    /// Invoked for low-level tracing (state transitions, frame boundaries).
    ///
    /// The message is pre-rendered by the caller site; the hook performs no
    /// formatting itself so it stays usable from a `no_std` interrupt context.
    pub on_debug: Option<fn(&str)>,
}

impl Hooks {
    /// Hooks that do nothing. The default for [`crate::decoder::DecoderOptions`].
    pub const fn none() -> Self {
        Self {
            on_error: None,
            on_debug: None,
        }
    }

    pub(crate) fn error(&self, err: DecoderError) {
        if let Some(hook) = self.on_error {
            hook(err);
        }
        #[cfg(feature = "defmt")]
        defmt::trace!("decoder error: {}", err);
    }

    pub(crate) fn debug(&self, msg: &str) {
        if let Some(hook) = self.on_debug {
            hook(msg);
        }
        #[cfg(feature = "defmt")]
        defmt::trace!("{}", msg);
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self::none()
    }
}
