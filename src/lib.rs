//! A sans-I/O core for decoding the NMRA Digital Command Control (DCC) track
//! signal into typed command packets.
//!
//! The crate is organised as a small pipeline, leaves first:
//!
//! - [`signal`] — the lock-free signal ring buffer fed from an edge interrupt.
//! - [`classifier`] — turns timestamp triples into logical bits.
//! - [`framer`] — assembles bits into byte frames and validates their checksum.
//! - [`packet`] — the structural parser producing a [`packet::Packet`].
//! - [`decoder`] — [`decoder::Decoder`], the façade tying the above together.
//! - [`render`] — bounded-size diagnostic renderings, for tests and logs.
//!
//! None of this performs I/O: callers own the ring buffer's storage, drive the
//! main-loop drain themselves, and own every produced [`packet::Packet`].
#![no_std]

#[cfg(test)]
extern crate std;

pub mod classifier;
pub mod decoder;
pub mod error;
pub mod framer;
pub mod packet;
pub mod render;
pub mod signal;

pub use decoder::{DecodeOutcome, Decoder, DecoderOptions};
pub use error::{DecoderError, Hooks};
pub use packet::Packet;
pub use signal::SignalBuffer;
