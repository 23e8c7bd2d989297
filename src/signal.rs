//! C1: the lock-free signal ring buffer.
//!
//! A fixed-capacity SPSC queue of microsecond timestamps. The producer is the
//! track-edge interrupt handler; the consumer is the main decode loop. Capacity
//! is a const generic so a caller picks the size that fits their target instead
//! of the crate hardcoding one.
//!
//! There is no atomic fast path here: both sides serialise through a
//! [`critical_section::Mutex`], which on a single-core target compiles down to a
//! brief interrupt mask around each access — the non-atomic option named in the
//! concurrency design. Hosted tests get the same code, backed by
//! `critical-section`'s `std` implementation.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::error::DecoderError;

struct Inner<const N: usize> {
    buf: [u32; N],
    write_index: usize,
    read_index: usize,
    count: usize,
}

impl<const N: usize> Inner<N> {
    const fn new() -> Self {
        Self {
            buf: [0; N],
            write_index: 0,
            read_index: 0,
            count: 0,
        }
    }
}

/// SPSC ring buffer of timestamps, capacity `N`.
pub struct SignalBuffer<const N: usize> {
    inner: Mutex<RefCell<Inner<N>>>,
}

impl<const N: usize> SignalBuffer<N> {
    /// An empty buffer. `N` must be at least 1.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner::new())),
        }
    }

    /// Appends a timestamp. Safe to call from interrupt context.
    ///
    /// Fails with [`DecoderError::BufferOverflow`] iff the buffer is full; the
    /// timestamp is not written in that case.
    pub fn write(&self, timestamp: u32) -> Result<(), DecoderError> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.count == N {
                return Err(DecoderError::BufferOverflow);
            }
            let idx = inner.write_index;
            inner.buf[idx] = timestamp;
            inner.write_index = (idx + 1) % N;
            inner.count += 1;
            Ok(())
        })
    }

    /// Removes and returns the oldest timestamp, or `None` if the buffer is empty.
    pub fn read(&self) -> Option<u32> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.count == 0 {
                return None;
            }
            let idx = inner.read_index;
            let t = inner.buf[idx];
            inner.read_index = (idx + 1) % N;
            inner.count -= 1;
            Some(t)
        })
    }

    /// Drains up to `dst.len()` timestamps into `dst`, oldest first. Never fails;
    /// returns the number actually written.
    pub fn read_many(&self, dst: &mut [u32]) -> usize {
        let mut actual = 0;
        while actual < dst.len() {
            match self.read() {
                Some(t) => {
                    dst[actual] = t;
                    actual += 1;
                }
                None => break,
            }
        }
        actual
    }

    /// Number of timestamps currently queued.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).count)
    }

    /// `true` iff [`Self::len`] is zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed capacity `N`.
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for SignalBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_returns_fifo_order() {
        let buf: SignalBuffer<4> = SignalBuffer::new();
        buf.write(10).unwrap();
        buf.write(20).unwrap();
        assert_eq!(buf.read(), Some(10));
        assert_eq!(buf.read(), Some(20));
        assert_eq!(buf.read(), None);
    }

    #[test]
    fn capacity_one_write_succeeds_second_write_fails() {
        let buf: SignalBuffer<1> = SignalBuffer::new();
        assert!(buf.write(1).is_ok());
        assert_eq!(buf.write(2), Err(DecoderError::BufferOverflow));
    }

    #[test]
    fn read_on_empty_fails() {
        let buf: SignalBuffer<1> = SignalBuffer::new();
        assert_eq!(buf.read(), None);
    }

    #[test]
    fn capacity_one_drains_then_refills() {
        let buf: SignalBuffer<1> = SignalBuffer::new();
        buf.write(1).unwrap();
        assert_eq!(buf.read(), Some(1));
        buf.write(2).unwrap();
        assert_eq!(buf.read(), Some(2));
    }

    #[test]
    fn overflowing_write_does_not_clobber_pending_item() {
        let buf: SignalBuffer<1> = SignalBuffer::new();
        buf.write(1).unwrap();
        assert!(buf.write(2).is_err());
        assert_eq!(buf.read(), Some(1));
    }

    #[test]
    fn read_many_drains_and_clamps() {
        let buf: SignalBuffer<4> = SignalBuffer::new();
        buf.write(1).unwrap();
        buf.write(2).unwrap();
        buf.write(3).unwrap();
        let mut dst = [0u32; 2];
        let n = buf.read_many(&mut dst);
        assert_eq!(n, 2);
        assert_eq!(dst, [1, 2]);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn wraps_around_capacity_boundary() {
        let buf: SignalBuffer<2> = SignalBuffer::new();
        buf.write(1).unwrap();
        buf.write(2).unwrap();
        assert_eq!(buf.read(), Some(1));
        buf.write(3).unwrap();
        assert_eq!(buf.read(), Some(2));
        assert_eq!(buf.read(), Some(3));
        assert_eq!(buf.read(), None);
    }
}
