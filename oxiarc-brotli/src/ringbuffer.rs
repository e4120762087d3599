//! Output ring buffer.
//!
//! Decoded bytes are written at `pos` and handed to the caller from the
//! `[bytes_written, bytes_ready)` region. The buffer is `size` bytes (a power
//! of two) plus [`RING_BUFFER_SLACK`] bytes that let a dictionary word run
//! past the physical end; such overflow is folded back to the start by
//! [`RingBuffer::wrap`].
//!
//! Allocation is lazy. The window declared by the stream header bounds the
//! size, but short streams only get a buffer as large as the meta-block
//! lengths announced so far.

use crate::dictionary::MAX_TRANSFORMED_WORD_LENGTH;
use tracing::debug;

/// Bytes kept after the window for dictionary words.
pub const RING_BUFFER_SLACK: usize = MAX_TRANSFORMED_WORD_LENGTH;

/// Smallest buffer allocated for a stream that has more meta-blocks to come.
const MIN_NON_FINAL_SIZE: usize = 16384;

/// Decoder history and output staging area.
#[derive(Debug, Clone, Default)]
pub struct RingBuffer {
    data: Vec<u8>,
    size: usize,
    max_size: usize,
    pos: usize,
    bytes_ready: usize,
    bytes_written: usize,
}

impl RingBuffer {
    /// Create an unallocated buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the largest size the buffer may grow to (the window size).
    pub fn set_max_size(&mut self, max_size: usize) {
        debug_assert!(max_size.is_power_of_two());
        self.max_size = max_size;
    }

    /// Current allocated window size.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Window size declared by the stream.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Write position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Grow to fit `expected_total` bytes of output, within the window.
    ///
    /// Never shrinks; existing bytes keep their positions. Returns whether
    /// the buffer was reallocated.
    pub fn grow(&mut self, expected_total: usize, is_last: bool) -> bool {
        if self.size >= self.max_size {
            return false;
        }
        let mut new_size = self.max_size;
        if new_size > expected_total {
            while new_size >> 1 > expected_total {
                new_size >>= 1;
            }
            if !is_last && new_size < MIN_NON_FINAL_SIZE && self.max_size >= MIN_NON_FINAL_SIZE {
                new_size = MIN_NON_FINAL_SIZE;
            }
        }
        if new_size <= self.size {
            return false;
        }

        debug!(old = self.size, new = new_size, "growing ring buffer");
        let mut data = vec![0u8; new_size + RING_BUFFER_SLACK];
        data[..self.size].copy_from_slice(&self.data[..self.size]);
        self.data = data;
        self.size = new_size;
        true
    }

    /// Append one byte. The caller keeps `pos` below the fence.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.data[self.pos] = byte;
        self.pos += 1;
    }

    /// The two most recently written bytes, newest first.
    #[inline]
    pub fn last_two(&self) -> (u8, u8) {
        let mask = self.size.wrapping_sub(1);
        (
            self.data[self.pos.wrapping_sub(1) & mask],
            self.data[self.pos.wrapping_sub(2) & mask],
        )
    }

    /// Copy `len` bytes from `distance` back, as if one byte at a time in
    /// increasing order, so a source that overlaps the destination repeats.
    ///
    /// Source positions wrap at the physical end. `pos + len` must not
    /// exceed the window size.
    pub fn copy_match(&mut self, distance: usize, len: usize) {
        debug_assert!(self.pos + len <= self.size);
        let mask = self.size - 1;
        let mut done = 0;
        while done < len {
            let dst = self.pos + done;
            let src = dst.wrapping_sub(distance) & mask;
            let mut run = (len - done).min(self.size - src);
            if src < dst && dst - src < run {
                run = dst - src;
            }
            self.data.copy_within(src..src + run, dst);
            done += run;
        }
        self.pos += len;
    }

    /// Writable tail starting at `pos`, including the slack.
    #[inline]
    pub fn tail_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.pos..]
    }

    /// Writable slice of `len` bytes at `pos`; `pos + len` stays within
    /// the window.
    #[inline]
    pub fn window_mut(&mut self, len: usize) -> &mut [u8] {
        &mut self.data[self.pos..self.pos + len]
    }

    /// Account for `len` bytes written through [`tail_mut`](Self::tail_mut)
    /// or [`window_mut`](Self::window_mut).
    #[inline]
    pub fn advance(&mut self, len: usize) {
        self.pos += len;
    }

    /// Position at which decoding must stop and flush.
    ///
    /// In eager mode the fence also stops decoding once the bytes produced
    /// since the last flush would fill the caller's remaining output.
    #[inline]
    pub fn fence(&self, eager: bool, output_remaining: usize) -> usize {
        if eager {
            self.size.min(self.bytes_written + output_remaining)
        } else {
            self.size
        }
    }

    /// Mark everything written so far as ready for the caller.
    #[inline]
    pub fn mark_ready(&mut self) {
        self.bytes_ready = self.pos.min(self.size);
    }

    /// Ready bytes not yet handed out.
    #[inline]
    pub fn pending(&self) -> usize {
        self.bytes_ready - self.bytes_written
    }

    /// Copy ready bytes into `out`; returns how many were copied.
    pub fn write_out(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.pending());
        out[..n].copy_from_slice(&self.data[self.bytes_written..self.bytes_written + n]);
        self.bytes_written += n;
        n
    }

    /// Fold bytes written past the window end back to the start.
    ///
    /// Only valid once every byte of the window was written out.
    pub fn wrap(&mut self) {
        if self.size != 0 && self.pos >= self.size {
            if self.pos > self.size {
                self.data.copy_within(self.size..self.pos, 0);
            }
            self.pos &= self.size - 1;
            self.bytes_written = 0;
            self.bytes_ready = 0;
        }
    }

    /// Release the buffer.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
