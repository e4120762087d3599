//! Push-fed little-endian bit reader.
//!
//! Brotli packs every field least-significant bit first. The reader keeps a
//! 64-bit accumulator that is refilled one 32-bit half at a time from a byte
//! buffer, so after [`BitReader::fill_window`] at least 32 bits are ready
//! for peeking or reading.
//!
//! Compressed bytes are pushed in with [`BitReader::feed`]. The buffer always
//! ends with [`SLACK`] zero bytes, which lets the hot decoding paths read a
//! few bytes past the data received so far without bounds juggling. Reading
//! into that padding is never silently accepted: [`BitReader::overrun`]
//! reports it, and the decoder either rewinds to a [`BitReader::mark`] and
//! waits for more input, or fails with a truncated-input error once
//! [`BitReader::finish`] has been called.

use crate::error::{Result, StreamError, UsageError};

/// Zero bytes kept after the genuine input.
pub const SLACK: usize = 64;

/// Genuine bytes that must be buffered past the cursor before a decoding
/// unit is allowed to run without a checkpoint. One command (block switch,
/// command code and both length extras) needs well under this many bytes.
pub const SAFEGUARD: usize = 36;

const HALF_BITS: u32 = 32;
const HALF_BYTES: usize = 4;

/// Bit-level cursor over pushed input.
#[derive(Debug, Clone)]
pub struct BitReader {
    /// Genuine input followed by `SLACK` zero bytes.
    data: Vec<u8>,
    /// Number of genuine bytes at the start of `data`.
    genuine: usize,
    /// Pre-fetched bits; the next unread bit is at `bit_offset`.
    accumulator: u64,
    /// Number of accumulator bits already consumed (64 = empty).
    bit_offset: u32,
    /// Index in `data` of the next byte to load into the accumulator.
    cursor: usize,
    /// No more input will be fed.
    end_of_input: bool,
    /// Bytes dropped from the front of `data` by compaction.
    discarded: u64,
}

impl BitReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self {
            data: vec![0; SLACK],
            genuine: 0,
            accumulator: 0,
            bit_offset: 64,
            cursor: 0,
            end_of_input: false,
            discarded: 0,
        }
    }

    /// Append compressed bytes.
    ///
    /// Fully consumed bytes are released first by sliding the unconsumed
    /// tail to the head of the buffer. Marks taken before a feed are
    /// invalidated.
    pub fn feed(&mut self, chunk: &[u8]) {
        let position = self.position();
        let keep_from = (position / 8).min(self.genuine);

        self.data.truncate(self.genuine);
        self.data.drain(..keep_from);
        self.discarded += keep_from as u64;
        self.genuine -= keep_from;

        self.data.extend_from_slice(chunk);
        self.genuine += chunk.len();
        self.data.resize(self.genuine + SLACK, 0);

        self.sync(position - keep_from * 8);
    }

    /// Record that no further input will arrive.
    pub fn finish(&mut self) {
        self.end_of_input = true;
    }

    /// Whether [`finish`](Self::finish) was called.
    pub fn is_end_of_input(&self) -> bool {
        self.end_of_input
    }

    /// Ensure at least 32 unread bits sit in the accumulator.
    #[inline]
    pub fn fill_window(&mut self) {
        if self.bit_offset >= HALF_BITS {
            let half = self.load_half();
            self.accumulator = (u64::from(half) << HALF_BITS) | (self.accumulator >> HALF_BITS);
            self.bit_offset -= HALF_BITS;
            self.cursor += HALF_BYTES;
        }
    }

    #[inline]
    fn load_half(&self) -> u32 {
        self.data
            .get(self.cursor..self.cursor + HALF_BYTES)
            .and_then(|bytes| bytes.try_into().ok())
            .map_or(0, u32::from_le_bytes)
    }

    /// Unread accumulator bits, lowest bit first.
    #[inline]
    pub fn peek_bits(&self) -> u32 {
        self.accumulator.checked_shr(self.bit_offset).unwrap_or(0) as u32
    }

    /// Consume `n` bits that were already peeked.
    #[inline]
    pub fn drop_bits(&mut self, n: u32) {
        debug_assert!(self.bit_offset + n <= 64);
        self.bit_offset += n;
    }

    /// Read `n <= 32` bits without refilling.
    ///
    /// The caller guarantees the accumulator holds `n` unread bits, which is
    /// the case for up to 32 bits right after [`fill_window`](Self::fill_window).
    #[inline]
    pub fn read_few_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32 && self.bit_offset + n <= 64);
        let value = (self.accumulator.checked_shr(self.bit_offset).unwrap_or(0)
            & ((1u64 << n) - 1)) as u32;
        self.bit_offset += n;
        value
    }

    /// Refill, then read `n <= 32` bits.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> u32 {
        self.fill_window();
        self.read_few_bits(n)
    }

    /// Skip to the next byte boundary; the skipped bits must be zero.
    pub fn jump_to_byte_boundary(&mut self) -> Result<()> {
        let padding = (64 - self.bit_offset) & 7;
        if padding != 0 && self.read_few_bits(padding) != 0 {
            return Err(StreamError::CorruptedPaddingBits.into());
        }
        Ok(())
    }

    /// Copy raw bytes from a byte-aligned position into `dst`.
    ///
    /// Copies as many genuine bytes as are buffered, up to `dst.len()`, and
    /// returns the count.
    pub fn copy_raw_bytes(&mut self, dst: &mut [u8]) -> Result<usize> {
        if self.bit_offset & 7 != 0 {
            return Err(UsageError::UnalignedCopy.into());
        }
        let start = self.position() / 8;
        let n = dst.len().min(self.genuine.saturating_sub(start));
        dst[..n].copy_from_slice(&self.data[start..start + n]);
        self.sync((start + n) * 8);
        Ok(n)
    }

    /// Snapshot the read position.
    #[inline]
    pub fn mark(&self) -> usize {
        self.position()
    }

    /// Return to a position captured by [`mark`](Self::mark) since the last feed.
    pub fn rewind(&mut self, mark: usize) {
        self.sync(mark);
    }

    /// The cursor has consumed bits beyond the genuine input.
    #[inline]
    pub fn overrun(&self) -> bool {
        self.position() > self.genuine * 8
    }

    /// At least [`SAFEGUARD`] genuine bytes remain past the cursor.
    #[inline]
    pub fn has_margin(&self) -> bool {
        self.genuine.saturating_sub(self.consumed_bytes()) >= SAFEGUARD
    }

    /// Genuine bytes not yet touched by the cursor.
    pub fn unused_bytes(&self) -> usize {
        self.genuine.saturating_sub(self.consumed_bytes())
    }

    /// Verify the cursor stayed inside the genuine input.
    ///
    /// With `end_of_stream`, additionally require that every genuine byte
    /// was consumed.
    pub fn check_health(&self, end_of_stream: bool) -> Result<()> {
        if self.overrun() {
            return Err(StreamError::TruncatedInput.into());
        }
        if end_of_stream && self.unused_bytes() != 0 {
            return Err(StreamError::UnusedBytesAfterEnd.into());
        }
        Ok(())
    }

    /// Compressed bytes consumed since creation.
    pub fn total_in(&self) -> u64 {
        self.discarded + self.consumed_bytes().min(self.genuine) as u64
    }

    /// Position of the next unread bit, relative to the start of `data`.
    #[inline]
    fn position(&self) -> usize {
        self.cursor * 8 + self.bit_offset as usize - 64
    }

    #[inline]
    fn consumed_bytes(&self) -> usize {
        self.position().div_ceil(8)
    }

    /// Reload the accumulator so the next unread bit is `position`.
    fn sync(&mut self, position: usize) {
        self.cursor = position / 8;
        self.accumulator = 0;
        self.bit_offset = 64;
        self.fill_window();
        self.fill_window();
        self.bit_offset = (position % 8) as u32;
    }
}

impl Default for BitReader {
    fn default() -> Self {
        Self::new()
    }
}
