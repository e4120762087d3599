//! Core traits for streaming codecs.
//!
//! This module defines the push-style interface that decompressors expose to
//! the rest of the stack: the caller hands over whatever compressed bytes it
//! has, provides an output buffer, and learns how much of each was used.

use crate::error::{OxiArcError, Result};

/// Status of a streaming decompression operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressStatus {
    /// More input is needed to continue decompression.
    NeedsInput,
    /// More output buffer space is needed.
    NeedsOutput,
    /// Decompression is complete.
    Done,
}

/// A streaming decompressor (decoder).
///
/// Implementations may buffer input internally, so `consumed` can be smaller
/// than `input.len()` when the decoder applies backpressure. Callers pass
/// `end_of_input = true` once `input` holds the final bytes of the stream;
/// this is what allows a decoder to distinguish a truncated stream from one
/// that is still arriving.
pub trait Decompressor {
    /// Decompress data from input to output.
    ///
    /// # Arguments
    ///
    /// * `input` - Input compressed data
    /// * `output` - Output buffer for decompressed data
    /// * `end_of_input` - `input` ends the compressed stream
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        end_of_input: bool,
    ) -> Result<(usize, usize, DecompressStatus)>;

    /// Reset the decompressor to its initial state.
    fn reset(&mut self);

    /// Check if the decompressor has finished.
    fn is_finished(&self) -> bool;

    /// Decompress all data at once (convenience method).
    fn decompress_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut input_pos = 0;
        let mut buffer = vec![0u8; 32768];

        loop {
            let (consumed, produced, status) =
                self.decompress(&input[input_pos..], &mut buffer, true)?;

            input_pos += consumed;
            output.extend_from_slice(&buffer[..produced]);

            match status {
                DecompressStatus::Done => break,
                DecompressStatus::NeedsInput if input_pos >= input.len() && consumed == 0 => {
                    return Err(OxiArcError::unexpected_eof(1));
                }
                DecompressStatus::NeedsOutput | DecompressStatus::NeedsInput => continue,
            }
        }

        Ok(output)
    }
}
