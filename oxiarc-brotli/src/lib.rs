//! # OxiArc Brotli
//!
//! Pure Rust streaming decompressor for the Brotli format (RFC 7932).
//!
//! ## Features
//!
//! - **Push decoding**: feed compressed bytes in pieces of any size and
//!   drain decoded bytes into buffers of any size
//!   - Suspends and resumes at any byte boundary of input or output
//!   - Eager output for low-latency consumers
//! - **Full format**: context modeling, block switching, the static
//!   dictionary with all 121 transforms, metadata and uncompressed blocks
//! - **Large window** streams (up to 1 GiB windows)
//! - **Compound dictionaries**: up to 15 caller-supplied chunks that
//!   backward references can reach past the window
//! - [`std::io::Read`] adapter and the [`oxiarc_core::Decompressor`] trait
//!
//! ## Example
//!
//! ```rust
//! use oxiarc_brotli::decompress;
//!
//! // Uncompressed meta-block holding "hi", then an empty last meta-block.
//! let stream = [0x10, 0x00, 0x10, b'h', b'i', 0x03];
//! assert_eq!(decompress(&stream).unwrap(), b"hi");
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use oxiarc_brotli::BrotliDecoder;
//! use oxiarc_core::DecompressStatus;
//!
//! let mut decoder = BrotliDecoder::new();
//! let mut out = Vec::new();
//! let mut buf = [0u8; 1];
//! for &byte in &[0x10, 0x00, 0x10, b'h', b'i', 0x03] {
//!     decoder.feed(&[byte]).unwrap();
//!     loop {
//!         let (n, status) = decoder.decode(&mut buf).unwrap();
//!         out.extend_from_slice(&buf[..n]);
//!         if status != DecompressStatus::NeedsOutput {
//!             break;
//!         }
//!     }
//! }
//! assert!(decoder.is_finished());
//! assert_eq!(out, b"hi");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![forbid(unsafe_code)]

pub mod bitreader;
pub mod compound;
pub mod config;
pub mod context;
pub mod decoder;
pub mod dictionary;
pub mod error;
pub mod huffman;
pub mod io;
pub mod metablock;
pub mod prefix;
pub mod ringbuffer;
pub mod transform;

#[cfg(test)]
mod testutil;

// Re-exports
pub use compound::MAX_DICTIONARY_CHUNKS;
pub use config::DecoderConfig;
pub use decoder::{BrotliDecoder, SessionStatus};
pub use dictionary::Dictionary;
pub use error::{BrotliError, Result, StreamError, UsageError};
pub use io::BrotliReader;
pub use transform::Transforms;

/// Decompress a complete Brotli stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_with_config(data, DecoderConfig::default())
}

/// Decompress a complete Brotli stream with the given configuration.
pub fn decompress_with_config(data: &[u8], config: DecoderConfig) -> Result<Vec<u8>> {
    decoder::decode_all(&mut BrotliDecoder::with_config(config), data)
}

/// Decompress a stream that references the given compound dictionary
/// chunks, in order.
pub fn decompress_with_dictionary(data: &[u8], chunks: &[&[u8]]) -> Result<Vec<u8>> {
    let mut decoder = BrotliDecoder::new();
    for &chunk in chunks {
        decoder.attach_dictionary_chunk(chunk)?;
    }
    decoder::decode_all(&mut decoder, data)
}
