//! Brotli-specific error types.
//!
//! Errors fall into two disjoint categories. [`StreamError`] means the
//! compressed data is corrupt or incomplete; the session that saw it is
//! finished and every later call reports the same value. [`UsageError`]
//! means the API was driven incorrectly (or an internal invariant broke)
//! and is a programming error on the caller's side.

use oxiarc_core::OxiArcError;
use std::io;
use thiserror::Error;

/// Corruption detected in the compressed stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Code lengths of a complex prefix code ran past the alphabet.
    #[error("corrupted code length table")]
    CorruptedCodeLengthTable,

    /// A zero run in a context map ran past the end of the map.
    #[error("corrupted context map")]
    CorruptedContextMap,

    /// The code length code histogram is over- or under-subscribed.
    #[error("corrupted Huffman code histogram")]
    CorruptedHuffmanHistogram,

    /// Bits skipped to reach a byte boundary were not zero.
    #[error("corrupted padding bits")]
    CorruptedPaddingBits,

    /// The reserved bit of a metadata block header was set.
    #[error("corrupted reserved bit")]
    CorruptedReservedBit,

    /// A simple prefix code listed the same symbol twice.
    #[error("duplicate simple Huffman code symbol")]
    DuplicateSimpleHuffmanSymbol,

    /// The last length nibble (or byte) of a meta-block header is zero.
    #[error("exuberant nibble")]
    ExuberantNibble,

    /// A copy points outside the window and every dictionary.
    #[error("invalid backward reference")]
    InvalidBackwardReference,

    /// The commands of a meta-block produce more bytes than it declares.
    #[error("invalid metablock length")]
    InvalidMetablockLength,

    /// The stream header does not encode a supported window size.
    #[error("invalid window bits")]
    InvalidWindowBits,

    /// A short distance code resolved to a distance below one.
    #[error("negative distance")]
    NegativeDistance,

    /// The stream ended before the final meta-block was complete.
    #[error("truncated input")]
    TruncatedInput,

    /// Input continues after the final meta-block.
    #[error("unused bytes after end of stream")]
    UnusedBytesAfterEnd,

    /// Decoded code lengths leave part of the code space unassigned.
    #[error("unused Huffman space")]
    UnusedHuffmanSpace,

    /// A simple prefix code named a symbol outside its alphabet.
    #[error("symbol out of range")]
    SymbolOutOfRange,

    /// The input source reported an I/O error.
    #[error("read failed ({kind:?}): {message}")]
    ReadFailed {
        /// Kind of the underlying I/O error.
        kind: io::ErrorKind,
        /// Display text of the underlying I/O error.
        message: String,
    },
}

/// Misuse of the decoder API or a broken internal invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// The session was closed.
    #[error("decoder session already closed")]
    AlreadyClosed,

    /// Options can only change before any input is fed.
    #[error("decoder session must be freshly initialized")]
    StateNotFresh,

    /// At most [`MAX_DICTIONARY_CHUNKS`](crate::MAX_DICTIONARY_CHUNKS) chunks can be attached.
    #[error("too many compound dictionary chunks (max {max})")]
    TooManyDictionaryChunks {
        /// Maximum number of chunks.
        max: usize,
    },

    /// A raw byte copy was requested off a byte boundary.
    #[error("unaligned raw byte copy")]
    UnalignedCopy,

    /// The state machine reached a state it can never be in.
    #[error("unreachable decoder state: {0}")]
    Unreachable(&'static str),

    /// A custom static dictionary failed validation.
    #[error("invalid dictionary: {0}")]
    InvalidDictionary(String),
}

/// Brotli decompression errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrotliError {
    /// The compressed stream is corrupt or incomplete.
    #[error("brotli stream error: {0}")]
    Stream(#[from] StreamError),

    /// The decoder was used incorrectly.
    #[error("brotli usage error: {0}")]
    Usage(#[from] UsageError),
}

/// Result type for Brotli operations.
pub type Result<T> = std::result::Result<T, BrotliError>;

impl BrotliError {
    /// Returns the stream error, if this is one.
    pub fn stream(&self) -> Option<&StreamError> {
        match self {
            Self::Stream(err) => Some(err),
            Self::Usage(_) => None,
        }
    }

    /// Returns true if the compressed data was at fault.
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Returns true if the stream ended early.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Stream(StreamError::TruncatedInput))
    }

    /// Converts into the workspace error type.
    ///
    /// `offset` is the number of compressed bytes consumed when the error
    /// was detected.
    pub fn into_core(self, offset: u64) -> OxiArcError {
        match self {
            Self::Stream(err) => match err {
                StreamError::TruncatedInput => OxiArcError::unexpected_eof(1),
                StreamError::InvalidWindowBits | StreamError::CorruptedReservedBit => {
                    OxiArcError::invalid_header(err.to_string())
                }
                StreamError::CorruptedCodeLengthTable
                | StreamError::CorruptedHuffmanHistogram
                | StreamError::DuplicateSimpleHuffmanSymbol
                | StreamError::UnusedHuffmanSpace
                | StreamError::SymbolOutOfRange => OxiArcError::invalid_huffman(offset * 8),
                StreamError::InvalidBackwardReference | StreamError::NegativeDistance => {
                    OxiArcError::corrupted(offset, err.to_string())
                }
                StreamError::ReadFailed { kind, message } => {
                    OxiArcError::Io(io::Error::new(kind, message))
                }
                other => OxiArcError::corrupted(offset, other.to_string()),
            },
            Self::Usage(err) => OxiArcError::invalid_state(err.to_string()),
        }
    }
}

impl From<BrotliError> for OxiArcError {
    fn from(err: BrotliError) -> Self {
        err.into_core(0)
    }
}

impl From<BrotliError> for io::Error {
    fn from(err: BrotliError) -> Self {
        match err {
            BrotliError::Stream(StreamError::ReadFailed { kind, message }) => {
                io::Error::new(kind, message)
            }
            BrotliError::Stream(StreamError::TruncatedInput) => {
                io::Error::new(io::ErrorKind::UnexpectedEof, err)
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        StreamError::ReadFailed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
