//! Decoder configuration.

/// Default size of the read buffer used by [`BrotliReader`](crate::BrotliReader).
pub const DEFAULT_INPUT_CHUNK_SIZE: usize = 8192;

/// Brotli decoder options.
///
/// Options are fixed once a session consumes its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Accept "large window" streams (window bits up to 30).
    ///
    /// Large-window streams are not RFC 7932 compliant and use a distinct
    /// header escape; regular streams decode identically either way.
    pub large_window: bool,
    /// Hand decoded bytes to the caller as soon as they fit in the output
    /// buffer instead of when the ring buffer fills.
    pub eager_output: bool,
    /// Number of compressed bytes [`BrotliReader`](crate::BrotliReader)
    /// requests from its source per read.
    pub input_chunk_size: usize,
}

impl DecoderConfig {
    /// RFC 7932 streams, ring-buffer-sized output batches.
    pub const DEFAULT: Self = Self {
        large_window: false,
        eager_output: false,
        input_chunk_size: DEFAULT_INPUT_CHUNK_SIZE,
    };

    /// Eager output with small input reads, for interactive streams.
    pub const LOW_LATENCY: Self = Self {
        large_window: false,
        eager_output: true,
        input_chunk_size: 512,
    };

    /// Accept large-window streams.
    pub const LARGE_WINDOW: Self = Self {
        large_window: true,
        eager_output: false,
        input_chunk_size: DEFAULT_INPUT_CHUNK_SIZE,
    };

    /// Create the default configuration.
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Set large window support.
    pub const fn with_large_window(mut self, enabled: bool) -> Self {
        self.large_window = enabled;
        self
    }

    /// Set eager output.
    pub const fn with_eager_output(mut self, enabled: bool) -> Self {
        self.eager_output = enabled;
        self
    }

    /// Set the reader's input chunk size. Zero is raised to one.
    pub const fn with_input_chunk_size(mut self, size: usize) -> Self {
        self.input_chunk_size = if size == 0 { 1 } else { size };
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
