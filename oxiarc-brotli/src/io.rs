//! [`std::io::Read`] adapter over a compressed byte source.

use crate::config::DecoderConfig;
use crate::decoder::BrotliDecoder;
use crate::error::StreamError;
use oxiarc_core::DecompressStatus;
use std::io::{self, Read};
use tracing::trace;

/// Reader that decompresses a Brotli stream read from `R`.
///
/// Compressed bytes are pulled from the inner reader in chunks of
/// [`DecoderConfig::input_chunk_size`] bytes. Decoding errors surface as
/// [`io::Error`]s of kind `InvalidData`, except truncation, which is
/// `UnexpectedEof`.
///
/// # Example
///
/// ```
/// use oxiarc_brotli::BrotliReader;
/// use std::io::Read;
///
/// let mut reader = BrotliReader::new(&[0x06u8][..]);
/// let mut out = Vec::new();
/// reader.read_to_end(&mut out).unwrap();
/// assert!(out.is_empty());
/// ```
#[derive(Debug)]
pub struct BrotliReader<R> {
    inner: R,
    decoder: BrotliDecoder,
    buffer: Vec<u8>,
    eof: bool,
}

impl<R: Read> BrotliReader<R> {
    /// Wrap `inner` with the default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, DecoderConfig::default())
    }

    /// Wrap `inner` with the given configuration.
    pub fn with_config(inner: R, config: DecoderConfig) -> Self {
        Self::with_decoder(inner, BrotliDecoder::with_config(config))
    }

    /// Wrap `inner` around a prepared decoder, for example one with
    /// dictionary chunks attached.
    pub fn with_decoder(inner: R, decoder: BrotliDecoder) -> Self {
        let chunk = decoder.config().input_chunk_size.max(1);
        Self {
            inner,
            decoder,
            buffer: vec![0u8; chunk],
            eof: false,
        }
    }

    /// The decode session.
    pub fn decoder(&self) -> &BrotliDecoder {
        &self.decoder
    }

    /// Get a reference to the inner reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Get a mutable reference to the inner reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the adapter and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Pull the next compressed chunk into the decoder.
    fn fill(&mut self) -> io::Result<()> {
        let n = loop {
            match self.inner.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(self.decoder.fail_input(StreamError::from(err)).into());
                }
            }
        };
        trace!(bytes = n, "read compressed chunk");
        if n == 0 {
            self.eof = true;
            self.decoder.finish_input()?;
        } else {
            self.decoder.feed(&self.buffer[..n])?;
        }
        Ok(())
    }
}

impl<R: Read> Read for BrotliReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let (written, status) = self.decoder.decode(buf)?;
            if written > 0 {
                return Ok(written);
            }
            match status {
                DecompressStatus::Done => return Ok(0),
                DecompressStatus::NeedsOutput => {}
                DecompressStatus::NeedsInput if self.eof => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "decoder starved after end of input",
                    ));
                }
                DecompressStatus::NeedsInput => self.fill()?,
            }
        }
    }
}
