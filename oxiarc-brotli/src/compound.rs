//! Compound dictionary: caller supplied chunks addressed past the window.
//!
//! The chunks form one address space in attachment order. A 256-entry block
//! map built on first use gives, for every `1 << block_bits` wide block of
//! that space, the first chunk that may contain an address in it.

use crate::error::{Result, StreamError, UsageError};
use std::sync::Arc;

/// Maximum number of chunks a session accepts.
pub const MAX_DICTIONARY_CHUNKS: usize = 15;

const BLOCK_MAP_BITS: u32 = 8;

/// Attached chunks and their lookup structures.
#[derive(Debug, Clone)]
pub struct CompoundDictionary {
    chunks: Vec<Arc<[u8]>>,
    /// `offsets[i]` is the address of chunk `i`; the last entry is the total.
    offsets: Vec<usize>,
    block_bits: Option<u32>,
    block_map: Vec<u8>,
}

/// Progress of one copy out of the compound dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompoundCopy {
    index: usize,
    offset: usize,
    length: usize,
    copied: usize,
}

impl CompoundCopy {
    /// All bytes were copied.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.copied == self.length
    }
}

impl CompoundDictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self {
            chunks: Vec::new(),
            offsets: vec![0],
            block_bits: None,
            block_map: Vec::new(),
        }
    }

    /// Append a chunk.
    pub fn attach(&mut self, chunk: Arc<[u8]>) -> Result<()> {
        if self.chunks.len() == MAX_DICTIONARY_CHUNKS {
            return Err(UsageError::TooManyDictionaryChunks {
                max: MAX_DICTIONARY_CHUNKS,
            }
            .into());
        }
        let total = self.total_size() + chunk.len();
        self.chunks.push(chunk);
        self.offsets.push(total);
        self.block_bits = None;
        Ok(())
    }

    /// Combined length of all chunks.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Number of attached chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// No chunk is attached.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn build_block_map(&mut self) -> u32 {
        let total = self.total_size();
        let mut bits = BLOCK_MAP_BITS;
        while (total - 1) >> bits != 0 {
            bits += 1;
        }
        bits -= BLOCK_MAP_BITS;

        self.block_map = vec![0u8; 1 << BLOCK_MAP_BITS];
        let mut cursor = 0;
        let mut index = 0;
        while cursor < total {
            while self.offsets[index + 1] < cursor {
                index += 1;
            }
            self.block_map[cursor >> bits] = index as u8;
            cursor += 1 << bits;
        }
        self.block_bits = Some(bits);
        bits
    }

    /// Locate `length` bytes at `address` of the compound space.
    ///
    /// A copy that would run past the last chunk is an invalid backward
    /// reference.
    pub fn start_copy(&mut self, address: usize, length: usize) -> Result<CompoundCopy> {
        let total = self.total_size();
        if address >= total || length > total - address {
            return Err(StreamError::InvalidBackwardReference.into());
        }
        let bits = match self.block_bits {
            Some(bits) => bits,
            None => self.build_block_map(),
        };
        let mut index = usize::from(self.block_map[address >> bits]);
        while address >= self.offsets[index + 1] {
            index += 1;
        }
        Ok(CompoundCopy {
            index,
            offset: address - self.offsets[index],
            length,
            copied: 0,
        })
    }

    /// Continue `copy` into `dst`, returning the number of bytes written.
    pub fn copy_into(&self, copy: &mut CompoundCopy, dst: &mut [u8]) -> usize {
        let mut written = 0;
        while !copy.is_done() && written < dst.len() {
            let Some(chunk) = self.chunks.get(copy.index) else {
                break;
            };
            let remaining_in_chunk = chunk.len() - copy.offset;
            let n = (copy.length - copy.copied)
                .min(remaining_in_chunk)
                .min(dst.len() - written);
            dst[written..written + n].copy_from_slice(&chunk[copy.offset..copy.offset + n]);
            written += n;
            copy.offset += n;
            copy.copied += n;
            if n == remaining_in_chunk {
                copy.index += 1;
                copy.offset = 0;
            }
        }
        written
    }
}

impl Default for CompoundDictionary {
    fn default() -> Self {
        Self::new()
    }
}
