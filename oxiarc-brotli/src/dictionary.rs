//! Static dictionary.
//!
//! Words are grouped by length. Bucket `len` holds `1 << size_bits[len]`
//! words of `len` bytes each, stored back to back after the shorter
//! buckets. A bucket with zero size bits is empty.

use crate::error::{Result, UsageError};
use std::sync::{Arc, OnceLock};

/// Shortest word in the RFC dictionary.
pub const MIN_WORD_LENGTH: usize = 4;

/// Longest word in the RFC dictionary.
pub const MAX_WORD_LENGTH: usize = 24;

/// Longest transformed word: longest prefix, longest word, longest suffix.
pub const MAX_TRANSFORMED_WORD_LENGTH: usize = 5 + MAX_WORD_LENGTH + 8;

/// Number of length buckets.
pub const NUM_LENGTHS: usize = 32;

/// Bucket widths of the RFC dictionary.
pub const RFC_SIZE_BITS_BY_LENGTH: [u8; NUM_LENGTHS] = [
    0, 0, 0, 0, 10, 10, 11, 11, 10, 10, 10, 10, 10, 9, 9, 8, 7, 7, 8, 7, 7, 6, 6, 5, 5, 0, 0, 0, 0,
    0, 0, 0,
];

static RFC_DATA: &[u8] = include_bytes!("../data/dictionary.bin");

/// Word-length indexed dictionary blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    data: Arc<[u8]>,
    size_bits: [u8; NUM_LENGTHS],
    offsets: [usize; NUM_LENGTHS],
}

impl Dictionary {
    /// The RFC 7932 dictionary, loaded once and shared.
    pub fn rfc() -> Arc<Dictionary> {
        static RFC: OnceLock<Arc<Dictionary>> = OnceLock::new();
        RFC.get_or_init(|| {
            let size_bits = RFC_SIZE_BITS_BY_LENGTH;
            Arc::new(Dictionary {
                data: Arc::from(RFC_DATA),
                offsets: offsets_for(&size_bits),
                size_bits,
            })
        })
        .clone()
    }

    /// Build a custom dictionary.
    ///
    /// `size_bits[len]` is the bucket width for words of `len` bytes; at
    /// most [`NUM_LENGTHS`] entries, missing ones are zero. Lengths 0 to 3
    /// must be unused, every width must stay below 31, and `data` must
    /// hold exactly the words the widths describe.
    pub fn new(data: impl Into<Arc<[u8]>>, size_bits: &[u8]) -> Result<Self> {
        let data = data.into();
        if size_bits.len() > NUM_LENGTHS {
            return Err(invalid(format!(
                "{} size bit entries, at most {NUM_LENGTHS}",
                size_bits.len()
            )));
        }
        let mut bits = [0u8; NUM_LENGTHS];
        bits[..size_bits.len()].copy_from_slice(size_bits);

        if let Some(len) = bits[..MIN_WORD_LENGTH].iter().position(|&b| b != 0) {
            return Err(invalid(format!("words of length {len} are not allowed")));
        }
        if let Some(len) = bits.iter().position(|&b| b >= 31) {
            return Err(invalid(format!("bucket {len} is {} bits wide", bits[len])));
        }

        let offsets = offsets_for(&bits);
        let last = NUM_LENGTHS - 1;
        let expected = offsets[last] + bucket_size(last, bits[last]);
        if data.len() != expected {
            return Err(invalid(format!(
                "data holds {} bytes, widths describe {expected}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            size_bits: bits,
            offsets,
        })
    }

    /// Bucket width for words of `len` bytes, 0 when there are none.
    #[inline]
    pub fn size_bits(&self, len: usize) -> u32 {
        self.size_bits.get(len).map_or(0, |&b| u32::from(b))
    }

    /// Word `index` of length `len`.
    pub fn word(&self, len: usize, index: usize) -> Option<&[u8]> {
        let start = self.offsets.get(len)? + index * len;
        self.data.get(start..start + len)
    }

    /// The raw words blob.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn bucket_size(len: usize, bits: u8) -> usize {
    if bits == 0 {
        0
    } else {
        len << bits
    }
}

fn offsets_for(size_bits: &[u8; NUM_LENGTHS]) -> [usize; NUM_LENGTHS] {
    let mut offsets = [0usize; NUM_LENGTHS];
    for len in 1..NUM_LENGTHS {
        offsets[len] = offsets[len - 1] + bucket_size(len - 1, size_bits[len - 1]);
    }
    offsets
}

fn invalid(message: String) -> crate::error::BrotliError {
    UsageError::InvalidDictionary(message).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc_dictionary_contents() {
        let dict = Dictionary::rfc();
        let data = dict.data();
        assert_eq!(data.len(), 122_784);
        assert_eq!(&data[..16], b"timedownlifeleft");
        let hash = data
            .iter()
            .fold(0u32, |h, &b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
        assert_eq!(hash, 1_309_770_418);
    }

    #[test]
    fn test_rfc_offsets() {
        let dict = Dictionary::rfc();
        let expected = [
            0, 0, 0, 0, 0, 4096, 9216, 21504, 35840, 44032, 53248, 63488, 74752, 87040, 93696,
            100864, 104704, 106752, 108928, 113536, 115968, 118528, 119872, 121280, 122016,
        ];
        assert_eq!(&dict.offsets[..expected.len()], &expected);
        assert_eq!(dict.word(4, 0), Some(&b"time"[..]));
        assert_eq!(dict.word(5, 0), Some(&b"first"[..]));
        assert_eq!(dict.word(24, 0), Some(&b"<script type=\"text/javas"[..]));
        assert_eq!(dict.size_bits(3), 0);
        assert_eq!(dict.size_bits(24), 5);
        assert_eq!(dict.size_bits(100), 0);
    }

    #[test]
    fn test_rfc_is_shared() {
        assert!(Arc::ptr_eq(&Dictionary::rfc(), &Dictionary::rfc()));
    }

    #[test]
    fn test_custom_dictionary() {
        // Two 4-byte words.
        let dict = Dictionary::new(&b"abcdwxyz"[..], &[0, 0, 0, 0, 1]).unwrap();
        assert_eq!(dict.word(4, 1), Some(&b"wxyz"[..]));
        assert_eq!(dict.size_bits(4), 1);
        assert_eq!(dict.word(4, 2), None);
    }

    #[test]
    fn test_custom_dictionary_validation() {
        assert!(Dictionary::new(&b"ab"[..], &[0, 0, 1]).is_err());
        assert!(Dictionary::new(&b"abcd"[..], &[0, 0, 0, 0, 1]).is_err());
        assert!(Dictionary::new(&b""[..], &[0, 0, 0, 0, 31]).is_err());
        assert!(Dictionary::new(&b""[..], &[0; 33]).is_err());
        assert!(Dictionary::new(&b""[..], &[]).is_ok());
    }
}
