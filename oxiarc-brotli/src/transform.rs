//! Dictionary word transforms (RFC 7932 section 8).
//!
//! A transform wraps a dictionary word in a prefix and a suffix and applies
//! one operator to the word itself: trimming bytes from either end,
//! uppercasing, or shifting code points.

use crate::error::{Result, StreamError};
use std::sync::OnceLock;

/// Number of transforms in the RFC catalog.
pub const NUM_RFC_TRANSFORMS: usize = 121;

/// Operator applied to the dictionary word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOperator {
    /// Insert the word unchanged.
    Identity,
    /// Drop the last `n` (1..=9) bytes.
    OmitLast(u8),
    /// Uppercase the first UTF-8 scalar.
    UppercaseFirst,
    /// Uppercase every UTF-8 scalar.
    UppercaseAll,
    /// Drop the first `n` (1..=9) bytes.
    OmitFirst(u8),
    /// Shift the first scalar by the transform parameter.
    ShiftFirst,
    /// Shift every scalar by the transform parameter.
    ShiftAll,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    /// Bytes emitted before the word.
    pub prefix: Vec<u8>,
    /// Operator applied to the word.
    pub operator: WordOperator,
    /// Bytes emitted after the word.
    pub suffix: Vec<u8>,
    /// Signed 16-bit code point delta for the shift operators.
    pub param: u16,
}

impl Transform {
    /// Transform without a shift parameter.
    pub fn new(prefix: &[u8], operator: WordOperator, suffix: &[u8]) -> Self {
        Self {
            prefix: prefix.to_vec(),
            operator,
            suffix: suffix.to_vec(),
            param: 0,
        }
    }

    /// Set the shift parameter.
    pub fn with_param(mut self, param: u16) -> Self {
        self.param = param;
        self
    }
}

/// Transform catalog, indexed by the transform id of a dictionary reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transforms {
    transforms: Vec<Transform>,
}

impl Transforms {
    /// Build a custom catalog.
    pub fn new(transforms: Vec<Transform>) -> Self {
        Self { transforms }
    }

    /// The RFC 7932 catalog.
    pub fn rfc() -> &'static Transforms {
        static RFC: OnceLock<Transforms> = OnceLock::new();
        RFC.get_or_init(|| {
            Transforms::new(
                RFC_TRANSFORMS
                    .iter()
                    .map(|&(prefix, operator, suffix)| Transform::new(prefix, operator, suffix))
                    .collect(),
            )
        })
    }

    /// Number of transforms.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// The catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Transform `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Transform> {
        self.transforms.get(index)
    }

    /// Write `word` with transform `index` applied to the start of `dst`.
    ///
    /// Returns the number of bytes written. An unknown transform, or a
    /// result that does not fit in `dst`, is an invalid backward reference.
    pub fn transform_word(&self, dst: &mut [u8], word: &[u8], index: usize) -> Result<usize> {
        let transform = self
            .transforms
            .get(index)
            .ok_or(StreamError::InvalidBackwardReference)?;

        let (omit_first, omit_last) = match transform.operator {
            WordOperator::OmitFirst(n) => (usize::from(n), 0),
            WordOperator::OmitLast(n) => (0, usize::from(n)),
            _ => (0, 0),
        };
        let body = &word[omit_first.min(word.len())..];
        let body = &body[..body.len().saturating_sub(omit_last)];

        let prefix = transform.prefix.as_slice();
        let suffix = transform.suffix.as_slice();
        let total = prefix.len() + body.len() + suffix.len();
        if dst.len() < total {
            return Err(StreamError::InvalidBackwardReference.into());
        }

        let (head, rest) = dst.split_at_mut(prefix.len());
        head.copy_from_slice(prefix);
        let (middle, tail) = rest.split_at_mut(body.len());
        middle.copy_from_slice(body);
        match transform.operator {
            WordOperator::UppercaseFirst => uppercase(middle, 1),
            WordOperator::UppercaseAll => {
                let len = middle.len();
                uppercase(middle, len)
            }
            WordOperator::ShiftFirst => shift(middle, transform.param, true),
            WordOperator::ShiftAll => shift(middle, transform.param, false),
            _ => {}
        }
        tail[..suffix.len()].copy_from_slice(suffix);
        Ok(total)
    }
}

/// Flip the case of up to `budget` bytes' worth of scalars.
///
/// ASCII lowercase letters lose bit 5. For a two-byte sequence bit 5 of the
/// second byte flips, for longer sequences the third byte is XOR-ed with 5.
/// Bytes past the end of `word` are left alone.
fn uppercase(word: &mut [u8], budget: usize) {
    let mut i = 0;
    let mut budget = budget as isize;
    while budget > 0 && i < word.len() {
        let c0 = word[i];
        let step = if c0 < 0xC0 {
            if c0.is_ascii_lowercase() {
                word[i] ^= 32;
            }
            1
        } else if c0 < 0xE0 {
            if let Some(c1) = word.get_mut(i + 1) {
                *c1 ^= 32;
            }
            2
        } else {
            if let Some(c2) = word.get_mut(i + 2) {
                *c2 ^= 5;
            }
            3
        };
        i += step;
        budget -= step as isize;
    }
}

/// Add the sign-extended `param` to each UTF-8 scalar, keeping the
/// sequence length. Truncated sequences are skipped.
fn shift(word: &mut [u8], param: u16, first_only: bool) {
    let delta = u32::from(param & 0x7FFF) + (0x100_0000 - u32::from(param & 0x8000));
    let mut i = 0;
    while i < word.len() {
        let remaining = word.len() - i;
        let c0 = word[i];
        let step = if c0 < 0x80 {
            let scalar = delta + u32::from(c0);
            word[i] = (scalar & 0x7F) as u8;
            1
        } else if c0 < 0xC0 {
            1
        } else if c0 < 0xE0 {
            if remaining >= 2 {
                let c1 = word[i + 1];
                let scalar = delta + (u32::from(c1 & 0x3F) | (u32::from(c0 & 0x1F) << 6));
                word[i] = (0xC0 | ((scalar >> 6) & 0x1F)) as u8;
                word[i + 1] = ((c1 & 0xC0) as u32 | (scalar & 0x3F)) as u8;
                2
            } else {
                remaining
            }
        } else if c0 < 0xF0 {
            if remaining >= 3 {
                let (c1, c2) = (word[i + 1], word[i + 2]);
                let scalar = delta
                    + (u32::from(c2 & 0x3F)
                        | (u32::from(c1 & 0x3F) << 6)
                        | (u32::from(c0 & 0x0F) << 12));
                word[i] = (0xE0 | ((scalar >> 12) & 0x0F)) as u8;
                word[i + 1] = ((c1 & 0xC0) as u32 | ((scalar >> 6) & 0x3F)) as u8;
                word[i + 2] = ((c2 & 0xC0) as u32 | (scalar & 0x3F)) as u8;
                3
            } else {
                remaining
            }
        } else if c0 < 0xF8 {
            if remaining >= 4 {
                let (c1, c2, c3) = (word[i + 1], word[i + 2], word[i + 3]);
                let scalar = delta
                    + (u32::from(c3 & 0x3F)
                        | (u32::from(c2 & 0x3F) << 6)
                        | (u32::from(c1 & 0x3F) << 12)
                        | (u32::from(c0 & 0x07) << 18));
                word[i] = (0xF0 | ((scalar >> 18) & 0x07)) as u8;
                word[i + 1] = ((c1 & 0xC0) as u32 | ((scalar >> 12) & 0x3F)) as u8;
                word[i + 2] = ((c2 & 0xC0) as u32 | ((scalar >> 6) & 0x3F)) as u8;
                word[i + 3] = ((c3 & 0xC0) as u32 | (scalar & 0x3F)) as u8;
                4
            } else {
                remaining
            }
        } else {
            1
        };
        i += step;
        if first_only {
            break;
        }
    }
}

use WordOperator::{Identity, OmitFirst, OmitLast, UppercaseAll, UppercaseFirst};

#[rustfmt::skip]
const RFC_TRANSFORMS: [(&[u8], WordOperator, &[u8]); NUM_RFC_TRANSFORMS] = [
    (b"", Identity, b""),
    (b"", Identity, b" "),
    (b" ", Identity, b" "),
    (b"", OmitFirst(1), b""),
    (b"", UppercaseFirst, b" "),
    (b"", Identity, b" the "),
    (b" ", Identity, b""),
    (b"s ", Identity, b" "),
    (b"", Identity, b" of "),
    (b"", UppercaseFirst, b""),
    (b"", Identity, b" and "),
    (b"", OmitFirst(2), b""),
    (b"", OmitLast(1), b""),
    (b", ", Identity, b" "),
    (b"", Identity, b", "),
    (b" ", UppercaseFirst, b" "),
    (b"", Identity, b" in "),
    (b"", Identity, b" to "),
    (b"e ", Identity, b" "),
    (b"", Identity, b"\""),
    (b"", Identity, b"."),
    (b"", Identity, b"\">"),
    (b"", Identity, b"\n"),
    (b"", OmitLast(3), b""),
    (b"", Identity, b"]"),
    (b"", Identity, b" for "),
    (b"", OmitFirst(3), b""),
    (b"", OmitLast(2), b""),
    (b"", Identity, b" a "),
    (b"", Identity, b" that "),
    (b" ", UppercaseFirst, b""),
    (b"", Identity, b". "),
    (b".", Identity, b""),
    (b" ", Identity, b", "),
    (b"", OmitFirst(4), b""),
    (b"", Identity, b" with "),
    (b"", Identity, b"'"),
    (b"", Identity, b" from "),
    (b"", Identity, b" by "),
    (b"", OmitFirst(5), b""),
    (b"", OmitFirst(6), b""),
    (b" the ", Identity, b""),
    (b"", OmitLast(4), b""),
    (b"", Identity, b". The "),
    (b"", UppercaseAll, b""),
    (b"", Identity, b" on "),
    (b"", Identity, b" as "),
    (b"", Identity, b" is "),
    (b"", OmitLast(7), b""),
    (b"", OmitLast(1), b"ing "),
    (b"", Identity, b"\n\t"),
    (b"", Identity, b":"),
    (b" ", Identity, b". "),
    (b"", Identity, b"ed "),
    (b"", OmitFirst(9), b""),
    (b"", OmitFirst(7), b""),
    (b"", OmitLast(6), b""),
    (b"", Identity, b"("),
    (b"", UppercaseFirst, b", "),
    (b"", OmitLast(8), b""),
    (b"", Identity, b" at "),
    (b"", Identity, b"ly "),
    (b" the ", Identity, b" of "),
    (b"", OmitLast(5), b""),
    (b"", OmitLast(9), b""),
    (b" ", UppercaseFirst, b", "),
    (b"", UppercaseFirst, b"\""),
    (b".", Identity, b"("),
    (b"", UppercaseAll, b" "),
    (b"", UppercaseFirst, b"\">"),
    (b"", Identity, b"=\""),
    (b" ", Identity, b"."),
    (b".com/", Identity, b""),
    (b" the ", Identity, b" of the "),
    (b"", UppercaseFirst, b"'"),
    (b"", Identity, b". This "),
    (b"", Identity, b","),
    (b".", Identity, b" "),
    (b"", UppercaseFirst, b"("),
    (b"", UppercaseFirst, b"."),
    (b"", Identity, b" not "),
    (b" ", Identity, b"=\""),
    (b"", Identity, b"er "),
    (b" ", UppercaseAll, b" "),
    (b"", Identity, b"al "),
    (b" ", UppercaseAll, b""),
    (b"", Identity, b"='"),
    (b"", UppercaseAll, b"\""),
    (b"", UppercaseFirst, b". "),
    (b" ", Identity, b"("),
    (b"", Identity, b"ful "),
    (b" ", UppercaseFirst, b". "),
    (b"", Identity, b"ive "),
    (b"", Identity, b"less "),
    (b"", UppercaseAll, b"'"),
    (b"", Identity, b"est "),
    (b" ", UppercaseFirst, b"."),
    (b"", UppercaseAll, b"\">"),
    (b" ", Identity, b"='"),
    (b"", UppercaseFirst, b","),
    (b"", Identity, b"ize "),
    (b"", UppercaseAll, b"."),
    (b"\xC2\xA0", Identity, b""),
    (b" ", Identity, b","),
    (b"", UppercaseFirst, b"=\""),
    (b"", UppercaseAll, b"=\""),
    (b"", Identity, b"ous "),
    (b"", UppercaseAll, b", "),
    (b"", UppercaseFirst, b"='"),
    (b" ", UppercaseFirst, b","),
    (b" ", UppercaseAll, b"=\""),
    (b" ", UppercaseAll, b", "),
    (b"", UppercaseAll, b","),
    (b"", UppercaseAll, b"("),
    (b"", UppercaseAll, b". "),
    (b" ", UppercaseAll, b"."),
    (b"", UppercaseAll, b"='"),
    (b" ", UppercaseAll, b". "),
    (b" ", UppercaseFirst, b"=\""),
    (b" ", UppercaseAll, b"='"),
    (b" ", UppercaseFirst, b"='"),
];
