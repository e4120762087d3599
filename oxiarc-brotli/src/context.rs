//! Literal context lookup (RFC 7932 section 7.1).
//!
//! The table holds four 512-entry halves, one per context mode. Within a
//! mode, entries `0..256` are indexed by the previous byte and entries
//! `256..512` by the byte before it; the two values are OR-ed together.

/// Literal context modes, in stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContextMode {
    /// Low six bits of the previous byte.
    Lsb6 = 0,
    /// High six bits of the previous byte.
    Msb6 = 1,
    /// UTF-8 character classes of the two previous bytes.
    Utf8 = 2,
    /// Signed magnitude classes of the two previous bytes.
    Signed = 3,
}

impl ContextMode {
    /// Mode from a 2-bit stream value.
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::Lsb6,
            1 => Self::Msb6,
            2 => Self::Utf8,
            _ => Self::Signed,
        }
    }

    /// Offset of this mode's half of [`LOOKUP`].
    #[inline]
    pub fn lookup_offset(self) -> usize {
        (self as usize) << 9
    }
}

/// Context lookup table for all four modes.
pub static LOOKUP: [u8; 2048] = build_lookup();

const UTF8_MAP: &[u8; 128] = b"         !!  !                  \"#$##%#$&'##(#)#++++++++++((&*'##,---,---,-----,-----,-----&#'###.///.///./////./////./////&#'# ";

// Run lengths (+32) of the values 0, 1, 2, 3, 0, 1, ... for the UTF-8
// second-byte half.
const UTF8_RLE: &[u8; 19] = b"A/*  ':  & : $  \x81 @";

const fn build_lookup() -> [u8; 2048] {
    let mut lookup = [0u8; 2048];
    let mut i = 0;
    while i < 256 {
        lookup[i] = (i & 0x3F) as u8;
        lookup[512 + i] = (i >> 2) as u8;
        lookup[1792 + i] = (2 + (i >> 6)) as u8;
        i += 1;
    }
    i = 0;
    while i < 128 {
        lookup[1024 + i] = 4 * (UTF8_MAP[i] - 32);
        i += 1;
    }
    i = 0;
    while i < 64 {
        lookup[1152 + i] = (i & 1) as u8;
        lookup[1216 + i] = (2 + (i & 1)) as u8;
        i += 1;
    }
    let mut offset = 1280;
    let mut k = 0;
    while k < 19 {
        let value = (k & 3) as u8;
        let mut reps = UTF8_RLE[k] - 32;
        while reps > 0 {
            lookup[offset] = value;
            offset += 1;
            reps -= 1;
        }
        k += 1;
    }
    i = 0;
    while i < 16 {
        lookup[1792 + i] = 1;
        lookup[2032 + i] = 6;
        i += 1;
    }
    lookup[1792] = 0;
    lookup[2047] = 7;
    i = 0;
    while i < 256 {
        lookup[1536 + i] = lookup[1792 + i] << 3;
        i += 1;
    }
    lookup
}

/// Literal context for the two most recent output bytes.
#[inline]
pub fn literal_context(lookup_offset: usize, prev1: u8, prev2: u8) -> usize {
    (LOOKUP[lookup_offset + prev1 as usize] | LOOKUP[lookup_offset + 256 + prev2 as usize]) as usize
}
