//! Canonical prefix codes (RFC 7932 section 3).
//!
//! Codes are decoded through flat two-level tables. Each `u32` entry packs
//! `bit_length << 16 | value`. Root entries cover the first
//! [`HUFFMAN_TABLE_BITS`] bits; codes longer than that store, in the root
//! slot, the combined root and sub-table width together with the offset of
//! their second-level table, relative to the slot.

use crate::bitreader::BitReader;
use crate::error::{Result, StreamError};
use crate::prefix::log2_floor;

/// Root table width for data alphabets.
pub const HUFFMAN_TABLE_BITS: u32 = 8;
const HUFFMAN_TABLE_MASK: u32 = (1 << HUFFMAN_TABLE_BITS) - 1;

const MAX_LENGTH: usize = 15;
const CODE_LENGTH_CODES: usize = 18;
const CODE_LENGTH_CODE_ORDER: [usize; CODE_LENGTH_CODES] =
    [1, 2, 3, 4, 0, 5, 17, 6, 16, 7, 8, 9, 10, 11, 12, 13, 14, 15];
const DEFAULT_CODE_LENGTH: u8 = 8;
const CODE_LENGTH_REPEAT_CODE: u8 = 16;

/// Static code for code length code lengths, indexed by 4 peeked bits.
const FIXED_TABLE: [u32; 16] = [
    0x020000, 0x020004, 0x020003, 0x030002, 0x020000, 0x020004, 0x020003, 0x040001, 0x020000,
    0x020004, 0x020003, 0x030002, 0x020000, 0x020004, 0x020003, 0x040005,
];

/// Upper bound of a table's size, indexed by `(alphabet_size + 31) >> 5`.
pub const MAX_HUFFMAN_TABLE_SIZE: [usize; 23] = [
    256, 402, 436, 468, 500, 534, 566, 598, 630, 662, 694, 726, 758, 790, 822, 854, 886, 920, 952,
    984, 1016, 1048, 1080,
];

/// Table size bound for the 26-symbol block length alphabet.
pub const HUFFMAN_TABLE_SIZE_26: usize = 396;

/// Table size bound for alphabets of up to 258 symbols.
pub const HUFFMAN_TABLE_SIZE_258: usize = 632;

/// Upper bound on the table size for an alphabet.
#[inline]
pub fn max_table_size(alphabet_size_limit: usize) -> usize {
    MAX_HUFFMAN_TABLE_SIZE[(alphabet_size_limit + 31) >> 5]
}

// ============================================================================
// Table builder
// ============================================================================

/// Next reversed-bit-order key of `len` bits.
#[inline]
fn next_key(key: u32, len: u32) -> u32 {
    let mut step = 1u32 << (len - 1);
    while key & step != 0 {
        step >>= 1;
    }
    (key & step.wrapping_sub(1)) + step
}

/// Store `item` at `table[0]`, `table[step]`, ... below `end`.
#[inline]
fn replicate_value(table: &mut [u32], step: usize, end: usize, item: u32) {
    let mut pos = end;
    loop {
        pos -= step;
        table[pos] = item;
        if pos == 0 {
            break;
        }
    }
}

/// Width of the second-level table needed by the codes of length `len`
/// and above that remain in `count`.
fn next_table_bit_size(count: &[i32; MAX_LENGTH + 1], len: usize, root_bits: u32) -> u32 {
    let mut bits = len;
    let mut left = 1i32 << (bits as u32 - root_bits);
    while bits < MAX_LENGTH {
        left -= count[bits];
        if left <= 0 {
            break;
        }
        bits += 1;
        left <<= 1;
    }
    bits as u32 - root_bits
}

/// Build a lookup table from per-symbol code lengths (0 = unused).
///
/// The lengths must form a complete prefix code, or contain exactly one
/// used symbol, which then decodes from zero bits. `table` must hold at
/// least [`max_table_size`] entries for the alphabet. Returns the number of
/// entries used.
pub fn build_table(table: &mut [u32], root_bits: u32, code_lengths: &[u8]) -> usize {
    let mut count = [0i32; MAX_LENGTH + 1];
    let mut offset = [0usize; MAX_LENGTH + 1];
    let mut sorted = vec![0u32; code_lengths.len()];

    for &len in code_lengths {
        count[len as usize] += 1;
    }
    for len in 1..MAX_LENGTH {
        offset[len + 1] = offset[len] + count[len] as usize;
    }
    for (symbol, &len) in code_lengths.iter().enumerate() {
        if len != 0 {
            let slot = &mut offset[len as usize];
            sorted[*slot] = symbol as u32;
            *slot += 1;
        }
    }

    let mut table_bits = root_bits;
    let mut table_size = 1usize << table_bits;
    let mut total_size = table_size;

    if offset[MAX_LENGTH] == 1 {
        table[..total_size].fill(sorted[0]);
        return total_size;
    }

    // Root table.
    let mut key = 0u32;
    let mut symbol = 0usize;
    let mut step = 1usize;
    for len in 1..=root_bits as usize {
        step <<= 1;
        while count[len] > 0 {
            replicate_value(
                &mut table[key as usize..],
                step,
                table_size,
                ((len as u32) << 16) | sorted[symbol],
            );
            symbol += 1;
            key = next_key(key, len as u32);
            count[len] -= 1;
        }
    }

    // Second-level tables, linked from the root slot of their prefix.
    let mask = total_size - 1;
    let mut low = usize::MAX;
    let mut current = 0usize;
    step = 1;
    for len in root_bits as usize + 1..=MAX_LENGTH {
        step <<= 1;
        while count[len] > 0 {
            if key as usize & mask != low {
                current += table_size;
                table_bits = next_table_bit_size(&count, len, root_bits);
                table_size = 1 << table_bits;
                total_size += table_size;
                low = key as usize & mask;
                table[low] = ((table_bits + root_bits) << 16) | (current - low) as u32;
            }
            replicate_value(
                &mut table[current + (key as usize >> root_bits)..],
                step,
                table_size,
                ((len as u32 - root_bits) << 16) | sorted[symbol],
            );
            symbol += 1;
            key = next_key(key, len as u32);
            count[len] -= 1;
        }
    }
    total_size
}

// ============================================================================
// Symbol decoding
// ============================================================================

/// Decode one symbol with the table starting at `table[0]`.
#[inline]
pub fn read_symbol(table: &[u32], br: &mut BitReader) -> u32 {
    br.fill_window();
    let bits = br.peek_bits();
    let mut index = (bits & HUFFMAN_TABLE_MASK) as usize;
    let entry = table[index];
    let len = entry >> 16;
    if len <= HUFFMAN_TABLE_BITS {
        br.drop_bits(len);
        return entry & 0xFFFF;
    }
    index += (entry & 0xFFFF) as usize;
    index += ((bits & ((1u32 << len) - 1)) >> HUFFMAN_TABLE_BITS) as usize;
    let entry = table[index];
    br.drop_bits((entry >> 16) + HUFFMAN_TABLE_BITS);
    entry & 0xFFFF
}

// ============================================================================
// Code reading
// ============================================================================

/// Read one prefix code from the stream and build its table.
///
/// Returns the number of table entries used.
pub fn read_huffman_code(
    br: &mut BitReader,
    alphabet_size_max: usize,
    alphabet_size_limit: usize,
    table: &mut [u32],
) -> Result<usize> {
    let mut code_lengths = vec![0u8; alphabet_size_limit];
    let simple_or_skip = br.read_bits(2);
    if simple_or_skip == 1 {
        read_simple_code_lengths(br, alphabet_size_max, &mut code_lengths)?;
    } else {
        read_complex_code_lengths(br, simple_or_skip as usize, &mut code_lengths)?;
    }
    Ok(build_table(table, HUFFMAN_TABLE_BITS, &code_lengths))
}

/// Read one prefix code into a freshly allocated table.
pub fn read_table(
    br: &mut BitReader,
    alphabet_size_max: usize,
    alphabet_size_limit: usize,
    capacity: usize,
) -> Result<Vec<u32>> {
    let mut table = vec![0u32; capacity];
    let used = read_huffman_code(br, alphabet_size_max, alphabet_size_limit, &mut table)?;
    table.truncate(used);
    Ok(table)
}

/// Up to four explicitly listed symbols with a fixed length shape.
fn read_simple_code_lengths(
    br: &mut BitReader,
    alphabet_size_max: usize,
    code_lengths: &mut [u8],
) -> Result<()> {
    let max_bits = 1 + log2_floor(alphabet_size_max as u32 - 1);
    let num_symbols = br.read_bits(2) as usize + 1;

    let mut symbols = [0usize; 4];
    for slot in symbols.iter_mut().take(num_symbols) {
        let symbol = br.read_bits(max_bits) as usize;
        if symbol >= code_lengths.len() {
            return Err(StreamError::SymbolOutOfRange.into());
        }
        *slot = symbol;
    }
    for i in 0..num_symbols {
        if symbols[i + 1..num_symbols].contains(&symbols[i]) {
            return Err(StreamError::DuplicateSimpleHuffmanSymbol.into());
        }
    }

    let shape: &[u8] = match num_symbols {
        1 => &[1],
        2 => &[1, 1],
        3 => &[1, 2, 2],
        _ if br.read_bits(1) == 1 => &[1, 2, 3, 3],
        _ => &[2, 2, 2, 2],
    };
    for (&symbol, &len) in symbols.iter().zip(shape) {
        code_lengths[symbol] = len;
    }
    Ok(())
}

/// Code lengths coded with the code length code.
fn read_complex_code_lengths(
    br: &mut BitReader,
    skip: usize,
    code_lengths: &mut [u8],
) -> Result<()> {
    let mut code_length_code_lengths = [0u8; CODE_LENGTH_CODES];
    let mut space = 32i32;
    let mut num_codes = 0;
    for &index in &CODE_LENGTH_CODE_ORDER[skip..] {
        if space <= 0 {
            break;
        }
        br.fill_window();
        let entry = FIXED_TABLE[(br.peek_bits() & 15) as usize];
        br.drop_bits(entry >> 16);
        let value = (entry & 0xFFFF) as u8;
        code_length_code_lengths[index] = value;
        if value != 0 {
            space -= 32 >> value;
            num_codes += 1;
        }
    }
    if space != 0 && num_codes != 1 {
        return Err(StreamError::CorruptedHuffmanHistogram.into());
    }
    read_code_lengths(br, &code_length_code_lengths, code_lengths)
}

fn read_code_lengths(
    br: &mut BitReader,
    code_length_code_lengths: &[u8; CODE_LENGTH_CODES],
    code_lengths: &mut [u8],
) -> Result<()> {
    let num_symbols = code_lengths.len();
    let mut table = [0u32; 32];
    build_table(&mut table, 5, code_length_code_lengths);

    let mut symbol = 0usize;
    let mut prev_code_len = DEFAULT_CODE_LENGTH;
    let mut repeat = 0usize;
    let mut repeat_code_len = 0u8;
    let mut space = 32768i32;

    while symbol < num_symbols && space > 0 {
        br.fill_window();
        let entry = table[(br.peek_bits() & 31) as usize];
        br.drop_bits(entry >> 16);
        let code_len = (entry & 0xFFFF) as u8;

        if code_len < CODE_LENGTH_REPEAT_CODE {
            repeat = 0;
            code_lengths[symbol] = code_len;
            symbol += 1;
            if code_len != 0 {
                prev_code_len = code_len;
                space -= 32768 >> code_len;
            }
            continue;
        }

        let extra_bits = u32::from(code_len) - 14;
        let new_len = if code_len == CODE_LENGTH_REPEAT_CODE {
            prev_code_len
        } else {
            0
        };
        if repeat_code_len != new_len {
            repeat = 0;
            repeat_code_len = new_len;
        }
        let old_repeat = repeat;
        if repeat > 0 {
            repeat = (repeat - 2) << extra_bits;
        }
        repeat += br.read_bits(extra_bits) as usize + 3;
        let delta = repeat - old_repeat;
        if symbol + delta > num_symbols {
            return Err(StreamError::CorruptedCodeLengthTable.into());
        }
        code_lengths[symbol..symbol + delta].fill(repeat_code_len);
        symbol += delta;
        if repeat_code_len != 0 {
            space -= (delta << (15 - repeat_code_len)) as i32;
        }
    }
    if space != 0 {
        return Err(StreamError::UnusedHuffmanSpace.into());
    }
    Ok(())
}

// ============================================================================
// Tree groups
// ============================================================================

/// Tables for several trees over one alphabet, stored back to back.
#[derive(Debug, Clone, Default)]
pub struct HuffmanTreeGroup {
    codes: Vec<u32>,
    offsets: Vec<usize>,
}

impl HuffmanTreeGroup {
    /// Read `num_trees` prefix codes.
    pub fn decode(
        br: &mut BitReader,
        alphabet_size_max: usize,
        alphabet_size_limit: usize,
        num_trees: usize,
    ) -> Result<Self> {
        let max_size = max_table_size(alphabet_size_limit);
        let mut codes = vec![0u32; num_trees * max_size];
        let mut offsets = Vec::with_capacity(num_trees);
        let mut next = 0;
        for _ in 0..num_trees {
            offsets.push(next);
            next += read_huffman_code(
                br,
                alphabet_size_max,
                alphabet_size_limit,
                &mut codes[next..next + max_size],
            )?;
        }
        codes.truncate(next);
        Ok(Self { codes, offsets })
    }

    /// Number of trees.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// The group holds no trees.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Decode one symbol with tree `tree`.
    #[inline]
    pub fn read_symbol(&self, tree: usize, br: &mut BitReader) -> u32 {
        read_symbol(&self.codes[self.offsets[tree]..], br)
    }
}
