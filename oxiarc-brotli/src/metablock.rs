//! Stream header, meta-block headers and the prefix codes of a compressed
//! meta-block (RFC 7932 sections 6, 7 and 9).
//!
//! Every reader here is a pure function of the bit stream: it either
//! returns a complete value or an error, and never touches decoder state.
//! The decoder takes a checkpoint before calling one and rewinds when the
//! call ran past the buffered input.

use crate::bitreader::BitReader;
use crate::context::ContextMode;
use crate::error::{Result, StreamError};
use crate::huffman::{
    HUFFMAN_TABLE_SIZE_26, HUFFMAN_TABLE_SIZE_258, HuffmanTreeGroup, max_table_size, read_symbol,
    read_table,
};
use crate::prefix::{
    BLOCK_LENGTH_N_BITS, BLOCK_LENGTH_OFFSET, MAX_ALLOWED_DISTANCE, MAX_DISTANCE_BITS,
    MAX_LARGE_WINDOW_DISTANCE_BITS, NUM_BLOCK_LENGTH_CODES, NUM_COMMAND_CODES, NUM_LITERAL_CODES,
    distance_alphabet_limit, distance_alphabet_size,
};

/// Smallest window of a large-window stream.
pub const LARGE_MIN_WINDOW_BITS: u32 = 10;

/// Largest window of a large-window stream.
pub const LARGE_MAX_WINDOW_BITS: u32 = 30;

/// Block length of a category with a single block type; never runs out
/// within one meta-block.
pub const SINGLE_BLOCK_LENGTH: u32 = 1 << 28;

/// Block category indices.
pub const LITERAL: usize = 0;
/// Command block category.
pub const COMMAND: usize = 1;
/// Distance block category.
pub const DISTANCE: usize = 2;

/// Literal context map entries per block type.
pub const LITERAL_CONTEXT_BITS: u32 = 6;
/// Distance context map entries per block type.
pub const DISTANCE_CONTEXT_BITS: u32 = 2;

/// Decode the window size from the stream header.
///
/// Returns the window bits and whether the stream uses the large-window
/// escape, which is only accepted when `allow_large_window` is set.
pub fn decode_window_bits(br: &mut BitReader, allow_large_window: bool) -> Result<(u32, bool)> {
    br.fill_window();
    if br.read_few_bits(1) == 0 {
        return Ok((16, false));
    }
    let n = br.read_few_bits(3);
    if n != 0 {
        return Ok((17 + n, false));
    }
    let n = br.read_few_bits(3);
    match n {
        0 => Ok((17, false)),
        1 => {
            if !allow_large_window {
                return Err(StreamError::InvalidWindowBits.into());
            }
            if br.read_few_bits(1) != 0 {
                return Err(StreamError::InvalidWindowBits.into());
            }
            let bits = br.read_few_bits(6);
            if !(LARGE_MIN_WINDOW_BITS..=LARGE_MAX_WINDOW_BITS).contains(&bits) {
                return Err(StreamError::InvalidWindowBits.into());
            }
            Ok((bits, true))
        }
        _ => Ok((8 + n, false)),
    }
}

/// Fields of one meta-block header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetaBlockHeader {
    /// ISLAST was set.
    pub is_last: bool,
    /// The block carries raw bytes.
    pub is_uncompressed: bool,
    /// The block carries metadata to skip.
    pub is_metadata: bool,
    /// Bytes of output (or metadata) the block holds.
    pub length: usize,
}

/// Read a meta-block header.
///
/// Uncompressed and metadata blocks are followed by padding up to a byte
/// boundary; it is consumed and checked here.
pub fn read_meta_block_header(br: &mut BitReader) -> Result<MetaBlockHeader> {
    let mut header = MetaBlockHeader::default();
    br.fill_window();
    header.is_last = br.read_few_bits(1) == 1;
    if header.is_last && br.read_few_bits(1) == 1 {
        return Ok(header);
    }

    let size_nibbles = br.read_few_bits(2) + 4;
    if size_nibbles == 7 {
        header.is_metadata = true;
        if br.read_few_bits(1) != 0 {
            return Err(StreamError::CorruptedReservedBit.into());
        }
        let size_bytes = br.read_few_bits(2);
        if size_bytes != 0 {
            let mut length = 0usize;
            for i in 0..size_bytes {
                let byte = br.read_bits(8) as usize;
                if byte == 0 && i + 1 == size_bytes && size_bytes > 1 {
                    return Err(StreamError::ExuberantNibble.into());
                }
                length |= byte << (i * 8);
            }
            header.length = length + 1;
        }
        br.jump_to_byte_boundary()?;
        return Ok(header);
    }

    let mut length = 0usize;
    for i in 0..size_nibbles {
        let nibble = br.read_bits(4) as usize;
        if nibble == 0 && i + 1 == size_nibbles && size_nibbles > 4 {
            return Err(StreamError::ExuberantNibble.into());
        }
        length |= nibble << (i * 4);
    }
    header.length = length + 1;
    if !header.is_last {
        header.is_uncompressed = br.read_bits(1) == 1;
    }
    if header.is_uncompressed {
        br.jump_to_byte_boundary()?;
    }
    Ok(header)
}

/// Variable length count in `0..=255`.
pub fn decode_var_len_u8(br: &mut BitReader) -> u32 {
    br.fill_window();
    if br.read_few_bits(1) == 0 {
        return 0;
    }
    let n = br.read_few_bits(3);
    if n == 0 {
        1
    } else {
        br.read_few_bits(n) + (1 << n)
    }
}

// ============================================================================
// Block partitions
// ============================================================================

/// Switching state of one block category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockState {
    /// Number of block types.
    pub num_types: usize,
    /// Symbols left in the current block.
    pub length: u32,
    /// The two most recent block types, older first.
    pub ring: [usize; 2],
}

impl Default for BlockState {
    fn default() -> Self {
        Self {
            num_types: 1,
            length: SINGLE_BLOCK_LENGTH,
            ring: [1, 0],
        }
    }
}

impl BlockState {
    /// The block type in effect.
    #[inline]
    pub fn current(&self) -> usize {
        self.ring[1]
    }

    /// Read a block switch command and return the new block type.
    pub fn switch(&mut self, codes: &BlockCodes, br: &mut BitReader) -> usize {
        if self.num_types < 2 || codes.types.is_empty() {
            self.length = SINGLE_BLOCK_LENGTH;
            return self.current();
        }
        let symbol = read_symbol(&codes.types, br) as usize;
        self.length = read_block_length(&codes.lengths, br);
        let mut block_type = match symbol {
            0 => self.ring[0],
            1 => self.ring[1] + 1,
            _ => symbol - 2,
        };
        if block_type >= self.num_types {
            block_type -= self.num_types;
        }
        self.ring = [self.ring[1], block_type];
        block_type
    }
}

/// Block type and block length codes of one category.
#[derive(Debug, Clone, Default)]
pub struct BlockCodes {
    types: Vec<u32>,
    lengths: Vec<u32>,
}

fn read_block_length(table: &[u32], br: &mut BitReader) -> u32 {
    let code = read_symbol(table, br) as usize;
    let code = code.min(NUM_BLOCK_LENGTH_CODES - 1);
    BLOCK_LENGTH_OFFSET[code] + br.read_bits(BLOCK_LENGTH_N_BITS[code])
}

fn read_partition(br: &mut BitReader) -> Result<(BlockState, BlockCodes)> {
    let num_types = decode_var_len_u8(br) as usize + 1;
    if num_types == 1 {
        return Ok((BlockState::default(), BlockCodes::default()));
    }
    let alphabet = num_types + 2;
    let types = read_table(br, alphabet, alphabet, HUFFMAN_TABLE_SIZE_258)?;
    let lengths = read_table(
        br,
        NUM_BLOCK_LENGTH_CODES,
        NUM_BLOCK_LENGTH_CODES,
        HUFFMAN_TABLE_SIZE_26,
    )?;
    let length = read_block_length(&lengths, br);
    let state = BlockState {
        num_types,
        length,
        ring: [1, 0],
    };
    Ok((state, BlockCodes { types, lengths }))
}

// ============================================================================
// Context maps
// ============================================================================

/// Decode a context map of `size` entries; returns the number of trees it
/// refers to and the map.
pub fn read_context_map(br: &mut BitReader, size: usize) -> Result<(usize, Vec<u8>)> {
    let num_trees = decode_var_len_u8(br) as usize + 1;
    let mut map = vec![0u8; size];
    if num_trees == 1 {
        return Ok((1, map));
    }

    br.fill_window();
    let max_run_length_prefix = if br.read_few_bits(1) == 1 {
        br.read_few_bits(4) + 1
    } else {
        0
    };
    let alphabet = num_trees + max_run_length_prefix as usize;
    let table = read_table(br, alphabet, alphabet, max_table_size(alphabet))?;

    let mut i = 0;
    while i < size {
        let code = read_symbol(&table, br);
        if code == 0 {
            i += 1;
        } else if code <= max_run_length_prefix {
            let zeros = (1usize << code) + br.read_bits(code) as usize;
            if zeros > size - i {
                return Err(StreamError::CorruptedContextMap.into());
            }
            i += zeros;
        } else {
            map[i] = (code - max_run_length_prefix) as u8;
            i += 1;
        }
    }
    if br.read_bits(1) == 1 {
        inverse_move_to_front(&mut map);
    }
    Ok((num_trees, map))
}

/// Bitset of the literal block types whose 64 contexts all share one tree.
fn trivial_literal_contexts(context_map: &[u8]) -> [u32; 8] {
    let mut trivial = [0u32; 8];
    for (block_type, contexts) in context_map
        .chunks_exact(1 << LITERAL_CONTEXT_BITS)
        .enumerate()
    {
        if contexts.iter().all(|&tree| tree == contexts[0]) {
            trivial[block_type >> 5] |= 1 << (block_type & 31);
        }
    }
    trivial
}

fn inverse_move_to_front(values: &mut [u8]) {
    let mut mtf: [u8; 256] = std::array::from_fn(|i| i as u8);
    for value in values.iter_mut() {
        let index = usize::from(*value);
        let symbol = mtf[index];
        *value = symbol;
        mtf.copy_within(0..index, 1);
        mtf[0] = symbol;
    }
}

// ============================================================================
// Compressed meta-block header
// ============================================================================

/// Everything a compressed meta-block declares before its commands.
#[derive(Debug, Clone, Default)]
pub struct MetaBlockCodes {
    /// Initial block state per category.
    pub blocks: [BlockState; 3],
    /// Block switch codes per category.
    pub block_codes: [BlockCodes; 3],
    /// Distance postfix bits.
    pub npostfix: u32,
    /// Number of direct distance codes.
    pub ndirect: u32,
    /// Context mode of each literal block type.
    pub context_modes: Vec<ContextMode>,
    /// Literal context map, 64 entries per literal block type.
    pub context_map: Vec<u8>,
    /// Distance context map, 4 entries per distance block type.
    pub distance_context_map: Vec<u8>,
    /// Bit `t` is set when literal block type `t` maps all its contexts to
    /// one tree.
    pub trivial_literal_contexts: [u32; 8],
    /// Literal trees.
    pub literals: HuffmanTreeGroup,
    /// Insert-and-copy command trees.
    pub commands: HuffmanTreeGroup,
    /// Distance trees.
    pub distances: HuffmanTreeGroup,
    /// Number of distance symbols that may occur.
    pub distance_alphabet_limit: usize,
}

impl MetaBlockCodes {
    /// Literal block type `block_type` uses one tree for every context.
    #[inline]
    pub fn is_trivial_literal_context(&self, block_type: usize) -> bool {
        self.trivial_literal_contexts[block_type >> 5] & (1 << (block_type & 31)) != 0
    }

    /// Read the header of a compressed meta-block.
    pub fn read(br: &mut BitReader, large_window: bool) -> Result<Self> {
        let mut blocks = [BlockState::default(); 3];
        let mut block_codes: [BlockCodes; 3] = Default::default();
        for (state, codes) in blocks.iter_mut().zip(block_codes.iter_mut()) {
            let (s, c) = read_partition(br)?;
            *state = s;
            *codes = c;
        }

        br.fill_window();
        let npostfix = br.read_few_bits(2);
        let ndirect = br.read_few_bits(4) << npostfix;

        let num_literal_types = blocks[LITERAL].num_types;
        let context_modes = (0..num_literal_types)
            .map(|_| ContextMode::from_bits(br.read_bits(2)))
            .collect();

        let (num_literal_trees, context_map) =
            read_context_map(br, num_literal_types << LITERAL_CONTEXT_BITS)?;
        let trivial_literal_contexts = trivial_literal_contexts(&context_map);

        let (num_distance_trees, distance_context_map) =
            read_context_map(br, blocks[DISTANCE].num_types << DISTANCE_CONTEXT_BITS)?;

        let literals =
            HuffmanTreeGroup::decode(br, NUM_LITERAL_CODES, NUM_LITERAL_CODES, num_literal_trees)?;
        let commands = HuffmanTreeGroup::decode(
            br,
            NUM_COMMAND_CODES,
            NUM_COMMAND_CODES,
            blocks[COMMAND].num_types,
        )?;
        let (distance_alphabet_max, distance_alphabet_limit) = if large_window {
            (
                distance_alphabet_size(npostfix, ndirect, MAX_LARGE_WINDOW_DISTANCE_BITS),
                distance_alphabet_limit(MAX_ALLOWED_DISTANCE, npostfix, ndirect),
            )
        } else {
            let size = distance_alphabet_size(npostfix, ndirect, MAX_DISTANCE_BITS);
            (size, size)
        };
        let distances = HuffmanTreeGroup::decode(
            br,
            distance_alphabet_max,
            distance_alphabet_limit,
            num_distance_trees,
        )?;

        Ok(Self {
            blocks,
            block_codes,
            npostfix,
            ndirect,
            context_modes,
            context_map,
            distance_context_map,
            trivial_literal_contexts,
            literals,
            commands,
            distances,
            distance_alphabet_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrotliError;
    use crate::testutil::BitWriter;

    fn window_bits(bits: &[(u32, u32)], large: bool) -> Result<(u32, bool)> {
        let mut w = BitWriter::default();
        for &(value, n) in bits {
            w.write(value, n);
        }
        decode_window_bits(&mut w.reader(), large)
    }

    #[test]
    fn test_window_bits_variants() {
        assert_eq!(window_bits(&[(0, 1)], false), Ok((16, false)));
        assert_eq!(window_bits(&[(1, 1), (1, 3)], false), Ok((18, false)));
        assert_eq!(window_bits(&[(1, 1), (7, 3)], false), Ok((24, false)));
        assert_eq!(window_bits(&[(1, 1), (0, 3), (0, 3)], false), Ok((17, false)));
        assert_eq!(window_bits(&[(1, 1), (0, 3), (2, 3)], false), Ok((10, false)));
        assert_eq!(window_bits(&[(1, 1), (0, 3), (7, 3)], false), Ok((15, false)));
    }

    #[test]
    fn test_large_window_escape() {
        let escape = [(1, 1), (0, 3), (1, 3), (0, 1), (30, 6)];
        assert_eq!(
            window_bits(&escape, false),
            Err(BrotliError::from(StreamError::InvalidWindowBits))
        );
        assert_eq!(window_bits(&escape, true), Ok((30, true)));

        let reserved = [(1, 1), (0, 3), (1, 3), (1, 1), (20, 6)];
        assert!(window_bits(&reserved, true).is_err());
        let too_small = [(1, 1), (0, 3), (1, 3), (0, 1), (9, 6)];
        assert!(window_bits(&too_small, true).is_err());
        let too_big = [(1, 1), (0, 3), (1, 3), (0, 1), (31, 6)];
        assert!(window_bits(&too_big, true).is_err());

        // Regular headers decode the same with large windows enabled.
        assert_eq!(window_bits(&[(1, 1), (3, 3)], true), Ok((20, false)));
    }

    fn header(w: &BitWriter) -> Result<MetaBlockHeader> {
        read_meta_block_header(&mut w.reader())
    }

    #[test]
    fn test_empty_last_block() {
        let mut w = BitWriter::default();
        w.write(1, 1);
        w.write(1, 1);
        let h = header(&w).unwrap();
        assert!(h.is_last);
        assert_eq!(h.length, 0);
        assert!(!h.is_metadata);
    }

    #[test]
    fn test_compressed_block_length() {
        let mut w = BitWriter::default();
        w.write(0, 1); // ISLAST
        w.write(1, 2); // five nibbles
        w.write(0x12345 - 1, 20);
        w.write(0, 1); // ISUNCOMPRESSED
        let h = header(&w).unwrap();
        assert_eq!(h.length, 0x12345);
        assert!(!h.is_last && !h.is_uncompressed && !h.is_metadata);
    }

    #[test]
    fn test_uncompressed_block_is_aligned() {
        let mut w = BitWriter::default();
        w.write(0, 1);
        w.write(0, 2);
        w.write(9, 16);
        w.write(1, 1);
        w.align();
        w.write(0xAB, 8);
        let mut br = w.reader();
        let h = read_meta_block_header(&mut br).unwrap();
        assert!(h.is_uncompressed);
        assert_eq!(h.length, 10);
        assert_eq!(br.read_bits(8), 0xAB);
    }

    #[test]
    fn test_exuberant_nibble() {
        let mut w = BitWriter::default();
        w.write(0, 1);
        w.write(1, 2); // five nibbles, the last one zero
        w.write(0x0FFFF, 20);
        w.write(0, 1);
        assert_eq!(
            header(&w),
            Err(BrotliError::from(StreamError::ExuberantNibble))
        );

        // Four nibbles may all be zero.
        let mut w = BitWriter::default();
        w.write(0, 1);
        w.write(0, 2);
        w.write(0, 16);
        w.write(0, 1);
        assert_eq!(header(&w).unwrap().length, 1);
    }

    #[test]
    fn test_metadata_header() {
        let mut w = BitWriter::default();
        w.write(0, 1);
        w.write(3, 2); // metadata
        w.write(0, 1); // reserved
        w.write(2, 2); // two length bytes
        w.write(0x0102, 16);
        let h = header(&w).unwrap();
        assert!(h.is_metadata);
        assert_eq!(h.length, 0x0103);

        let mut w = BitWriter::default();
        w.write(0, 1);
        w.write(3, 2);
        w.write(0, 1);
        w.write(2, 2);
        w.write(0x0001, 16);
        assert_eq!(
            header(&w),
            Err(BrotliError::from(StreamError::ExuberantNibble))
        );
    }

    #[test]
    fn test_reserved_bit() {
        let mut w = BitWriter::default();
        w.write(0, 1);
        w.write(3, 2);
        w.write(1, 1);
        assert_eq!(
            header(&w),
            Err(BrotliError::from(StreamError::CorruptedReservedBit))
        );
    }

    #[test]
    fn test_var_len_u8() {
        for (value, expected) in [(0u32, 0u32), (1, 1), (2, 2), (3, 3), (200, 200), (255, 255)] {
            let mut w = BitWriter::default();
            if value == 0 {
                w.write(0, 1);
            } else {
                w.write(1, 1);
                let n = 31 - value.leading_zeros();
                w.write(n, 3);
                if n > 0 {
                    w.write(value - (1 << n), n);
                }
            }
            assert_eq!(decode_var_len_u8(&mut w.reader()), expected);
        }
    }

    /// Simple prefix code listing `symbols` over an alphabet needing
    /// `symbol_bits` bits per symbol.
    fn write_simple_code(w: &mut BitWriter, symbols: &[u32], symbol_bits: u32) {
        w.write(1, 2);
        w.write(symbols.len() as u32 - 1, 2);
        for &s in symbols {
            w.write(s, symbol_bits);
        }
    }

    fn write_num_trees(w: &mut BitWriter, count: u32) {
        let value = count - 1;
        if value == 0 {
            w.write(0, 1);
        } else {
            w.write(1, 1);
            let n = 31 - value.leading_zeros();
            w.write(n, 3);
            if n > 0 {
                w.write(value - (1 << n), n);
            }
        }
    }

    #[test]
    fn test_context_map_with_runs_and_mtf() {
        let mut w = BitWriter::default();
        write_num_trees(&mut w, 3);
        w.write(1, 1); // run length codes present
        w.write(1, 4); // max prefix 2
        // Alphabet of 5: 0 (zero), 1..=2 (runs), 3..=4 (trees 1 and 2).
        // Symbols 0, 2, 3, 4 with lengths 2 each; codes 00, 01, 10, 11.
        write_simple_code(&mut w, &[0, 2, 3, 4], 3);
        w.write(0, 1); // four equal lengths
        // Entries: tree 1, run of 4 + 1 zeros, tree 2, zero.
        w.write_code(2, 2);
        w.write_code(1, 2);
        w.write(1, 2);
        w.write_code(3, 2);
        w.write_code(0, 2);
        w.write(0, 1); // no move-to-front
        let (trees, map) = read_context_map(&mut w.reader(), 8).unwrap();
        assert_eq!(trees, 3);
        assert_eq!(map, [1, 0, 0, 0, 0, 0, 2, 0]);
    }

    #[test]
    fn test_trivial_literal_contexts_per_block_type() {
        let mut map = vec![0u8; 40 << LITERAL_CONTEXT_BITS];
        // Type 1 uses tree 3 throughout, type 2 mixes trees.
        map[64..128].fill(3);
        map[130] = 1;
        // Type 33 uses tree 7 throughout.
        map[33 * 64..34 * 64].fill(7);
        map[39 * 64 + 63] = 2;

        let codes = MetaBlockCodes {
            trivial_literal_contexts: trivial_literal_contexts(&map),
            ..MetaBlockCodes::default()
        };
        assert!(codes.is_trivial_literal_context(0));
        assert!(codes.is_trivial_literal_context(1));
        assert!(!codes.is_trivial_literal_context(2));
        assert!(codes.is_trivial_literal_context(33));
        assert!(!codes.is_trivial_literal_context(39));
        assert!(!codes.is_trivial_literal_context(40));
        assert_eq!(codes.trivial_literal_contexts[0] & 0b111, 0b011);
    }

    #[test]
    fn test_inverse_move_to_front() {
        let mut values = [1, 1, 0, 2, 0];
        inverse_move_to_front(&mut values);
        assert_eq!(values, [1, 0, 0, 2, 2]);
    }

    #[test]
    fn test_context_map_run_overflow() {
        let mut w = BitWriter::default();
        write_num_trees(&mut w, 2);
        w.write(1, 1);
        w.write(2, 4); // max prefix 3
        write_simple_code(&mut w, &[3], 3);
        // A single-symbol code reads no bits: every entry is a run of 8+.
        w.write(0, 3);
        assert_eq!(
            read_context_map(&mut w.reader(), 4).map(|(n, _)| n),
            Err(BrotliError::from(StreamError::CorruptedContextMap))
        );
    }

    #[test]
    fn test_single_tree_context_map() {
        let mut w = BitWriter::default();
        write_num_trees(&mut w, 1);
        let mut br = w.reader();
        assert_eq!(read_context_map(&mut br, 64).unwrap(), (1, vec![0; 64]));
        assert_eq!(br.mark(), 1);
    }

    #[test]
    fn test_block_switch() {
        let mut w = BitWriter::default();
        write_num_trees(&mut w, 3); // three block types
        // Type code over 5 symbols: 0, 1, 4 (type 2).
        write_simple_code(&mut w, &[1, 0, 4], 3);
        // Length code over 26 symbols: single symbol 1 (length 5 + 0..=3).
        write_simple_code(&mut w, &[1], 5);
        w.write(2, 2); // first block length 7
        // Switch: code for symbol 4 (third listed: length 2, code 11).
        w.write_code(3, 2);
        w.write(0, 2);
        // Switch: symbol 0 (second listed: code 10), the older type.
        w.write_code(2, 2);
        w.write(3, 2);
        // Switch: symbol 1 (first listed: code 0), the newer type plus one.
        w.write_code(0, 1);
        w.write(1, 2);

        let mut br = w.reader();
        let (mut state, codes) = read_partition(&mut br).unwrap();
        assert_eq!(state.num_types, 3);
        assert_eq!(state.length, 7);
        assert_eq!(state.current(), 0);

        assert_eq!(state.switch(&codes, &mut br), 2);
        assert_eq!(state.length, 5);
        assert_eq!(state.switch(&codes, &mut br), 0);
        assert_eq!(state.length, 8);
        assert_eq!(state.ring, [2, 0]);
        assert_eq!(state.switch(&codes, &mut br), 1);
        assert_eq!(state.length, 6);
        assert!(!br.overrun());
    }

    #[test]
    fn test_single_type_partition() {
        let mut w = BitWriter::default();
        w.write(0, 1);
        let (mut state, codes) = read_partition(&mut w.reader()).unwrap();
        assert_eq!(state, BlockState::default());
        let mut br = BitReader::new();
        assert_eq!(state.switch(&codes, &mut br), 0);
        assert_eq!(state.length, SINGLE_BLOCK_LENGTH);
    }
}
