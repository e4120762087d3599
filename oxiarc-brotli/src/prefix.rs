//! Prefix code range tables.
//!
//! Block lengths, insert lengths, copy lengths and distances are all coded
//! as a small symbol selecting a base value plus a number of extra bits
//! (RFC 7932 sections 4, 5 and 6).

use std::sync::OnceLock;

/// Number of symbols in the block count / block length alphabets.
pub const NUM_BLOCK_LENGTH_CODES: usize = 26;

/// Number of insert-and-copy command symbols.
pub const NUM_COMMAND_CODES: usize = 704;

/// Number of literal symbols.
pub const NUM_LITERAL_CODES: usize = 256;

/// Distance codes that refer to the recent-distance ring.
pub const NUM_DISTANCE_SHORT_CODES: usize = 16;

/// Distance extra bits in regular streams.
pub const MAX_DISTANCE_BITS: u32 = 24;

/// Distance extra bits in large-window streams.
pub const MAX_LARGE_WINDOW_DISTANCE_BITS: u32 = 62;

/// Largest distance a large-window stream may encode.
pub const MAX_ALLOWED_DISTANCE: i32 = 0x7FFF_FFFC;

/// Base value of each block length code.
pub const BLOCK_LENGTH_OFFSET: [u32; NUM_BLOCK_LENGTH_CODES] = [
    1, 5, 9, 13, 17, 25, 33, 41, 49, 65, 81, 97, 113, 145, 177, 209, 241, 305, 369, 497, 753, 1265,
    2289, 4337, 8433, 16625,
];

/// Extra bits of each block length code.
pub const BLOCK_LENGTH_N_BITS: [u32; NUM_BLOCK_LENGTH_CODES] = [
    2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 7, 8, 9, 10, 11, 12, 13, 24,
];

const INSERT_LENGTH_N_BITS: [u16; 24] = [
    0, 0, 0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 7, 8, 9, 10, 12, 14, 24,
];

const COPY_LENGTH_N_BITS: [u16; 24] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 7, 8, 9, 10, 24,
];

/// Recent-distance ring slot used by each short distance code, relative to
/// the newest entry.
pub const DISTANCE_SHORT_CODE_INDEX_OFFSET: [usize; NUM_DISTANCE_SHORT_CODES] =
    [0, 3, 2, 1, 0, 0, 0, 0, 0, 0, 3, 3, 3, 3, 3, 3];

/// Adjustment added to the ring entry by each short distance code.
pub const DISTANCE_SHORT_CODE_VALUE_OFFSET: [i32; NUM_DISTANCE_SHORT_CODES] =
    [0, 0, 0, 0, -1, 1, -2, 2, -3, 3, -1, 1, -2, 2, -3, 3];

/// Decoded form of one insert-and-copy command symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandCode {
    /// Extra bits following the symbol for the insert length.
    pub insert_extra_bits: u8,
    /// Extra bits following the insert extra bits for the copy length.
    pub copy_extra_bits: u8,
    /// Insert length before extra bits.
    pub insert_offset: u32,
    /// Copy length before extra bits.
    pub copy_offset: u32,
    /// Distance context (0..=3), or negative when the command reuses the
    /// last distance without reading a distance code.
    pub distance_context: i8,
}

/// Lookup table from command symbol to its decoded form.
pub fn command_lookup() -> &'static [CommandCode; NUM_COMMAND_CODES] {
    static TABLE: OnceLock<[CommandCode; NUM_COMMAND_CODES]> = OnceLock::new();
    TABLE.get_or_init(build_command_lookup)
}

fn build_command_lookup() -> [CommandCode; NUM_COMMAND_CODES] {
    let mut insert_offsets = [0u32; 24];
    let mut copy_offsets = [0u32; 24];
    copy_offsets[0] = 2;
    for i in 0..23 {
        insert_offsets[i + 1] = insert_offsets[i] + (1 << INSERT_LENGTH_N_BITS[i]);
        copy_offsets[i + 1] = copy_offsets[i] + (1 << COPY_LENGTH_N_BITS[i]);
    }

    let mut table = [CommandCode::default(); NUM_COMMAND_CODES];
    for (cmd, entry) in table.iter_mut().enumerate() {
        let mut range = cmd >> 6;
        // Commands in the first two ranges never read a distance code.
        let mut distance_context_offset = -4i32;
        if range >= 2 {
            range -= 2;
            distance_context_offset = 0;
        }
        let insert_code = (((0x29850 >> (range * 2)) & 3) << 3) | ((cmd >> 3) & 7);
        let copy_code = (((0x26244 >> (range * 2)) & 3) << 3) | (cmd & 7);
        let copy_offset = copy_offsets[copy_code];
        let distance_context = distance_context_offset
            + if copy_offset > 4 {
                3
            } else {
                copy_offset as i32 - 2
            };
        *entry = CommandCode {
            insert_extra_bits: INSERT_LENGTH_N_BITS[insert_code] as u8,
            copy_extra_bits: COPY_LENGTH_N_BITS[copy_code] as u8,
            insert_offset: insert_offsets[insert_code],
            copy_offset,
            distance_context: distance_context as i8,
        };
    }
    table
}

/// Size of the distance alphabet for the given postfix bits, direct codes
/// and maximum number of distance extra bits.
pub fn distance_alphabet_size(npostfix: u32, ndirect: u32, max_distance_bits: u32) -> usize {
    NUM_DISTANCE_SHORT_CODES + ndirect as usize + 2 * ((max_distance_bits as usize) << npostfix)
}

/// Number of distance symbols that can produce distances up to
/// `max_distance`. Symbols past the limit are never valid.
pub fn distance_alphabet_limit(max_distance: i32, npostfix: u32, ndirect: u32) -> usize {
    debug_assert!(max_distance >= 0 && max_distance as u32 >= ndirect + (2 << npostfix));
    // Reaches 1 << 31 for the largest window.
    let offset = ((max_distance as u32 - ndirect) >> npostfix) + 4;
    let ndistbits = log2_floor(offset) - 1;
    let group = ((ndistbits - 1) << 1) | ((offset >> ndistbits) & 1);
    (((group - 1) << npostfix) + (1 << npostfix) + ndirect) as usize + NUM_DISTANCE_SHORT_CODES
}

/// Extra bits and base offset of every distance symbol.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    /// Extra bits per symbol.
    pub extra_bits: Vec<u8>,
    /// Base distance per symbol (before adding shifted extra bits).
    pub offset: Vec<i32>,
}

impl DistanceTable {
    /// Fill the table for `alphabet_limit` symbols.
    pub fn rebuild(&mut self, npostfix: u32, ndirect: u32, alphabet_limit: usize) {
        self.extra_bits.clear();
        self.offset.clear();
        self.extra_bits.resize(NUM_DISTANCE_SHORT_CODES, 0);
        self.offset.resize(NUM_DISTANCE_SHORT_CODES, 0);

        for j in 0..ndirect as i32 {
            self.extra_bits.push(0);
            self.offset.push(j + 1);
        }

        let postfix = 1i32 << npostfix;
        let mut bits = 1i32;
        let mut half = 0i32;
        while self.offset.len() < alphabet_limit {
            let base = ndirect as i32 + ((((2 + half) << bits) - 4) << npostfix) + 1;
            // Groups are always filled completely.
            for j in 0..postfix {
                self.extra_bits.push(bits as u8);
                self.offset.push(base + j);
            }
            bits += half;
            half ^= 1;
        }
    }
}

/// Index of the highest set bit; `x` must be non-zero.
pub fn log2_floor(x: u32) -> u32 {
    31 - x.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lookup_first_ranges() {
        let table = command_lookup();
        // Symbol 0: insert 0, copy 2, implicit distance.
        assert_eq!(table[0].insert_offset, 0);
        assert_eq!(table[0].copy_offset, 2);
        assert!(table[0].distance_context < 0);

        // Symbol 128 starts the first range with explicit distances.
        assert_eq!(table[128].insert_offset, 0);
        assert_eq!(table[128].copy_offset, 2);
        assert_eq!(table[128].distance_context, 0);

        // Copy lengths above 4 always use distance context 3.
        assert_eq!(table[135].copy_offset, 9);
        assert_eq!(table[135].distance_context, 3);
    }

    #[test]
    fn test_command_lookup_last_symbol() {
        let last = command_lookup()[NUM_COMMAND_CODES - 1];
        assert_eq!(last.insert_offset, 22594);
        assert_eq!(last.insert_extra_bits, 24);
        assert_eq!(last.copy_offset, 2118);
        assert_eq!(last.copy_extra_bits, 24);
        assert_eq!(last.distance_context, 3);
    }

    #[test]
    fn test_distance_alphabet() {
        assert_eq!(distance_alphabet_size(0, 0, MAX_DISTANCE_BITS), 64);
        assert_eq!(distance_alphabet_size(3, 120, MAX_DISTANCE_BITS), 520);
        assert_eq!(
            distance_alphabet_limit(MAX_ALLOWED_DISTANCE, 0, 0),
            NUM_DISTANCE_SHORT_CODES + 58
        );
    }

    #[test]
    fn test_large_window_alphabet_limit_with_postfix() {
        assert_eq!(distance_alphabet_limit(MAX_ALLOWED_DISTANCE, 1, 0), 128);
        assert_eq!(distance_alphabet_limit(MAX_ALLOWED_DISTANCE, 3, 120), 544);
        for npostfix in 0..4 {
            for ndirect in [0, 15 << npostfix] {
                let limit = distance_alphabet_limit(MAX_ALLOWED_DISTANCE, npostfix, ndirect);
                let size = distance_alphabet_size(npostfix, ndirect, MAX_LARGE_WINDOW_DISTANCE_BITS);
                assert!(limit <= size, "npostfix {npostfix} ndirect {ndirect}");
            }
        }

        let mut table = DistanceTable::default();
        table.rebuild(0, 0, distance_alphabet_limit(MAX_ALLOWED_DISTANCE, 0, 0));
        assert_eq!(table.offset.len(), 74);
        assert_eq!(table.extra_bits[73], 29);
        assert_eq!(
            i64::from(table.offset[73]) + (1 << 29) - 1,
            i64::from(MAX_ALLOWED_DISTANCE)
        );
    }

    #[test]
    fn test_distance_table_groups() {
        let mut table = DistanceTable::default();
        table.rebuild(0, 0, 64);
        assert_eq!(table.offset.len(), 64);
        // First regular codes: 1, 2 (1 extra bit each), then 5, 7 ...
        assert_eq!(table.offset[16], 1);
        assert_eq!(table.extra_bits[16], 1);
        assert_eq!(table.offset[17], 3);
        assert_eq!(table.offset[18], 5);
        assert_eq!(table.extra_bits[18], 2);
        assert_eq!(table.offset[19], 9);

        table.rebuild(1, 2, 24);
        assert_eq!(table.offset[16], 1);
        assert_eq!(table.offset[17], 2);
        assert_eq!(table.extra_bits[18], 1);
        assert_eq!(table.offset[18], 3);
        assert_eq!(table.offset[19], 4);
    }

    #[test]
    fn test_block_length_tables_are_contiguous() {
        for i in 0..NUM_BLOCK_LENGTH_CODES - 1 {
            assert_eq!(
                BLOCK_LENGTH_OFFSET[i] + (1 << BLOCK_LENGTH_N_BITS[i]),
                BLOCK_LENGTH_OFFSET[i + 1]
            );
        }
    }
}
