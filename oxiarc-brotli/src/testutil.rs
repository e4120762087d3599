//! Helpers for building bit streams in unit tests.

use crate::bitreader::BitReader;

/// LSB-first bit packer for building test streams.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    pub fn write(&mut self, value: u32, n: u32) {
        for i in 0..n {
            if self.bits % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 1 << (self.bits % 8);
            }
            self.bits += 1;
        }
    }

    /// Prefix codes go out most significant bit first.
    pub fn write_code(&mut self, code: u32, len: u32) {
        for i in (0..len).rev() {
            self.write((code >> i) & 1, 1);
        }
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn align(&mut self) {
        self.bits = self.bytes.len() * 8;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn reader(&self) -> BitReader {
        let mut br = BitReader::new();
        br.feed(&self.bytes);
        br
    }
}
