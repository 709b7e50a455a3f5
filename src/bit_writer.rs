// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::bit_reader::MAX_BITS_PER_CALL;

/// Writes bits, least significant first, in the layout `BitReader` consumes.
#[derive(Default, Clone)]
pub struct BitWriter {
    storage: Vec<u8>,
    bit_buf: u64,
    bits_in_buf: usize,
}

impl Debug for BitWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BitWriter{{ storage: [{} bytes], bits_in_buf: {} }}",
            self.storage.len(),
            self.bits_in_buf
        )
    }
}

impl BitWriter {
    pub fn new() -> BitWriter {
        BitWriter::default()
    }

    /// Appends the low `num` bits of `value`; higher bits must be zero.
    /// ```
    /// # use jxl_dequant::{bit_reader::BitReader, bit_writer::BitWriter};
    /// let mut bw = BitWriter::new();
    /// bw.write(3, 0b101);
    /// bw.write(13, 0x1234);
    /// let bytes = bw.finish();
    /// let mut br = BitReader::new(&bytes);
    /// assert_eq!(br.read(3)?, 0b101);
    /// assert_eq!(br.read(13)?, 0x1234);
    /// # Ok::<(), jxl_dequant::error::Error>(())
    /// ```
    #[inline]
    pub fn write(&mut self, num: usize, value: u64) {
        debug_assert!(num <= MAX_BITS_PER_CALL);
        debug_assert!(value >> num == 0, "{value} does not fit in {num} bits");
        self.bit_buf |= value << self.bits_in_buf;
        self.bits_in_buf += num;
        while self.bits_in_buf >= 8 {
            self.storage.push(self.bit_buf as u8);
            self.bit_buf >>= 8;
            self.bits_in_buf -= 8;
        }
    }

    pub fn bits_written(&self) -> usize {
        self.storage.len() * 8 + self.bits_in_buf
    }

    pub fn zero_pad_to_byte(&mut self) {
        if self.bits_in_buf != 0 {
            self.write(8 - self.bits_in_buf, 0);
        }
    }

    /// Pads to a byte boundary and returns the written bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.zero_pad_to_byte();
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_reader::BitReader;
    use crate::error::Result;
    use test_log::test;

    #[test]
    fn matches_reader_bit_order() {
        let mut bw = BitWriter::new();
        bw.write(8, 0);
        bw.write(4, 1);
        bw.write(4, 0);
        assert_eq!(bw.finish(), vec![0, 1]);
    }

    #[test]
    fn padding() {
        let mut bw = BitWriter::new();
        bw.write(1, 1);
        assert_eq!(bw.bits_written(), 1);
        bw.zero_pad_to_byte();
        assert_eq!(bw.bits_written(), 8);
        bw.zero_pad_to_byte();
        assert_eq!(bw.bits_written(), 8);
        assert_eq!(bw.finish(), vec![1]);
    }

    #[test]
    fn arbitrary_field_sequences() {
        arbtest::arbtest(|u| {
            let num_fields = u.int_in_range(0..=64usize)?;
            let mut fields = Vec::with_capacity(num_fields);
            let mut bw = BitWriter::new();
            for _ in 0..num_fields {
                let num = u.int_in_range(0..=MAX_BITS_PER_CALL)?;
                let value = u.arbitrary::<u64>()? & ((1u64 << num) - 1);
                bw.write(num, value);
                fields.push((num, value));
            }
            let bytes = bw.finish();
            let mut br = BitReader::new(&bytes);
            let read_back: Result<Vec<u64>> = fields.iter().map(|&(n, _)| br.read(n)).collect();
            let read_back = read_back.expect("stream too short");
            assert!(fields.iter().map(|&(_, v)| v).eq(read_back));
            br.close().expect("padding must be zero");
            Ok(())
        });
    }
}
