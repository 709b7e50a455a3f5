// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Field-level coders shared by the reading and writing side of every header
//! in this crate, so that the two can never disagree on a layout.

use crate::{
    bit_reader::BitReader,
    bit_writer::BitWriter,
    error::{Error, Result},
    util::f16,
};

#[derive(Debug, Clone, Copy)]
pub enum U32 {
    Bits(usize),
    BitsOffset { n: usize, off: u32 },
    Val(u32),
}

impl U32 {
    pub fn read(&self, br: &mut BitReader) -> Result<u32> {
        match *self {
            U32::Bits(n) => Ok(br.read(n)? as u32),
            U32::BitsOffset { n, off } => Ok(br.read(n)? as u32 + off),
            U32::Val(val) => Ok(val),
        }
    }

    fn can_represent(&self, value: u32) -> bool {
        match *self {
            U32::Bits(n) => (value as u64) >> n == 0,
            U32::BitsOffset { n, off } => value >= off && ((value - off) as u64) >> n == 0,
            U32::Val(val) => value == val,
        }
    }

    fn max(&self) -> u32 {
        match *self {
            U32::Bits(n) => ((1u64 << n) - 1) as u32,
            U32::BitsOffset { n, off } => (((1u64 << n) - 1) as u32).saturating_add(off),
            U32::Val(val) => val,
        }
    }

    /// Writes `value`, which must be representable by this distribution.
    fn write(&self, value: u32, bw: &mut BitWriter) {
        debug_assert!(self.can_represent(value));
        match *self {
            U32::Bits(n) => bw.write(n, value as u64),
            U32::BitsOffset { n, off } => bw.write(n, (value - off) as u64),
            U32::Val(_) => {}
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum U32Coder {
    Direct(U32),
    Select(U32, U32, U32, U32),
}

pub trait FieldCoder<Config>
where
    Self: Sized,
{
    fn read(config: &Config, br: &mut BitReader) -> Result<Self>;
    fn write(&self, config: &Config, bw: &mut BitWriter) -> Result<()>;
}

impl FieldCoder<()> for bool {
    fn read(_: &(), br: &mut BitReader) -> Result<bool> {
        Ok(br.read(1)? != 0)
    }

    fn write(&self, _: &(), bw: &mut BitWriter) -> Result<()> {
        bw.write(1, *self as u64);
        Ok(())
    }
}

impl FieldCoder<U32Coder> for u32 {
    fn read(config: &U32Coder, br: &mut BitReader) -> Result<u32> {
        let u = match config {
            U32Coder::Direct(u) => u,
            U32Coder::Select(u0, u1, u2, u3) => match br.read(2)? {
                0 => u0,
                1 => u1,
                2 => u2,
                _ => u3,
            },
        };
        u.read(br)
    }

    fn write(&self, config: &U32Coder, bw: &mut BitWriter) -> Result<()> {
        let value = *self;
        match config {
            U32Coder::Direct(u) => {
                if !u.can_represent(value) {
                    return Err(Error::ValueTooLarge(value, u.max()));
                }
                u.write(value, bw);
            }
            U32Coder::Select(u0, u1, u2, u3) => {
                let choices = [u0, u1, u2, u3];
                let Some(selector) = choices.iter().position(|u| u.can_represent(value)) else {
                    let max = choices.iter().map(|u| u.max()).max().unwrap_or(0);
                    return Err(Error::ValueTooLarge(value, max));
                };
                bw.write(2, selector as u64);
                choices[selector].write(value, bw);
            }
        }
        Ok(())
    }
}

/// Floats are stored exactly: as binary16 when that loses nothing, as binary32
/// otherwise, behind a one-bit tag. NaN and infinities are rejected both ways.
impl FieldCoder<()> for f32 {
    fn read(_: &(), br: &mut BitReader) -> Result<f32> {
        let value = if br.read(1)? == 1 {
            let half = f16::from_bits(br.read(16)? as u16);
            if !half.is_finite() {
                return Err(Error::FloatNaNOrInf);
            }
            half.to_f32()
        } else {
            f32::from_bits(br.read(32)? as u32)
        };
        if !value.is_finite() {
            return Err(Error::FloatNaNOrInf);
        }
        Ok(value)
    }

    fn write(&self, _: &(), bw: &mut BitWriter) -> Result<()> {
        if !self.is_finite() {
            return Err(Error::FloatNaNOrInf);
        }
        match f16::exact_from_f32(*self) {
            Some(half) => {
                bw.write(1, 1);
                bw.write(16, half.to_bits() as u64);
            }
            None => {
                bw.write(1, 0);
                bw.write(32, self.to_bits() as u64);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const SIZE_CODER: U32Coder = U32Coder::Select(
        U32::Val(0),
        U32::Bits(4),
        U32::BitsOffset { n: 5, off: 16 },
        U32::BitsOffset { n: 10, off: 48 },
    );

    #[test]
    fn u32_select_picks_first_fit() -> Result<()> {
        for (value, expected_bits) in [(0u32, 2), (1, 6), (15, 6), (16, 7), (47, 7), (48, 12)] {
            let mut bw = BitWriter::new();
            value.write(&SIZE_CODER, &mut bw)?;
            assert_eq!(bw.bits_written(), expected_bits, "value {value}");
            let bytes = bw.finish();
            let mut br = BitReader::new(&bytes);
            assert_eq!(u32::read(&SIZE_CODER, &mut br)?, value);
        }
        Ok(())
    }

    #[test]
    fn u32_out_of_range() {
        let mut bw = BitWriter::new();
        assert_eq!(
            1072u32.write(&SIZE_CODER, &mut bw),
            Err(Error::ValueTooLarge(1072, 1071))
        );
        assert_eq!(
            3u32.write(&U32Coder::Direct(U32::Val(2)), &mut bw),
            Err(Error::ValueTooLarge(3, 2))
        );
        assert_eq!(bw.bits_written(), 0);
    }

    #[test]
    fn float_sizes() -> Result<()> {
        let mut bw = BitWriter::new();
        0.5f32.write(&(), &mut bw)?;
        assert_eq!(bw.bits_written(), 17);
        0.1f32.write(&(), &mut bw)?;
        assert_eq!(bw.bits_written(), 17 + 33);
        assert_eq!(f32::NAN.write(&(), &mut bw), Err(Error::FloatNaNOrInf));
        Ok(())
    }

    #[test]
    fn float_rejects_non_finite_input() {
        // Tag 1 followed by the binary16 infinity.
        let mut bw = BitWriter::new();
        bw.write(1, 1);
        bw.write(16, 0x7C00);
        let bytes = bw.finish();
        assert_eq!(
            f32::read(&(), &mut BitReader::new(&bytes)),
            Err(Error::FloatNaNOrInf)
        );

        let mut bw = BitWriter::new();
        bw.write(1, 0);
        bw.write(32, f32::NAN.to_bits() as u64);
        let bytes = bw.finish();
        assert_eq!(
            f32::read(&(), &mut BitReader::new(&bytes)),
            Err(Error::FloatNaNOrInf)
        );
    }

    #[test]
    fn floats_are_exact() {
        arbtest::arbtest(|u| {
            let value = f32::from_bits(u.arbitrary()?);
            if !value.is_finite() {
                return Ok(());
            }
            let mut bw = BitWriter::new();
            value.write(&(), &mut bw).expect("finite floats are encodable");
            let bytes = bw.finish();
            let decoded = f32::read(&(), &mut BitReader::new(&bytes)).expect("decodable");
            assert_eq!(decoded.to_bits(), value.to_bits());
            Ok(())
        });
    }
}
