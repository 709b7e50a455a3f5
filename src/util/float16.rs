// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! IEEE 754 binary16, just enough of it to move quantization weights through the
//! bitstream: bit-level conversion to and from `f32`, and an exactness test used by
//! the float coder to decide whether 16 bits suffice.

/// Format: 1 sign bit, 5 exponent bits (bias 15), 10 mantissa bits.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct f16(u16);

impl f16 {
    pub const ZERO: Self = Self(0);
    pub const MAX: f32 = 65504.0;

    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Returns true if this is neither infinite nor NaN.
    #[inline]
    pub fn is_finite(self) -> bool {
        ((self.0 >> 10) & 0x1F) != 31
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        let sign = ((self.0 >> 15) & 1) as u32;
        let exp = ((self.0 >> 10) & 0x1F) as u32;
        let mant = (self.0 & 0x3FF) as u32;

        let bits = match (exp, mant) {
            (0, 0) => sign << 31,
            (0, _) => {
                // Subnormal: value is mant * 2^-24, always exact in f32.
                let magnitude = mant as f32 * (1.0 / 16777216.0);
                return if sign == 1 { -magnitude } else { magnitude };
            }
            (31, 0) => (sign << 31) | (0xFF << 23),
            (31, _) => (sign << 31) | (0xFF << 23) | (mant << 13) | 0x0040_0000,
            _ => (sign << 31) | ((exp + 112) << 23) | (mant << 13),
        };
        f32::from_bits(bits)
    }

    /// Rounds `f` to the nearest binary16 value, ties to even. Values beyond the
    /// binary16 range become infinities.
    pub fn from_f32(f: f32) -> Self {
        let bits = f.to_bits();
        let sign = ((bits >> 31) & 1) as u16;
        let exp = ((bits >> 23) & 0xFF) as i32;
        let mant = bits & 0x007F_FFFF;

        if exp == 255 {
            let payload = if mant == 0 { 0 } else { 0x0200 };
            return Self((sign << 15) | (0x1F << 10) | payload);
        }

        let unbiased = exp - 127;
        if unbiased < -25 {
            return Self(sign << 15);
        }
        if unbiased < -14 {
            // Scaling by 2^24 is exact here and leaves at most 10 integer bits.
            // A result of 1024 carries into the smallest normal, which has the
            // same bit pattern.
            let m = (f.abs() * 16777216.0).round_ties_even() as u16;
            return Self((sign << 15) | m);
        }
        if unbiased > 15 {
            return Self((sign << 15) | (0x1F << 10));
        }

        let h_exp = (unbiased + 15) as u16;
        let h_mant = (mant >> 13) as u16;
        let round_bit = (mant >> 12) & 1;
        let sticky = mant & 0x0FFF;
        let h_mant = if round_bit == 1 && (sticky != 0 || (h_mant & 1) == 1) {
            h_mant + 1
        } else {
            h_mant
        };
        if h_mant > 0x3FF {
            if h_exp >= 30 {
                Self((sign << 15) | (0x1F << 10))
            } else {
                Self((sign << 15) | ((h_exp + 1) << 10))
            }
        } else {
            Self((sign << 15) | (h_exp << 10) | h_mant)
        }
    }

    /// Returns the binary16 value equal to `f`, if there is one.
    pub fn exact_from_f32(f: f32) -> Option<Self> {
        if !f.is_finite() {
            return None;
        }
        let h = Self::from_f32(f);
        (h.is_finite() && h.to_f32().to_bits() == f.to_bits()).then_some(h)
    }
}

impl From<f16> for f32 {
    #[inline]
    fn from(f: f16) -> f32 {
        f.to_f32()
    }
}

impl core::fmt::Debug for f16 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}
