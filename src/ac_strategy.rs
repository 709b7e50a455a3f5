// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AcStrategyType {
    // Update AcStrategyType::VALUES when changing this!
    // Regular block size DCT
    DCT = 0,
    // Encode pixels without transforming
    IDENTITY = 1,
    // Use 2-by-2 DCT
    DCT2X2 = 2,
    // Use 4-by-4 DCT
    DCT4X4 = 3,
    // Use 16-by-16 DCT
    DCT16X16 = 4,
    // Use 32-by-32 DCT
    DCT32X32 = 5,
    // Use 16-by-8 DCT
    DCT16X8 = 6,
    // Use 8-by-16 DCT
    DCT8X16 = 7,
    // Use 32-by-8 DCT
    DCT32X8 = 8,
    // Use 8-by-32 DCT
    DCT8X32 = 9,
    // Use 32-by-16 DCT
    DCT32X16 = 10,
    // Use 16-by-32 DCT
    DCT16X32 = 11,
    // 4x8 and 8x4 DCT
    DCT4X8 = 12,
    DCT8X4 = 13,
    // Corner-DCT.
    AFV0 = 14,
    AFV1 = 15,
    AFV2 = 16,
    AFV3 = 17,
}

impl AcStrategyType {
    pub const CARDINALITY: usize = Self::VALUES.len();
    pub const VALUES: [AcStrategyType; 18] = [
        AcStrategyType::DCT,
        AcStrategyType::IDENTITY,
        AcStrategyType::DCT2X2,
        AcStrategyType::DCT4X4,
        AcStrategyType::DCT16X16,
        AcStrategyType::DCT32X32,
        AcStrategyType::DCT16X8,
        AcStrategyType::DCT8X16,
        AcStrategyType::DCT32X8,
        AcStrategyType::DCT8X32,
        AcStrategyType::DCT32X16,
        AcStrategyType::DCT16X32,
        AcStrategyType::DCT4X8,
        AcStrategyType::DCT8X4,
        AcStrategyType::AFV0,
        AcStrategyType::AFV1,
        AcStrategyType::AFV2,
        AcStrategyType::AFV3,
    ];

    pub fn from_usize(idx: usize) -> Option<AcStrategyType> {
        AcStrategyType::VALUES.get(idx).copied()
    }

    /// Width of the transform, in 8x8 blocks.
    pub fn covered_blocks_x(self) -> usize {
        const LUT: [usize; AcStrategyType::CARDINALITY] =
            [1, 1, 1, 1, 2, 4, 1, 2, 1, 4, 2, 4, 1, 1, 1, 1, 1, 1];
        LUT[self as usize]
    }

    /// Height of the transform, in 8x8 blocks.
    pub fn covered_blocks_y(self) -> usize {
        const LUT: [usize; AcStrategyType::CARDINALITY] =
            [1, 1, 1, 1, 2, 4, 2, 1, 4, 1, 4, 2, 1, 1, 1, 1, 1, 1];
        LUT[self as usize]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn values_match_discriminants() {
        for (i, &kind) in AcStrategyType::VALUES.iter().enumerate() {
            assert_eq!(kind as usize, i);
            assert_eq!(AcStrategyType::from_usize(i), Some(kind));
        }
        assert_eq!(AcStrategyType::from_usize(AcStrategyType::CARDINALITY), None);
    }

    #[test]
    fn transposed_kinds_swap_dimensions() {
        use AcStrategyType::*;
        for (a, b) in [(DCT16X8, DCT8X16), (DCT32X8, DCT8X32), (DCT32X16, DCT16X32)] {
            assert_eq!(a.covered_blocks_x(), b.covered_blocks_y());
            assert_eq!(a.covered_blocks_y(), b.covered_blocks_x());
        }
    }
}
