// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{
    BLOCK_DIM,
    error::{
        Error::{
            InvalidDistanceBand, InvalidQuantEncoding, InvalidQuantizationTableWeight,
            InvalidRawQuantShift, InvalidRawQuantTable, InvalidRawQuantTableSize,
            InvalidRawQuantValue,
        },
        Result,
    },
    util::{AlignedF32Buffer, tracing_wrappers::*},
};

use super::{
    ALMOST_ZERO, DequantMatrices, MAX_RAW_QUANT_VALUE, NUM_PREDEFINED_TABLES, QUANT_TABLE_OFFSETS, QuantTable,
    encoding::QuantEncoding,
    interpolate::{get_quant_weights, interpolate_vec},
    library::library_tables,
};

impl DequantMatrices {
    /// Builds the forward and inverse weights of all quant tables into a new
    /// arena laid out like [`DequantMatrices::TOTAL_TABLE_SIZE`] describes.
    pub(super) fn compute(encodings: &[QuantEncoding]) -> Result<AlignedF32Buffer> {
        debug_assert_eq!(encodings.len(), QuantTable::CARDINALITY);
        let mut table = AlignedF32Buffer::new(2 * Self::TOTAL_TABLE_SIZE);
        let (weights, inv_weights) = table.as_mut_slice().split_at_mut(Self::TOTAL_TABLE_SIZE);
        for (encoding, quant_table) in encodings.iter().zip(QuantTable::VALUES) {
            let offset = QUANT_TABLE_OFFSETS[quant_table as usize * 3];
            let range = offset..offset + 3 * quant_table.num_coefficients();
            if let Err(err) = compute_table(encoding, quant_table, &mut weights[range.clone()]) {
                debug!(?quant_table, ?err, "quant table computation failed");
                return Err(err);
            }
            for (inv, weight) in inv_weights[range].iter_mut().zip(&weights[offset..]) {
                *inv = 1.0 / *weight;
            }
            trace!(?quant_table, offset, "computed quant table");
        }
        Ok(table)
    }
}

/// Computes the forward weights of one quant table, all three channels, into
/// `weights`.
pub(super) fn compute_table(
    encoding: &QuantEncoding,
    quant_table: QuantTable,
    weights: &mut [f32],
) -> Result<()> {
    let required_size = quant_table.required_size();
    if !encoding.fits(required_size) {
        return Err(InvalidQuantEncoding {
            mode: encoding.mode() as u8,
            required_size,
        });
    }
    let wrows = BLOCK_DIM * quant_table.required_size_x();
    let wcols = BLOCK_DIM * quant_table.required_size_y();
    let num = wrows * wcols;
    debug_assert_eq!(weights.len(), 3 * num);
    match encoding {
        QuantEncoding::Library(idx) => {
            assert!((*idx as usize) < NUM_PREDEFINED_TABLES);
            let offset = QUANT_TABLE_OFFSETS[quant_table as usize * 3];
            weights.copy_from_slice(&library_tables().as_slice()[offset..offset + 3 * num]);
            // Library tables are validated when they are built.
            return Ok(());
        }
        QuantEncoding::Identity { xyb_weights } => {
            for c in 0..3 {
                for i in 0..num {
                    weights[num * c + i] = xyb_weights[c][0];
                }
                weights[num * c + 1] = xyb_weights[c][1];
                weights[num * c + BLOCK_DIM] = xyb_weights[c][1];
                weights[num * c + BLOCK_DIM + 1] = xyb_weights[c][2];
            }
        }
        QuantEncoding::Dct2 { xyb_weights } => {
            for (c, xyb_weight) in xyb_weights.iter().enumerate() {
                let start = c * num;
                weights[start] = 0xBAD as f32;
                weights[start + 1] = xyb_weight[0];
                weights[start + 8] = xyb_weight[0];
                weights[start + 9] = xyb_weight[1];
                for y in 0..2 {
                    for x in 0..2 {
                        weights[start + y * 8 + x + 2] = xyb_weight[2];
                        weights[start + (y + 2) * 8 + x] = xyb_weight[2];
                    }
                }
                for y in 0..2 {
                    for x in 0..2 {
                        weights[start + (y + 2) * 8 + x + 2] = xyb_weight[3];
                    }
                }
                for y in 0..4 {
                    for x in 0..4 {
                        weights[start + y * 8 + x + 4] = xyb_weight[4];
                        weights[start + (y + 4) * 8 + x] = xyb_weight[4];
                    }
                }
                for y in 0..4 {
                    for x in 0..4 {
                        weights[start + (y + 4) * 8 + x + 4] = xyb_weight[5];
                    }
                }
            }
        }
        QuantEncoding::Dct4 { params, xyb_mul } => {
            let mut weights4x4 = [0f32; 3 * 4 * 4];
            get_quant_weights(4, 4, params, &mut weights4x4)?;
            for c in 0..3 {
                for y in 0..BLOCK_DIM {
                    for x in 0..BLOCK_DIM {
                        weights[c * num + y * BLOCK_DIM + x] =
                            weights4x4[c * 16 + (y / 2) * 4 + (x / 2)];
                    }
                }
                weights[c * num + 1] /= xyb_mul[c][0];
                weights[c * num + BLOCK_DIM] /= xyb_mul[c][0];
                weights[c * num + BLOCK_DIM + 1] /= xyb_mul[c][1];
            }
        }
        QuantEncoding::Dct4x8 { params, xyb_mul } => {
            let mut weights4x8 = [0f32; 3 * 4 * 8];
            get_quant_weights(4, 8, params, &mut weights4x8)?;
            for c in 0..3 {
                for y in 0..BLOCK_DIM {
                    for x in 0..BLOCK_DIM {
                        weights[c * num + y * BLOCK_DIM + x] =
                            weights4x8[c * 32 + (y / 2) * 8 + x];
                    }
                }
                weights[c * num + BLOCK_DIM] /= xyb_mul[c];
            }
        }
        QuantEncoding::Dct { params } => {
            get_quant_weights(wrows, wcols, params, weights)?;
        }
        QuantEncoding::Raw { qtable, den_shift } => {
            if qtable.len() != 3 * num {
                return Err(InvalidRawQuantTableSize(qtable.len(), 3 * num));
            }
            if *den_shift >= 32 {
                return Err(InvalidRawQuantShift(*den_shift));
            }
            let den = (1u64 << den_shift) as f32;
            for (weight, &q) in weights.iter_mut().zip(qtable) {
                if q <= 0 {
                    return Err(InvalidRawQuantTable);
                }
                if q > MAX_RAW_QUANT_VALUE {
                    return Err(InvalidRawQuantValue(q));
                }
                *weight = q as f32 / den;
            }
        }
        QuantEncoding::Afv {
            params4x8,
            params4x4,
            weights: afv_weights,
        } => {
            // Radial frequency of each coefficient of the 4x4 corner; the
            // entries at 0xBAD are placed directly.
            #[allow(clippy::excessive_precision)]
            const FREQS: [f32; 16] = [
                0xBAD as f32,
                0xBAD as f32,
                0.8517778890324296,
                5.37778436506804,
                0xBAD as f32,
                0xBAD as f32,
                4.734747904497923,
                5.449245381693219,
                1.6598270267479331,
                4f32,
                7.275749096817861,
                10.423227632456525,
                2.662932286148962,
                7.630657783650829,
                8.962388608184032,
                12.97166202570235,
            ];
            let mut weights4x8 = [0f32; 3 * 4 * 8];
            get_quant_weights(4, 8, params4x8, &mut weights4x8)?;
            let mut weights4x4 = [0f32; 3 * 4 * 4];
            get_quant_weights(4, 4, params4x4, &mut weights4x4)?;
            #[allow(clippy::excessive_precision)]
            const LO: f32 = 0.8517778890324296;
            #[allow(clippy::excessive_precision)]
            const HI: f32 = 12.97166202570235f32 - LO + 1e-6f32;
            for c in 0..3 {
                let bands = &afv_weights[c][5..];
                for (i, &band) in bands.iter().enumerate() {
                    if !(band >= ALMOST_ZERO) {
                        return Err(InvalidDistanceBand(i, band));
                    }
                }

                {
                    let start = c * num;
                    weights[start] = 1f32;
                    let mut set = |x, y, val| {
                        weights[start + y * 8 + x] = val;
                    };
                    set(0, 1, afv_weights[c][0]);
                    set(1, 0, afv_weights[c][1]);
                    set(0, 2, afv_weights[c][2]);
                    set(2, 0, afv_weights[c][3]);
                    set(2, 2, afv_weights[c][4]);

                    for y in 0..4 {
                        for x in 0..4 {
                            if x < 2 && y < 2 {
                                continue;
                            }
                            let pos = (FREQS[y * 4 + x] - LO) * (bands.len() - 1) as f32 / HI;
                            set(2 * x, 2 * y, interpolate_vec(pos, bands));
                        }
                    }
                }

                for y in 0..BLOCK_DIM / 2 {
                    for x in 0..BLOCK_DIM {
                        if x == 0 && y == 0 {
                            continue;
                        }
                        weights[c * num + (2 * y + 1) * BLOCK_DIM + x] =
                            weights4x8[c * 32 + y * 8 + x];
                    }
                }

                for y in 0..BLOCK_DIM / 2 {
                    for x in 0..BLOCK_DIM / 2 {
                        if x == 0 && y == 0 {
                            continue;
                        }
                        weights[c * num + (2 * y) * BLOCK_DIM + 2 * x + 1] =
                            weights4x4[c * 16 + y * 4 + x];
                    }
                }
            }
        }
    }
    for weight in weights.iter() {
        if !(ALMOST_ZERO..=1.0 / ALMOST_ZERO).contains(weight) {
            return Err(InvalidQuantizationTableWeight(*weight));
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::quant_weights::DistanceBands;
    use test_log::test;

    fn computed(encoding: &QuantEncoding, quant_table: QuantTable) -> Result<Vec<f32>> {
        let mut weights = vec![0f32; 3 * quant_table.num_coefficients()];
        compute_table(encoding, quant_table, &mut weights)?;
        Ok(weights)
    }

    #[test]
    fn identity_layout() -> Result<()> {
        let weights = computed(
            &QuantEncoding::Identity {
                xyb_weights: [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
            },
            QuantTable::IDENTITY,
        )?;
        for c in 0..3 {
            let base = 3.0 * c as f32;
            let w = &weights[64 * c..64 * (c + 1)];
            assert_eq!(w[1], base + 2.0);
            assert_eq!(w[8], base + 2.0);
            assert_eq!(w[9], base + 3.0);
            let rest = w.iter().enumerate().filter(|(i, _)| ![1, 8, 9].contains(i));
            assert!(rest.map(|(_, &v)| v).all(|v| v == base + 1.0));
        }
        Ok(())
    }

    #[test]
    fn dct2_layout() -> Result<()> {
        let weights = computed(
            &QuantEncoding::Dct2 {
                xyb_weights: [[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; 3],
            },
            QuantTable::DCT2X2,
        )?;
        let w = &weights[..64];
        assert_eq!((w[1], w[8], w[9]), (1.0, 1.0, 2.0));
        assert_eq!((w[2], w[16], w[18], w[27]), (3.0, 3.0, 4.0, 4.0));
        assert_eq!((w[4], w[32], w[36], w[63]), (5.0, 5.0, 6.0, 6.0));
        Ok(())
    }

    #[test]
    fn dct4_multipliers() -> Result<()> {
        let params = DistanceBands::from_array(&[[8.0], [8.0], [8.0]]);
        let weights = computed(
            &QuantEncoding::Dct4 {
                params,
                xyb_mul: [[2.0, 4.0], [1.0, 1.0], [1.0, 1.0]],
            },
            QuantTable::DCT4X4,
        )?;
        assert_eq!((weights[0], weights[1], weights[8], weights[9]), (8.0, 4.0, 4.0, 2.0));
        assert!(weights[64..].iter().all(|&w| w == 8.0));
        Ok(())
    }

    #[test]
    fn dct4x8_multiplier() -> Result<()> {
        let params = DistanceBands::from_array(&[[8.0], [8.0], [8.0]]);
        let weights = computed(
            &QuantEncoding::Dct4x8 {
                params,
                xyb_mul: [1.0, 0.5, 1.0],
            },
            QuantTable::DCT4X8,
        )?;
        assert_eq!(weights[64 + 8], 16.0);
        assert_eq!(weights[64 + 9], 8.0);
        Ok(())
    }

    #[test]
    fn raw_scaling_and_size() -> Result<()> {
        let qtable: Vec<i32> = (1..=192).collect();
        let weights = computed(&QuantEncoding::raw_from_qtable(&qtable, 2), QuantTable::DCT)?;
        assert_eq!(weights[0], 0.25);
        assert_eq!(weights[191], 48.0);

        assert_eq!(
            computed(&QuantEncoding::raw_from_qtable(&qtable, 2), QuantTable::DCT4X8),
            Ok(weights)
        );
        assert_eq!(
            computed(&QuantEncoding::raw_from_qtable(&qtable, 2), QuantTable::DCT16X16),
            Err(Error::InvalidRawQuantTableSize(192, 768))
        );
        assert_eq!(
            computed(&QuantEncoding::raw_from_qtable(&qtable, 32), QuantTable::DCT),
            Err(Error::InvalidRawQuantShift(32))
        );
        let mut negative = qtable.clone();
        negative[100] = -3;
        assert_eq!(
            computed(&QuantEncoding::raw_from_qtable(&negative, 0), QuantTable::DCT),
            Err(Error::InvalidRawQuantTable)
        );
        let mut zero = qtable.clone();
        zero[7] = 0;
        assert_eq!(
            computed(&QuantEncoding::raw_from_qtable(&zero, 0), QuantTable::DCT),
            Err(Error::InvalidRawQuantTable)
        );
        let mut large = qtable.clone();
        large[191] = MAX_RAW_QUANT_VALUE + 1;
        assert_eq!(
            computed(&QuantEncoding::raw_from_qtable(&large, 10), QuantTable::DCT),
            Err(Error::InvalidRawQuantValue(MAX_RAW_QUANT_VALUE + 1))
        );
        Ok(())
    }

    #[test]
    fn single_block_modes_need_single_blocks() {
        let encoding = QuantEncoding::Identity {
            xyb_weights: [[1.0; 3]; 3],
        };
        assert_eq!(
            computed(&encoding, QuantTable::DCT16X16),
            Err(Error::InvalidQuantEncoding {
                mode: 1,
                required_size: 4
            })
        );
    }

    #[test]
    fn out_of_range_weights() {
        let encoding = QuantEncoding::Dct {
            params: DistanceBands::from_array(&[[1e9], [1.0], [1.0]]),
        };
        assert_eq!(
            computed(&encoding, QuantTable::DCT),
            Err(Error::InvalidQuantizationTableWeight(1e9))
        );
        let encoding = QuantEncoding::Identity {
            xyb_weights: [[1.0, f32::NAN, 1.0], [1.0; 3], [1.0; 3]],
        };
        assert!(matches!(
            computed(&encoding, QuantTable::IDENTITY),
            Err(Error::InvalidQuantizationTableWeight(_))
        ));
    }

    #[test]
    fn afv_stitching() -> Result<()> {
        let encoding = QuantEncoding::Afv {
            params4x8: DistanceBands::from_array(&[[40.0], [40.0], [40.0]]),
            params4x4: DistanceBands::from_array(&[[30.0], [30.0], [30.0]]),
            weights: [[1.0, 2.0, 3.0, 4.0, 5.0, 20.0, 20.0, 20.0, 20.0]; 3],
        };
        let weights = computed(&encoding, QuantTable::AFV0)?;
        let w = &weights[..64];
        assert_eq!(w[0], 1.0);
        assert_eq!((w[8], w[1], w[16], w[2], w[18]), (1.0, 2.0, 3.0, 4.0, 5.0));
        // Odd rows come from the 4x8 grid, odd columns of even rows from 4x4,
        // except where the direct weights sit.
        let odd_rows = (1..8).step_by(2).flat_map(|y| (0..8).map(move |x| y * 8 + x));
        assert!(odd_rows.filter(|&i| i != 8).all(|i| w[i] == 40.0));
        let odd_cols = (0..8).step_by(2).flat_map(|y| (1..8).step_by(2).map(move |x| y * 8 + x));
        assert!(odd_cols.filter(|&i| i != 1).all(|i| w[i] == 30.0));
        assert_eq!((w[4], w[6], w[32], w[54]), (20.0, 20.0, 20.0, 20.0));
        Ok(())
    }

    #[test]
    fn afv_corner_bands_must_be_positive() {
        let encoding = QuantEncoding::Afv {
            params4x8: DistanceBands::from_array(&[[40.0], [40.0], [40.0]]),
            params4x4: DistanceBands::from_array(&[[30.0], [30.0], [30.0]]),
            weights: [[1.0, 2.0, 3.0, 4.0, 5.0, 20.0, 20.0, -1.0, 20.0]; 3],
        };
        assert_eq!(
            computed(&encoding, QuantTable::AFV0),
            Err(Error::InvalidDistanceBand(2, -1.0))
        );
    }
}
