// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::f32::consts::SQRT_2;

use crate::error::{Error::InvalidDistanceBand, Result};

use super::{ALMOST_ZERO, DistanceBands};

/// Expands distance bands into a `rows x cols` weight grid per channel, written
/// channel-major into `out`.
///
/// Coefficient `(y, x)` sits at normalized radius
/// `sqrt((x / (cols - 1))^2 + (y / (rows - 1))^2) / sqrt(2)`, which is 0 at DC
/// and 1 at the highest frequency. That radius is scaled onto the band axis
/// `[0, N - 1]` and the weight is linearly interpolated between the two
/// nearest anchors.
pub fn get_quant_weights(
    rows: usize,
    cols: usize,
    distance_bands: &DistanceBands,
    out: &mut [f32],
) -> Result<()> {
    let num_bands = distance_bands.num_bands();
    debug_assert!(out.len() >= 3 * rows * cols);
    for c in 0..3 {
        let bands = distance_bands.channel(c);
        for (i, &band) in bands.iter().enumerate() {
            // Also rejects NaN.
            if !(band >= ALMOST_ZERO) {
                return Err(InvalidDistanceBand(i, band));
            }
        }
        let scale = (num_bands - 1) as f32;
        // Divisions rather than reciprocals keep the last row and column at
        // exactly 1, so the corner lands on the last anchor.
        let colmax = cols.saturating_sub(1).max(1) as f32;
        let rowmax = rows.saturating_sub(1).max(1) as f32;
        for y in 0..rows {
            let dy = y as f32 / rowmax;
            let dy2 = dy * dy;
            for x in 0..cols {
                let dx = x as f32 / colmax;
                let distance = (dx * dx + dy2).sqrt() / SQRT_2;
                out[c * cols * rows + y * cols + x] = interpolate_vec(distance * scale, bands);
            }
        }
    }
    Ok(())
}

/// Piecewise-linear lookup of `scaled_pos` in `array`, clamped to its last entry.
pub fn interpolate_vec(scaled_pos: f32, array: &[f32]) -> f32 {
    let last = array.len() - 1;
    if scaled_pos >= last as f32 {
        return array[last];
    }
    let idxf32 = scaled_pos.floor();
    let frac = scaled_pos - idxf32;
    let idx = idxf32 as usize;
    let a = array[idx];
    let b = array[idx + 1];
    a + frac * (b - a)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::util::test::assert_almost_abs_eq;
    use test_log::test;

    #[test]
    fn single_band_is_constant() -> Result<()> {
        let bands = DistanceBands::from_array(&[[7.5], [3.0], [0.25]]);
        let mut out = [0f32; 3 * 8 * 16];
        get_quant_weights(8, 16, &bands, &mut out)?;
        for (c, expected) in [7.5, 3.0, 0.25].into_iter().enumerate() {
            assert!(out[c * 128..(c + 1) * 128].iter().all(|&w| w == expected));
        }
        Ok(())
    }

    #[test]
    fn two_bands_over_8x8() -> Result<()> {
        let bands = DistanceBands::from_array(&[[10.0, 1.0], [1.0, 1.0], [1.0, 1.0]]);
        let mut out = [0f32; 3 * 64];
        get_quant_weights(8, 8, &bands, &mut out)?;
        assert_eq!(out[0], 10.0);
        assert_eq!(out[63], 1.0);
        for lowest in [out[1], out[8]] {
            assert!((lowest - 10.0).abs() < (lowest - 1.0).abs(), "{lowest}");
        }
        Ok(())
    }

    #[test]
    fn monotonic_along_the_diagonal() -> Result<()> {
        let bands = DistanceBands::from_array(&[
            [50.0, 40.0, 10.0, 5.0],
            [4.0, 3.0, 2.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
        ]);
        let mut out = [0f32; 3 * 32 * 32];
        get_quant_weights(32, 32, &bands, &mut out)?;
        for c in 0..2 {
            let diagonal: Vec<f32> = (0..32).map(|i| out[c * 1024 + i * 32 + i]).collect();
            assert!(diagonal.windows(2).all(|w| w[0] > w[1]), "{diagonal:?}");
        }
        assert_eq!(out[1023], 5.0);
        Ok(())
    }

    #[test]
    fn non_square_and_degenerate_shapes() -> Result<()> {
        let bands = DistanceBands::from_array(&[[8.0, 2.0], [8.0, 2.0], [8.0, 2.0]]);
        let mut out = [0f32; 3 * 4 * 8];
        get_quant_weights(4, 8, &bands, &mut out)?;
        assert_eq!(out[31], 2.0);
        // Halfway along a single axis is 1/(2 sqrt 2) of the way to the corner.
        let mut row = [0f32; 3 * 3];
        get_quant_weights(1, 3, &bands, &mut row)?;
        assert_almost_abs_eq(row[1], 8.0 - 6.0 * 0.5 / SQRT_2, 1e-5);
        assert_almost_abs_eq(row[2], 8.0 - 6.0 / SQRT_2, 1e-5);
        Ok(())
    }

    #[test]
    fn rejects_small_bands() {
        let mut out = [0f32; 3 * 64];
        let bands = DistanceBands::from_array(&[[1.0, 0.0], [1.0, 1.0], [1.0, 1.0]]);
        assert_eq!(
            get_quant_weights(8, 8, &bands, &mut out),
            Err(Error::InvalidDistanceBand(1, 0.0))
        );
    }

    #[test]
    fn interpolation_clamps() {
        let array = [4.0, 2.0, 1.0];
        assert_eq!(interpolate_vec(0.0, &array), 4.0);
        assert_eq!(interpolate_vec(0.5, &array), 3.0);
        assert_eq!(interpolate_vec(1.5, &array), 1.5);
        assert_eq!(interpolate_vec(2.0, &array), 1.0);
        assert_eq!(interpolate_vec(7.0, &array), 1.0);
        assert_eq!(interpolate_vec(3.0, &[9.0]), 9.0);
    }
}
