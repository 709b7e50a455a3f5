// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;

use crate::error::{Error, Result};

use super::{MAX_DISTANCE_BANDS, NUM_PREDEFINED_TABLES};

/// Per-channel anchor weights along the radial frequency axis, from DC
/// (first band) to the highest frequency of the block (last band).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceBands {
    params: [[f32; MAX_DISTANCE_BANDS]; 3],
    num_bands: usize,
}

impl DistanceBands {
    /// Absolute anchor weights, `N` per channel.
    pub const fn from_array<const N: usize>(values: &[[f32; N]; 3]) -> Self {
        assert!(N >= 1 && N <= MAX_DISTANCE_BANDS);
        let mut params = [[0.0; MAX_DISTANCE_BANDS]; 3];
        let mut c = 0;
        while c < 3 {
            let mut i = 0;
            while i < N {
                params[c][i] = values[c][i];
                i += 1;
            }
            c += 1;
        }
        Self {
            params,
            num_bands: N,
        }
    }

    /// Compact notation: the first value of each channel is an absolute weight,
    /// every following value `v` scales the previous anchor by `1 + v` if
    /// positive, and by `1 / (1 - v)` otherwise.
    pub fn from_relative<const N: usize>(values: &[[f32; N]; 3]) -> Self {
        let mut absolute = *values;
        for row in absolute.iter_mut() {
            for i in 1..N {
                row[i] = row[i - 1] * mult(row[i]);
            }
        }
        Self::from_array(&absolute)
    }

    /// Builds bands from runtime rows, which must all have the same length
    /// between 1 and [`MAX_DISTANCE_BANDS`].
    pub fn from_rows(rows: [&[f32]; 3]) -> Result<Self> {
        let num_bands = rows[0].len();
        if !(1..=MAX_DISTANCE_BANDS).contains(&num_bands) {
            return Err(Error::InvalidNumDistanceBands(num_bands));
        }
        let mut params = [[0.0; MAX_DISTANCE_BANDS]; 3];
        for (dst, src) in params.iter_mut().zip(rows) {
            if src.len() != num_bands {
                return Err(Error::InvalidNumDistanceBands(src.len()));
            }
            dst[..num_bands].copy_from_slice(src);
        }
        Ok(Self { params, num_bands })
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn channel(&self, c: usize) -> &[f32] {
        &self.params[c][..self.num_bands]
    }

    pub(super) fn channel_mut(&mut self, c: usize) -> &mut [f32] {
        &mut self.params[c][..self.num_bands]
    }

    /// Empty bands of the given size, filled in by the decoder.
    pub(super) fn zeroed(num_bands: usize) -> Self {
        debug_assert!((1..=MAX_DISTANCE_BANDS).contains(&num_bands));
        Self {
            params: [[0.0; MAX_DISTANCE_BANDS]; 3],
            num_bands,
        }
    }
}

pub(super) fn mult(v: f32) -> f32 {
    if v > 0f32 {
        1f32 + v
    } else {
        1f32 / (1f32 - v)
    }
}

/// Tag values as they appear in the bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum QuantMode {
    Library = 0,
    Identity = 1,
    Dct2 = 2,
    Dct4 = 3,
    Dct4x8 = 4,
    Afv = 5,
    Dct = 6,
    Raw = 7,
}

/// How the weights of one quant table are derived.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq)]
pub enum QuantEncoding {
    /// Predefined table, by index.
    Library(u8),
    // a.k.a. "Hornuss"
    Identity {
        xyb_weights: [[f32; 3]; 3],
    },
    Dct2 {
        xyb_weights: [[f32; 6]; 3],
    },
    Dct4 {
        params: DistanceBands,
        xyb_mul: [[f32; 2]; 3],
    },
    Dct4x8 {
        params: DistanceBands,
        xyb_mul: [f32; 3],
    },
    /// `weights[c][0..5]` are placed directly in the low-frequency corner, and
    /// `weights[c][5..9]` are distance bands for the rest of the 4x4 corner.
    Afv {
        params4x8: DistanceBands,
        params4x4: DistanceBands,
        weights: [[f32; 9]; 3],
    },
    Dct {
        params: DistanceBands,
    },
    /// Forward weight `qtable[i] / 2^den_shift`, channel-major.
    Raw {
        qtable: Vec<i32>,
        den_shift: u32,
    },
}

impl QuantEncoding {
    pub fn library(idx: u8) -> Self {
        assert!(
            (idx as usize) < NUM_PREDEFINED_TABLES,
            "library table {idx} does not exist"
        );
        Self::Library(idx)
    }

    pub fn raw_from_qtable(qtable: &[i32], den_shift: u32) -> Self {
        Self::Raw {
            qtable: qtable.to_vec(),
            den_shift,
        }
    }

    pub fn mode(&self) -> QuantMode {
        match self {
            Self::Library(_) => QuantMode::Library,
            Self::Identity { .. } => QuantMode::Identity,
            Self::Dct2 { .. } => QuantMode::Dct2,
            Self::Dct4 { .. } => QuantMode::Dct4,
            Self::Dct4x8 { .. } => QuantMode::Dct4x8,
            Self::Afv { .. } => QuantMode::Afv,
            Self::Dct { .. } => QuantMode::Dct,
            Self::Raw { .. } => QuantMode::Raw,
        }
    }

    /// Whether this encoding can describe a table covering `required_size`
    /// 8x8 blocks. The fixed-layout modes only exist for single blocks.
    pub fn fits(&self, required_size: usize) -> bool {
        match self.mode() {
            QuantMode::Identity
            | QuantMode::Dct2
            | QuantMode::Dct4
            | QuantMode::Dct4x8
            | QuantMode::Afv => required_size == 1,
            QuantMode::Library | QuantMode::Dct | QuantMode::Raw => true,
        }
    }
}
