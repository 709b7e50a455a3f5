// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Quantization weight tables: how they are described ([`QuantEncoding`]),
//! built, transported in the bitstream, and looked up per transform kind.

mod codec;
mod compute;
mod encoding;
mod interpolate;
mod library;

pub use encoding::{DistanceBands, QuantEncoding, QuantMode};
pub use interpolate::get_quant_weights;

use crate::{
    BLOCK_SIZE,
    ac_strategy::AcStrategyType,
    bit_reader::BitReader,
    bit_writer::BitWriter,
    error::{Error, Result},
    util::{AlignedF32Buffer, tracing_wrappers::*},
};

pub const INV_DC_QUANT: [f32; 3] = [4096.0, 512.0, 256.0];

pub const DC_QUANT: [f32; 3] = [
    1.0 / INV_DC_QUANT[0],
    1.0 / INV_DC_QUANT[1],
    1.0 / INV_DC_QUANT[2],
];

pub const NUM_PREDEFINED_TABLES: usize = 1;
pub const CEIL_LOG2_NUM_PREDEFINED_TABLES: usize = 0;
pub const LOG2_NUM_QUANT_MODES: usize = 3;
pub const LOG2_MAX_DISTANCE_BANDS: usize = 4;
pub const MAX_DISTANCE_BANDS: usize = 1 + (1 << LOG2_MAX_DISTANCE_BANDS);

/// Largest entry of a RAW table that the bitstream can carry.
pub const MAX_RAW_QUANT_VALUE: i32 = (1 << 20) + 4368;

const ALMOST_ZERO: f32 = 1e-8;

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantTable {
    // Update QuantTable::VALUES when changing this!
    DCT,
    IDENTITY,
    DCT2X2,
    DCT4X4,
    DCT16X16,
    DCT32X32,
    // DCT16X8
    DCT8X16,
    // DCT32X8
    DCT8X32,
    // DCT32X16
    DCT16X32,
    // DCT8X4
    DCT4X8,
    // AFV1
    // AFV2
    // AFV3
    AFV0,
}

impl QuantTable {
    pub const CARDINALITY: usize = Self::VALUES.len();
    pub const VALUES: [QuantTable; 11] = [
        QuantTable::DCT,
        QuantTable::IDENTITY,
        QuantTable::DCT2X2,
        QuantTable::DCT4X4,
        QuantTable::DCT16X16,
        QuantTable::DCT32X32,
        QuantTable::DCT8X16,
        QuantTable::DCT8X32,
        QuantTable::DCT16X32,
        QuantTable::DCT4X8,
        QuantTable::AFV0,
    ];

    pub fn from_usize(idx: usize) -> Option<QuantTable> {
        QuantTable::VALUES.get(idx).copied()
    }

    pub const fn for_strategy(strategy: AcStrategyType) -> QuantTable {
        match strategy {
            AcStrategyType::DCT => QuantTable::DCT,
            AcStrategyType::IDENTITY => QuantTable::IDENTITY,
            AcStrategyType::DCT2X2 => QuantTable::DCT2X2,
            AcStrategyType::DCT4X4 => QuantTable::DCT4X4,
            AcStrategyType::DCT16X16 => QuantTable::DCT16X16,
            AcStrategyType::DCT32X32 => QuantTable::DCT32X32,
            AcStrategyType::DCT16X8 | AcStrategyType::DCT8X16 => QuantTable::DCT8X16,
            AcStrategyType::DCT32X8 | AcStrategyType::DCT8X32 => QuantTable::DCT8X32,
            AcStrategyType::DCT32X16 | AcStrategyType::DCT16X32 => QuantTable::DCT16X32,
            AcStrategyType::DCT4X8 | AcStrategyType::DCT8X4 => QuantTable::DCT4X8,
            AcStrategyType::AFV0
            | AcStrategyType::AFV1
            | AcStrategyType::AFV2
            | AcStrategyType::AFV3 => QuantTable::AFV0,
        }
    }

    /// Rows of the weight grid, in 8x8 blocks.
    pub const fn required_size_x(self) -> usize {
        DequantMatrices::REQUIRED_SIZE_X[self as usize]
    }

    /// Columns of the weight grid, in 8x8 blocks.
    pub const fn required_size_y(self) -> usize {
        DequantMatrices::REQUIRED_SIZE_Y[self as usize]
    }

    /// Number of 8x8 blocks covered by the table.
    pub const fn required_size(self) -> usize {
        self.required_size_x() * self.required_size_y()
    }

    /// Coefficients per channel.
    pub const fn num_coefficients(self) -> usize {
        self.required_size() * BLOCK_SIZE
    }
}

/// Start of each `(table, channel)` in the forward half of the arena; the
/// inverse half uses the same offsets shifted by `TOTAL_TABLE_SIZE`.
const QUANT_TABLE_OFFSETS: [usize; QuantTable::CARDINALITY * 3] = {
    let mut offsets = [0; QuantTable::CARDINALITY * 3];
    let mut pos = 0;
    let mut i = 0;
    while i < QuantTable::CARDINALITY {
        let num = QuantTable::VALUES[i].num_coefficients();
        let mut c = 0;
        while c < 3 {
            offsets[3 * i + c] = pos + c * num;
            c += 1;
        }
        pos += 3 * num;
        i += 1;
    }
    assert!(pos == DequantMatrices::TOTAL_TABLE_SIZE);
    offsets
};

const STRATEGY_OFFSETS: [usize; AcStrategyType::CARDINALITY * 3] = {
    let mut offsets = [0; AcStrategyType::CARDINALITY * 3];
    let mut i = 0;
    while i < AcStrategyType::CARDINALITY {
        let table = QuantTable::for_strategy(AcStrategyType::VALUES[i]) as usize;
        let mut c = 0;
        while c < 3 {
            offsets[3 * i + c] = QUANT_TABLE_OFFSETS[3 * table + c];
            c += 1;
        }
        i += 1;
    }
    offsets
};

/// Forward and inverse weights of every quant table, their encodings, and the
/// DC quantizers.
#[derive(Clone, Debug)]
pub struct DequantMatrices {
    /// `TOTAL_TABLE_SIZE` forward weights followed by as many inverse weights.
    table: AlignedF32Buffer,
    table_offsets: [usize; AcStrategyType::CARDINALITY * 3],
    dc_quant: [f32; 3],
    inv_dc_quant: [f32; 3],
    encodings: Vec<QuantEncoding>,
}

impl Default for DequantMatrices {
    fn default() -> Self {
        Self::new()
    }
}

impl DequantMatrices {
    pub const REQUIRED_SIZE_X: [usize; QuantTable::CARDINALITY] = [1, 1, 1, 1, 2, 4, 1, 1, 2, 1, 1];

    pub const REQUIRED_SIZE_Y: [usize; QuantTable::CARDINALITY] = [1, 1, 1, 1, 2, 4, 2, 4, 4, 1, 1];

    pub const SUM_REQUIRED_X_Y: usize = 40;

    pub const TOTAL_TABLE_SIZE: usize = Self::SUM_REQUIRED_X_Y * BLOCK_SIZE * 3;

    /// All tables set to their library defaults.
    pub fn new() -> Self {
        Self {
            table: library::library_tables().clone(),
            table_offsets: STRATEGY_OFFSETS,
            dc_quant: DC_QUANT,
            inv_dc_quant: INV_DC_QUANT,
            encodings: vec![QuantEncoding::Library(0); QuantTable::CARDINALITY],
        }
    }

    /// Reads a quant table set and the DC quantizers, in that order.
    pub fn from_bitstream(br: &mut BitReader) -> Result<Self> {
        let mut matrices = Self::new();
        matrices.decode(br)?;
        matrices.decode_dc(br)?;
        Ok(matrices)
    }

    /// The predefined encodings, one per quant table.
    pub fn library() -> &'static [QuantEncoding; QuantTable::CARDINALITY] {
        library::library()
    }

    #[inline]
    pub fn matrix_offset(&self, quant_kind: AcStrategyType, c: usize) -> usize {
        self.table_offsets[quant_kind as usize * 3 + c]
    }

    /// Forward weights of `quant_kind` for channel `c`, cache-line aligned.
    #[inline]
    pub fn matrix(&self, quant_kind: AcStrategyType, c: usize) -> &[f32] {
        let start = self.matrix_offset(quant_kind, c);
        let num = QuantTable::for_strategy(quant_kind).num_coefficients();
        &self.table.as_slice()[start..start + num]
    }

    /// Reciprocals of [`Self::matrix`].
    #[inline]
    pub fn inv_matrix(&self, quant_kind: AcStrategyType, c: usize) -> &[f32] {
        let start = Self::TOTAL_TABLE_SIZE + self.matrix_offset(quant_kind, c);
        let num = QuantTable::for_strategy(quant_kind).num_coefficients();
        &self.table.as_slice()[start..start + num]
    }

    #[inline]
    pub fn dc_quant(&self, c: usize) -> f32 {
        self.dc_quant[c]
    }

    #[inline]
    pub fn inv_dc_quant(&self, c: usize) -> f32 {
        self.inv_dc_quant[c]
    }

    pub fn dc_quants(&self) -> &[f32; 3] {
        &self.dc_quant
    }

    pub fn inv_dc_quants(&self) -> &[f32; 3] {
        &self.inv_dc_quant
    }

    /// Number of forward weights across all tables and channels.
    pub fn size(&self) -> usize {
        Self::TOTAL_TABLE_SIZE
    }

    pub fn encodings(&self) -> &[QuantEncoding] {
        &self.encodings
    }

    /// Installs one encoding per quant table. The encodings go through the
    /// bitstream first and the tables are built from what was read back, so an
    /// encoder ends up with exactly the tables a decoder will compute. On error
    /// nothing changes.
    pub fn set_custom(&mut self, encodings: &[QuantEncoding]) -> Result<()> {
        if encodings.len() != QuantTable::CARDINALITY {
            return Err(Error::WrongNumberOfEncodings(
                encodings.len(),
                QuantTable::CARDINALITY,
            ));
        }
        let mut bw = BitWriter::new();
        codec::write_encodings(encodings, &mut bw)?;
        bw.zero_pad_to_byte();
        trace!(bits = bw.bits_written(), "encoded custom quant tables");
        let bytes = bw.finish();
        let mut br = BitReader::new(&bytes);
        let decoded = codec::read_encodings(&mut br)?;
        br.close()?;
        let table = Self::compute(&decoded)?;
        assert_eq!(decoded, encodings, "quant encodings changed in the bitstream");
        debug!("installed custom quant tables");
        self.table = table;
        self.encodings = decoded;
        Ok(())
    }

    /// Sets the DC quantizers from their inverses: higher values mean finer
    /// quantization. The stored values are the ones a decoder reads back.
    pub fn set_custom_dc(&mut self, dc: &[f32; 3]) -> Result<()> {
        let dc_quant = dc.map(f32::recip);
        let mut bw = BitWriter::new();
        codec::write_dc(&dc_quant, &mut bw)?;
        bw.zero_pad_to_byte();
        let bytes = bw.finish();
        let mut br = BitReader::new(&bytes);
        let (dc_quant, inv_dc_quant) = codec::read_dc(&mut br)?;
        br.close()?;
        debug!(?dc_quant, "installed custom DC quantizers");
        self.dc_quant = dc_quant;
        self.inv_dc_quant = inv_dc_quant;
        Ok(())
    }
}
