// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_traits::FromPrimitive;

use crate::{
    bit_reader::BitReader,
    bit_writer::BitWriter,
    encodings::{FieldCoder, U32, U32Coder},
    error::{Error, Result},
    util::tracing_wrappers::*,
};

use super::{
    ALMOST_ZERO, CEIL_LOG2_NUM_PREDEFINED_TABLES, DC_QUANT, DequantMatrices, INV_DC_QUANT,
    LOG2_MAX_DISTANCE_BANDS, LOG2_NUM_QUANT_MODES, MAX_DISTANCE_BANDS, MAX_RAW_QUANT_VALUE,
    NUM_PREDEFINED_TABLES, QuantTable,
    encoding::{DistanceBands, QuantEncoding, QuantMode},
};

const LOG2_MAX_COPY_SOURCE: usize = 4;

const COPY_SOURCE_CODER: U32Coder = U32Coder::Direct(U32::Bits(LOG2_MAX_COPY_SOURCE));

/// Direct weights and distance bands are stored divided by this.
const WEIGHT_SCALE: f32 = 64.0;

/// DC quantizers are stored multiplied by this.
const DC_SCALE: f32 = 128.0;

const RAW_SHIFT_CODER: U32Coder = U32Coder::Select(
    U32::Val(0),
    U32::BitsOffset { n: 2, off: 1 },
    U32::BitsOffset { n: 3, off: 5 },
    U32::BitsOffset { n: 5, off: 13 },
);

const RAW_VALUE_CODER: U32Coder = U32Coder::Select(
    U32::BitsOffset { n: 4, off: 1 },
    U32::BitsOffset { n: 8, off: 17 },
    U32::BitsOffset { n: 12, off: 273 },
    U32::BitsOffset { n: 20, off: 4369 },
);

const _: () = assert!(QuantTable::CARDINALITY <= 1 << LOG2_MAX_COPY_SOURCE);

fn write_weight(weight: f32, bw: &mut BitWriter) -> Result<()> {
    (weight / WEIGHT_SCALE).write(&(), bw)
}

fn read_weight(br: &mut BitReader) -> Result<f32> {
    Ok(f32::read(&(), br)? * WEIGHT_SCALE)
}

/// Reads a weight or multiplier that is later divided by.
fn read_factor(br: &mut BitReader, scale: f32) -> Result<f32> {
    let factor = f32::read(&(), br)? * scale;
    if factor.abs() < ALMOST_ZERO {
        return Err(Error::HfQuantFactorTooSmall(factor));
    }
    Ok(factor)
}

impl FieldCoder<()> for DistanceBands {
    fn read(_: &(), br: &mut BitReader) -> Result<Self> {
        let mut num_bands = br.read(LOG2_MAX_DISTANCE_BANDS)? as usize + 1;
        if num_bands == 1 << LOG2_MAX_DISTANCE_BANDS {
            num_bands += br.read(1)? as usize;
        }
        let mut bands = DistanceBands::zeroed(num_bands);
        for c in 0..3 {
            for band in bands.channel_mut(c) {
                *band = read_weight(br)?;
            }
        }
        Ok(bands)
    }

    fn write(&self, _: &(), bw: &mut BitWriter) -> Result<()> {
        let num_bands = self.num_bands();
        if !(1..=MAX_DISTANCE_BANDS).contains(&num_bands) {
            return Err(Error::InvalidNumDistanceBands(num_bands));
        }
        let max_short = 1 << LOG2_MAX_DISTANCE_BANDS;
        bw.write(LOG2_MAX_DISTANCE_BANDS, (num_bands.min(max_short) - 1) as u64);
        if num_bands >= max_short {
            bw.write(1, (num_bands - max_short) as u64);
        }
        for c in 0..3 {
            for &band in self.channel(c) {
                write_weight(band, bw)?;
            }
        }
        Ok(())
    }
}

fn write_encoding(
    encodings: &[QuantEncoding],
    index: usize,
    bw: &mut BitWriter,
) -> Result<()> {
    let encoding = &encodings[index];
    let quant_table = QuantTable::VALUES[index];
    let required_size = quant_table.required_size();
    if !encoding.fits(required_size) {
        return Err(Error::InvalidQuantEncoding {
            mode: encoding.mode() as u8,
            required_size,
        });
    }
    if let QuantEncoding::Raw { qtable, .. } = encoding {
        let num = 3 * quant_table.num_coefficients();
        if qtable.len() != num {
            return Err(Error::InvalidRawQuantTableSize(qtable.len(), num));
        }
    }
    let copy_source = match encoding {
        QuantEncoding::Library(_) => None,
        _ => encodings[..index].iter().position(|e| e == encoding),
    };
    if let Some(from) = copy_source {
        trace!(index, from, "copying quant encoding");
        bw.write(LOG2_NUM_QUANT_MODES, QuantMode::Library as u64);
        true.write(&(), bw)?;
        (from as u32).write(&COPY_SOURCE_CODER, bw)?;
        return Ok(());
    }
    bw.write(LOG2_NUM_QUANT_MODES, encoding.mode() as u64);
    match encoding {
        QuantEncoding::Library(idx) => {
            assert!(
                (*idx as usize) < NUM_PREDEFINED_TABLES,
                "library table {idx} does not exist"
            );
            false.write(&(), bw)?;
            bw.write(CEIL_LOG2_NUM_PREDEFINED_TABLES, *idx as u64);
        }
        QuantEncoding::Identity { xyb_weights } => {
            for &weight in xyb_weights.as_flattened() {
                write_weight(weight, bw)?;
            }
        }
        QuantEncoding::Dct2 { xyb_weights } => {
            for &weight in xyb_weights.as_flattened() {
                write_weight(weight, bw)?;
            }
        }
        QuantEncoding::Dct4 { params, xyb_mul } => {
            for mul in xyb_mul.as_flattened() {
                mul.write(&(), bw)?;
            }
            params.write(&(), bw)?;
        }
        QuantEncoding::Dct4x8 { params, xyb_mul } => {
            for mul in xyb_mul {
                mul.write(&(), bw)?;
            }
            params.write(&(), bw)?;
        }
        QuantEncoding::Afv {
            params4x8,
            params4x4,
            weights,
        } => {
            for &weight in weights.as_flattened() {
                write_weight(weight, bw)?;
            }
            params4x8.write(&(), bw)?;
            params4x4.write(&(), bw)?;
        }
        QuantEncoding::Dct { params } => {
            params.write(&(), bw)?;
        }
        QuantEncoding::Raw { qtable, den_shift } => {
            if *den_shift >= 32 {
                return Err(Error::InvalidRawQuantShift(*den_shift));
            }
            den_shift.write(&RAW_SHIFT_CODER, bw)?;
            for &q in qtable {
                if q <= 0 {
                    return Err(Error::InvalidRawQuantTable);
                }
                if q > MAX_RAW_QUANT_VALUE {
                    return Err(Error::InvalidRawQuantValue(q));
                }
                (q as u32).write(&RAW_VALUE_CODER, bw)?;
            }
        }
    }
    Ok(())
}

fn read_encoding(
    decoded: &[QuantEncoding],
    br: &mut BitReader,
) -> Result<QuantEncoding> {
    let index = decoded.len();
    let quant_table = QuantTable::VALUES[index];
    let required_size = quant_table.required_size();
    let raw_mode = br.read(LOG2_NUM_QUANT_MODES)? as u8;
    let mode = QuantMode::from_u8(raw_mode).ok_or(Error::InvalidQuantEncodingMode(raw_mode))?;
    debug!(?quant_table, ?mode, "reading quant encoding");
    let encoding = match mode {
        QuantMode::Library => {
            if bool::read(&(), br)? {
                let from = u32::read(&COPY_SOURCE_CODER, br)? as usize;
                let source = decoded
                    .get(from)
                    .filter(|e| !matches!(e, QuantEncoding::Library(_)))
                    .ok_or(Error::InvalidCopySource { index, from })?;
                source.clone()
            } else {
                let idx = br.read(CEIL_LOG2_NUM_PREDEFINED_TABLES)? as u8;
                if idx as usize >= NUM_PREDEFINED_TABLES {
                    return Err(Error::InvalidQuantEncoding {
                        mode: raw_mode,
                        required_size,
                    });
                }
                QuantEncoding::Library(idx)
            }
        }
        QuantMode::Identity => {
            let mut xyb_weights = [[0.0; 3]; 3];
            for weight in xyb_weights.as_flattened_mut() {
                *weight = read_factor(br, WEIGHT_SCALE)?;
            }
            QuantEncoding::Identity { xyb_weights }
        }
        QuantMode::Dct2 => {
            let mut xyb_weights = [[0.0; 6]; 3];
            for weight in xyb_weights.as_flattened_mut() {
                *weight = read_factor(br, WEIGHT_SCALE)?;
            }
            QuantEncoding::Dct2 { xyb_weights }
        }
        QuantMode::Dct4 => {
            let mut xyb_mul = [[0.0; 2]; 3];
            for mul in xyb_mul.as_flattened_mut() {
                *mul = read_factor(br, 1.0)?;
            }
            let params = DistanceBands::read(&(), br)?;
            QuantEncoding::Dct4 { params, xyb_mul }
        }
        QuantMode::Dct4x8 => {
            let mut xyb_mul = [0.0; 3];
            for mul in xyb_mul.iter_mut() {
                *mul = read_factor(br, 1.0)?;
            }
            let params = DistanceBands::read(&(), br)?;
            QuantEncoding::Dct4x8 { params, xyb_mul }
        }
        QuantMode::Afv => {
            let mut weights = [[0.0; 9]; 3];
            for weight in weights.as_flattened_mut() {
                *weight = read_weight(br)?;
            }
            let params4x8 = DistanceBands::read(&(), br)?;
            let params4x4 = DistanceBands::read(&(), br)?;
            QuantEncoding::Afv {
                params4x8,
                params4x4,
                weights,
            }
        }
        QuantMode::Dct => QuantEncoding::Dct {
            params: DistanceBands::read(&(), br)?,
        },
        QuantMode::Raw => {
            let den_shift = u32::read(&RAW_SHIFT_CODER, br)?;
            if den_shift >= 32 {
                return Err(Error::InvalidRawQuantShift(den_shift));
            }
            let num = 3 * quant_table.num_coefficients();
            let mut qtable = Vec::with_capacity(num);
            for _ in 0..num {
                // At least 1 and at most 2^20 + 4368, so always a valid i32.
                qtable.push(u32::read(&RAW_VALUE_CODER, br)? as i32);
            }
            QuantEncoding::Raw { qtable, den_shift }
        }
    };
    if !encoding.fits(required_size) {
        return Err(Error::InvalidQuantEncoding {
            mode: raw_mode,
            required_size,
        });
    }
    Ok(encoding)
}

/// Writes a quant table set: one bit if every table uses its library default,
/// otherwise one encoding per table.
pub(super) fn write_encodings(encodings: &[QuantEncoding], bw: &mut BitWriter) -> Result<()> {
    debug_assert_eq!(encodings.len(), QuantTable::CARDINALITY);
    let all_default = encodings.iter().all(|e| *e == QuantEncoding::Library(0));
    all_default.write(&(), bw)?;
    if !all_default {
        for index in 0..encodings.len() {
            write_encoding(encodings, index, bw)?;
        }
    }
    Ok(())
}

pub(super) fn read_encodings(br: &mut BitReader) -> Result<Vec<QuantEncoding>> {
    let all_default = bool::read(&(), br)?;
    debug!(all_default, "reading quant tables");
    if all_default {
        return Ok(vec![QuantEncoding::Library(0); QuantTable::CARDINALITY]);
    }
    let mut encodings = Vec::with_capacity(QuantTable::CARDINALITY);
    for _ in 0..QuantTable::CARDINALITY {
        let encoding = read_encoding(&encodings, br)?;
        encodings.push(encoding);
    }
    Ok(encodings)
}

pub(super) fn write_dc(dc_quant: &[f32; 3], bw: &mut BitWriter) -> Result<()> {
    let all_default = *dc_quant == DC_QUANT;
    all_default.write(&(), bw)?;
    if !all_default {
        for &quant in dc_quant {
            (quant * DC_SCALE).write(&(), bw)?;
        }
    }
    Ok(())
}

/// Returns the DC quantizers and their inverses.
pub(super) fn read_dc(br: &mut BitReader) -> Result<([f32; 3], [f32; 3])> {
    if bool::read(&(), br)? {
        return Ok((DC_QUANT, INV_DC_QUANT));
    }
    let mut dc_quant = [0.0f32; 3];
    for quant in dc_quant.iter_mut() {
        *quant = f32::read(&(), br)? / DC_SCALE;
        if !(*quant >= ALMOST_ZERO) {
            return Err(Error::LfQuantFactorTooSmall(*quant));
        }
    }
    Ok((dc_quant, dc_quant.map(f32::recip)))
}

impl DequantMatrices {
    pub fn encode(&self, bw: &mut BitWriter) -> Result<()> {
        write_encodings(&self.encodings, bw)
    }

    /// Replaces the encodings and tables with a quant table set read from `br`.
    /// On error `self` is left as it was.
    pub fn decode(&mut self, br: &mut BitReader) -> Result<()> {
        let encodings = read_encodings(br)?;
        let table = Self::compute(&encodings)?;
        self.table = table;
        self.encodings = encodings;
        Ok(())
    }

    pub fn encode_dc(&self, bw: &mut BitWriter) -> Result<()> {
        write_dc(&self.dc_quant, bw)
    }

    pub fn decode_dc(&mut self, br: &mut BitReader) -> Result<()> {
        let (dc_quant, inv_dc_quant) = read_dc(br)?;
        self.dc_quant = dc_quant;
        self.inv_dc_quant = inv_dc_quant;
        Ok(())
    }
}
