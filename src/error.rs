// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("Read out of bounds; size hint: {0}")]
    OutOfBounds(usize),
    #[error("Non-zero padding bits")]
    NonZeroPadding,
    #[error("Float is NaN or Inf")]
    FloatNaNOrInf,
    #[error("Value {0} does not fit in the coder, limit is {1}")]
    ValueTooLarge(u32, u32),
    #[error("Invalid raw quantization table")]
    InvalidRawQuantTable,
    #[error("Invalid raw quantization table size: {0}, expected {1}")]
    InvalidRawQuantTableSize(usize, usize),
    #[error("Raw quantization table value {0} is too large, limit is {max}", max = crate::quant_weights::MAX_RAW_QUANT_VALUE)]
    InvalidRawQuantValue(i32),
    #[error("Invalid raw quantization table denominator shift: {0}")]
    InvalidRawQuantShift(u32),
    #[error("Invalid distance band {0}: {1}")]
    InvalidDistanceBand(usize, f32),
    #[error("Invalid number of distance bands: {0}, limit is {max}", max = crate::quant_weights::MAX_DISTANCE_BANDS)]
    InvalidNumDistanceBands(usize),
    #[error("Invalid quantization table weight: {0}")]
    InvalidQuantizationTableWeight(f32),
    #[error("Invalid quant encoding mode {0}")]
    InvalidQuantEncodingMode(u8),
    #[error("Invalid quant encoding with mode {mode} and required size {required_size}")]
    InvalidQuantEncoding { mode: u8, required_size: usize },
    #[error("Invalid quant table copy: table {index} copies from table {from}")]
    InvalidCopySource { index: usize, from: usize },
    #[error("HF quantization factor is too small: {0}")]
    HfQuantFactorTooSmall(f32),
    #[error("LF quantization factor is too small: {0}")]
    LfQuantFactorTooSmall(f32),
    #[error("Wrong number of quant encodings: {0} given, {1} expected")]
    WrongNumberOfEncodings(usize, usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
