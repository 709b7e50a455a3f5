// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#![deny(unsafe_code)]
pub mod ac_strategy;
pub mod bit_reader;
pub mod bit_writer;
pub mod encodings;
pub mod error;
pub mod quant_weights;
pub mod util;

pub const BLOCK_DIM: usize = 8;
pub const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;

pub use ac_strategy::AcStrategyType;
pub use quant_weights::{
    DC_QUANT, DequantMatrices, DistanceBands, INV_DC_QUANT, QuantEncoding, QuantMode, QuantTable,
};
