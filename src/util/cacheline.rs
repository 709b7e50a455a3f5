// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#![allow(unsafe_code)]

use std::fmt::Debug;

pub const CACHE_LINE_BYTE_SIZE: usize = 64;

const FLOATS_PER_CACHE_LINE: usize = CACHE_LINE_BYTE_SIZE / std::mem::size_of::<f32>();

#[derive(Clone, Copy)]
#[repr(C, align(64))]
struct CacheLine([f32; FLOATS_PER_CACHE_LINE]);

const _: () = assert!(std::mem::size_of::<CacheLine>() == CACHE_LINE_BYTE_SIZE);

impl Default for CacheLine {
    fn default() -> Self {
        CacheLine([0.0; FLOATS_PER_CACHE_LINE])
    }
}

/// Zero-initialized `f32` storage whose first element starts a cache line, which
/// is at least as strict as any SIMD load the consumers of the tables issue.
#[derive(Clone)]
pub struct AlignedF32Buffer {
    lines: Box<[CacheLine]>,
    len: usize,
}

impl AlignedF32Buffer {
    pub fn new(len: usize) -> Self {
        let num_lines = len.div_ceil(FLOATS_PER_CACHE_LINE);
        Self {
            lines: vec![CacheLine::default(); num_lines].into_boxed_slice(),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[f32] {
        // SAFETY: CacheLine is a repr(C) array of f32 of exactly CACHE_LINE_BYTE_SIZE bytes,
        // so the lines form a contiguous, initialized run of f32 with no padding, and
        // `len` never exceeds the number of floats in `lines`.
        unsafe { std::slice::from_raw_parts(self.lines.as_ptr().cast::<f32>(), self.len) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        // SAFETY: see `as_slice`; the mutable borrow of `self` guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.lines.as_mut_ptr().cast::<f32>(), self.len) }
    }
}

impl Debug for AlignedF32Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AlignedF32Buffer {{ len: {} }}", self.len)
    }
}
