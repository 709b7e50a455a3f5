// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#[cfg(test)]
pub mod test;

mod cacheline;
mod float16;
pub mod tracing_wrappers;

pub use cacheline::*;
pub use float16::f16;
