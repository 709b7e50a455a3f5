// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#![allow(unused_imports)]

#[cfg(feature = "tracing")]
mod private {
    pub use tracing::{debug, trace};
}

#[cfg(not(feature = "tracing"))]
mod private {
    macro_rules! fake_log {
        ($($_: tt)*) => {};
    }
    pub(crate) use fake_log as debug;
    pub(crate) use fake_log as trace;
}

pub use private::*;
