// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use num_traits::AsPrimitive;

fn rel_error_gt<T: AsPrimitive<f64>>(left: T, right: T, max_rel_error: T) -> bool {
    let left_f64: f64 = left.as_();
    let right_f64: f64 = right.as_();
    let error = (left_f64 - right_f64).abs();
    matches!(
        (2.0 * error / (left_f64.abs() + right_f64.abs() + 1e-16))
            .partial_cmp(&max_rel_error.as_()),
        Some(std::cmp::Ordering::Greater) | None
    )
}

fn abs_error_gt<T: AsPrimitive<f64>>(left: T, right: T, max_abs_error: T) -> bool {
    let left_f64: f64 = left.as_();
    let right_f64: f64 = right.as_();
    matches!(
        (left_f64 - right_f64)
            .abs()
            .partial_cmp(&max_abs_error.as_()),
        Some(std::cmp::Ordering::Greater) | None
    )
}

pub fn assert_almost_abs_eq<T: AsPrimitive<f64> + Debug + Copy>(
    left: T,
    right: T,
    max_abs_error: T,
) {
    if abs_error_gt(left, right, max_abs_error) {
        panic!(
            "assertion failed: `(left ≈ right)`\n  left: `{left:?}`,\n right: `{right:?}`,\n max_abs_error: `{max_abs_error:?}`"
        );
    }
}

pub fn assert_almost_rel_eq<T: AsPrimitive<f64> + Debug + Copy>(
    left: T,
    right: T,
    max_rel_error: T,
) {
    if rel_error_gt(left, right, max_rel_error) {
        panic!(
            "assertion failed: `(left ≈ right)`\n  left: `{left:?}`,\n right: `{right:?}`,\n max_rel_error: `{max_rel_error:?}`"
        );
    }
}

/// Element-wise bit equality, reporting the first differing index.
pub fn assert_all_bit_eq(left: &[f32], right: &[f32]) {
    assert_eq!(left.len(), right.len(), "length mismatch");
    if let Some(idx) = left
        .iter()
        .zip(right)
        .position(|(l, r)| l.to_bits() != r.to_bits())
    {
        panic!(
            "assertion failed: `(left == right)` at index {idx}\n left[{idx}]: `{:?}`,\n right[{idx}]: `{:?}`",
            left[idx], right[idx]
        );
    }
}
