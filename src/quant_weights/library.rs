// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::sync::OnceLock;

use crate::util::AlignedF32Buffer;

use super::{
    DequantMatrices, QuantTable,
    encoding::{DistanceBands, QuantEncoding, mult},
};

// Band values are written in the relative notation of
// `DistanceBands::from_relative`.

fn dct() -> QuantEncoding {
    QuantEncoding::Dct {
        params: DistanceBands::from_relative(&[
            [3150.0, 0.0, -0.4, -0.4, -0.4, -2.0],
            [560.0, 0.0, -0.3, -0.3, -0.3, -0.3],
            [512.0, -2.0, -1.0, 0.0, -1.0, -2.0],
        ]),
    }
}

fn id() -> QuantEncoding {
    QuantEncoding::Identity {
        xyb_weights: [
            [280.0, 3160.0, 3160.0],
            [60.0, 864.0, 864.0],
            [18.0, 200.0, 200.0],
        ],
    }
}

fn dct2x2() -> QuantEncoding {
    QuantEncoding::Dct2 {
        xyb_weights: [
            [3840.0, 2560.0, 1280.0, 640.0, 480.0, 300.0],
            [960.0, 640.0, 320.0, 180.0, 140.0, 120.0],
            [640.0, 320.0, 128.0, 64.0, 32.0, 16.0],
        ],
    }
}

fn dct4x4_params() -> DistanceBands {
    DistanceBands::from_relative(&[
        [2200.0, 0.0, 0.0, 0.0],
        [392.0, 0.0, 0.0, 0.0],
        [112.0, -0.25, -0.25, -0.5],
    ])
}

fn dct4x4() -> QuantEncoding {
    QuantEncoding::Dct4 {
        params: dct4x4_params(),
        xyb_mul: [[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]],
    }
}

#[allow(clippy::excessive_precision)]
fn dct16x16() -> QuantEncoding {
    QuantEncoding::Dct {
        params: DistanceBands::from_relative(&[
            [
                8996.8725711814115328,
                -1.3000777393353804,
                -0.49424529824571225,
                -0.439093774457103443,
                -0.6350101832695744,
                -0.90177264050827612,
                -1.6162099239887414,
            ],
            [
                3191.48366296844234752,
                -0.67424582104194355,
                -0.80745813428471001,
                -0.44925837484843441,
                -0.35865440981033403,
                -0.31322389111877305,
                -0.37615025315725483,
            ],
            [
                1157.50408145487200256,
                -2.0531423165804414,
                -1.4,
                -0.50687130033378396,
                -0.42708730624733904,
                -1.4856834539296244,
                -4.9209142884401604,
            ],
        ]),
    }
}

#[allow(clippy::excessive_precision)]
fn dct32x32() -> QuantEncoding {
    QuantEncoding::Dct {
        params: DistanceBands::from_relative(&[
            [
                15718.40830982518931456,
                -1.025,
                -0.98,
                -0.9012,
                -0.4,
                -0.48819395464,
                -0.421064,
                -0.27,
            ],
            [
                7305.7636810695983104,
                -0.8041958212306401,
                -0.7633036457487539,
                -0.55660379990111464,
                -0.49785304658857626,
                -0.43699592683512467,
                -0.40180866526242109,
                -0.27321683125358037,
            ],
            [
                3803.53173721215041536,
                -3.060733579805728,
                -2.0413270132490346,
                -2.0235650159727417,
                -0.5495389509954993,
                -0.4,
                -0.4,
                -0.3,
            ],
        ]),
    }
}

// dct16x8
fn dct8x16() -> QuantEncoding {
    QuantEncoding::Dct {
        params: DistanceBands::from_relative(&[
            [7240.7734393502, -0.7, -0.7, -0.2, -0.2, -0.2, -0.5],
            [1448.15468787004, -0.5, -0.5, -0.5, -0.2, -0.2, -0.2],
            [506.854140754517, -1.4, -0.2, -0.5, -0.5, -1.5, -3.6],
        ]),
    }
}

// dct32x8
#[allow(clippy::excessive_precision)]
fn dct8x32() -> QuantEncoding {
    QuantEncoding::Dct {
        params: DistanceBands::from_relative(&[
            [
                16283.2494710648897,
                -1.7812845336559429,
                -1.6309059012653515,
                -1.0382179034313539,
                -0.85,
                -0.7,
                -0.9,
                -1.2360638576849587,
            ],
            [
                5089.15750884921511936,
                -0.320049391452786891,
                -0.35362849922161446,
                -0.30340000000000003,
                -0.61,
                -0.5,
                -0.5,
                -0.6,
            ],
            [
                3397.77603275308720128,
                -0.321327362693153371,
                -0.34507619223117997,
                -0.70340000000000003,
                -0.9,
                -1.0,
                -1.0,
                -1.1754605576265209,
            ],
        ]),
    }
}

// dct32x16
#[allow(clippy::excessive_precision)]
fn dct16x32() -> QuantEncoding {
    QuantEncoding::Dct {
        params: DistanceBands::from_relative(&[
            [
                13844.97076442300573,
                -0.97113799999999995,
                -0.658,
                -0.42026,
                -0.22712,
                -0.2206,
                -0.226,
                -0.6,
            ],
            [
                4798.964084220744293,
                -0.61125308982767057,
                -0.83770786552491361,
                -0.79014862079498627,
                -0.2692727459704829,
                -0.38272769465388551,
                -0.22924222653091453,
                -0.20719098826199578,
            ],
            [
                1807.236946760964614,
                -1.2,
                -1.2,
                -0.7,
                -0.7,
                -0.7,
                -0.4,
                -0.5,
            ],
        ]),
    }
}

#[allow(clippy::excessive_precision)]
fn dct4x8_params() -> DistanceBands {
    DistanceBands::from_relative(&[
        [
            2198.050556016380522,
            -0.96269623020744692,
            -0.76194253026666783,
            -0.6551140670773547,
        ],
        [
            764.3655248643528689,
            -0.92630200888366945,
            -0.9675229603596517,
            -0.27845290869168118,
        ],
        [
            527.107573587542228,
            -1.4594385811273854,
            -1.450082094097871593,
            -1.5843722511996204,
        ],
    ])
}

// dct8x4
fn dct4x8() -> QuantEncoding {
    QuantEncoding::Dct4x8 {
        params: dct4x8_params(),
        xyb_mul: [1.0, 1.0, 1.0],
    }
}

fn afv0() -> QuantEncoding {
    let mut weights = [
        [
            3072.0, 3072.0, // 4x4/4x8 DC tendency.
            256.0, 256.0, 256.0, // AFV corner.
            414.0, 0.0, 0.0, 0.0, // AFV high freqs.
        ],
        [
            1024.0, 1024.0, // 4x4/4x8 DC tendency.
            50.0, 50.0, 50.0, // AFV corner.
            58.0, 0.0, 0.0, 0.0, // AFV high freqs.
        ],
        [
            384.0, 384.0, // 4x4/4x8 DC tendency.
            12.0, 12.0, 12.0, // AFV corner.
            22.0, -0.25, -0.25, -0.25, // AFV high freqs.
        ],
    ];
    // The high frequency bands are relative as well.
    for row in weights.iter_mut() {
        for i in 6..9 {
            row[i] = row[i - 1] * mult(row[i]);
        }
    }
    QuantEncoding::Afv {
        params4x8: dct4x8_params(),
        params4x4: dct4x4_params(),
        weights,
    }
}

pub(super) fn library() -> &'static [QuantEncoding; QuantTable::CARDINALITY] {
    static QUANTS: OnceLock<[QuantEncoding; QuantTable::CARDINALITY]> = OnceLock::new();
    QUANTS.get_or_init(|| {
        [
            dct(),
            id(),
            dct2x2(),
            dct4x4(),
            dct16x16(),
            dct32x32(),
            dct8x16(),
            dct8x32(),
            dct16x32(),
            dct4x8(),
            afv0(),
        ]
    })
}

/// The arena of a default-constructed `DequantMatrices`, built once.
pub(super) fn library_tables() -> &'static AlignedF32Buffer {
    static TABLES: OnceLock<AlignedF32Buffer> = OnceLock::new();
    TABLES.get_or_init(|| {
        DequantMatrices::compute(library()).expect("library table computation should not fail")
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::test::assert_almost_abs_eq;
    use test_log::test;

    #[test]
    fn library_fits_its_tables() {
        for (encoding, table) in library().iter().zip(QuantTable::VALUES) {
            assert!(encoding.fits(table.required_size()), "{table:?}");
            assert!(!matches!(encoding, QuantEncoding::Library(_)));
        }
    }

    #[test]
    fn afv_bands_are_expanded() {
        let QuantEncoding::Afv { weights, .. } = afv0() else {
            unreachable!()
        };
        assert_eq!(weights[0][5..], [414.0; 4]);
        assert_eq!(weights[2][5], 22.0);
        assert_almost_abs_eq(weights[2][6], 17.6, 1e-4);
        assert_almost_abs_eq(weights[2][8], 11.264, 1e-4);
    }

    #[test]
    fn dct_table_endpoints() {
        let table = library_tables().as_slice();
        // Low and high end of the plain 8x8 table, channel 0: the first and
        // the last anchor.
        assert_eq!(table[0], 3150.0);
        let last = 3150.0f32 * mult(0.0) * mult(-0.4) * mult(-0.4) * mult(-0.4) * mult(-2.0);
        assert_almost_abs_eq(table[63], last, 1e-2);
    }
}
