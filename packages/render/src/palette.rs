//! Colours used by the raster charts.

use image::Rgb;

/// Fill for heatmap cells with no observations.
pub const MISSING: Rgb<u8> = Rgb([220, 220, 220]);

/// Bar colour for the feature importance chart.
pub const IMPORTANCE_BAR: Rgb<u8> = Rgb([31, 119, 180]);

const CATEGORICAL: [[u8; 3]; 10] = [
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
];

const YL_OR_RD: [[u8; 3]; 9] = [
    [255, 255, 204],
    [255, 237, 160],
    [254, 217, 118],
    [254, 178, 76],
    [253, 141, 60],
    [252, 78, 42],
    [227, 26, 28],
    [189, 0, 38],
    [128, 0, 38],
];

/// Colour for the `i`-th series; wraps after ten.
#[must_use]
pub const fn categorical(i: usize) -> Rgb<u8> {
    Rgb(CATEGORICAL[i % CATEGORICAL.len()])
}

/// Yellow-orange-red ramp; `t` is clamped to `[0, 1]`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn yl_or_rd(t: f64) -> Rgb<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (YL_OR_RD.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(YL_OR_RD.len() - 1);
    let frac = scaled - lo as f64;

    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let a = f64::from(YL_OR_RD[lo][c]);
        let b = f64::from(YL_OR_RD[hi][c]);
        *slot = (b - a).mul_add(frac, a).round() as u8;
    }
    Rgb(out)
}

/// Heatmap colour for a mean severity in `[1, 5]`.
#[must_use]
pub fn severity(mean: f64) -> Rgb<u8> {
    yl_or_rd((mean - 1.0) / 4.0)
}
