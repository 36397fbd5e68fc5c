//! sRGB → CIE-Lab conversion and the skin-tone classifier built on it.

/// D65 reference white used to normalise XYZ before the Lab transform.
const WHITE_X: f64 = 0.95047;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.08883;

/// CIE ε: below this the cube root is replaced by a linear segment.
const LAB_EPSILON: f64 = 0.008856;
const LAB_KAPPA_SLOPE: f64 = 7.787;

/// Lightness window (inclusive) classified as skin.
const SKIN_L: (f64, f64) = (30.0, 90.0);
/// Green–red window (inclusive) classified as skin.
const SKIN_A: (f64, f64) = (8.0, 26.0);
/// Blue–yellow window (inclusive) classified as skin.
const SKIN_B: (f64, f64) = (5.0, 26.0);

/// A colour in CIE-Lab space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    /// Lightness, `0..=100`
    pub l: f64,
    /// Green (−) to red (+)
    pub a: f64,
    /// Blue (−) to yellow (+)
    pub b: f64,
}

impl Lab {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }
}

#[inline]
fn srgb_to_linear(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn lab_f(v: f64) -> f64 {
    if v > LAB_EPSILON {
        v.cbrt()
    } else {
        LAB_KAPPA_SLOPE * v + 16.0 / 116.0
    }
}

/// Converts an 8-bit sRGB colour to CIE-Lab (D65).
///
/// sRGB is linearised, projected to XYZ, normalised by the D65 white point
/// and mapped through the Lab companding function.
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> Lab {
    let (lr, lg, lb) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));

    let x = (lr * 0.4124 + lg * 0.3576 + lb * 0.1805) / WHITE_X;
    let y = (lr * 0.2126 + lg * 0.7152 + lb * 0.0722) / WHITE_Y;
    let z = (lr * 0.0193 + lg * 0.1192 + lb * 0.9505) / WHITE_Z;

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

#[inline]
fn within(value: f64, (low, high): (f64, f64)) -> bool {
    (low..=high).contains(&value)
}

/// Binary skin-tone classifier.
///
/// Returns `1` when `L`, `A` and `B` all fall inside their skin windows and
/// `0` otherwise. The mask is a hard threshold with no soft edge.
pub fn skin_mask(lab: Lab) -> u8 {
    u8::from(within(lab.l, SKIN_L) && within(lab.a, SKIN_A) && within(lab.b, SKIN_B))
}

/// Linear interpolation `a + (b - a) * t`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
