//! The base colour transform: brightness, contrast, saturate and a second
//! brightness stage for exposure, composed in that order with the semantics
//! of the CSS filter functions of the same names.

use image::Rgba;

use crate::enhance::params::EnhancementParams;
use crate::error::KernelError;
use crate::kernels::{for_each_row_mut, CHANNELS};
use crate::utils::{clamp_to_byte, clamp_unit, validate_non_empty_image};
use crate::Image;

/// Luminance weights of the saturate matrix.
const LUMA_R: f32 = 0.213;
const LUMA_G: f32 = 0.715;
const LUMA_B: f32 = 0.072;

/// Combined brightness × contrast × saturation × exposure transform.
///
/// Each stage works on channels normalized to `[0, 1]` and clamps before the
/// next stage reads them. Brightness and exposure compose multiplicatively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    brightness: f32,
    contrast: f32,
    exposure: f32,
    saturate: [[f32; 3]; 3],
    identity: bool,
}

impl ColorTransform {
    pub fn new(params: &EnhancementParams) -> Self {
        let s = params.saturation / 100.0;
        let saturate = [
            [
                LUMA_R + (1.0 - LUMA_R) * s,
                LUMA_G - LUMA_G * s,
                LUMA_B - LUMA_B * s,
            ],
            [
                LUMA_R - LUMA_R * s,
                LUMA_G + (1.0 - LUMA_G) * s,
                LUMA_B - LUMA_B * s,
            ],
            [
                LUMA_R - LUMA_R * s,
                LUMA_G - LUMA_G * s,
                LUMA_B + (1.0 - LUMA_B) * s,
            ],
        ];

        Self {
            brightness: params.brightness / 100.0,
            contrast: params.contrast / 100.0,
            exposure: params.exposure / 100.0,
            saturate,
            identity: params.brightness == 100.0
                && params.contrast == 100.0
                && params.saturation == 100.0
                && params.exposure == 100.0,
        }
    }

    /// Whether the transform leaves every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Transforms one RGB triple.
    pub fn apply(&self, rgb: [u8; 3]) -> [u8; 3] {
        if self.identity {
            return rgb;
        }

        let mut c = rgb.map(|v| clamp_unit(f32::from(v) / 255.0 * self.brightness));
        c = c.map(|v| clamp_unit((v - 0.5) * self.contrast + 0.5));

        let m = &self.saturate;
        c = [0, 1, 2].map(|row| clamp_unit(m[row][0] * c[0] + m[row][1] * c[1] + m[row][2] * c[2]));

        c.map(|v| clamp_to_byte(clamp_unit(v * self.exposure) * 255.0))
    }
}

/// Trait applying the base colour transform to a whole image
pub trait ColorFilter {
    /// Output image type
    type Output;

    /// Applies the transform to every pixel; alpha passes through.
    ///
    /// # Errors
    ///
    /// * `KernelError::EmptyImage` - When the image has a zero dimension
    fn color_filter(&self, transform: &ColorTransform) -> Result<Self::Output, KernelError>;
}

impl ColorFilter for Image<Rgba<u8>> {
    type Output = Self;

    fn color_filter(&self, transform: &ColorTransform) -> Result<Self::Output, KernelError> {
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height)?;

        let mut output = self.clone();
        if transform.is_identity() {
            return Ok(output);
        }

        let buffer: &mut [u8] = &mut output;
        for_each_row_mut(buffer, width, |_, row| {
            for px in row.chunks_exact_mut(CHANNELS) {
                let [r, g, b] = transform.apply([px[0], px[1], px[2]]);
                px[0] = r;
                px[1] = g;
                px[2] = b;
            }
        });

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_gradient_rgba_image;

    fn transform(f: impl FnOnce(&mut EnhancementParams)) -> ColorTransform {
        let mut params = EnhancementParams::default();
        f(&mut params);
        ColorTransform::new(&params)
    }

    #[test]
    fn neutral_params_are_identity() {
        let t = transform(|_| {});
        assert!(t.is_identity());
        let image = create_gradient_rgba_image(8, 8);
        assert_eq!(image.color_filter(&t).unwrap(), image);
    }

    #[test]
    fn brightness_scales_channels() {
        let t = transform(|p| p.brightness = 120.0);
        // 100 * 1.2 = 120; 250 * 1.2 clamps to 255
        assert_eq!(t.apply([100, 0, 250]), [120, 0, 255]);
    }

    #[test]
    fn brightness_and_exposure_compose() {
        let both = transform(|p| {
            p.brightness = 120.0;
            p.exposure = 150.0;
        });
        // 100 * 1.2 * 1.5 = 180
        assert_eq!(both.apply([100, 100, 100]), [180, 180, 180]);
    }

    #[test]
    fn contrast_pivots_around_mid_grey() {
        let t = transform(|p| p.contrast = 150.0);
        let [low, _, high] = t.apply([64, 0, 192]);
        assert!(low < 64);
        assert!(high > 192);

        let flat = transform(|p| p.contrast = 50.0);
        let [low, _, high] = flat.apply([64, 0, 192]);
        assert!(low > 64);
        assert!(high < 192);
    }

    #[test]
    fn zero_saturation_yields_grey() {
        let t = transform(|p| p.saturation = 0.0);
        let [r, g, b] = t.apply([200, 40, 90]);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn saturation_keeps_greys_grey() {
        let t = transform(|p| p.saturation = 250.0);
        let [r, g, b] = t.apply([120, 120, 120]);
        assert!(r.abs_diff(120) <= 1);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn color_filter_passes_alpha_through() {
        let image: Image<Rgba<u8>> = Image::from_pixel(3, 3, Rgba([100, 100, 100, 42]));
        let t = transform(|p| p.brightness = 150.0);
        let out = image.color_filter(&t).unwrap();
        assert_eq!(out.get_pixel(1, 1), &Rgba([150, 150, 150, 42]));
    }

    #[test]
    fn color_filter_rejects_empty_image() {
        let image: Image<Rgba<u8>> = Image::new(0, 0);
        let t = transform(|_| {});
        assert_eq!(image.color_filter(&t), Err(KernelError::EmptyImage));
    }
}
