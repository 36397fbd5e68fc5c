//! Test utilities for photogen
//!
//! Fixtures shared by the unit tests of the kernels, the engine, the crop
//! transform, the history store and the strip compositor.
//! It is only compiled when running tests.

#[cfg(test)]
use crate::codec::{DataUrl, OutputFormat};
#[cfg(test)]
use crate::Image;
#[cfg(test)]
use image::{Pixel, Primitive, Rgba};

/// Creates an opaque RGBA image whose channels vary with position.
///
/// - red grows along x
/// - green grows along y
/// - blue is fixed at 128
#[cfg(test)]
pub fn create_gradient_rgba_image(width: u32, height: u32) -> Image<Rgba<u8>> {
    Image::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            255,
        ])
    })
}

/// Creates an image with a skin-toned square in the middle of a blue field.
///
/// The skin square spans `[width/4, 3*width/4)` × `[height/4, 3*height/4)`
/// and alternates between two close skin tones so that blurring changes it.
#[cfg(test)]
pub fn create_portrait_like_image(width: u32, height: u32) -> Image<Rgba<u8>> {
    Image::from_fn(width, height, |x, y| {
        let inside = x >= width / 4 && x < 3 * width / 4 && y >= height / 4 && y < 3 * height / 4;
        if inside {
            if (x + y) % 2 == 0 {
                Rgba([224, 172, 140, 255])
            } else {
                Rgba([204, 152, 120, 255])
            }
        } else {
            Rgba([30, 60, 200, 255])
        }
    })
}

/// Encodes an image as a PNG data URL.
#[cfg(test)]
pub fn png_data_url(image: &Image<Rgba<u8>>) -> DataUrl {
    DataUrl::encode(image, OutputFormat::Png, 100).expect("encode test png")
}

/// Compares two images pixel by pixel with a tolerance.
///
/// # Returns
/// `true` if all pixels are within tolerance and dimensions match, `false` otherwise
#[cfg(test)]
pub fn images_approx_equal<P>(expected: &Image<P>, actual: &Image<P>, tolerance: f32) -> bool
where
    P: Pixel,
    P::Subpixel: Primitive,
    f32: From<P::Subpixel>,
{
    if expected.dimensions() != actual.dimensions() {
        return false;
    }

    expected.pixels().zip(actual.pixels()).all(|(e, a)| {
        e.channels()
            .iter()
            .zip(a.channels())
            .all(|(ec, ac)| (f32::from(*ec) - f32::from(*ac)).abs() <= tolerance)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_gradient_rgba_image_has_expected_corners() {
        let image = create_gradient_rgba_image(10, 10);
        assert_eq!(image.dimensions(), (10, 10));
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 128, 255]));
        assert_eq!(image.get_pixel(9, 9), &Rgba([229, 229, 128, 255]));
    }

    #[test]
    fn images_approx_equal_with_tolerant_comparison() {
        let image1 = create_gradient_rgba_image(4, 4);
        let mut image2 = image1.clone();
        let p = *image2.get_pixel(0, 0);
        image2.put_pixel(0, 0, Rgba([p[0] + 1, p[1], p[2], p[3]]));

        assert!(images_approx_equal(&image1, &image2, 1.5));
        assert!(!images_approx_equal(&image1, &image2, 0.5));
    }
}
