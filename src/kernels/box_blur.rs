use crate::error::KernelError;
use crate::kernels::{for_each_row_mut, CHANNELS};
use crate::utils::{clamp_to_byte, validate_non_empty_image};
use crate::Image;
use image::Rgba;

/// Trait providing a separable uniform box blur
///
/// The blur runs a horizontal pass followed by a vertical pass, each with a
/// kernel of `2 * radius + 1` equal weights. Samples outside the image are
/// clamped to the nearest edge pixel, so the output always has the input's
/// dimensions. Each pass stores its result as bytes before the next pass
/// reads it.
pub trait BoxBlur {
    /// Output image type of the blur
    type Output;

    /// Blurs the colour channels with a square kernel of the given radius.
    ///
    /// The alpha channel is copied through unchanged. A radius of `0` is the
    /// identity.
    ///
    /// # Arguments
    ///
    /// * `radius` - Kernel radius in pixels
    ///
    /// # Errors
    ///
    /// * `KernelError::EmptyImage` - When the image has a zero dimension
    ///
    /// # Examples
    ///
    /// ```
    /// use image::Rgba;
    /// use photogen::{BoxBlur, Image};
    ///
    /// let image: Image<Rgba<u8>> = Image::from_pixel(8, 8, Rgba([90, 120, 150, 255]));
    /// let blurred = image.box_blur(2).unwrap();
    /// assert_eq!(blurred.get_pixel(4, 4), &Rgba([90, 120, 150, 255]));
    /// ```
    fn box_blur(&self, radius: u32) -> Result<Self::Output, KernelError>;
}

impl BoxBlur for Image<Rgba<u8>> {
    type Output = Self;

    fn box_blur(&self, radius: u32) -> Result<Self::Output, KernelError> {
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height)?;

        if radius == 0 {
            return Ok(self.clone());
        }

        let horizontal = horizontal_pass(self, radius);
        Ok(vertical_pass(&horizontal, radius))
    }
}

fn horizontal_pass(source: &Image<Rgba<u8>>, radius: u32) -> Image<Rgba<u8>> {
    let (width, height) = source.dimensions();
    let kernel_size = (2 * radius + 1) as f32;
    let src = source.as_raw();
    let row_len = width as usize * CHANNELS;
    let radius = radius as i64;
    let last = i64::from(width) - 1;

    let mut out = vec![0u8; src.len()];
    for_each_row_mut(&mut out, width, |y, row| {
        let src_row = &src[y * row_len..(y + 1) * row_len];
        for x in 0..width as i64 {
            let mut sums = [0u32; 3];
            for k in -radius..=radius {
                let sx = (x + k).clamp(0, last) as usize * CHANNELS;
                for (sum, value) in sums.iter_mut().zip(&src_row[sx..sx + 3]) {
                    *sum += u32::from(*value);
                }
            }
            let dx = x as usize * CHANNELS;
            for (c, sum) in sums.iter().enumerate() {
                row[dx + c] = clamp_to_byte(*sum as f32 / kernel_size);
            }
            row[dx + 3] = src_row[dx + 3];
        }
    });

    // The buffer length always matches the dimensions it was sized from.
    Image::from_raw(width, height, out).unwrap_or_else(|| source.clone())
}

fn vertical_pass(source: &Image<Rgba<u8>>, radius: u32) -> Image<Rgba<u8>> {
    let (width, height) = source.dimensions();
    let kernel_size = (2 * radius + 1) as f32;
    let src = source.as_raw();
    let row_len = width as usize * CHANNELS;
    let radius = radius as i64;
    let last = i64::from(height) - 1;

    let mut out = vec![0u8; src.len()];
    for_each_row_mut(&mut out, width, |y, row| {
        let y = y as i64;
        for x in 0..width as usize {
            let dx = x * CHANNELS;
            let mut sums = [0u32; 3];
            for k in -radius..=radius {
                let sy = (y + k).clamp(0, last) as usize;
                let offset = sy * row_len + dx;
                for (sum, value) in sums.iter_mut().zip(&src[offset..offset + 3]) {
                    *sum += u32::from(*value);
                }
            }
            for (c, sum) in sums.iter().enumerate() {
                row[dx + c] = clamp_to_byte(*sum as f32 / kernel_size);
            }
            row[dx + 3] = src[y as usize * row_len + dx + 3];
        }
    });

    Image::from_raw(width, height, out).unwrap_or_else(|| source.clone())
}
