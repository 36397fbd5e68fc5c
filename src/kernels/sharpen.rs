use crate::error::KernelError;
use crate::kernels::CHANNELS;
use crate::utils::{clamp_to_byte, validate_non_empty_image};
use crate::Image;
use image::Rgba;

/// Scale applied to the user-facing sharpness before it reaches the kernel.
const AMOUNT_SCALE: f32 = 0.3;

/// Trait providing the 3×3 sharpening convolution
///
/// The kernel is
///
/// ```text
///  0  -1   0
/// -1   c  -1     c = 4 + 2 * (amount * 0.3)
///  0  -1   0
/// ```
///
/// Only interior pixels are convolved. The first and last rows and columns
/// are copied through unchanged, as is the alpha channel.
pub trait Sharpen {
    /// Output image type of the convolution
    type Output;

    /// Applies the sharpening kernel with the given amount.
    ///
    /// An amount of `0` returns the input unchanged. Channel values are
    /// clamped to `[0, 255]`.
    ///
    /// # Errors
    ///
    /// * `KernelError::EmptyImage` - When the image has a zero dimension
    /// * `KernelError::InvalidParameter` - When `amount` is negative or not finite
    fn sharpen(&self, amount: f32) -> Result<Self::Output, KernelError>;
}

impl Sharpen for Image<Rgba<u8>> {
    type Output = Self;

    fn sharpen(&self, amount: f32) -> Result<Self::Output, KernelError> {
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height)?;

        if !amount.is_finite() || amount < 0.0 {
            return Err(KernelError::InvalidParameter(format!(
                "sharpen amount must be a non-negative number, got {amount}"
            )));
        }

        if amount == 0.0 || width < 3 || height < 3 {
            return Ok(self.clone());
        }

        let center = 4.0 + 2.0 * (amount * AMOUNT_SCALE);
        let src = self.as_raw();
        let row_len = width as usize * CHANNELS;
        let mut output = self.clone();
        let out: &mut [u8] = &mut output;

        for y in 1..height as usize - 1 {
            for x in 1..width as usize - 1 {
                let idx = y * row_len + x * CHANNELS;
                let (up, down) = (idx - row_len, idx + row_len);
                let (left, right) = (idx - CHANNELS, idx + CHANNELS);
                for c in 0..3 {
                    let value = f32::from(src[idx + c]) * center
                        - f32::from(src[up + c])
                        - f32::from(src[down + c])
                        - f32::from(src[left + c])
                        - f32::from(src[right + c]);
                    out[idx + c] = clamp_to_byte(value);
                }
            }
        }

        Ok(output)
    }
}
