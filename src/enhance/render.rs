use image::Rgba;
use tracing::{debug, instrument};

use crate::codec::{DataUrl, OutputFormat};
use crate::enhance::filters::{ColorFilter, ColorTransform};
use crate::enhance::params::EnhancementParams;
use crate::error::{EnhanceError, KernelError};
use crate::kernels::box_blur::BoxBlur;
use crate::kernels::lab::{lerp, rgb_to_lab, skin_mask};
use crate::kernels::sharpen::Sharpen;
use crate::kernels::{for_each_row_mut, CHANNELS};
use crate::utils::clamp_to_byte;
use crate::Image;

/// Renders an original image with an enhancement parameter set.
///
/// The pipeline runs in a fixed order:
///
/// 1. the base colour transform over the full buffer
/// 2. skin smoothing, when `skin_smooth > 0`: the step 1 result is blurred
///    and every pixel classified as skin is replaced by its blurred value
/// 3. sharpening with `amount = sharpness`
///
/// The input and the parameters are never mutated.
///
/// # Errors
///
/// * `EnhanceError::Params` - When a parameter is out of range
/// * `EnhanceError::Kernel` - When the image is empty
#[instrument(skip_all, fields(width = original.width(), height = original.height()))]
pub fn render(
    original: &Image<Rgba<u8>>,
    params: &EnhancementParams,
) -> Result<Image<Rgba<u8>>, EnhanceError> {
    params.validate()?;

    let mut working = original.color_filter(&ColorTransform::new(params))?;

    let radius = params.blur_radius();
    if radius > 0 {
        working = smooth_skin(&working, radius)?;
    }

    let output = working.sharpen(params.sharpness)?;
    debug!(
        radius,
        sharpness = params.sharpness,
        "Enhancement render complete"
    );
    Ok(output)
}

/// Decodes `source`, renders it and encodes the result.
///
/// A decode failure is reported as `EnhanceError::Source` before anything is
/// produced, so callers keep their previous output.
pub fn render_to_data_url(
    source: &DataUrl,
    params: &EnhancementParams,
    format: OutputFormat,
    quality: u8,
) -> Result<DataUrl, EnhanceError> {
    let original = source.decode()?;
    let rendered = render(&original, params)?;
    Ok(DataUrl::encode(&rendered, format, quality)?)
}

/// Blends the blurred image into `image` wherever the skin mask is set.
///
/// The mask is evaluated on the unblurred pixel. Alpha always comes from the
/// unblurred image.
fn smooth_skin(image: &Image<Rgba<u8>>, radius: u32) -> Result<Image<Rgba<u8>>, KernelError> {
    let (width, height) = image.dimensions();
    let blurred = image.box_blur(radius)?;
    let blurred_raw = blurred.as_raw();
    let row_len = width as usize * CHANNELS;

    let mut output = image.clone();
    let buffer: &mut [u8] = &mut output;
    for_each_row_mut(buffer, width, |y, row| {
        let blurred_row = &blurred_raw[y * row_len..(y + 1) * row_len];
        for (px, bl) in row
            .chunks_exact_mut(CHANNELS)
            .zip(blurred_row.chunks_exact(CHANNELS))
        {
            let mask = skin_mask(rgb_to_lab(px[0], px[1], px[2]));
            if mask == 0 {
                continue;
            }
            let t = f32::from(mask);
            for c in 0..3 {
                px[c] = clamp_to_byte(lerp(f32::from(px[c]), f32::from(bl[c]), t));
            }
        }
    });

    debug!(width, height, radius, "Skin smoothing applied");
    Ok(output)
}
