//! Internal utility functions shared by the kernels, the enhancement engine
//! and the strip compositor.

use crate::error::KernelError;

/// Stores a floating-point channel value into a byte the way a clamped byte
/// array does: clamp to `[0, 255]`, then round half to even.
///
/// # Arguments
///
/// * `value` - Channel value in the `0.0..=255.0` scale
///
/// # Returns
///
/// The clamped, rounded byte
#[inline]
pub fn clamp_to_byte(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Clamps a normalized channel value to `[0, 1]`.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Validates that an image has non-zero dimensions.
///
/// # Arguments
///
/// * `width` - The width of the image
/// * `height` - The height of the image
///
/// # Returns
///
/// `Ok(())` if the dimensions are valid, otherwise `KernelError::EmptyImage`
pub fn validate_non_empty_image(width: u32, height: u32) -> Result<(), KernelError> {
    if width == 0 || height == 0 {
        Err(KernelError::EmptyImage)
    } else {
        Ok(())
    }
}

/// Strips the final extension from a file name, keeping dotted stems intact.
///
/// `"photo.final.jpg"` becomes `"photo.final"`; a name without an extension
/// is returned unchanged.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_byte() {
        assert_eq!(clamp_to_byte(-10.0), 0);
        assert_eq!(clamp_to_byte(0.0), 0);
        assert_eq!(clamp_to_byte(127.4), 127);
        assert_eq!(clamp_to_byte(255.0), 255);
        assert_eq!(clamp_to_byte(300.0), 255);
        assert_eq!(clamp_to_byte(f32::NAN), 0);
    }

    #[test]
    fn test_clamp_to_byte_rounds_half_to_even() {
        assert_eq!(clamp_to_byte(0.5), 0);
        assert_eq!(clamp_to_byte(1.5), 2);
        assert_eq!(clamp_to_byte(2.5), 2);
        assert_eq!(clamp_to_byte(254.5), 254);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.1), 0.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(1.7), 1.0);
    }

    #[test]
    fn test_validate_non_empty_image() {
        assert!(validate_non_empty_image(100, 100).is_ok());
        assert!(validate_non_empty_image(1, 1).is_ok());
        assert!(validate_non_empty_image(0, 100).is_err());
        assert!(validate_non_empty_image(100, 0).is_err());
        assert!(validate_non_empty_image(0, 0).is_err());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("portrait.jpg"), "portrait");
        assert_eq!(file_stem("photo.final.png"), "photo.final");
        assert_eq!(file_stem("no_extension"), "no_extension");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }
}
