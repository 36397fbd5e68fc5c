use image::{imageops, Rgba};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use crate::crop::geometry::CropGeometry;
use crate::error::CropError;
use crate::Image;

/// Fill used for the corners uncovered by a rotation.
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Trait cutting a committed crop out of a source image
pub trait ApplyCrop {
    /// Output image type
    type Output;

    /// Cuts the crop rectangle out and applies its rotation.
    ///
    /// The rotation turns the cropped region about its centre inside a
    /// canvas of the same size; uncovered corners are transparent.
    ///
    /// # Errors
    ///
    /// * `CropError::OutOfBounds` - When the rectangle leaves the image
    /// * `CropError::BelowMinimum` - When the rectangle is empty
    fn apply_crop(&self, geometry: &CropGeometry) -> Result<Self::Output, CropError>;
}

impl ApplyCrop for Image<Rgba<u8>> {
    type Output = Self;

    fn apply_crop(&self, geometry: &CropGeometry) -> Result<Self::Output, CropError> {
        geometry.validate(self.dimensions(), 1)?;

        let cropped = imageops::crop_imm(
            self,
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height,
        )
        .to_image();

        if !geometry.is_rotated() {
            return Ok(cropped);
        }

        let theta = geometry.rotation_degrees.to_radians() as f32;
        Ok(rotate_about_center(
            &cropped,
            theta,
            Interpolation::Bilinear,
            TRANSPARENT,
        ))
    }
}
