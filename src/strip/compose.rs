use image::imageops::{self, FilterType};
use image::Rgba;
use itertools::iproduct;
use tracing::{debug, instrument};

use crate::config::StripConfig;
use crate::crop::apply::ApplyCrop;
use crate::crop::geometry::CropGeometry;
use crate::error::StripError;
use crate::strip::grid::GridSpec;
use crate::strip::layout::StripLayout;
use crate::Image;

/// Trait tiling an image region into a photo strip
pub trait ComposeStrip {
    /// Output image type
    type Output;

    /// Renders the full-resolution strip.
    ///
    /// The region is `crop` (rotation included) or the whole image. It is
    /// scaled once to the tile size and drawn into every cell over the
    /// background, so all tiles are pixel-identical.
    ///
    /// # Errors
    ///
    /// * `StripError::InvalidGrid` / `StripError::InvalidColor` - For a bad grid
    /// * `StripError::InvalidRegion` - When the crop is outside the image
    fn compose_strip(
        &self,
        crop: Option<&CropGeometry>,
        grid: &GridSpec,
        config: &StripConfig,
    ) -> Result<Self::Output, StripError>;

    /// Renders the low-resolution preview with the same crop sampling and
    /// aspect math as `compose_strip`.
    fn compose_preview(
        &self,
        crop: Option<&CropGeometry>,
        grid: &GridSpec,
        config: &StripConfig,
    ) -> Result<Self::Output, StripError>;
}

impl ComposeStrip for Image<Rgba<u8>> {
    type Output = Self;

    #[instrument(skip_all, fields(rows = grid.rows, cols = grid.cols))]
    fn compose_strip(
        &self,
        crop: Option<&CropGeometry>,
        grid: &GridSpec,
        config: &StripConfig,
    ) -> Result<Self::Output, StripError> {
        let background = grid.validate(config.max_cells_per_axis)?;
        let region = source_region(self, crop)?;
        let layout = StripLayout::full(region.dimensions(), grid, config);
        Ok(render_layout(&region, &layout, background))
    }

    fn compose_preview(
        &self,
        crop: Option<&CropGeometry>,
        grid: &GridSpec,
        config: &StripConfig,
    ) -> Result<Self::Output, StripError> {
        let background = grid.validate(config.max_cells_per_axis)?;
        let region = source_region(self, crop)?;
        let layout = StripLayout::preview(region.dimensions(), grid, config);
        Ok(render_layout(&region, &layout, background))
    }
}

fn source_region(
    image: &Image<Rgba<u8>>,
    crop: Option<&CropGeometry>,
) -> Result<Image<Rgba<u8>>, StripError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(StripError::InvalidRegion);
    }
    match crop {
        Some(geometry) => image
            .apply_crop(geometry)
            .map_err(|_| StripError::InvalidRegion),
        None => Ok(image.clone()),
    }
}

/// Fills the canvas with `background` and draws `region` into every cell.
pub fn render_layout(
    region: &Image<Rgba<u8>>,
    layout: &StripLayout,
    background: Rgba<u8>,
) -> Image<Rgba<u8>> {
    let tile = imageops::resize(
        region,
        layout.tile_width,
        layout.tile_height,
        FilterType::Triangle,
    );

    let mut canvas = Image::from_pixel(layout.canvas_width, layout.canvas_height, background);
    for (row, col) in iproduct!(0..layout.rows, 0..layout.cols) {
        let (x, y) = layout.cell_origin(row, col);
        imageops::overlay(&mut canvas, &tile, i64::from(x), i64::from(y));
    }

    debug!(
        width = layout.canvas_width,
        height = layout.canvas_height,
        tile_width = layout.tile_width,
        tile_height = layout.tile_height,
        "Strip composed"
    );
    canvas
}
