use crate::config::StripConfig;
use crate::strip::grid::GridSpec;

/// Pixel geometry of a composed strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripLayout {
    pub rows: u32,
    pub cols: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl StripLayout {
    /// Full-resolution layout: tiles are `config.tile_height` tall and as
    /// wide as the region's aspect ratio requires.
    pub fn full(region: (u32, u32), grid: &GridSpec, config: &StripConfig) -> Self {
        let (tile_w, tile_h) = full_tile(region, config);
        Self::from_scaled(grid, tile_w, tile_h, f64::from(grid.spacing_px))
    }

    /// Preview layout: the full layout scaled so a tile is
    /// `config.preview_tile_width` wide. Tile size and spacing scale
    /// together, so preview and full output agree up to scale.
    pub fn preview(region: (u32, u32), grid: &GridSpec, config: &StripConfig) -> Self {
        let (tile_w, tile_h) = full_tile(region, config);
        let scale = preview_scale(region, config);
        Self::from_scaled(
            grid,
            tile_w * scale,
            tile_h * scale,
            f64::from(grid.spacing_px) * scale,
        )
    }

    fn from_scaled(grid: &GridSpec, tile_w: f64, tile_h: f64, spacing: f64) -> Self {
        let to_px = |v: f64| (v.round() as u32).max(1);
        let tile_width = to_px(tile_w);
        let tile_height = to_px(tile_h);
        let spacing = spacing.round() as u32;

        Self {
            rows: grid.rows,
            cols: grid.cols,
            tile_width,
            tile_height,
            spacing,
            canvas_width: grid.cols * tile_width + grid.cols.saturating_sub(1) * spacing,
            canvas_height: grid.rows * tile_height + grid.rows.saturating_sub(1) * spacing,
        }
    }

    /// Top-left corner of the tile at `(row, col)`.
    pub fn cell_origin(&self, row: u32, col: u32) -> (u32, u32) {
        (
            col * (self.tile_width + self.spacing),
            row * (self.tile_height + self.spacing),
        )
    }
}

/// Ratio between preview and full-resolution pixels.
pub fn preview_scale(region: (u32, u32), config: &StripConfig) -> f64 {
    let (tile_w, _) = full_tile(region, config);
    f64::from(config.preview_tile_width) / tile_w
}

fn full_tile((width, height): (u32, u32), config: &StripConfig) -> (f64, f64) {
    let tile_h = f64::from(config.tile_height.max(1));
    let ratio = f64::from(width.max(1)) / f64::from(height.max(1));
    ((tile_h * ratio).max(1.0), tile_h)
}
