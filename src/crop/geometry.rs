//! Rectangles tagged with the coordinate space they live in, and the single
//! conversion between spaces.

use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// Coordinate space of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    /// The on-screen cropping surface.
    Display,
    /// Pixels of the original uploaded bitmap.
    Source,
    /// Pixels of a rendered output canvas (e.g. a scaled export).
    Output,
}

/// Full extents of the image in each coordinate space.
///
/// Conversions are linear per axis: a coordinate `v` maps to
/// `v * to_extent / from_extent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleContext {
    pub source: (f64, f64),
    pub display: (f64, f64),
    pub output: (f64, f64),
}

impl ScaleContext {
    /// Context for a source shown at `display` size and rendered at source
    /// size.
    pub fn new(source: (u32, u32), display: (f64, f64)) -> Self {
        let source = (f64::from(source.0), f64::from(source.1));
        Self {
            source,
            display,
            output: source,
        }
    }

    /// Context whose display fits the source inside `max_display`, keeping
    /// its aspect ratio.
    pub fn fit(source: (u32, u32), max_display: (f64, f64)) -> Self {
        let (sw, sh) = (f64::from(source.0), f64::from(source.1));
        let scale = (max_display.0 / sw).min(max_display.1 / sh);
        Self::new(source, (sw * scale, sh * scale))
    }

    pub fn with_output(mut self, output: (f64, f64)) -> Self {
        self.output = output;
        self
    }

    /// Uniform display-to-source factor along x.
    pub fn display_scale(&self) -> f64 {
        self.display.0 / self.source.0
    }

    pub fn extent(&self, space: Space) -> (f64, f64) {
        match space {
            Space::Display => self.display,
            Space::Source => self.source,
            Space::Output => self.output,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CropError> {
        let usable = |(w, h): (f64, f64)| w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0;
        if usable(self.source) && usable(self.display) && usable(self.output) {
            Ok(())
        } else {
            Err(CropError::DegenerateSpace)
        }
    }
}

/// An axis-aligned rectangle in a known coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub space: Space,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(space: Space, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            space,
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrinks and shifts the rectangle so it lies within `(0, 0, w, h)`.
    pub fn clamp_within(&self, (w, h): (f64, f64)) -> Self {
        let width = self.width.clamp(0.0, w);
        let height = self.height.clamp(0.0, h);
        let x = self.x.clamp(0.0, w - width);
        let y = self.y.clamp(0.0, h - height);
        Self::new(self.space, x, y, width, height)
    }
}

/// Converts a rectangle into another coordinate space.
///
/// This is the only place where coordinates change space.
///
/// # Errors
///
/// * `CropError::DegenerateSpace` - When an extent in `ctx` is zero or not finite
pub fn convert(rect: &Rect, to: Space, ctx: &ScaleContext) -> Result<Rect, CropError> {
    ctx.validate()?;
    if rect.space == to {
        return Ok(*rect);
    }

    let (from_w, from_h) = ctx.extent(rect.space);
    let (to_w, to_h) = ctx.extent(to);

    Ok(Rect::new(
        to,
        rect.x * to_w / from_w,
        rect.y * to_h / from_h,
        rect.width * to_w / from_w,
        rect.height * to_h / from_h,
    ))
}

/// Committed crop of a record, always in source-pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropGeometry {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default, alias = "rotation")]
    pub rotation_degrees: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio_label: Option<String>,
}

impl CropGeometry {
    /// Builds a geometry from a source-space rectangle, rounding to whole
    /// pixels inside `source`.
    ///
    /// Both edges are rounded and clamped, so `x + width` never exceeds the
    /// source width even when the rectangle ends on a fractional pixel.
    ///
    /// # Errors
    ///
    /// * `CropError::InvalidState` - When `rect` is not in source space
    pub fn from_source_rect(
        rect: &Rect,
        source: (u32, u32),
        rotation_degrees: f64,
        aspect_ratio_label: Option<String>,
    ) -> Result<Self, CropError> {
        if rect.space != Space::Source {
            return Err(CropError::InvalidState("converting a non-source rectangle"));
        }
        let edges = |start: f64, len: f64, limit: u32| {
            let limit = f64::from(limit);
            let lo = start.round().clamp(0.0, limit);
            let hi = (start + len).round().clamp(lo, limit);
            (lo as u32, (hi - lo) as u32)
        };
        let (x, width) = edges(rect.x, rect.width, source.0);
        let (y, height) = edges(rect.y, rect.height, source.1);
        Ok(Self {
            x,
            y,
            width,
            height,
            rotation_degrees,
            aspect_ratio_label,
        })
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(
            Space::Source,
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.width),
            f64::from(self.height),
        )
    }

    /// Checks the minimum size and the source bounds.
    ///
    /// # Errors
    ///
    /// * `CropError::BelowMinimum` - When either side is below `min_size`
    /// * `CropError::OutOfBounds` - When the crop leaves the source image
    pub fn validate(&self, source: (u32, u32), min_size: u32) -> Result<(), CropError> {
        if self.width < min_size || self.height < min_size {
            return Err(CropError::BelowMinimum {
                width: self.width,
                height: self.height,
                min: min_size,
            });
        }

        let fits = |start: u32, len: u32, limit: u32| {
            start.checked_add(len).is_some_and(|end| end <= limit)
        };
        if !fits(self.x, self.width, source.0) || !fits(self.y, self.height, source.1) {
            return Err(CropError::OutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                source_width: source.0,
                source_height: source.1,
            });
        }

        Ok(())
    }

    /// Whether a rotation must be applied when deriving.
    pub fn is_rotated(&self) -> bool {
        self.rotation_degrees.rem_euclid(360.0) != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ScaleContext {
        ScaleContext::new((2000, 3000), (400.0, 600.0))
    }

    #[test]
    fn source_to_display_applies_scale() {
        let detected = Rect::new(Space::Source, 500.0, 800.0, 700.0, 900.0);
        let shown = convert(&detected, Space::Display, &ctx()).unwrap();
        assert_eq!(shown, Rect::new(Space::Display, 100.0, 160.0, 140.0, 180.0));
    }

    #[test]
    fn display_to_source_is_the_inverse() {
        let shown = Rect::new(Space::Display, 100.0, 160.0, 140.0, 180.0);
        let source = convert(&shown, Space::Source, &ctx()).unwrap();
        assert_eq!(source, Rect::new(Space::Source, 500.0, 800.0, 700.0, 900.0));
    }

    #[test]
    fn same_space_conversion_is_identity() {
        let rect = Rect::new(Space::Display, 1.5, 2.5, 3.0, 4.0);
        assert_eq!(convert(&rect, Space::Display, &ctx()).unwrap(), rect);
    }

    #[test]
    fn output_space_follows_output_extent() {
        let ctx = ctx().with_output((1000.0, 1500.0));
        let rect = Rect::new(Space::Source, 500.0, 800.0, 700.0, 900.0);
        let out = convert(&rect, Space::Output, &ctx).unwrap();
        assert_eq!(out, Rect::new(Space::Output, 250.0, 400.0, 350.0, 450.0));
    }

    #[test]
    fn degenerate_context_is_rejected() {
        let ctx = ScaleContext::new((0, 3000), (400.0, 600.0));
        let rect = Rect::new(Space::Source, 0.0, 0.0, 1.0, 1.0);
        assert_eq!(
            convert(&rect, Space::Display, &ctx),
            Err(CropError::DegenerateSpace)
        );
    }

    #[test]
    fn fit_preserves_aspect() {
        let ctx = ScaleContext::fit((2000, 3000), (800.0, 600.0));
        assert_eq!(ctx.display, (400.0, 600.0));
        assert!((ctx.display_scale() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn clamp_within_shifts_then_shrinks() {
        let rect = Rect::new(Space::Display, 350.0, -10.0, 100.0, 50.0);
        let clamped = rect.clamp_within((400.0, 600.0));
        assert_eq!(clamped, Rect::new(Space::Display, 300.0, 0.0, 100.0, 50.0));

        let huge = Rect::new(Space::Display, 0.0, 0.0, 900.0, 50.0);
        assert_eq!(huge.clamp_within((400.0, 600.0)).width, 400.0);
    }

    #[test]
    fn geometry_validation() {
        let geometry = CropGeometry {
            x: 100,
            y: 100,
            width: 400,
            height: 400,
            rotation_degrees: 0.0,
            aspect_ratio_label: Some("1:1".to_string()),
        };
        assert!(geometry.validate((1000, 1000), 10).is_ok());
        assert!(matches!(
            geometry.validate((450, 1000), 10),
            Err(CropError::OutOfBounds { .. })
        ));

        let tiny = CropGeometry {
            width: 9,
            ..geometry
        };
        assert_eq!(
            tiny.validate((1000, 1000), 10),
            Err(CropError::BelowMinimum {
                width: 9,
                height: 400,
                min: 10
            })
        );
    }

    #[test]
    fn geometry_rounds_edges_inside_source() {
        // Ends exactly on the right edge with a half-pixel start.
        let rect = Rect::new(Space::Source, 100.5, 0.0, 899.5, 200.0);
        let geometry = CropGeometry::from_source_rect(&rect, (1000, 1000), 0.0, None).unwrap();
        assert_eq!((geometry.x, geometry.width), (101, 899));
        assert!(geometry.validate((1000, 1000), 10).is_ok());

        let overhang = Rect::new(Space::Source, 990.4, 995.0, 20.0, 20.0);
        let geometry = CropGeometry::from_source_rect(&overhang, (1000, 1000), 0.0, None).unwrap();
        assert_eq!(
            (geometry.x, geometry.y, geometry.width, geometry.height),
            (990, 995, 10, 5)
        );
    }

    #[test]
    fn geometry_requires_source_rect() {
        let rect = Rect::new(Space::Display, 0.0, 0.0, 10.0, 10.0);
        assert!(CropGeometry::from_source_rect(&rect, (100, 100), 0.0, None).is_err());
    }

    #[test]
    fn geometry_serde_accepts_legacy_rotation_key() {
        let geometry: CropGeometry =
            serde_json::from_str(r#"{"x":1,"y":2,"width":30,"height":40,"rotation":90}"#).unwrap();
        assert_eq!(geometry.rotation_degrees, 90.0);
        assert_eq!(geometry.aspect_ratio_label, None);
        assert!(geometry.is_rotated());

        let json = serde_json::to_value(&geometry).unwrap();
        assert_eq!(json["rotationDegrees"], 90.0);
    }
}
