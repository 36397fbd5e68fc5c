use tracing::debug;

use crate::config::EditorConfig;
use crate::crop::geometry::{convert, CropGeometry, Rect, ScaleContext, Space};
use crate::crop::presets::AspectRatio;
use crate::error::CropError;
use crate::history::record::RecordId;

/// State of the interactive crop surface for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropState {
    Idle,
    CropEditing,
    /// Sub-state of `Idle` while a face-detection call is in flight.
    AutoDetecting,
}

/// Handle for one in-flight detection call.
///
/// A result is only applied when the ticket still matches the session: same
/// record, same detection generation, still detecting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionTicket {
    pub record_id: RecordId,
    /// Ratio to send with the request.
    pub aspect_ratio: f64,
    generation: u64,
}

/// Crop editing session over one record.
///
/// The crop box is held in display space; it only enters source space when
/// converted on save.
#[derive(Debug, Clone)]
pub struct CropSession {
    record_id: RecordId,
    ctx: ScaleContext,
    state: CropState,
    aspect: AspectRatio,
    crop_box: Option<Rect>,
    rotation_degrees: f64,
    min_size: u32,
    auto_crop_area: f64,
    generation: u64,
}

impl CropSession {
    pub fn new(record_id: RecordId, ctx: ScaleContext, config: &EditorConfig) -> Self {
        Self {
            record_id,
            ctx,
            state: CropState::Idle,
            aspect: AspectRatio::default(),
            crop_box: None,
            rotation_degrees: 0.0,
            min_size: config.min_crop_size,
            auto_crop_area: config.auto_crop_area.clamp(0.0, 1.0),
            generation: 0,
        }
    }

    /// Continues the detection numbering of a session this one replaces, so
    /// tickets issued before the replacement stay stale.
    pub(crate) fn continuing_from(mut self, generation: u64) -> Self {
        self.generation = self.generation.max(generation);
        self
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn state(&self) -> CropState {
        self.state
    }

    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    pub fn context(&self) -> &ScaleContext {
        &self.ctx
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    /// The crop box as shown on the cropping surface.
    pub fn crop_box(&self) -> Option<Rect> {
        self.crop_box
    }

    /// The crop box converted into `space`.
    pub fn crop_box_in(&self, space: Space) -> Option<Result<Rect, CropError>> {
        self.crop_box.map(|rect| convert(&rect, space, &self.ctx))
    }

    /// Enters crop mode with a centred box covering the configured share of
    /// the display, fitted to the active ratio.
    ///
    /// # Errors
    ///
    /// * `CropError::InvalidState` - Unless the session is idle
    /// * `CropError::DegenerateSpace` - When the display has no area
    pub fn begin(&mut self) -> Result<(), CropError> {
        self.require(CropState::Idle, "a crop is already in progress")?;
        self.ctx.validate()?;

        let (dw, dh) = self.ctx.display;
        let (width, height) = (dw * self.auto_crop_area, dh * self.auto_crop_area);
        let initial = Rect::new(
            Space::Display,
            (dw - width) / 2.0,
            (dh - height) / 2.0,
            width,
            height,
        );

        self.crop_box = Some(self.fit_to_aspect(initial));
        self.rotation_degrees = 0.0;
        self.state = CropState::CropEditing;
        Ok(())
    }

    /// Switches the aspect ratio; while editing, the box is refitted around
    /// its centre.
    ///
    /// # Errors
    ///
    /// * `CropError::InvalidState` - While a detection call is in flight
    pub fn set_aspect(&mut self, aspect: AspectRatio) -> Result<(), CropError> {
        if self.state == CropState::AutoDetecting {
            return Err(CropError::InvalidState("face detection is running"));
        }
        self.aspect = aspect;
        if let Some(rect) = self.crop_box {
            self.crop_box = Some(self.fit_to_aspect(rect));
        }
        Ok(())
    }

    /// Moves or resizes the box. Fixed ratios force `height = width / ratio`
    /// from the top-left corner; the box is kept inside the display.
    ///
    /// `rect` may be given in any space; it is converted to display space.
    ///
    /// # Errors
    ///
    /// * `CropError::InvalidState` - Unless editing
    /// * `CropError::InvalidSize` - When a side is not a positive number
    pub fn drag(&mut self, rect: Rect) -> Result<(), CropError> {
        self.require(CropState::CropEditing, "not editing a crop")?;
        positive("width", rect.width)?;
        positive("height", rect.height)?;

        let mut rect = convert(&rect, Space::Display, &self.ctx)?;
        let (dw, dh) = self.ctx.display;
        rect.x = rect.x.clamp(0.0, dw);
        rect.y = rect.y.clamp(0.0, dh);

        if let Some(ratio) = self.aspect.ratio() {
            rect.height = rect.width / ratio;
            if rect.y + rect.height > dh {
                rect.height = dh - rect.y;
                rect.width = rect.height * ratio;
            }
            if rect.x + rect.width > dw {
                rect.width = dw - rect.x;
                rect.height = rect.width / ratio;
            }
        }

        self.crop_box = Some(rect.clamp_within(self.ctx.display));
        Ok(())
    }

    /// Numeric width/height entry in source pixels. The box is centred in
    /// the view; fixed ratios derive the height from the width.
    ///
    /// # Errors
    ///
    /// * `CropError::InvalidState` - Unless editing
    /// * `CropError::InvalidSize` - When a side is not positive or larger than the source
    pub fn set_manual_size(&mut self, width: f64, height: f64) -> Result<(), CropError> {
        self.require(CropState::CropEditing, "not editing a crop")?;
        positive("width", width)?;
        let height = match self.aspect.ratio() {
            Some(ratio) => width / ratio,
            None => {
                positive("height", height)?;
                height
            }
        };

        let (sw, sh) = self.ctx.source;
        if width > sw || height > sh {
            return Err(CropError::InvalidSize(format!(
                "{width}x{height} does not fit in a {sw}x{sh} image"
            )));
        }

        let source = Rect::new(
            Space::Source,
            (sw - width) / 2.0,
            (sh - height) / 2.0,
            width,
            height,
        );
        self.crop_box = Some(convert(&source, Space::Display, &self.ctx)?);
        Ok(())
    }

    /// # Errors
    ///
    /// * `CropError::InvalidState` - Unless editing
    /// * `CropError::InvalidSize` - When the angle is not finite
    pub fn set_rotation(&mut self, degrees: f64) -> Result<(), CropError> {
        self.require(CropState::CropEditing, "not editing a crop")?;
        if !degrees.is_finite() {
            return Err(CropError::InvalidSize(format!("rotation {degrees}")));
        }
        self.rotation_degrees = degrees.rem_euclid(360.0);
        Ok(())
    }

    /// Converts the box into source-pixel geometry and leaves crop mode.
    ///
    /// On error the session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// * `CropError::InvalidState` - Unless editing
    /// * `CropError::BelowMinimum` - When a side is below the minimum size
    /// * `CropError::OutOfBounds` - When the box leaves the source
    pub fn save(&mut self) -> Result<CropGeometry, CropError> {
        self.require(CropState::CropEditing, "not editing a crop")?;
        let rect = self
            .crop_box
            .ok_or(CropError::InvalidState("no crop box"))?;

        let (sw, sh) = self.ctx.source;
        let bounds = (sw as u32, sh as u32);
        let source = convert(&rect, Space::Source, &self.ctx)?;
        let mut geometry = CropGeometry::from_source_rect(
            &source,
            bounds,
            self.rotation_degrees,
            Some(self.aspect.label()),
        )?;
        if let Some(ratio) = self.aspect.ratio() {
            // The ratio must hold in whole source pixels: the height follows the
            // rounded width, or the width follows the room left above the
            // bottom edge.
            let room = bounds.1 - geometry.y;
            let height = (f64::from(geometry.width) / ratio).round() as u32;
            if height <= room {
                geometry.height = height;
            } else {
                geometry.height = room;
                geometry.width = ((f64::from(room) * ratio).round() as u32).min(geometry.width);
            }
        }

        geometry.validate(bounds, self.min_size)?;

        debug!(
            record = self.record_id.0,
            x = geometry.x,
            y = geometry.y,
            width = geometry.width,
            height = geometry.height,
            "Crop saved"
        );
        self.reset();
        Ok(geometry)
    }

    /// Leaves crop mode without committing anything. Any detection in
    /// flight becomes stale.
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Starts a detection call.
    ///
    /// # Errors
    ///
    /// * `CropError::InvalidState` - Unless the session is idle
    pub fn begin_detection(&mut self) -> Result<DetectionTicket, CropError> {
        self.require(CropState::Idle, "a crop is already in progress")?;
        self.generation += 1;
        self.state = CropState::AutoDetecting;
        Ok(DetectionTicket {
            record_id: self.record_id,
            aspect_ratio: self.aspect.detection_ratio(),
            generation: self.generation,
        })
    }

    /// Applies a detection rectangle and enters crop mode with it.
    ///
    /// Returns `Ok(false)` and changes nothing when the ticket is stale.
    ///
    /// # Errors
    ///
    /// * `CropError::DegenerateSpace` - When the context cannot convert
    pub fn apply_detection(
        &mut self,
        ticket: &DetectionTicket,
        detected: Rect,
    ) -> Result<bool, CropError> {
        if !self.accepts(ticket) {
            debug!(record = ticket.record_id.0, "Discarding stale detection result");
            return Ok(false);
        }

        let shown = convert(&detected, Space::Display, &self.ctx)?.clamp_within(self.ctx.display);
        self.crop_box = Some(shown);
        self.rotation_degrees = 0.0;
        self.state = CropState::CropEditing;
        Ok(true)
    }

    /// Returns to `Idle` after a failed detection call. Returns `false` for a
    /// stale ticket.
    pub fn fail_detection(&mut self, ticket: &DetectionTicket) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.state = CropState::Idle;
        true
    }

    fn accepts(&self, ticket: &DetectionTicket) -> bool {
        self.state == CropState::AutoDetecting
            && ticket.record_id == self.record_id
            && ticket.generation == self.generation
    }

    fn require(&self, state: CropState, message: &'static str) -> Result<(), CropError> {
        if self.state == state {
            Ok(())
        } else {
            Err(CropError::InvalidState(message))
        }
    }

    fn reset(&mut self) {
        self.state = CropState::Idle;
        self.crop_box = None;
        self.rotation_degrees = 0.0;
        self.generation += 1;
    }

    /// Shrinks `rect` around its centre to the active ratio.
    fn fit_to_aspect(&self, rect: Rect) -> Rect {
        let Some(ratio) = self.aspect.ratio() else {
            return rect.clamp_within(self.ctx.display);
        };

        let (cx, cy) = rect.center();
        let (mut width, mut height) = (rect.width, rect.height);
        if width / height > ratio {
            width = height * ratio;
        } else {
            height = width / ratio;
        }

        Rect::new(
            Space::Display,
            cx - width / 2.0,
            cy - height / 2.0,
            width,
            height,
        )
        .clamp_within(self.ctx.display)
    }
}

fn positive(name: &str, value: f64) -> Result<(), CropError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CropError::InvalidSize(format!("{name} must be positive, got {value}")))
    }
}
