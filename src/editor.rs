//! The editing session: one store, one configuration and at most one crop
//! session, exposing every user-facing operation.
//!
//! Every operation validates and renders before it touches the store, so a
//! failure leaves the collection exactly as it was.

use image::Rgba;
use tracing::{debug, info, instrument, warn};

use crate::codec::{DataUrl, OutputFormat};
use crate::collaborators::{
    BackgroundRemoval, BackgroundRemovalRequest, ComplianceCheck, DetectionRequest,
    DetectionResponse, FaceDetection,
};
use crate::config::EditorConfig;
use crate::crop::apply::ApplyCrop;
use crate::crop::geometry::{CropGeometry, Rect, ScaleContext};
use crate::crop::presets::AspectRatio;
use crate::crop::session::{CropSession, CropState, DetectionTicket};
use crate::enhance::params::EnhancementParams;
use crate::enhance::render::render;
use crate::error::{CodecError, CollaboratorError, CropError, EditorError, StorageError};
use crate::export::{export_batch, export_record, ExportOptions, ExportedFile};
use crate::history::persist::{Persister, Storage};
use crate::history::record::{ImageRecord, RecordPatch, RecordState};
use crate::history::store::{Collection, EditorStore};
use crate::strip::compose::ComposeStrip;
use crate::strip::grid::GridSpec;
use crate::utils::file_stem;
use crate::Image;

const NO_SESSION: CropError = CropError::InvalidState("no crop session is open");

#[derive(Debug, Default)]
pub struct Editor {
    config: EditorConfig,
    store: EditorStore,
    crop: Option<CropSession>,
    /// Ratio new crop sessions open with.
    aspect: AspectRatio,
    /// Latest detection generation of any closed session.
    detection_generation: u64,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            store: EditorStore::new(),
            crop: None,
            aspect: AspectRatio::default(),
            detection_generation: 0,
        }
    }

    /// Restores the collection persisted in `storage`; an empty storage
    /// starts an empty session.
    ///
    /// # Errors
    ///
    /// * `StorageError` - When the stored collection cannot be read
    pub fn load_from(config: EditorConfig, storage: &impl Storage) -> Result<Self, StorageError> {
        let collection = storage.load()?.unwrap_or_default();
        info!(len = collection.len(), "Collection restored");
        Ok(Self {
            config,
            store: EditorStore::with_collection(collection),
            crop: None,
            aspect: AspectRatio::default(),
            detection_generation: 0,
        })
    }

    /// Mirrors every later change of the collection into `storage`.
    pub fn persist_to<S: Storage + 'static>(&mut self, storage: S) {
        self.store.subscribe(Box::new(Persister::new(storage)));
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn collection(&self) -> &Collection {
        self.store.collection()
    }

    pub fn current_index(&self) -> usize {
        self.store.current_index()
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        self.store.current()
    }

    pub fn crop_session(&self) -> Option<&CropSession> {
        self.crop.as_ref()
    }

    /// Selects a record (clamped into range). A crop session over another
    /// record is dropped.
    pub fn select(&mut self, index: usize) -> usize {
        let selected = self.store.select(index);
        self.drop_foreign_session();
        selected
    }

    /// Adds an uploaded image and selects it.
    ///
    /// # Errors
    ///
    /// * `EditorError::Codec` - When the image cannot be decoded
    pub fn upload(&mut self, name: &str, image: DataUrl) -> Result<usize, EditorError> {
        let size = image.decode()?.dimensions();
        let id = self.store.allocate_id();
        let index = self.store.append(RecordState::new(id, name, image, size));
        self.drop_foreign_session();
        info!(record = id.0, width = size.0, height = size.1, "Image uploaded");
        Ok(index)
    }

    /// Adds an uploaded file, sniffing its format from the content.
    ///
    /// # Errors
    ///
    /// * `EditorError::Codec` - When the bytes are not a supported image
    pub fn upload_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<usize, EditorError> {
        let mime = image::guess_format(bytes)
            .map(|format| format.to_mime_type())
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        self.upload(name, DataUrl::from_bytes(mime, bytes))
    }

    // Crop

    /// Enters crop mode for the current record shown at `display` size.
    ///
    /// # Errors
    ///
    /// * `EditorError::NoImage` - When the collection is empty
    /// * `EditorError::Crop` - When a crop or detection is already running
    pub fn begin_crop(&mut self, display: (f64, f64)) -> Result<&CropSession, EditorError> {
        let session = self.session_for_current(display)?;
        session.begin()?;
        Ok(&*session)
    }

    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    /// Chooses the aspect ratio of the open crop session and of later ones.
    ///
    /// # Errors
    ///
    /// * `EditorError::Crop` - While a detection is running
    pub fn set_aspect(&mut self, aspect: AspectRatio) -> Result<(), EditorError> {
        if let Some(session) = self.crop.as_mut() {
            session.set_aspect(aspect)?;
        }
        self.aspect = aspect;
        Ok(())
    }

    /// # Errors
    ///
    /// * `EditorError::Crop` - Without an editing session, or for an empty box
    pub fn drag_crop(&mut self, rect: Rect) -> Result<(), EditorError> {
        Ok(self.session_mut()?.drag(rect)?)
    }

    /// # Errors
    ///
    /// * `EditorError::Crop` - Without an editing session, or for a bad size
    pub fn set_crop_size(&mut self, width: f64, height: f64) -> Result<(), EditorError> {
        Ok(self.session_mut()?.set_manual_size(width, height)?)
    }

    /// # Errors
    ///
    /// * `EditorError::Crop` - Without an editing session, or for a non-finite angle
    pub fn set_crop_rotation(&mut self, degrees: f64) -> Result<(), EditorError> {
        Ok(self.session_mut()?.set_rotation(degrees)?)
    }

    pub fn cancel_crop(&mut self) {
        if let Some(session) = self.crop.as_mut() {
            session.cancel();
        }
    }

    /// Commits the crop box to the current record and re-derives its image.
    ///
    /// # Errors
    ///
    /// * `EditorError::Crop` - Without an editing session, or for a box below
    ///   the minimum size; the session stays open
    /// * `EditorError::Codec` / `EditorError::Enhance` - When re-deriving fails
    pub fn save_crop(&mut self) -> Result<CropGeometry, EditorError> {
        let mut session = self.session_mut()?.clone();
        let geometry = session.save()?;

        let state = &self.current_record()?.state;
        let url = self.derive(state, Some(&geometry), &state.enhancement_settings)?;
        self.store.commit(RecordPatch {
            crop_data: Some(Some(geometry.clone())),
            url: Some(url),
            ..Default::default()
        })?;

        self.crop = Some(session);
        Ok(geometry)
    }

    /// Removes the crop of the current record.
    ///
    /// # Errors
    ///
    /// * `EditorError::NoImage` - When the collection is empty
    /// * `EditorError::Codec` / `EditorError::Enhance` - When re-deriving fails
    pub fn clear_crop(&mut self) -> Result<(), EditorError> {
        let state = &self.current_record()?.state;
        let url = self.derive(state, None, &state.enhancement_settings)?;
        self.store.commit(RecordPatch {
            crop_data: Some(None),
            url: Some(url),
            ..Default::default()
        })?;
        Ok(())
    }

    // Face detection

    /// Starts a detection for the current record and returns the request to
    /// send.
    ///
    /// # Errors
    ///
    /// * `EditorError::NoImage` - When the collection is empty
    /// * `EditorError::Crop` - Unless the crop session is idle
    pub fn begin_detection(
        &mut self,
        display: (f64, f64),
    ) -> Result<(DetectionTicket, DetectionRequest), EditorError> {
        let image = self.current_record()?.state.original_url.clone();
        let ticket = self.session_for_current(display)?.begin_detection()?;
        debug!(record = ticket.record_id.0, aspect_ratio = ticket.aspect_ratio, "Detection started");
        Ok((
            ticket,
            DetectionRequest {
                image,
                aspect_ratio: ticket.aspect_ratio,
            },
        ))
    }

    /// Applies a detection outcome. A success opens crop mode with the
    /// detected box shown in display space.
    ///
    /// Returns `Ok(false)` when the result is stale: the user cancelled,
    /// selected or deleted the record, or started another detection.
    ///
    /// # Errors
    ///
    /// * `EditorError::Collaborator` - When the service failed; the session
    ///   returns to idle
    pub fn complete_detection(
        &mut self,
        ticket: &DetectionTicket,
        outcome: Result<DetectionResponse, CollaboratorError>,
    ) -> Result<bool, EditorError> {
        let still_current = self.current().is_some_and(|r| r.id() == ticket.record_id);
        let Some(session) = self.crop.as_mut().filter(|_| still_current) else {
            debug!(record = ticket.record_id.0, "Discarding detection for a record no longer edited");
            return Ok(false);
        };

        match outcome.and_then(DetectionResponse::into_rect) {
            Ok(rect) => Ok(session.apply_detection(ticket, rect)?),
            Err(error) => {
                if session.fail_detection(ticket) {
                    warn!(%error, record = ticket.record_id.0, "Face detection failed");
                    Err(error.into())
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// Runs a detection round trip against `service`.
    ///
    /// # Errors
    ///
    /// See `begin_detection` and `complete_detection`.
    pub fn auto_detect(
        &mut self,
        display: (f64, f64),
        service: &dyn FaceDetection,
    ) -> Result<bool, EditorError> {
        let (ticket, request) = self.begin_detection(display)?;
        let outcome = service.detect(&request);
        self.complete_detection(&ticket, outcome)
    }

    // Enhancement

    /// Renders the current record with `params` without saving anything.
    ///
    /// # Errors
    ///
    /// * `EditorError::NoImage` - When the collection is empty
    /// * `EditorError::Enhance` - For out-of-range parameters or an undecodable original
    pub fn preview_enhancements(&self, params: &EnhancementParams) -> Result<DataUrl, EditorError> {
        let state = &self.current_record()?.state;
        self.derive(state, state.crop_data.as_ref(), params)
    }

    /// Commits `params` to the current record.
    ///
    /// # Errors
    ///
    /// See `preview_enhancements`.
    pub fn save_enhancements(&mut self, params: EnhancementParams) -> Result<(), EditorError> {
        let url = self.preview_enhancements(&params)?;
        self.store.commit(RecordPatch {
            enhancement_settings: Some(params),
            url: Some(url),
            ..Default::default()
        })?;
        Ok(())
    }

    /// Commits the neutral parameter set.
    ///
    /// # Errors
    ///
    /// See `preview_enhancements`.
    pub fn reset_enhancements(&mut self) -> Result<(), EditorError> {
        self.save_enhancements(EnhancementParams::default())
    }

    // Background removal

    /// Request for the background-removal service over the current image.
    ///
    /// # Errors
    ///
    /// * `EditorError::NoImage` - When the collection is empty
    pub fn background_request(
        &self,
        background_colour: Option<String>,
        custom_background: Option<DataUrl>,
        clothing: Option<DataUrl>,
    ) -> Result<BackgroundRemovalRequest, EditorError> {
        Ok(BackgroundRemovalRequest {
            image: Some(self.current_record()?.state.url.clone()),
            background_colour,
            custom_background,
            clothing,
        })
    }

    /// Calls the service. The result is only kept once passed to
    /// `save_background_removal`.
    ///
    /// # Errors
    ///
    /// * `EditorError::Collaborator` - When the service fails
    pub fn remove_background(
        &self,
        request: &BackgroundRemovalRequest,
        service: &dyn BackgroundRemoval,
    ) -> Result<DataUrl, EditorError> {
        let response = service.remove_background(request).inspect_err(|error| {
            warn!(%error, "Background removal failed");
        })?;
        Ok(response.processed_image_data_url)
    }

    /// Appends the processed image as a new record and selects it.
    ///
    /// # Errors
    ///
    /// * `EditorError::NoImage` - When the collection is empty
    /// * `EditorError::Codec` - When the processed image cannot be decoded
    pub fn save_background_removal(&mut self, processed: DataUrl) -> Result<usize, EditorError> {
        let stem = file_stem(self.current_record()?.name()).to_string();
        let extension = OutputFormat::from_mime(processed.mime())
            .map(OutputFormat::extension)
            .unwrap_or("png");
        let name = format!("{stem}_processed.{extension}");
        self.upload(&name, processed)
    }

    // Photo strips

    /// Low-resolution strip of the current record.
    ///
    /// # Errors
    ///
    /// * `EditorError::NoImage` - When the collection is empty
    /// * `EditorError::Strip` - For a bad grid or crop region
    pub fn strip_preview(&self, grid: &GridSpec) -> Result<Image<Rgba<u8>>, EditorError> {
        let state = &self.current_record()?.state;
        let source = self.strip_source(state)?;
        Ok(source.compose_preview(state.crop_data.as_ref(), grid, &self.config.strip)?)
    }

    /// Renders the full-resolution strip of the current record and appends it
    /// as a new record, which becomes current.
    ///
    /// # Errors
    ///
    /// See `strip_preview`; nothing is appended on error.
    #[instrument(skip_all, fields(rows = grid.rows, cols = grid.cols))]
    pub fn create_strip(&mut self, grid: &GridSpec) -> Result<usize, EditorError> {
        let state = &self.current_record()?.state;
        let source = self.strip_source(state)?;
        let strip = source.compose_strip(state.crop_data.as_ref(), grid, &self.config.strip)?;

        let format = self.config.preview_format;
        let name = format!("{}-passport-strip.{}", state.name, format.extension());
        let url = DataUrl::encode(&strip, format, self.config.preview_quality)?;
        self.upload(&name, url)
    }

    // History

    /// # Errors
    ///
    /// * `EditorError::History` - When there is nothing to undo
    pub fn undo(&mut self) -> Result<(), EditorError> {
        Ok(self.store.undo()?)
    }

    /// # Errors
    ///
    /// * `EditorError::History` - When there is nothing to redo
    pub fn redo(&mut self) -> Result<(), EditorError> {
        Ok(self.store.redo()?)
    }

    /// Renames the current record.
    ///
    /// # Errors
    ///
    /// * `EditorError::NoImage` - When the collection is empty
    pub fn rename(&mut self, name: &str) -> Result<(), EditorError> {
        self.current_record()?;
        self.store.commit(RecordPatch {
            name: Some(name.to_string()),
            ..Default::default()
        })?;
        Ok(())
    }

    /// Deletes a record; the selection stays in range and a crop session
    /// over the deleted record is dropped.
    ///
    /// # Errors
    ///
    /// * `EditorError::History` - When `index` addresses no record
    pub fn delete(&mut self, index: usize) -> Result<(), EditorError> {
        self.store.delete(index)?;
        self.drop_foreign_session();
        Ok(())
    }

    // Export

    /// # Errors
    ///
    /// * `EditorError::NoImage` - When the collection is empty
    /// * `EditorError::InvalidExport` / `EditorError::Codec` - See `export_record`
    pub fn export_current(
        &self,
        options: &ExportOptions,
        checker: Option<&dyn ComplianceCheck>,
    ) -> Result<ExportedFile, EditorError> {
        export_record(self.current_record()?, options, checker)
    }

    /// Exports the records at `indices`; out-of-range indices are skipped.
    ///
    /// # Errors
    ///
    /// * `EditorError::InvalidExport` / `EditorError::Codec` - See `export_record`
    pub fn export_selected(
        &self,
        indices: &[usize],
        options: &ExportOptions,
        checker: Option<&dyn ComplianceCheck>,
    ) -> Result<Vec<ExportedFile>, EditorError> {
        let collection = self.store.collection();
        export_batch(
            indices.iter().filter_map(|&i| collection.get(i)),
            options,
            checker,
        )
    }

    fn current_record(&self) -> Result<&ImageRecord, EditorError> {
        self.store.current().ok_or(EditorError::NoImage)
    }

    fn session_mut(&mut self) -> Result<&mut CropSession, CropError> {
        self.crop.as_mut().ok_or(NO_SESSION)
    }

    /// The crop session of the current record, opened on demand.
    ///
    /// An idle session is rebuilt when the display size changes.
    fn session_for_current(&mut self, display: (f64, f64)) -> Result<&mut CropSession, EditorError> {
        let record = self.current_record()?;
        let (id, source) = (record.id(), record.state.original_size());
        let ctx = ScaleContext::new(source, display);

        let session = match self.crop.take() {
            Some(session)
                if session.record_id() == id
                    && (session.state() != CropState::Idle || session.context() == &ctx) =>
            {
                session
            }
            replaced => {
                if let Some(old) = replaced {
                    self.retire(&old);
                }
                let mut session = CropSession::new(id, ctx, &self.config)
                    .continuing_from(self.detection_generation);
                session.set_aspect(self.aspect)?;
                session
            }
        };
        Ok(self.crop.insert(session))
    }

    fn retire(&mut self, session: &CropSession) {
        self.detection_generation = self.detection_generation.max(session.generation());
    }

    fn drop_foreign_session(&mut self) {
        let current = self.store.current().map(ImageRecord::id);
        if self
            .crop
            .as_ref()
            .is_some_and(|session| Some(session.record_id()) != current)
        {
            debug!("Closing crop session of a record that is no longer current");
            if let Some(session) = self.crop.take() {
                self.retire(&session);
            }
        }
    }

    /// Original rendered with its enhancement, uncropped.
    fn strip_source(&self, state: &RecordState) -> Result<Image<Rgba<u8>>, EditorError> {
        let original = state.original_url.decode()?;
        if state.enhancement_settings.is_identity() {
            Ok(original)
        } else {
            Ok(render(&original, &state.enhancement_settings)?)
        }
    }

    /// Derived image of `state` with the given crop and parameters: the
    /// original is enhanced, then cropped. A pristine record derives to its
    /// original unchanged.
    fn derive(
        &self,
        state: &RecordState,
        crop: Option<&CropGeometry>,
        params: &EnhancementParams,
    ) -> Result<DataUrl, EditorError> {
        params.validate()?;
        if crop.is_none() && params.is_identity() {
            return Ok(state.original_url.clone());
        }

        let original = state.original_url.decode()?;
        let enhanced = if params.is_identity() {
            original
        } else {
            render(&original, params)?
        };
        let output = match crop {
            Some(geometry) => enhanced.apply_crop(geometry)?,
            None => enhanced,
        };
        Ok(DataUrl::encode(
            &output,
            self.config.preview_format,
            self.config.preview_quality,
        )?)
    }
}
