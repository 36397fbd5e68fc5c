pub mod codec;
pub mod collaborators;
pub mod config;
pub mod crop;
pub mod editor;
pub mod enhance;
mod error;
pub mod export;
pub mod history;
pub mod kernels;
pub mod strip;
mod utils;

#[cfg(test)]
mod test_utils;

use image::{ImageBuffer, Pixel};

pub use codec::{decode_image, encode_image, DataUrl, OutputFormat};
pub use collaborators::{
    BackgroundRemoval, BackgroundRemovalRequest, BackgroundRemovalResponse, ComplianceCheck,
    ComplianceIssue, ComplianceReport, ComplianceRequest, DetectedBox, DetectionRequest,
    DetectionResponse, FaceDetection,
};
pub use config::{EditorConfig, ExportDefaults, StripConfig};
pub use crop::apply::ApplyCrop;
pub use crop::geometry::{convert, CropGeometry, Rect, ScaleContext, Space};
pub use crop::presets::{AspectPreset, AspectRatio, PRESETS};
pub use crop::session::{CropSession, CropState, DetectionTicket};
pub use editor::Editor;
pub use enhance::filters::{ColorFilter, ColorTransform};
pub use enhance::params::EnhancementParams;
pub use enhance::render::{render, render_to_data_url};
pub use error::{
    CodecError, CollaboratorError, CropError, EditorError, EnhanceError, HistoryError,
    KernelError, ParamError, StorageError, StripError,
};
pub use export::{export_batch, export_record, ExportOptions, ExportedFile};
pub use history::persist::{JsonFileStorage, MemoryStorage, Persister, Storage};
pub use history::record::{ImageRecord, RecordId, RecordPatch, RecordState};
pub use history::store::{Collection, EditorStore, StoreSubscriber};
pub use kernels::box_blur::BoxBlur;
pub use kernels::lab::{lerp, rgb_to_lab, skin_mask, Lab};
pub use kernels::sharpen::Sharpen;
pub use strip::compose::ComposeStrip;
pub use strip::grid::{parse_hex_color, GridSpec};
pub use strip::layout::StripLayout;

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
