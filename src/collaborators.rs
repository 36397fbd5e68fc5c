//! Request/response contracts of the external services: face detection,
//! background removal (optionally replacing clothing) and the compliance
//! check.
//!
//! Transport is the implementor's concern. Calls are never retried; a failure
//! is returned to the caller and no state is written.

use serde::{Deserialize, Serialize};

use crate::codec::DataUrl;
use crate::crop::geometry::{Rect, Space};
use crate::error::CollaboratorError;

/// Body sent to the face-detection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRequest {
    pub image: DataUrl,
    /// Ratio of the active preset; `1` in free-form mode.
    pub aspect_ratio: f64,
}

/// Rectangle returned by the detection service, in source pixels of the
/// full original image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DetectedBox {
    pub fn to_rect(self) -> Rect {
        Rect::new(Space::Source, self.x, self.y, self.width, self.height)
    }
}

/// Body returned by the face-detection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetectionResponse {
    #[serde(rename_all = "camelCase")]
    Success { crop_data: DetectedBox },
    Failure { error: String },
}

impl DetectionResponse {
    /// The detected rectangle, tagged as source space.
    ///
    /// # Errors
    ///
    /// * `CollaboratorError::Service` - For an `{ error }` body
    /// * `CollaboratorError::Malformed` - For a rectangle without area
    pub fn into_rect(self) -> Result<Rect, CollaboratorError> {
        match self {
            Self::Success { crop_data } => {
                let usable = [crop_data.x, crop_data.y, crop_data.width, crop_data.height]
                    .iter()
                    .all(|v| v.is_finite())
                    && crop_data.width > 0.0
                    && crop_data.height > 0.0;
                if usable {
                    Ok(crop_data.to_rect())
                } else {
                    Err(CollaboratorError::Malformed(format!(
                        "detected box {crop_data:?} has no area"
                    )))
                }
            }
            Self::Failure { error } => Err(CollaboratorError::Service(error)),
        }
    }
}

/// Body sent to the background-removal service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundRemovalRequest {
    pub image: Option<DataUrl>,
    /// Hex colour painted behind the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_colour: Option<String>,
    /// Image painted behind the subject instead of a colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_background: Option<DataUrl>,
    /// Clothing overlay for the clothing-replacement variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clothing: Option<DataUrl>,
}

/// Body returned by the background-removal service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundRemovalResponse {
    pub processed_image_data_url: DataUrl,
}

/// Body sent to the compliance checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRequest {
    pub image: DataUrl,
}

/// A reason the checker gave for non-compliance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplianceIssue {
    BackgroundNotWhite,
    FaceNotCentered,
    SizeNotStandard,
    Other(String),
}

impl ComplianceIssue {
    const BACKGROUND: &'static str = "Background colour is not white.";
    const FACE: &'static str = "Face is not centered in the image.";
    const SIZE: &'static str = "Image size is not a typical ID/passport photo size.";

    pub fn parse(message: &str) -> Self {
        match message {
            Self::BACKGROUND => Self::BackgroundNotWhite,
            Self::FACE => Self::FaceNotCentered,
            Self::SIZE => Self::SizeNotStandard,
            other => Self::Other(other.to_string()),
        }
    }

    /// The message exactly as the checker reports it.
    pub fn message(&self) -> &str {
        match self {
            Self::BackgroundNotWhite => Self::BACKGROUND,
            Self::FaceNotCentered => Self::FACE,
            Self::SizeNotStandard => Self::SIZE,
            Self::Other(message) => message,
        }
    }
}

/// Body returned by the compliance checker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub compliant: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ComplianceReport {
    pub fn issues(&self) -> Vec<ComplianceIssue> {
        self.errors.iter().map(|e| ComplianceIssue::parse(e)).collect()
    }
}

/// Face-detection service.
pub trait FaceDetection {
    fn detect(&self, request: &DetectionRequest) -> Result<DetectionResponse, CollaboratorError>;
}

/// Background-removal / clothing-replacement service.
pub trait BackgroundRemoval {
    fn remove_background(
        &self,
        request: &BackgroundRemovalRequest,
    ) -> Result<BackgroundRemovalResponse, CollaboratorError>;
}

/// Compliance-check service.
pub trait ComplianceCheck {
    fn check(&self, request: &ComplianceRequest) -> Result<ComplianceReport, CollaboratorError>;
}

/// Parses a service body, mapping JSON errors to `Malformed`.
///
/// # Errors
///
/// * `CollaboratorError::Malformed` - When the body does not match `T`
pub fn parse_response<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, CollaboratorError> {
    serde_json::from_str(body).map_err(|e| CollaboratorError::Malformed(e.to_string()))
}
