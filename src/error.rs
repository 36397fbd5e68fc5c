use thiserror::Error;

/// Error type for the pixel kernels
///
/// Kernels are pure functions over RGBA buffers; they only fail when the
/// buffer or a numeric argument cannot produce a meaningful result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// The input image has a zero width or height
    #[error("Image dimensions must be non-zero")]
    EmptyImage,

    /// A kernel argument is outside its accepted range
    #[error("Invalid kernel parameter: {0}")]
    InvalidParameter(String),
}

/// Error type for data URL handling, decoding and encoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The string is not a `data:<mime>;base64,<payload>` URL
    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(String),

    /// The base64 payload could not be decoded
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// The bytes could not be decoded into a pixel buffer
    ///
    /// Callers recover by leaving the previously derived output untouched.
    #[error("Failed to load image: {0}")]
    Decode(String),

    /// The pixel buffer could not be serialized to the requested format
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// The requested MIME type or format name is not supported
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Error type for enhancement parameter validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// A parameter lies outside its valid range
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        /// Parameter name as shown to the user
        name: &'static str,
        /// Offending value
        value: f32,
        /// Inclusive lower bound
        min: f32,
        /// Inclusive upper bound
        max: f32,
    },
}

/// Error type for the enhancement engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnhanceError {
    /// The source image could not be loaded; the previous output is kept
    #[error(transparent)]
    Source(#[from] CodecError),

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Error type for crop operations
///
/// Every crop error is raised before any state is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropError {
    /// The crop box is smaller than the configured minimum in source pixels
    #[error("Crop of {width}x{height} is below the minimum of {min}x{min} source pixels")]
    BelowMinimum { width: u32, height: u32, min: u32 },

    /// Manual width/height entry was not a usable positive number
    #[error("Invalid crop size: {0}")]
    InvalidSize(String),

    /// The rectangle does not fit inside the source image
    #[error("Crop ({x}, {y}, {width}x{height}) exceeds source bounds {source_width}x{source_height}")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        source_width: u32,
        source_height: u32,
    },

    /// The requested operation is not valid in the current crop state
    #[error("Crop operation not allowed while {0}")]
    InvalidState(&'static str),

    /// No aspect-ratio preset is registered under this label
    #[error("Unknown aspect ratio preset: {0}")]
    UnknownPreset(String),

    /// Display or source dimensions are zero
    #[error("Coordinate space has zero size")]
    DegenerateSpace,
}

/// Error type for undo/redo history operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The undo stack of the record is empty
    #[error("Nothing to undo")]
    NothingToUndo,

    /// The redo stack of the record is empty
    #[error("Nothing to redo")]
    NothingToRedo,

    /// The index does not address a record of the collection
    #[error("Index {index} is out of range for a collection of {len} images")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Error type for photo strip composition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StripError {
    /// Rows or columns are zero or above the configured limit
    #[error("Grid of {rows}x{cols} is invalid (each axis must be 1..={max})")]
    InvalidGrid { rows: u32, cols: u32, max: u32 },

    /// The background colour string is not a hex colour
    #[error("Invalid background colour: {0}")]
    InvalidColor(String),

    /// The crop region is empty or outside the source image
    #[error("Crop region is empty or outside the source image")]
    InvalidRegion,

    /// The source image could not be loaded
    #[error(transparent)]
    Source(#[from] CodecError),
}

/// Error type for calls to the external detection, background-removal and
/// compliance services
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The service answered with a non-success HTTP status
    #[error("Service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The service answered with an `{ error }` body
    #[error("Service error: {0}")]
    Service(String),

    /// The response body did not match the expected contract
    #[error("Malformed service response: {0}")]
    Malformed(String),
}

/// Error type for the persistence mirror
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The collection could not be (de)serialized
    #[error("Storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The serialized collection does not fit in the available quota
    #[error("Storage quota exceeded: {required} bytes needed, {quota} available")]
    QuotaExceeded { required: usize, quota: usize },
}

/// Error type for the high-level editing operations
///
/// Every variant leaves the collection exactly as it was before the call.
#[derive(Debug, Error)]
pub enum EditorError {
    /// No image is loaded
    #[error("No image selected")]
    NoImage,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error(transparent)]
    Enhance(#[from] EnhanceError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Strip(#[from] StripError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Export options are outside their accepted ranges
    #[error("Invalid export option: {0}")]
    InvalidExport(String),
}
