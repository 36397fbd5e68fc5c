//! Data-URL encoded images: the persisted and exchanged form of every pixel
//! buffer (originals, derived renders, collaborator payloads).

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, Rgba};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::Image;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG; the only format that honours a quality setting.
    #[default]
    Jpeg,
    /// Lossless PNG.
    Png,
    /// Lossless WebP.
    #[serde(rename = "webp")]
    WebP,
}

impl OutputFormat {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// File extension used for exported files.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    pub fn from_mime(mime: &str) -> Result<Self, CodecError> {
        match mime {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::WebP),
            other => Err(CodecError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A `data:<mime>;base64,<payload>` image.
///
/// The URL text is shared behind an `Arc`, so cloning a record snapshot does
/// not copy pixel payloads.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUrl(Arc<str>);

impl DataUrl {
    /// Validates and wraps a data URL string.
    pub fn parse(url: impl Into<String>) -> Result<Self, CodecError> {
        let url = url.into();
        split_data_url(&url)?;
        Ok(Self(Arc::from(url)))
    }

    /// Wraps raw encoded bytes with their MIME type.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(Arc::from(format!(
            "{DATA_PREFIX}{mime}{BASE64_MARKER}{}",
            STANDARD.encode(bytes)
        )))
    }

    /// Encodes a pixel buffer into a data URL of the given format.
    ///
    /// `quality` (1–100) only affects JPEG.
    pub fn encode(
        image: &Image<Rgba<u8>>,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Self, CodecError> {
        let bytes = encode_image(image, format, quality)?;
        Ok(Self::from_bytes(format.mime(), &bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the URL text in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn mime(&self) -> &str {
        split_data_url(&self.0).map_or("", |(mime, _)| mime)
    }

    /// Decodes the base64 payload into the encoded image bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, CodecError> {
        let (_, payload) = split_data_url(&self.0)?;
        STANDARD
            .decode(payload)
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))
    }

    /// Decodes the image into an RGBA pixel buffer.
    pub fn decode(&self) -> Result<Image<Rgba<u8>>, CodecError> {
        decode_image(&self.bytes()?)
    }

    /// Reads the image dimensions from its header without decoding pixels.
    pub fn dimensions(&self) -> Result<(u32, u32), CodecError> {
        let bytes = self.bytes()?;
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| CodecError::Decode(e.to_string()))
    }
}

impl fmt::Debug for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUrl")
            .field("mime", &self.mime())
            .field("len", &self.len())
            .finish()
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DataUrl {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DataUrl> for String {
    fn from(value: DataUrl) -> Self {
        value.0.to_string()
    }
}

fn split_data_url(url: &str) -> Result<(&str, &str), CodecError> {
    let rest = url
        .strip_prefix(DATA_PREFIX)
        .ok_or_else(|| CodecError::MalformedDataUrl("missing `data:` prefix".to_string()))?;
    let marker = rest
        .find(BASE64_MARKER)
        .ok_or_else(|| CodecError::MalformedDataUrl("missing `;base64,` marker".to_string()))?;
    Ok((&rest[..marker], &rest[marker + BASE64_MARKER.len()..]))
}

/// Decodes encoded image bytes (PNG, JPEG or WebP) into an RGBA buffer.
pub fn decode_image(bytes: &[u8]) -> Result<Image<Rgba<u8>>, CodecError> {
    let image = image::load_from_memory(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(CodecError::Decode("image dimensions are zero".to_string()));
    }
    Ok(image.to_rgba8())
}

/// Encodes an RGBA buffer into the given format.
///
/// JPEG has no alpha channel, so alpha is dropped before encoding.
pub fn encode_image(
    image: &Image<Rgba<u8>>,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, CodecError> {
    let (width, height) = image.dimensions();
    let mut buffer = Vec::new();

    let result = match format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::Png => PngEncoder::new(&mut buffer).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        OutputFormat::WebP => WebPEncoder::new_lossless(&mut buffer).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    };

    result.map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_gradient_rgba_image, png_data_url};

    #[test]
    fn png_round_trip_is_lossless() {
        let image = create_gradient_rgba_image(12, 8);
        let url = png_data_url(&image);

        assert!(url.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(url.mime(), "image/png");
        assert_eq!(url.decode().unwrap(), image);
        assert_eq!(url.dimensions().unwrap(), (12, 8));
    }

    #[test]
    fn jpeg_encoding_produces_jpeg_magic() {
        let image = create_gradient_rgba_image(16, 16);
        let bytes = encode_image(&image, OutputFormat::Jpeg, 80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn webp_encoding_produces_riff_container() {
        let image = create_gradient_rgba_image(16, 16);
        let bytes = encode_image(&image, OutputFormat::WebP, 100).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(decode_image(&bytes).unwrap(), image);
    }

    #[test]
    fn parse_rejects_non_data_urls() {
        assert!(matches!(
            DataUrl::parse("https://example.com/a.png"),
            Err(CodecError::MalformedDataUrl(_))
        ));
        assert!(matches!(
            DataUrl::parse("data:image/png,abc"),
            Err(CodecError::MalformedDataUrl(_))
        ));
    }

    #[test]
    fn decode_reports_load_failure_for_garbage() {
        let url = DataUrl::from_bytes("image/png", b"not an image");
        assert!(matches!(url.decode(), Err(CodecError::Decode(_))));
    }

    #[test]
    fn invalid_base64_is_reported() {
        let url = DataUrl::parse("data:image/png;base64,@@@").unwrap();
        assert!(matches!(url.bytes(), Err(CodecError::InvalidBase64(_))));
    }

    #[test]
    fn serde_uses_plain_string() {
        let url = DataUrl::from_bytes("image/png", &[1, 2, 3]);
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, format!("\"{}\"", url.as_str()));

        let back: DataUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, url);
        assert!(serde_json::from_str::<DataUrl>("\"plain text\"").is_err());
    }

    #[test]
    fn format_metadata() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::WebP.mime(), "image/webp");
        assert_eq!(OutputFormat::from_mime("image/png").unwrap(), OutputFormat::Png);
        assert!(OutputFormat::from_mime("image/gif").is_err());
    }
}
