//! Export surface: turns records into `(bytes, filename)` pairs in the chosen
//! format, quality and scale.
//!
//! Export reads records only. A compliance checker, when given, annotates
//! each file; its failures are logged and never stop the export.

use std::collections::HashSet;

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::codec::{encode_image, OutputFormat};
use crate::collaborators::{ComplianceCheck, ComplianceReport, ComplianceRequest};
use crate::config::ExportDefaults;
use crate::error::EditorError;
use crate::history::record::ImageRecord;
use crate::utils::file_stem;

/// Stem used when neither the options nor the record provide one.
const FALLBACK_STEM: &str = "image";

pub const QUALITY_RANGE: (u8, u8) = (10, 100);
pub const SCALE_RANGE: (u32, u32) = (10, 200);

/// User choices for one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub format: OutputFormat,
    /// JPEG quality; ignored by the lossless formats.
    pub quality: u8,
    pub scale_percent: u32,
    /// File name without extension; defaults to the record name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&ExportDefaults::default())
    }
}

impl From<&ExportDefaults> for ExportOptions {
    fn from(defaults: &ExportDefaults) -> Self {
        Self {
            format: defaults.format,
            quality: defaults.quality,
            scale_percent: defaults.scale_percent,
            filename: None,
        }
    }
}

impl ExportOptions {
    /// # Errors
    ///
    /// * `EditorError::InvalidExport` - When quality or scale is out of range
    pub fn validate(&self) -> Result<(), EditorError> {
        let (qmin, qmax) = QUALITY_RANGE;
        if !(qmin..=qmax).contains(&self.quality) {
            return Err(EditorError::InvalidExport(format!(
                "quality {} is outside {qmin}..={qmax}",
                self.quality
            )));
        }
        let (smin, smax) = SCALE_RANGE;
        if !(smin..=smax).contains(&self.scale_percent) {
            return Err(EditorError::InvalidExport(format!(
                "scale {}% is outside {smin}..={smax}%",
                self.scale_percent
            )));
        }
        Ok(())
    }

    fn stem<'a>(&'a self, record: &'a ImageRecord) -> &'a str {
        if let Some(name) = self.filename.as_deref().map(str::trim) {
            if !name.is_empty() {
                return name;
            }
        }
        let stem = file_stem(record.name()).trim();
        if stem.is_empty() {
            FALLBACK_STEM
        } else {
            stem
        }
    }
}

/// One exported file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Present when a checker was consulted and answered.
    pub compliance: Option<ComplianceReport>,
}

impl ExportedFile {
    /// Size estimate shown next to the export controls.
    pub fn size_kib(&self) -> usize {
        (self.bytes.len() + 512) / 1024
    }
}

/// Exports the current rendering of `record`.
///
/// # Errors
///
/// * `EditorError::InvalidExport` - When the options are out of range
/// * `EditorError::Codec` - When the record image cannot be decoded or encoded
#[instrument(skip_all, fields(record = record.id().0, format = ?options.format))]
pub fn export_record(
    record: &ImageRecord,
    options: &ExportOptions,
    checker: Option<&dyn ComplianceCheck>,
) -> Result<ExportedFile, EditorError> {
    options.validate()?;

    let image = record.state.url.decode()?;
    let (width, height) = scaled_size(image.dimensions(), options.scale_percent);
    let image = if (width, height) == image.dimensions() {
        image
    } else {
        imageops::resize(&image, width, height, FilterType::Triangle)
    };
    let bytes = encode_image(&image, options.format, options.quality)?;

    let compliance = checker.and_then(|checker| {
        let request = ComplianceRequest {
            image: record.state.url.clone(),
        };
        checker
            .check(&request)
            .inspect_err(|error| {
                warn!(%error, record = record.id().0, "Compliance check failed; exporting anyway");
            })
            .ok()
    });

    let filename = format!("{}.{}", options.stem(record), options.format.extension());
    debug!(%filename, width, height, bytes = bytes.len(), "Record exported");

    Ok(ExportedFile {
        filename,
        mime: options.format.mime(),
        bytes,
        width,
        height,
        compliance,
    })
}

/// Exports several records with the same options, renaming colliding
/// filenames to `name (1).ext`, `name (2).ext`, ...
///
/// # Errors
///
/// The first error of `export_record`; nothing is returned in that case.
pub fn export_batch<'a>(
    records: impl IntoIterator<Item = &'a ImageRecord>,
    options: &ExportOptions,
    checker: Option<&dyn ComplianceCheck>,
) -> Result<Vec<ExportedFile>, EditorError> {
    let mut taken = HashSet::new();
    records
        .into_iter()
        .map(|record| {
            let mut file = export_record(record, options, checker)?;
            file.filename = unique_name(&file.filename, &mut taken);
            Ok(file)
        })
        .collect()
}

fn unique_name(filename: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(filename.to_string()) {
        return filename.to_string();
    }
    let (stem, ext) = match filename.rfind('.') {
        Some(dot) => filename.split_at(dot),
        None => (filename, ""),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn scaled_size((width, height): (u32, u32), percent: u32) -> (u32, u32) {
    let scale = |v: u32| ((f64::from(v) * f64::from(percent) / 100.0).round() as u32).max(1);
    (scale(width), scale(height))
}
