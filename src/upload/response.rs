//! Wire shapes returned to upload clients.

use serde::{Deserialize, Serialize};

use super::{BatchReport, FileOutcome};
use crate::decision::{Allowed, Verdict};
use crate::error::{Layer, ReasonCode, UploadError};
use crate::store::UploadRecord;

/// Payload of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadData {
    pub record: UploadRecord,
    pub validation: Allowed,
}

/// `{success, message, data}` on success,
/// `{success: false, error, reason, layer, details}` otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UploadData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
    /// Verdict behind a rejection, when content inspection got that far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Verdict>,
}

impl UploadResponse {
    pub fn from_outcome(filename: &str, outcome: FileOutcome) -> Self {
        let filename = Some(filename.to_string());
        match outcome {
            FileOutcome::Stored { record, verdict } => Self {
                success: true,
                filename,
                message: Some(
                    verdict
                        .warning
                        .clone()
                        .unwrap_or_else(|| "File uploaded successfully".to_string()),
                ),
                data: Some(UploadData {
                    record,
                    validation: verdict,
                }),
                error: None,
                reason: None,
                layer: None,
                details: None,
            },
            FileOutcome::Blocked(blocked) => Self {
                success: false,
                filename,
                message: None,
                data: None,
                error: Some(blocked.message.clone()),
                reason: Some(blocked.reason.reason_code()),
                layer: Some(blocked.layer),
                details: Some(Verdict::Blocked(blocked)),
            },
            FileOutcome::Failed { error, verdict } => Self {
                success: false,
                filename,
                message: None,
                data: None,
                error: Some(error.to_string()),
                reason: Some(error.reason_code()),
                layer: Some(error.layer()),
                details: verdict.map(Verdict::Allowed),
            },
        }
    }

    /// Whether the client may retry the same file unchanged
    pub fn is_retryable(&self) -> bool {
        self.reason.map(|r| r.is_retryable()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

/// Response for a multi-file request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BatchSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<UploadResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
}

impl BatchResponse {
    pub fn from_report(report: BatchReport) -> Self {
        let summary = BatchSummary {
            total: report.total,
            success: report.success_count,
            failed: report.failed_count,
        };
        let results = report
            .results
            .into_iter()
            .map(|r| UploadResponse::from_outcome(&r.filename, r.outcome))
            .collect();

        Self {
            success: true,
            message: format!(
                "{} files processed ({} succeeded, {} failed)",
                summary.total, summary.success, summary.failed
            ),
            summary: Some(summary),
            results,
            reason: None,
            layer: None,
        }
    }

    /// The request itself was refused; no file was looked at
    pub fn rejected(error: &UploadError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            summary: None,
            results: Vec::new(),
            reason: Some(error.reason_code()),
            layer: Some(error.layer()),
        }
    }
}

/// Client-side hint of what is usually accepted. The customer's blacklist
/// still has the final say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedFileTypes {
    pub allowed_extensions: Vec<AllowedType>,
    pub max_file_size: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedType {
    pub extension: String,
    pub mime: String,
}

const ADVERTISED_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "webp",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // text and data
    "txt", "csv", "json", "xml",
    // archives
    "zip", "rar", "7z",
    // audio and video
    "mp3", "mp4", "avi", "mov",
];

pub fn allowed_file_types(max_file_size: u64) -> AllowedFileTypes {
    let allowed_extensions = ADVERTISED_EXTENSIONS
        .iter()
        .map(|ext| AllowedType {
            extension: ext.to_string(),
            mime: mime_guess::from_ext(ext)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        })
        .collect();

    AllowedFileTypes {
        allowed_extensions,
        max_file_size: humansize::format_size(max_file_size, humansize::BINARY),
        note: "Some extensions may be blocked by your organization's policy".to_string(),
    }
}
