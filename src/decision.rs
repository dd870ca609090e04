//! Decision engine: reported extension + detected content + blacklist → verdict.
//!
//! The blacklist alone decides whether a file is blocked. A mismatch between
//! the reported extension and the detected content only raises the reported
//! risk, and turns a policy block into a forgery block.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Layer, ReasonCode};
use crate::extension::{self, TEXT_EXTENSIONS};
use crate::policy::PolicySnapshot;
use crate::signature;

/// Content type derived from the bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DetectedType {
    /// A normalized extension
    Known(String),
    /// Classified by the text heuristic
    Text,
    Unknown,
}

impl DetectedType {
    pub fn as_str(&self) -> &str {
        match self {
            DetectedType::Known(ext) => ext,
            DetectedType::Text => "text",
            DetectedType::Unknown => "unknown",
        }
    }
}

impl From<String> for DetectedType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => DetectedType::Text,
            "unknown" => DetectedType::Unknown,
            _ => DetectedType::Known(value),
        }
    }
}

impl From<DetectedType> for String {
    fn from(value: DetectedType) -> Self {
        match value {
            DetectedType::Known(ext) => ext,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for DetectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Why a file was blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    BlockedByPolicy,
    ExtensionForgeryDetected,
}

impl BlockReason {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            BlockReason::BlockedByPolicy => ReasonCode::BlockedByPolicy,
            BlockReason::ExtensionForgeryDetected => ReasonCode::ExtensionForgeryDetected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowed {
    pub detected: DetectedType,
    pub reported_extension: String,
    pub layer: Layer,
    pub risk: RiskLevel,
    pub confidence: Confidence,
    pub message: String,
    /// Non-blocking notice, set when the content does not match the name
    /// or could not be identified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocked {
    pub reason: BlockReason,
    pub detected: DetectedType,
    pub reported_extension: String,
    pub layer: Layer,
    pub risk: RiskLevel,
    pub message: String,
    /// What the uploader should do instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

/// Outcome of validating one file's content against a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Allowed(Allowed),
    Blocked(Blocked),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed(_))
    }

    pub fn detected(&self) -> &DetectedType {
        match self {
            Verdict::Allowed(a) => &a.detected,
            Verdict::Blocked(b) => &b.detected,
        }
    }

    pub fn risk(&self) -> RiskLevel {
        match self {
            Verdict::Allowed(a) => a.risk,
            Verdict::Blocked(b) => b.risk,
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            Verdict::Allowed(a) => a.layer,
            Verdict::Blocked(b) => b.layer,
        }
    }

    pub fn reported_extension(&self) -> &str {
        match self {
            Verdict::Allowed(a) => &a.reported_extension,
            Verdict::Blocked(b) => &b.reported_extension,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Verdict::Allowed(a) => &a.message,
            Verdict::Blocked(b) => &b.message,
        }
    }

    /// `None` for allowed files
    pub fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            Verdict::Allowed(_) => None,
            Verdict::Blocked(b) => Some(b.reason.reason_code()),
        }
    }
}

/// What the detectors found
struct Evidence {
    detected: DetectedType,
    /// Extensions the content may legitimately carry
    candidates: Vec<String>,
    layer: Layer,
    confidence: Confidence,
    mime: Option<String>,
    /// Content runs when opened
    active: bool,
}

impl Evidence {
    fn primary(&self) -> &str {
        self.detected.as_str()
    }
}

/// Decide whether `buffer`, uploaded as `reported_extension`, passes `policy`.
pub fn decide(buffer: &[u8], reported_extension: &str, policy: &PolicySnapshot) -> Verdict {
    let reported = extension::normalize(reported_extension);
    let header = signature::header(buffer);

    let evidence = match examine(header) {
        Some(evidence) => evidence,
        None => return unidentified(reported, policy),
    };

    debug!(
        reported = %reported,
        detected = %evidence.detected,
        layer = %evidence.layer,
        "Content identified"
    );
    reconcile(reported, evidence, policy)
}

/// Run the detectors in order of confidence
fn examine(header: &[u8]) -> Option<Evidence> {
    if let Some(rule) = signature::detect(header) {
        let detected = rule.detected_extension();
        return Some(Evidence {
            detected: DetectedType::Known(detected.to_string()),
            candidates: rule.candidates.iter().map(|c| c.to_string()).collect(),
            layer: Layer::Signature,
            confidence: Confidence::High,
            mime: mime_guess::from_ext(detected)
                .first_raw()
                .map(str::to_string),
            active: rule.category.is_active_content(),
        });
    }

    if let Some(sniffed) = signature::sniff(header) {
        return Some(Evidence {
            detected: DetectedType::Known(sniffed.extension.clone()),
            candidates: vec![sniffed.extension],
            layer: Layer::FileTypeLib,
            confidence: Confidence::High,
            mime: Some(sniffed.mime.to_string()),
            active: false,
        });
    }

    if signature::looks_like_text(header) {
        return Some(Evidence {
            detected: DetectedType::Text,
            candidates: TEXT_EXTENSIONS.iter().map(|c| c.to_string()).collect(),
            layer: Layer::Heuristic,
            confidence: Confidence::Low,
            mime: Some("text/plain".to_string()),
            active: false,
        });
    }

    None
}

/// Nothing recognized the bytes: only the reported extension can be judged
fn unidentified(reported: String, policy: &PolicySnapshot) -> Verdict {
    if policy.blocks(&reported) {
        return Verdict::Blocked(Blocked {
            reason: BlockReason::BlockedByPolicy,
            detected: DetectedType::Unknown,
            message: format!(".{reported} files are blocked by policy"),
            reported_extension: reported,
            layer: Layer::Unknown,
            risk: RiskLevel::Low,
            instruction: None,
        });
    }

    Verdict::Allowed(Allowed {
        detected: DetectedType::Unknown,
        message: format!("{} accepted", subject(&reported)),
        reported_extension: reported,
        layer: Layer::Unknown,
        risk: RiskLevel::Low,
        confidence: Confidence::Low,
        warning: Some(
            "file type could not be identified; make sure it comes from a trusted source".into(),
        ),
        mime: None,
    })
}

fn reconcile(reported: String, evidence: Evidence, policy: &PolicySnapshot) -> Verdict {
    let detected = evidence.primary().to_string();

    // Case A: the content is one of the types the name claims
    if evidence.candidates.iter().any(|c| *c == reported) {
        if policy.blocks(&reported) {
            return Verdict::Blocked(Blocked {
                reason: BlockReason::BlockedByPolicy,
                detected: evidence.detected,
                message: format!(".{reported} files are blocked by policy"),
                reported_extension: reported,
                layer: evidence.layer,
                risk: RiskLevel::None,
                instruction: None,
            });
        }

        let detected = match evidence.detected {
            DetectedType::Known(_) => DetectedType::Known(reported.clone()),
            other => other,
        };
        return Verdict::Allowed(Allowed {
            detected,
            message: format!(".{reported} file accepted"),
            reported_extension: reported,
            layer: evidence.layer,
            risk: RiskLevel::None,
            confidence: evidence.confidence,
            warning: None,
            mime: evidence.mime,
        });
    }

    // Case B: a different spelling of the same real type
    if extension::are_compatible(&reported, &detected) {
        if policy.blocks(&reported) || policy.blocks(&detected) {
            return Verdict::Blocked(Blocked {
                reason: BlockReason::BlockedByPolicy,
                detected: evidence.detected,
                message: format!(".{reported}/.{detected} files are blocked by policy"),
                reported_extension: reported,
                layer: evidence.layer,
                risk: RiskLevel::None,
                instruction: None,
            });
        }

        return Verdict::Allowed(Allowed {
            detected: evidence.detected,
            message: format!(".{reported} and .{detected} are compatible extensions"),
            reported_extension: reported,
            layer: evidence.layer,
            risk: RiskLevel::None,
            confidence: evidence.confidence,
            warning: None,
            mime: evidence.mime,
        });
    }

    // Case C: the name disguises the content
    let claimed = match reported.as_str() {
        "" => "without an extension".to_string(),
        ext => format!("as .{ext}"),
    };
    if policy.blocks(&reported) || policy.blocks(&detected) {
        let instruction = if reported.is_empty() {
            format!("rename the file to .{detected} and upload it again")
        } else {
            format!(
                "rename the file to .{detected} and upload it again, or upload a genuine \
                 .{reported} file"
            )
        };
        return Verdict::Blocked(Blocked {
            reason: BlockReason::ExtensionForgeryDetected,
            detected: evidence.detected,
            message: format!(
                "security risk: file was uploaded {claimed} but its content is .{detected}, \
                 which is blocked by policy"
            ),
            instruction: Some(instruction),
            reported_extension: reported,
            layer: evidence.layer,
            risk: RiskLevel::High,
        });
    }

    let mut warning = format!(
        "extension mismatch: file was uploaded {claimed} but its content is .{detected}; \
         allowed by policy, review before trusting it"
    );
    if evidence.active {
        warning.push_str(" (the content is executable)");
    }
    Verdict::Allowed(Allowed {
        detected: evidence.detected,
        message: format!("{} accepted with an extension mismatch", subject(&reported)),
        warning: Some(warning),
        reported_extension: reported,
        layer: evidence.layer,
        risk: RiskLevel::Medium,
        confidence: evidence.confidence,
        mime: evidence.mime,
    })
}

/// How a file is named in messages
fn subject(reported: &str) -> String {
    if reported.is_empty() {
        "file without an extension".to_string()
    } else {
        format!(".{reported} file")
    }
}
