//! Error types and the reason-code taxonomy shared by every validation layer.
//!
//! Library code returns the typed errors below; the binary and the config
//! loader wrap them in `anyhow` with context.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::CustomerId;

/// Validation stage at which an outcome was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// L1: user id to customer id resolution
    #[serde(rename = "L1_USER_VALIDATION")]
    Identity,
    /// L2: size and filename constraints
    #[serde(rename = "L2_BASIC")]
    Basic,
    /// L3: matched a rule in the signature table
    #[serde(rename = "L3_SIGNATURE")]
    Signature,
    /// L3: identified by the generic content sniffer
    #[serde(rename = "L3_FILETYPE_LIB")]
    FileTypeLib,
    /// L3: classified by the printable-text heuristic
    #[serde(rename = "L3_HEURISTIC")]
    Heuristic,
    /// L3: content type could not be determined
    #[serde(rename = "L3_UNKNOWN")]
    Unknown,
    /// L4: second policy read after the decision
    #[serde(rename = "L4_POLICY")]
    PolicyRecheck,
    /// L5: upload record persistence
    #[serde(rename = "L5_UPLOAD")]
    Persist,
    /// Whole-request checks (batch size)
    #[serde(rename = "REQUEST")]
    Request,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Identity => "L1_USER_VALIDATION",
            Layer::Basic => "L2_BASIC",
            Layer::Signature => "L3_SIGNATURE",
            Layer::FileTypeLib => "L3_FILETYPE_LIB",
            Layer::Heuristic => "L3_HEURISTIC",
            Layer::Unknown => "L3_UNKNOWN",
            Layer::PolicyRecheck => "L4_POLICY",
            Layer::Persist => "L5_UPLOAD",
            Layer::Request => "REQUEST",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable reason attached to every non-success outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    InvalidUserId,
    FileTooLarge,
    InvalidFilename,
    BlockedByPolicy,
    ExtensionForgeryDetected,
    PolicyCheckError,
    PolicyLookupFailed,
    ValidationError,
    UploadError,
    TooManyFiles,
    NoFiles,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::InvalidUserId => "INVALID_USER_ID",
            ReasonCode::FileTooLarge => "FILE_TOO_LARGE",
            ReasonCode::InvalidFilename => "INVALID_FILENAME",
            ReasonCode::BlockedByPolicy => "BLOCKED_BY_POLICY",
            ReasonCode::ExtensionForgeryDetected => "EXTENSION_FORGERY_DETECTED",
            ReasonCode::PolicyCheckError => "POLICY_CHECK_ERROR",
            ReasonCode::PolicyLookupFailed => "POLICY_LOOKUP_FAILED",
            ReasonCode::ValidationError => "VALIDATION_ERROR",
            ReasonCode::UploadError => "UPLOAD_ERROR",
            ReasonCode::TooManyFiles => "TOO_MANY_FILES",
            ReasonCode::NoFiles => "NO_FILES",
        }
    }

    /// Whether repeating the same request unchanged could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReasonCode::PolicyCheckError
                | ReasonCode::PolicyLookupFailed
                | ReasonCode::ValidationError
                | ReasonCode::UploadError
        )
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reported by the external identity, policy and upload stores
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no customer is registered for user '{0}'")]
    UserNotFound(String),

    #[error("customer {0} does not exist")]
    UnknownCustomer(CustomerId),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("write rejected: {0}")]
    WriteRejected(String),
}

/// Failures while deriving a customer's blacklist
#[derive(Debug, Clone, Error)]
pub enum PolicyError {
    #[error("policy lookup failed for customer {customer_id}: {source}")]
    LookupFailed {
        customer_id: CustomerId,
        #[source]
        source: StoreError,
    },

    #[error("policy lookup for customer {customer_id} timed out after {timeout_ms} ms")]
    Timeout {
        customer_id: CustomerId,
        timeout_ms: u64,
    },
}

impl PolicyError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            PolicyError::LookupFailed { .. } => ReasonCode::PolicyLookupFailed,
            PolicyError::Timeout { .. } => ReasonCode::PolicyCheckError,
        }
    }
}

/// Non-verdict failures of the upload pipeline
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("invalid user id '{user_id}': {source}")]
    InvalidUserId {
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error("file is {size} bytes, the maximum is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    #[error("{layer}: {source}")]
    Policy {
        layer: Layer,
        #[source]
        source: PolicyError,
    },

    #[error("signature analysis failed: {0}")]
    Validation(String),

    #[error("upload record could not be saved: {0}")]
    Persist(#[source] StoreError),

    #[error("{count} files submitted, at most {limit} are accepted per request")]
    TooManyFiles { count: usize, limit: usize },

    #[error("no files to upload")]
    NoFiles,
}

impl UploadError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            UploadError::InvalidUserId { .. } => ReasonCode::InvalidUserId,
            UploadError::FileTooLarge { .. } => ReasonCode::FileTooLarge,
            UploadError::InvalidFilename(_) => ReasonCode::InvalidFilename,
            UploadError::Policy { source, .. } => source.reason_code(),
            UploadError::Validation(_) => ReasonCode::ValidationError,
            UploadError::Persist(_) => ReasonCode::UploadError,
            UploadError::TooManyFiles { .. } => ReasonCode::TooManyFiles,
            UploadError::NoFiles => ReasonCode::NoFiles,
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            UploadError::InvalidUserId { .. } => Layer::Identity,
            UploadError::FileTooLarge { .. } | UploadError::InvalidFilename(_) => Layer::Basic,
            UploadError::Policy { layer, .. } => *layer,
            UploadError::Validation(_) => Layer::Signature,
            UploadError::Persist(_) => Layer::Persist,
            UploadError::TooManyFiles { .. } | UploadError::NoFiles => Layer::Request,
        }
    }
}

/// Rejected edits to a customer's extension policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyEditError {
    #[error("extension name is empty")]
    Empty,

    #[error("extension name is {len} characters, the maximum is {max}")]
    TooLong { len: usize, max: usize },

    #[error("extension '{0}' may only contain lower-case letters and digits")]
    InvalidCharacters(String),

    #[error("'{0}' is a fixed extension, toggle it instead of adding it")]
    FixedExtension(String),

    #[error("extension '{0}' is already in the policy")]
    Duplicate(String),

    #[error("custom extension limit of {max} reached")]
    LimitReached { max: usize },

    #[error("'{0}' is not a fixed extension")]
    NotFixed(String),

    #[error("custom extension '{0}' is not in the policy")]
    NotFound(String),

    #[error("customer {0} does not exist")]
    UnknownCustomer(CustomerId),
}

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is {value}, the maximum is {max}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_serialize_screaming() {
        let json = serde_json::to_string(&ReasonCode::ExtensionForgeryDetected).unwrap();
        assert_eq!(json, "\"EXTENSION_FORGERY_DETECTED\"");
        assert_eq!(
            ReasonCode::PolicyLookupFailed.as_str(),
            serde_json::to_value(ReasonCode::PolicyLookupFailed).unwrap()
        );
    }

    #[test]
    fn test_layer_tags_match_serde() {
        for layer in [
            Layer::Identity,
            Layer::Basic,
            Layer::Signature,
            Layer::FileTypeLib,
            Layer::Heuristic,
            Layer::Unknown,
            Layer::PolicyRecheck,
            Layer::Persist,
            Layer::Request,
        ] {
            let json = serde_json::to_value(layer).unwrap();
            assert_eq!(json, layer.as_str());
        }
    }

    #[test]
    fn test_policy_errors_map_to_distinct_codes() {
        let failed = UploadError::Policy {
            layer: Layer::Signature,
            source: PolicyError::LookupFailed {
                customer_id: CustomerId(1),
                source: StoreError::Unavailable("db down".into()),
            },
        };
        let stalled = UploadError::Policy {
            layer: Layer::PolicyRecheck,
            source: PolicyError::Timeout {
                customer_id: CustomerId(1),
                timeout_ms: 50,
            },
        };

        assert_eq!(failed.reason_code(), ReasonCode::PolicyLookupFailed);
        assert_eq!(failed.layer(), Layer::Signature);
        assert_eq!(stalled.reason_code(), ReasonCode::PolicyCheckError);
        assert_eq!(stalled.layer(), Layer::PolicyRecheck);
        assert!(stalled.reason_code().is_retryable());
        assert!(!ReasonCode::BlockedByPolicy.is_retryable());
    }
}
