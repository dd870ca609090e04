//! External collaborators: identity resolution, policy storage and upload
//! bookkeeping.
//!
//! The pipeline only talks to these traits. [`MemoryStore`] implements all
//! three for the CLI and for tests.

mod memory;

pub use memory::{CustomerPolicyView, ExtensionStats, FixtureCustomer, MemoryStore, PolicyFixture};

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Internal customer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An accepted upload, ready to be recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUpload {
    pub customer_id: CustomerId,
    pub filename: String,
    /// Normalized reported extension
    pub extension: String,
    pub size: u64,
    /// blake3 of the uploaded bytes, hex encoded
    pub content_hash: String,
}

/// A persisted upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: Uuid,
    pub customer_id: CustomerId,
    pub filename: String,
    pub extension: String,
    pub size: u64,
    pub content_hash: String,
    pub uploaded_at: DateTime<Utc>,
    /// Object storage location. Object storage is not wired up, so this is
    /// always empty.
    pub storage_key: Option<String>,
}

impl UploadRecord {
    pub fn from_new(upload: NewUpload) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: upload.customer_id,
            filename: upload.filename,
            extension: upload.extension,
            size: upload.size,
            content_hash: upload.content_hash,
            uploaded_at: Utc::now(),
            storage_key: None,
        }
    }
}

/// Maps an external user id to the customer owning the policy
pub trait IdentityResolver: Send + Sync + 'static {
    fn resolve_customer_id(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<CustomerId, StoreError>> + Send;
}

/// Authoritative source of blocked extensions
pub trait PolicyStore: Send + Sync + 'static {
    /// Fixed extensions currently toggled on plus every custom extension.
    /// Called once per policy read; implementations must not cache.
    fn blocked_extensions(
        &self,
        customer_id: CustomerId,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

/// Records accepted uploads
pub trait UploadSink: Send + Sync + 'static {
    fn save_upload_record(
        &self,
        upload: NewUpload,
    ) -> impl Future<Output = Result<UploadRecord, StoreError>> + Send;
}

/// Everything the upload pipeline needs from the outside world
pub trait Store: IdentityResolver + PolicyStore + UploadSink {}

impl<T> Store for T where T: IdentityResolver + PolicyStore + UploadSink {}
