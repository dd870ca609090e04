//! extguard Library
//!
//! Upload-time file extension policy enforcement. Every uploaded file is
//! checked against its customer's extension blacklist, and its magic bytes
//! are compared with the name it was uploaded under so that renamed
//! executables cannot slip through.
//!
//! # Features
//!
//! - **Signature Detection**: ordered magic-byte table with an `infer` fallback
//! - **Always-Fresh Policy**: the blacklist is re-read for every decision
//! - **Fail-Closed**: a failed or stalled policy lookup rejects the file
//! - **Layered Pipeline**: identity, limits, content, policy re-check, persistence
//! - **Scoped Scratch Files**: the on-disk copy is removed on every exit path
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use extguard::store::MemoryStore;
//! use extguard::upload::{FileUpload, UploadGuard};
//! use extguard::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let customer = store.add_customer("demo1");
//!     store.set_fixed_blocked(customer, "exe", true)?;
//!
//!     let guard = UploadGuard::new(store, &Config::default())?;
//!     let file = FileUpload::new("invoice.pdf", std::fs::read("invoice.pdf")?);
//!
//!     let response = guard.validate_and_maybe_store("demo1", file).await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod decision;
pub mod error;
pub mod extension;
pub mod policy;
pub mod signature;
pub mod store;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use decision::{decide, Allowed, BlockReason, Blocked, Confidence, DetectedType, RiskLevel, Verdict};
pub use error::{Layer, PolicyError, ReasonCode, StoreError, UploadError};
pub use extension::{are_compatible, normalize};
pub use policy::{PolicyResolver, PolicySnapshot};
pub use store::{CustomerId, IdentityResolver, MemoryStore, NewUpload, PolicyStore, Store, UploadRecord, UploadSink};
pub use upload::{BatchReport, FileOutcome, FileReport, FileUpload, UploadGuard, UploadResponse};
