//! Upload orchestration - runs every file through the validation layers
//!
//! - L1: user id → customer id
//! - L2: size and filename limits
//! - L3: content detection against the current blacklist
//! - L4: second, independent blacklist read
//! - L5: upload record persistence
//!
//! A file is stored only if every layer passes. Batches run files
//! concurrently and report them in input order.

pub mod response;
pub mod scratch;

pub use response::{allowed_file_types, AllowedFileTypes, BatchResponse, UploadData, UploadResponse};
pub use scratch::ScratchFile;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::{Config, LimitsConfig, UploadConfig};
use crate::decision::{self, Allowed, BlockReason, Blocked, Verdict};
use crate::error::{ConfigError, Layer, StoreError, UploadError};
use crate::extension;
use crate::policy::{PolicyResolver, PolicySnapshot};
use crate::store::{CustomerId, NewUpload, Store, UploadRecord};

/// One uploaded file, fully buffered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self { filename, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of running one file through the pipeline
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Passed every layer and was recorded
    Stored {
        record: UploadRecord,
        verdict: Allowed,
    },
    /// Rejected by the blacklist at L3 or L4
    Blocked(Blocked),
    /// Could not be validated or recorded. `verdict` is kept when the
    /// content had already been accepted.
    Failed {
        error: UploadError,
        verdict: Option<Allowed>,
    },
}

impl FileOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, FileOutcome::Stored { .. })
    }

    pub fn layer(&self) -> Layer {
        match self {
            FileOutcome::Stored { .. } => Layer::Persist,
            FileOutcome::Blocked(blocked) => blocked.layer,
            FileOutcome::Failed { error, .. } => error.layer(),
        }
    }
}

/// One entry of a batch, in input position
#[derive(Debug, Clone)]
pub struct FileReport {
    pub filename: String,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub results: Vec<FileReport>,
}

impl BatchReport {
    fn from_results(results: Vec<FileReport>) -> Self {
        let success_count = results.iter().filter(|r| r.outcome.is_stored()).count();
        Self {
            total: results.len(),
            success_count,
            failed_count: results.len() - success_count,
            results,
        }
    }
}

/// Bytes staged on disk, ready for inspection
struct Staged {
    scratch: ScratchFile,
    header: Vec<u8>,
    content_hash: String,
}

/// Validates uploads for a store and records the accepted ones
pub struct UploadGuard<S> {
    store: Arc<S>,
    resolver: PolicyResolver<S>,
    lookup_timeout: Duration,
    limits: LimitsConfig,
    upload: UploadConfig,
    scratch_dir: PathBuf,
}

impl<S> Clone for UploadGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: self.resolver.clone(),
            lookup_timeout: self.lookup_timeout,
            limits: self.limits.clone(),
            upload: self.upload.clone(),
            scratch_dir: self.scratch_dir.clone(),
        }
    }
}

impl<S: Store> UploadGuard<S> {
    /// Build a guard over `store`. Fails when `config` carries a zero limit,
    /// since a zero `upload.concurrency` would never grant a batch permit.
    pub fn new(store: Arc<S>, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let lookup_timeout = config.policy.lookup_timeout();
        Ok(Self {
            resolver: PolicyResolver::new(Arc::clone(&store), lookup_timeout),
            store,
            lookup_timeout,
            limits: config.limits.clone(),
            upload: config.upload.clone(),
            scratch_dir: config.scratch.resolved_dir(),
        })
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one file through L1 to L5
    pub async fn process(&self, user_id: &str, file: FileUpload) -> FileOutcome {
        let filename = file.filename.clone();
        match self.run_layers(user_id, file).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    user_id,
                    filename = %filename,
                    reason = %error.reason_code(),
                    layer = %error.layer(),
                    "Upload rejected: {}",
                    error
                );
                FileOutcome::Failed {
                    error,
                    verdict: None,
                }
            }
        }
    }

    async fn run_layers(&self, user_id: &str, file: FileUpload) -> Result<FileOutcome, UploadError> {
        let customer_id = self.resolve_identity(user_id).await?;
        self.check_basic(&file)?;

        let FileUpload { filename, bytes } = file;
        let size = bytes.len() as u64;
        let reported = extension::extension_of(&filename);

        let staged = self.stage(bytes).await?;
        let content_hash = staged.content_hash.clone();
        let policy = self.read_policy(customer_id, Layer::Signature).await?;
        let verdict = self.analyze(staged, reported.clone(), policy).await?;

        let allowed = match verdict {
            Verdict::Allowed(allowed) => allowed,
            Verdict::Blocked(blocked) => {
                warn!(
                    customer_id = %customer_id,
                    filename = %filename,
                    reason = %blocked.reason.reason_code(),
                    detected = %blocked.detected,
                    "Upload blocked: {}",
                    blocked.message
                );
                return Ok(FileOutcome::Blocked(blocked));
            }
        };
        if let Some(warning) = &allowed.warning {
            warn!(customer_id = %customer_id, filename = %filename, "{}", warning);
        }

        let recheck = self.read_policy(customer_id, Layer::PolicyRecheck).await?;
        if recheck.blocks(&reported) {
            warn!(
                customer_id = %customer_id,
                filename = %filename,
                "Blacklist changed during validation, .{} is now blocked",
                reported
            );
            return Ok(FileOutcome::Blocked(Blocked {
                reason: BlockReason::BlockedByPolicy,
                detected: allowed.detected,
                message: format!(".{reported} files are blocked by policy"),
                reported_extension: reported,
                layer: Layer::PolicyRecheck,
                risk: allowed.risk,
                instruction: None,
            }));
        }

        let upload = NewUpload {
            customer_id,
            filename: filename.clone(),
            extension: reported,
            size,
            content_hash,
        };
        match self.persist(upload).await {
            Ok(record) => {
                info!(
                    customer_id = %customer_id,
                    filename = %filename,
                    upload_id = %record.id,
                    size,
                    "Upload stored"
                );
                Ok(FileOutcome::Stored {
                    record,
                    verdict: allowed,
                })
            }
            Err(source) => {
                error!(customer_id = %customer_id, filename = %filename, error = %source, "Failed to record upload");
                Ok(FileOutcome::Failed {
                    error: UploadError::Persist(source),
                    verdict: Some(allowed),
                })
            }
        }
    }

    /// L1
    async fn resolve_identity(&self, user_id: &str) -> Result<CustomerId, UploadError> {
        let lookup = self.store.resolve_customer_id(user_id);
        let result = match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation: "resolve_customer_id",
                timeout_ms: self.lookup_timeout.as_millis() as u64,
            }),
        };

        result.map_err(|source| UploadError::InvalidUserId {
            user_id: user_id.to_string(),
            source,
        })
    }

    /// L2
    fn check_basic(&self, file: &FileUpload) -> Result<(), UploadError> {
        if file.size() > self.limits.max_file_size {
            return Err(UploadError::FileTooLarge {
                size: file.size(),
                limit: self.limits.max_file_size,
            });
        }
        if file.filename.trim().is_empty() {
            return Err(UploadError::InvalidFilename("filename is empty".into()));
        }
        let len = file.filename.chars().count();
        if len > self.limits.max_filename_len {
            return Err(UploadError::InvalidFilename(format!(
                "filename is {} characters, the maximum is {}",
                len, self.limits.max_filename_len
            )));
        }
        Ok(())
    }

    async fn read_policy(
        &self,
        customer_id: CustomerId,
        layer: Layer,
    ) -> Result<PolicySnapshot, UploadError> {
        self.resolver
            .resolve_blacklist(customer_id)
            .await
            .map_err(|source| UploadError::Policy { layer, source })
    }

    /// Write the bytes to a scratch file and read the header back. Runs on
    /// the blocking pool.
    async fn stage(&self, bytes: Vec<u8>) -> Result<Staged, UploadError> {
        let scratch_dir = self.scratch_dir.clone();
        let header_limit = self.limits.header_inspect_bytes;

        let task = tokio::task::spawn_blocking(move || -> std::io::Result<Staged> {
            let scratch = ScratchFile::create(&scratch_dir, &bytes)?;
            let header = scratch.read_header(header_limit)?;
            debug!(header_len = header.len(), "Read scratch header");

            Ok(Staged {
                scratch,
                header,
                content_hash: blake3::hash(&bytes).to_hex().to_string(),
            })
        });

        match task.await {
            Ok(Ok(staged)) => Ok(staged),
            Ok(Err(e)) => Err(UploadError::Validation(format!("scratch file: {e}"))),
            Err(e) => Err(UploadError::Validation(format!("staging task failed: {e}"))),
        }
    }

    /// L3: decide on the staged header. The scratch file is gone when this
    /// returns.
    async fn analyze(
        &self,
        staged: Staged,
        reported: String,
        policy: PolicySnapshot,
    ) -> Result<Verdict, UploadError> {
        let task = tokio::task::spawn_blocking(move || {
            let Staged {
                scratch, header, ..
            } = staged;
            let verdict = decision::decide(&header, &reported, &policy);
            drop(scratch);
            verdict
        });

        task.await
            .map_err(|e| UploadError::Validation(format!("analysis task failed: {e}")))
    }

    /// L5
    async fn persist(&self, upload: NewUpload) -> Result<UploadRecord, StoreError> {
        let timeout = self.upload.persist_timeout();
        match tokio::time::timeout(timeout, self.store.save_upload_record(upload)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation: "save_upload_record",
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Validate a batch. Request-level limits fail the whole batch; after
    /// that every file gets its own outcome.
    pub async fn process_batch(
        &self,
        user_id: &str,
        files: Vec<FileUpload>,
    ) -> Result<BatchReport, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }
        if files.len() > self.limits.max_batch_files {
            return Err(UploadError::TooManyFiles {
                count: files.len(),
                limit: self.limits.max_batch_files,
            });
        }

        // Process files concurrently with bounded concurrency
        let semaphore = Arc::new(Semaphore::new(self.upload.concurrency));
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            let filename = file.filename.clone();
            let guard = self.clone();
            let user_id = user_id.to_string();
            let semaphore = Arc::clone(&semaphore);

            let handle = tokio::spawn(async move {
                let permit = semaphore.acquire_owned().await;
                let outcome = guard.process(&user_id, file).await;
                drop(permit);
                outcome
            });
            handles.push((filename, handle));
        }

        // Wait for all tasks, in input order
        let mut results = Vec::with_capacity(handles.len());
        for (filename, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(filename = %filename, "Validation task failed: {}", e);
                    FileOutcome::Failed {
                        error: UploadError::Validation(format!("validation task failed: {e}")),
                        verdict: None,
                    }
                }
            };
            results.push(FileReport { filename, outcome });
        }

        let report = BatchReport::from_results(results);
        info!(
            total = report.total,
            success = report.success_count,
            failed = report.failed_count,
            "Batch processed"
        );
        Ok(report)
    }

    /// Single-file entry point returning the wire response
    pub async fn validate_and_maybe_store(&self, user_id: &str, file: FileUpload) -> UploadResponse {
        let filename = file.filename.clone();
        UploadResponse::from_outcome(&filename, self.process(user_id, file).await)
    }

    /// Batch entry point returning the wire response
    pub async fn validate_and_maybe_store_batch(
        &self,
        user_id: &str,
        files: Vec<FileUpload>,
    ) -> BatchResponse {
        match self.process_batch(user_id, files).await {
            Ok(report) => BatchResponse::from_report(report),
            Err(error) => BatchResponse::rejected(&error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{DetectedType, RiskLevel};
    use crate::error::ReasonCode;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    const PE: &[u8] = &[0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00, 0x00, 0x00];
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    struct Fixture {
        store: Arc<MemoryStore>,
        guard: UploadGuard<MemoryStore>,
        customer: CustomerId,
        scratch: TempDir,
    }

    fn fixture() -> Fixture {
        fixture_with(Config::default())
    }

    fn fixture_with(mut config: Config) -> Fixture {
        let scratch = TempDir::new().unwrap();
        config.scratch.dir = Some(scratch.path().to_path_buf());

        let store = Arc::new(MemoryStore::new());
        let customer = store.add_customer("demo1");
        let guard = UploadGuard::new(Arc::clone(&store), &config).unwrap();
        Fixture {
            store,
            guard,
            customer,
            scratch,
        }
    }

    fn scratch_is_empty(fx: &Fixture) -> bool {
        std::fs::read_dir(fx.scratch.path()).unwrap().count() == 0
    }

    #[tokio::test]
    async fn test_clean_upload_is_stored() {
        let fx = fixture();
        let outcome = fx.guard.process("demo1", FileUpload::new("logo.png", PNG)).await;

        match outcome {
            FileOutcome::Stored { record, verdict } => {
                assert_eq!(record.filename, "logo.png");
                assert_eq!(record.extension, "png");
                assert_eq!(record.size, PNG.len() as u64);
                assert_eq!(record.content_hash, blake3::hash(PNG).to_hex().to_string());
                assert_eq!(verdict.detected, DetectedType::Known("png".into()));
            }
            other => panic!("expected stored, got {other:?}"),
        }
        assert_eq!(fx.store.upload_history(fx.customer, 10).len(), 1);
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected_at_l1() {
        let fx = fixture();
        let outcome = fx.guard.process("nobody", FileUpload::new("a.png", PNG)).await;

        let FileOutcome::Failed { error, verdict } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.reason_code(), ReasonCode::InvalidUserId);
        assert_eq!(error.layer(), Layer::Identity);
        assert!(verdict.is_none());
    }

    #[tokio::test]
    async fn test_size_limit_applies_before_content() {
        let mut config = Config::default();
        config.limits.max_file_size = 16;
        let fx = fixture_with(config);

        let mut bytes = PNG.to_vec();
        bytes.resize(17, 0);
        let outcome = fx.guard.process("demo1", FileUpload::new("a.png", bytes)).await;

        let FileOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.reason_code(), ReasonCode::FileTooLarge);
        assert_eq!(error.layer(), Layer::Basic);
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn test_filename_rules() {
        let fx = fixture();

        let outcome = fx.guard.process("demo1", FileUpload::new("  ", PNG)).await;
        assert_eq!(outcome.layer(), Layer::Basic);

        let long = format!("{}.png", "a".repeat(252));
        let outcome = fx.guard.process("demo1", FileUpload::new(long, PNG)).await;
        let FileOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.reason_code(), ReasonCode::InvalidFilename);

        let exact = format!("{}.png", "a".repeat(251));
        let outcome = fx.guard.process("demo1", FileUpload::new(exact, PNG)).await;
        assert!(outcome.is_stored());
    }

    #[tokio::test]
    async fn test_forgery_blocked_and_not_recorded() {
        let fx = fixture();
        fx.store.set_fixed_blocked(fx.customer, "exe", true).unwrap();

        let outcome = fx.guard.process("demo1", FileUpload::new("notes.txt", PE)).await;
        let FileOutcome::Blocked(blocked) = outcome else {
            panic!("expected blocked");
        };
        assert_eq!(blocked.reason, BlockReason::ExtensionForgeryDetected);
        assert_eq!(blocked.risk, RiskLevel::High);
        assert!(fx.store.upload_history(fx.customer, 10).is_empty());
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn test_policy_edit_applies_to_next_upload() {
        let fx = fixture();

        let first = fx.guard.process("demo1", FileUpload::new("a.png", PNG)).await;
        assert!(first.is_stored());

        fx.store.add_custom(fx.customer, "png").unwrap();
        let second = fx.guard.process("demo1", FileUpload::new("b.png", PNG)).await;
        let FileOutcome::Blocked(blocked) = second else {
            panic!("expected blocked");
        };
        assert_eq!(blocked.reason, BlockReason::BlockedByPolicy);

        fx.store.remove_custom(fx.customer, "png").unwrap();
        let third = fx.guard.process("demo1", FileUpload::new("c.png", PNG)).await;
        assert!(third.is_stored());
    }

    #[tokio::test]
    async fn test_policy_outage_never_allows() {
        let fx = fixture();
        fx.store.set_policy_unavailable(true);

        let outcome = fx.guard.process("demo1", FileUpload::new("a.png", PNG)).await;
        let FileOutcome::Failed { error, verdict } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.reason_code(), ReasonCode::PolicyLookupFailed);
        assert!(verdict.is_none());
        assert!(fx.store.upload_history(fx.customer, 10).is_empty());
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn test_full_outage_fails_identity() {
        let fx = fixture();
        fx.store.set_unavailable(true);

        let outcome = fx.guard.process("demo1", FileUpload::new("a.png", PNG)).await;
        assert_eq!(outcome.layer(), Layer::Identity);
        assert!(!outcome.is_stored());
    }

    #[tokio::test]
    async fn test_stalled_policy_lookup_is_check_error() {
        let mut config = Config::default();
        config.policy.lookup_timeout_ms = 20;
        let fx = fixture_with(config);
        fx.store.set_lookup_delay(Some(Duration::from_millis(500)));

        let outcome = fx.guard.process("demo1", FileUpload::new("a.png", PNG)).await;
        let FileOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.reason_code(), ReasonCode::PolicyCheckError);
        assert_eq!(error.layer(), Layer::Signature);
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_verdict() {
        let fx = fixture();
        fx.store.set_reject_writes(true);

        let outcome = fx.guard.process("demo1", FileUpload::new("a.png", PNG)).await;
        let FileOutcome::Failed { error, verdict } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.reason_code(), ReasonCode::UploadError);
        assert_eq!(error.layer(), Layer::Persist);
        let verdict = verdict.unwrap();
        assert_eq!(verdict.detected, DetectedType::Known("png".into()));
        assert_eq!(verdict.risk, RiskLevel::None);
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn test_missing_scratch_dir_is_validation_error() {
        let mut config = Config::default();
        config.scratch.dir = Some(PathBuf::from("/nonexistent/extguard/scratch"));
        let store = Arc::new(MemoryStore::new());
        store.add_customer("demo1");
        let guard = UploadGuard::new(store, &config).unwrap();

        let outcome = guard.process("demo1", FileUpload::new("a.png", PNG)).await;
        let FileOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.reason_code(), ReasonCode::ValidationError);
    }

    #[tokio::test]
    async fn test_scratch_is_staged_before_policy_read() {
        let mut config = Config::default();
        config.scratch.dir = Some(PathBuf::from("/nonexistent/extguard/scratch"));
        let store = Arc::new(MemoryStore::new());
        store.add_customer("demo1");
        store.set_policy_unavailable(true);
        let guard = UploadGuard::new(store, &config).unwrap();

        // Staging fails first, so the policy outage is never reached
        let outcome = guard.process("demo1", FileUpload::new("a.png", PNG)).await;
        let FileOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.reason_code(), ReasonCode::ValidationError);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.upload.concurrency = 0;

        let err = UploadGuard::new(Arc::new(MemoryStore::new()), &config)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ConfigError::Zero {
                field: "upload.concurrency"
            }
        ));
    }

    #[test]
    fn test_unvalidated_limits_rejected() {
        let mut config = Config::default();
        config.limits.max_batch_files = 0;
        assert!(UploadGuard::new(Arc::new(MemoryStore::new()), &config).is_err());

        let mut config = Config::default();
        config.limits.header_inspect_bytes = 0;
        assert!(UploadGuard::new(Arc::new(MemoryStore::new()), &config).is_err());
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let fx = fixture();
        fx.store.set_fixed_blocked(fx.customer, "exe", true).unwrap();

        let files = vec![
            FileUpload::new("one.png", PNG),
            FileUpload::new("two.txt", PE),
            FileUpload::new("three.csv", "a,b\n1,2\n"),
        ];
        let report = fx.guard.process_batch("demo1", files).await.unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failed_count, 1);
        let names: Vec<_> = report.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["one.png", "two.txt", "three.csv"]);
        assert!(report.results[0].outcome.is_stored());
        assert!(matches!(report.results[1].outcome, FileOutcome::Blocked(_)));
        assert!(report.results[2].outcome.is_stored());
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn test_batch_request_limits() {
        let fx = fixture();

        let err = fx.guard.process_batch("demo1", Vec::new()).await.unwrap_err();
        assert_eq!(err.reason_code(), ReasonCode::NoFiles);

        let files = (0..6).map(|i| FileUpload::new(format!("{i}.png"), PNG)).collect();
        let err = fx.guard.process_batch("demo1", files).await.unwrap_err();
        assert_eq!(err.reason_code(), ReasonCode::TooManyFiles);
        assert!(fx.store.upload_history(fx.customer, 10).is_empty());
    }

    #[tokio::test]
    async fn test_from_path_keeps_file_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let file = FileUpload::from_path(&path).await.unwrap();
        assert_eq!(file.filename, "report.pdf");
        assert_eq!(file.bytes, b"%PDF-1.4");
    }
}
