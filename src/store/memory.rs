//! In-process store backing the CLI and the test suite.
//!
//! Mirrors the shape of the relational policy tables: each customer has a
//! toggle per fixed extension plus a list of custom extensions, and accepted
//! uploads are appended to a history.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{CustomerId, IdentityResolver, NewUpload, PolicyStore, UploadRecord, UploadSink};
use crate::error::{PolicyEditError, StoreError};
use crate::policy::rules::{self, FIXED_EXTENSIONS};

#[derive(Debug, Default)]
struct CustomerPolicy {
    fixed: BTreeMap<String, bool>,
    /// Newest last
    custom: Vec<(String, DateTime<Utc>)>,
}

impl CustomerPolicy {
    fn new() -> Self {
        Self {
            fixed: FIXED_EXTENSIONS
                .iter()
                .map(|ext| (ext.to_string(), false))
                .collect(),
            custom: Vec::new(),
        }
    }

    fn blocked(&self) -> Vec<String> {
        let mut blocked: Vec<String> = self
            .fixed
            .iter()
            .filter(|(_, on)| **on)
            .map(|(ext, _)| ext.clone())
            .chain(self.custom.iter().map(|(ext, _)| ext.clone()))
            .collect();
        blocked.sort();
        blocked.dedup();
        blocked
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    users: HashMap<String, CustomerId>,
    policies: HashMap<CustomerId, CustomerPolicy>,
    /// Append-only
    uploads: Vec<UploadRecord>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    unavailable: bool,
    policy_unavailable: bool,
    lookup_delay: Option<Duration>,
    reject_writes: bool,
}

/// Read-side view of one customer's policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPolicyView {
    pub customer_id: CustomerId,
    /// Fixed extension to blocked flag
    pub fixed: BTreeMap<String, bool>,
    /// Custom extensions, newest first
    pub custom: Vec<String>,
    pub custom_count: usize,
}

/// Per-extension upload totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionStats {
    pub extension: String,
    pub upload_count: usize,
    pub total_size: u64,
}

/// Thread-safe in-memory implementation of every store trait
///
/// Upload history is kept for the life of the store and never pruned, so
/// memory grows with every recorded upload. Long-running embedders should
/// back the traits with a real database instead.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    faults: RwLock<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user, returning its customer id. Idempotent per user id.
    pub fn add_customer(&self, user_id: &str) -> CustomerId {
        let mut inner = self.inner.write();
        if let Some(id) = inner.users.get(user_id) {
            return *id;
        }
        inner.next_id += 1;
        let id = CustomerId(inner.next_id);
        inner.users.insert(user_id.to_string(), id);
        inner.policies.insert(id, CustomerPolicy::new());
        id
    }

    pub fn set_fixed_blocked(
        &self,
        customer_id: CustomerId,
        ext: &str,
        blocked: bool,
    ) -> Result<(), PolicyEditError> {
        let ext = rules::validate_fixed_extension(ext)?;
        let mut inner = self.inner.write();
        let policy = inner
            .policies
            .get_mut(&customer_id)
            .ok_or(PolicyEditError::UnknownCustomer(customer_id))?;
        policy.fixed.insert(ext, blocked);
        Ok(())
    }

    /// Add a custom extension, returning the cleaned name
    pub fn add_custom(&self, customer_id: CustomerId, ext: &str) -> Result<String, PolicyEditError> {
        let mut inner = self.inner.write();
        let policy = inner
            .policies
            .get_mut(&customer_id)
            .ok_or(PolicyEditError::UnknownCustomer(customer_id))?;

        let clean =
            rules::validate_custom_extension(ext, policy.custom.iter().map(|(e, _)| e.as_str()))?;
        policy.custom.push((clean.clone(), Utc::now()));
        Ok(clean)
    }

    pub fn remove_custom(&self, customer_id: CustomerId, ext: &str) -> Result<(), PolicyEditError> {
        let ext = ext.trim().to_lowercase();
        let mut inner = self.inner.write();
        let policy = inner
            .policies
            .get_mut(&customer_id)
            .ok_or(PolicyEditError::UnknownCustomer(customer_id))?;

        let before = policy.custom.len();
        policy.custom.retain(|(e, _)| *e != ext);
        if policy.custom.len() == before {
            return Err(PolicyEditError::NotFound(ext));
        }
        Ok(())
    }

    pub fn policy_view(&self, customer_id: CustomerId) -> Option<CustomerPolicyView> {
        let inner = self.inner.read();
        let policy = inner.policies.get(&customer_id)?;
        let custom: Vec<String> = policy
            .custom
            .iter()
            .rev()
            .map(|(ext, _)| ext.clone())
            .collect();

        Some(CustomerPolicyView {
            customer_id,
            fixed: policy.fixed.clone(),
            custom_count: custom.len(),
            custom,
        })
    }

    /// Most recent uploads first
    pub fn upload_history(&self, customer_id: CustomerId, limit: usize) -> Vec<UploadRecord> {
        self.inner
            .read()
            .uploads
            .iter()
            .rev()
            .filter(|record| record.customer_id == customer_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Upload totals per extension, most uploaded first
    pub fn upload_stats_by_extension(&self, customer_id: CustomerId) -> Vec<ExtensionStats> {
        let inner = self.inner.read();
        let mut by_ext: HashMap<&str, ExtensionStats> = HashMap::new();
        for record in inner.uploads.iter().filter(|r| r.customer_id == customer_id) {
            let entry = by_ext
                .entry(record.extension.as_str())
                .or_insert_with(|| ExtensionStats {
                    extension: record.extension.clone(),
                    upload_count: 0,
                    total_size: 0,
                });
            entry.upload_count += 1;
            entry.total_size += record.size;
        }

        let mut stats: Vec<ExtensionStats> = by_ext.into_values().collect();
        stats.sort_by(|a, b| {
            b.upload_count
                .cmp(&a.upload_count)
                .then_with(|| a.extension.cmp(&b.extension))
        });
        stats
    }

    /// Make every read and write fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.write().unavailable = unavailable;
    }

    /// Make only policy lookups fail, leaving identity and writes working
    pub fn set_policy_unavailable(&self, unavailable: bool) {
        self.faults.write().policy_unavailable = unavailable;
    }

    /// Delay each policy lookup
    pub fn set_lookup_delay(&self, delay: Option<Duration>) {
        self.faults.write().lookup_delay = delay;
    }

    /// Reject upload record writes
    pub fn set_reject_writes(&self, reject: bool) {
        self.faults.write().reject_writes = reject;
    }

    pub fn from_fixture(fixture: &PolicyFixture) -> Result<Self, PolicyEditError> {
        let store = Self::new();
        for customer in &fixture.customers {
            let id = store.add_customer(&customer.user_id);
            for ext in &customer.blocked_fixed {
                store.set_fixed_blocked(id, ext, true)?;
            }
            for ext in &customer.custom {
                store.add_custom(id, ext)?;
            }
        }
        Ok(store)
    }

    fn faults(&self) -> Faults {
        *self.faults.read()
    }

    fn customer_for(&self, user_id: &str) -> Result<CustomerId, StoreError> {
        if self.faults().unavailable {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        self.inner
            .read()
            .users
            .get(user_id)
            .copied()
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))
    }

    fn blocked_for(&self, customer_id: CustomerId) -> Result<Vec<String>, StoreError> {
        let faults = self.faults();
        if faults.unavailable || faults.policy_unavailable {
            return Err(StoreError::Unavailable("policy tables are offline".into()));
        }
        self.inner
            .read()
            .policies
            .get(&customer_id)
            .map(CustomerPolicy::blocked)
            .ok_or(StoreError::UnknownCustomer(customer_id))
    }

    fn insert_upload(&self, upload: NewUpload) -> Result<UploadRecord, StoreError> {
        let faults = self.faults();
        if faults.unavailable {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        if faults.reject_writes {
            return Err(StoreError::WriteRejected("upload history is read-only".into()));
        }

        let mut inner = self.inner.write();
        if !inner.policies.contains_key(&upload.customer_id) {
            return Err(StoreError::UnknownCustomer(upload.customer_id));
        }
        let record = UploadRecord::from_new(upload);
        inner.uploads.push(record.clone());
        Ok(record)
    }
}

impl IdentityResolver for MemoryStore {
    async fn resolve_customer_id(&self, user_id: &str) -> Result<CustomerId, StoreError> {
        self.customer_for(user_id)
    }
}

impl PolicyStore for MemoryStore {
    async fn blocked_extensions(&self, customer_id: CustomerId) -> Result<Vec<String>, StoreError> {
        let delay = self.faults().lookup_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.blocked_for(customer_id)
    }
}

impl UploadSink for MemoryStore {
    async fn save_upload_record(&self, upload: NewUpload) -> Result<UploadRecord, StoreError> {
        self.insert_upload(upload)
    }
}

/// TOML description of customers and their policies
///
/// ```toml
/// [[customer]]
/// user_id = "demo1"
/// blocked_fixed = ["exe", "bat"]
/// custom = ["sh"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyFixture {
    #[serde(rename = "customer")]
    pub customers: Vec<FixtureCustomer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureCustomer {
    pub user_id: String,
    pub blocked_fixed: Vec<String>,
    pub custom: Vec<String>,
}

impl PolicyFixture {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy fixture: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse policy fixture: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(customer_id: CustomerId, filename: &str, ext: &str, size: u64) -> NewUpload {
        NewUpload {
            customer_id,
            filename: filename.to_string(),
            extension: ext.to_string(),
            size,
            content_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn test_blocked_is_union_of_fixed_and_custom() {
        let store = MemoryStore::new();
        let id = store.add_customer("demo1");
        store.set_fixed_blocked(id, "exe", true).unwrap();
        store.set_fixed_blocked(id, "bat", true).unwrap();
        store.set_fixed_blocked(id, "bat", false).unwrap();
        store.add_custom(id, "SH").unwrap();

        let blocked = store.blocked_extensions(id).await.unwrap();
        assert_eq!(blocked, vec!["exe", "sh"]);
    }

    #[tokio::test]
    async fn test_identity_resolution() {
        let store = MemoryStore::new();
        let id = store.add_customer("demo1");
        assert_eq!(store.add_customer("demo1"), id);
        assert_eq!(store.resolve_customer_id("demo1").await.unwrap(), id);
        assert_eq!(
            store.resolve_customer_id("ghost").await,
            Err(StoreError::UserNotFound("ghost".into()))
        );
    }

    #[test]
    fn test_policy_view_and_removal() {
        let store = MemoryStore::new();
        let id = store.add_customer("demo1");
        store.add_custom(id, "ju").unwrap();
        store.add_custom(id, "ch").unwrap();
        assert_eq!(
            store.add_custom(id, "ju"),
            Err(PolicyEditError::Duplicate("ju".into()))
        );

        let view = store.policy_view(id).unwrap();
        assert_eq!(view.custom, vec!["ch", "ju"]);
        assert_eq!(view.custom_count, 2);
        assert_eq!(view.fixed.len(), FIXED_EXTENSIONS.len());
        assert!(view.fixed.values().all(|blocked| !blocked));

        store.remove_custom(id, "JU").unwrap();
        assert_eq!(
            store.remove_custom(id, "ju"),
            Err(PolicyEditError::NotFound("ju".into()))
        );
        assert_eq!(store.policy_view(id).unwrap().custom, vec!["ch"]);
    }

    #[test]
    fn test_edits_for_unknown_customer() {
        let store = MemoryStore::new();
        assert_eq!(
            store.set_fixed_blocked(CustomerId(9), "exe", true),
            Err(PolicyEditError::UnknownCustomer(CustomerId(9)))
        );
        assert!(store.policy_view(CustomerId(9)).is_none());
    }

    #[tokio::test]
    async fn test_history_and_stats() {
        let store = MemoryStore::new();
        let a = store.add_customer("a");
        let b = store.add_customer("b");

        store.save_upload_record(upload(a, "1.jpg", "jpg", 10)).await.unwrap();
        store.save_upload_record(upload(a, "2.pdf", "pdf", 5)).await.unwrap();
        store.save_upload_record(upload(a, "3.jpg", "jpg", 20)).await.unwrap();
        store.save_upload_record(upload(b, "4.png", "png", 1)).await.unwrap();

        let history = store.upload_history(a, 2);
        let names: Vec<_> = history.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["3.jpg", "2.pdf"]);

        let stats = store.upload_stats_by_extension(a);
        assert_eq!(stats[0].extension, "jpg");
        assert_eq!(stats[0].upload_count, 2);
        assert_eq!(stats[0].total_size, 30);
        assert_eq!(stats[1].extension, "pdf");
        assert_eq!(stats.len(), 2);
    }

    #[tokio::test]
    async fn test_faults() {
        let store = MemoryStore::new();
        let id = store.add_customer("demo1");

        store.set_reject_writes(true);
        let err = store
            .save_upload_record(upload(id, "a.txt", "txt", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected(_)));

        store.set_unavailable(true);
        assert!(matches!(
            store.blocked_extensions(id).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.resolve_customer_id("demo1").await.is_err());

        store.set_unavailable(false);
        store.set_policy_unavailable(true);
        assert_eq!(store.resolve_customer_id("demo1").await, Ok(id));
        assert!(store.blocked_extensions(id).await.is_err());
    }

    #[test]
    fn test_fixture_parsing() {
        let fixture: PolicyFixture = toml::from_str(
            r#"
            [[customer]]
            user_id = "demo1"
            blocked_fixed = ["exe"]
            custom = ["sh", "ju"]

            [[customer]]
            user_id = "demo2"
            "#,
        )
        .unwrap();

        let store = MemoryStore::from_fixture(&fixture).unwrap();
        let view = store.policy_view(CustomerId(1)).unwrap();
        assert_eq!(view.fixed.get("exe"), Some(&true));
        assert_eq!(view.custom, vec!["ju", "sh"]);
        assert_eq!(store.policy_view(CustomerId(2)).unwrap().custom_count, 0);
    }

    #[test]
    fn test_fixture_rejects_bad_extension() {
        let fixture = PolicyFixture {
            customers: vec![FixtureCustomer {
                user_id: "demo1".into(),
                blocked_fixed: vec!["sh".into()],
                custom: vec![],
            }],
        };
        assert_eq!(
            MemoryStore::from_fixture(&fixture).unwrap_err(),
            PolicyEditError::NotFixed("sh".into())
        );
    }
}
