//! Per-customer blacklist resolution.
//!
//! A [`PolicySnapshot`] is built fresh from the store for every decision and
//! never reused, so a policy edit applies to the very next upload.

pub mod rules;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::PolicyError;
use crate::extension::normalize;
use crate::store::{CustomerId, PolicyStore};

/// One customer's blocked extensions, as read for one decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    customer_id: CustomerId,
    blocked: BTreeSet<String>,
    fetched_at: DateTime<Utc>,
}

impl PolicySnapshot {
    /// Build a snapshot, normalizing every entry. Empty names are dropped so a
    /// file without an extension never matches the blacklist by accident.
    pub fn new<I, S>(customer_id: CustomerId, blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let blocked = blocked
            .into_iter()
            .map(|ext| normalize(ext.as_ref().trim()))
            .filter(|ext| !ext.is_empty())
            .collect();

        Self {
            customer_id,
            blocked,
            fetched_at: Utc::now(),
        }
    }

    /// Whether a normalized extension is blacklisted
    pub fn blocks(&self, ext: &str) -> bool {
        self.blocked.contains(ext)
    }

    pub fn blocked(&self) -> impl Iterator<Item = &str> {
        self.blocked.iter().map(String::as_str)
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}

/// Reads the current blacklist from a [`PolicyStore`] with a bounded wait
pub struct PolicyResolver<S> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S> Clone for PolicyResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: PolicyStore> PolicyResolver<S> {
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Fetch the customer's blacklist. Failures are returned, never replaced
    /// by an empty blacklist.
    pub async fn resolve_blacklist(
        &self,
        customer_id: CustomerId,
    ) -> Result<PolicySnapshot, PolicyError> {
        let lookup = self.store.blocked_extensions(customer_id);

        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(blocked)) => {
                let snapshot = PolicySnapshot::new(customer_id, blocked);
                debug!(
                    customer_id = %customer_id,
                    blocked = snapshot.len(),
                    "Resolved blacklist"
                );
                Ok(snapshot)
            }
            Ok(Err(source)) => {
                error!(customer_id = %customer_id, error = %source, "Policy lookup failed");
                Err(PolicyError::LookupFailed {
                    customer_id,
                    source,
                })
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                error!(customer_id = %customer_id, timeout_ms, "Policy lookup timed out");
                Err(PolicyError::Timeout {
                    customer_id,
                    timeout_ms,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;

    #[test]
    fn test_snapshot_normalizes_entries() {
        let snapshot = PolicySnapshot::new(CustomerId(1), [".EXE", "jpeg", " sh ", "", "."]);
        let blocked: Vec<_> = snapshot.blocked().collect();
        assert_eq!(blocked, vec!["exe", "jpg", "sh"]);
        assert!(snapshot.blocks("jpg"));
        assert!(!snapshot.blocks(""));
    }

    #[tokio::test]
    async fn test_resolver_reads_store_every_time() {
        let store = Arc::new(MemoryStore::new());
        let customer = store.add_customer("demo1");
        let resolver = PolicyResolver::new(Arc::clone(&store), Duration::from_secs(1));

        let first = resolver.resolve_blacklist(customer).await.unwrap();
        assert!(first.is_empty());

        store.set_fixed_blocked(customer, "exe", true).unwrap();
        let second = resolver.resolve_blacklist(customer).await.unwrap();
        assert!(second.blocks("exe"));
    }

    #[tokio::test]
    async fn test_resolver_surfaces_store_failure() {
        let store = Arc::new(MemoryStore::new());
        let customer = store.add_customer("demo1");
        store.set_unavailable(true);
        let resolver = PolicyResolver::new(store, Duration::from_secs(1));

        let err = resolver.resolve_blacklist(customer).await.unwrap_err();
        assert!(matches!(
            err,
            PolicyError::LookupFailed {
                source: StoreError::Unavailable(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_resolver_times_out() {
        let store = Arc::new(MemoryStore::new());
        let customer = store.add_customer("demo1");
        store.set_lookup_delay(Some(Duration::from_millis(500)));
        let resolver = PolicyResolver::new(store, Duration::from_millis(20));

        let err = resolver.resolve_blacklist(customer).await.unwrap_err();
        assert!(matches!(err, PolicyError::Timeout { timeout_ms: 20, .. }));
    }
}
