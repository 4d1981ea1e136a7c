//! Per-client rule store (component A).
//!
//! Rules live in memory only. Reads take a cheap snapshot (`Arc` clone under
//! a short read lock); writes atomically replace a client's whole list under
//! a short write lock, so a reader never observes a torn update. Guarded by
//! `tokio::sync::RwLock`, matching how the rest of this service's shared,
//! runtime-reloadable state is guarded.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::rule::{Rule, RuleList};

#[derive(Default)]
pub struct RuleStore {
    inner: RwLock<HashMap<String, Arc<RuleList>>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the rule list for `client_id`, or an empty list if unknown.
    pub async fn get(&self, client_id: &str) -> Arc<RuleList> {
        self.inner.read().await.get(client_id).cloned().unwrap_or_default()
    }

    /// Atomically replace the rule list for `client_id`.
    ///
    /// Pre-compiles every `regexp` rule before publishing the list, so a
    /// malformed pattern is rejected wholesale rather than surfacing as a
    /// panic the first time the matcher reaches it.
    pub async fn put(&self, client_id: String, mut rules: RuleList) -> Result<(), String> {
        for rule in &mut rules {
            rule.compile()?;
        }
        self.inner.write().await.insert(client_id, Arc::new(rules));
        Ok(())
    }

    /// Remove all rules for `client_id`, if any exist.
    pub async fn clear(&self, client_id: &str) {
        self.inner.write().await.remove(client_id);
    }
}
