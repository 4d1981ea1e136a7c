//! Shared application state, following the `AppState` shape [`crate::util`]
//! wires into every handler.

use std::sync::Arc;

use crate::forwarder::{Forwarder, HttpForwarder};
use crate::publisher::{BroadcastPublisher, Publisher};
use crate::rule_store::RuleStore;

pub struct AppState {
    pub rule_store: Arc<RuleStore>,
    pub publisher: Arc<dyn Publisher>,
    pub forwarder: Arc<dyn Forwarder>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            rule_store: Arc::new(RuleStore::new()),
            publisher: Arc::new(BroadcastPublisher::new()),
            forwarder: Arc::new(HttpForwarder::from_env()),
        }
    }
}

impl AppState {
    pub fn with_forwarder(forwarder: Arc<dyn Forwarder>) -> Self {
        Self {
            rule_store: Arc::new(RuleStore::new()),
            publisher: Arc::new(BroadcastPublisher::new()),
            forwarder,
        }
    }
}
