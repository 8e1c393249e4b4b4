use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use listing_intake::intake::{
    DraftId, PropertyId, PropertySnapshot, PropertyStore, Role, SessionDirectory, StoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory persistence collaborator. Created records key off the
/// property reference so duplicate submissions surface as conflicts.
#[derive(Default)]
pub(crate) struct InMemoryPropertyStore {
    records: Mutex<HashMap<String, PropertySnapshot>>,
    drafts: Mutex<Vec<PropertySnapshot>>,
    property_sequence: AtomicU64,
    draft_sequence: AtomicU64,
}

impl PropertyStore for InMemoryPropertyStore {
    fn create(&self, snapshot: &PropertySnapshot) -> Result<PropertyId, StoreError> {
        let reference = snapshot
            .text("property_reference")
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::Unavailable("snapshot arrived without a reference".to_string())
            })?;

        let mut guard = self.records.lock().expect("record mutex poisoned");
        if guard.contains_key(&reference) {
            return Err(StoreError::Conflict);
        }
        guard.insert(reference, snapshot.clone());

        let id = self.property_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(PropertyId(format!("prop-{id:06}")))
    }

    fn save_draft(&self, snapshot: &PropertySnapshot) -> Result<DraftId, StoreError> {
        self.drafts
            .lock()
            .expect("draft mutex poisoned")
            .push(snapshot.clone());

        let id = self.draft_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(DraftId(format!("draft-{id:06}")))
    }
}

/// Static token table standing in for the external identity provider.
pub(crate) struct StaticSessionDirectory {
    tokens: HashMap<&'static str, Role>,
}

impl Default for StaticSessionDirectory {
    fn default() -> Self {
        let tokens = HashMap::from([
            ("admin-token", Role::Admin),
            ("manager-token", Role::Manager),
            ("staff-token", Role::Staff),
            ("viewer-token", Role::ReadOnly),
        ]);
        Self { tokens }
    }
}

impl SessionDirectory for StaticSessionDirectory {
    fn current_role(&self, token: &str) -> Option<Role> {
        self.tokens.get(token).copied()
    }
}
