use serde::{Deserialize, Serialize};

use super::domain::{PropertySnapshot, Role};

/// Identifier handed back by the persistence collaborator for a created
/// property record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Identifier for a persisted draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftId(pub String);

/// Persistence collaborator. Implemented outside the wizard; `create` is
/// only ever called with a snapshot that passed full-entity validation,
/// while drafts are persisted as-is by design.
pub trait PropertyStore: Send + Sync {
    fn create(&self, snapshot: &PropertySnapshot) -> Result<PropertyId, StoreError>;
    fn save_draft(&self, snapshot: &PropertySnapshot) -> Result<DraftId, StoreError>;
}

/// Failure surface of the persistence collaborator. Surfaced to the
/// caller with the snapshot intact so a retry is just another call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a property with this reference already exists")]
    Conflict,
    #[error("property store unavailable: {0}")]
    Unavailable(String),
}

/// Identity collaborator: resolves an opaque session token to a role.
/// Consulted per operation; the wizard never caches the answer.
pub trait SessionDirectory: Send + Sync {
    fn current_role(&self, token: &str) -> Option<Role>;
}
