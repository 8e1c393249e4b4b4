use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::intake::controller::WizardController;
use crate::intake::domain::{FieldValue, PropertySnapshot, Role};
use crate::intake::store::{DraftId, PropertyId, PropertyStore, SessionDirectory, StoreError};
use crate::intake::validation::ValidationEngine;

pub(super) fn engine() -> Arc<ValidationEngine> {
    Arc::new(ValidationEngine::standard())
}

/// Recording store so tests can assert exactly when persistence happens.
#[derive(Default)]
pub(super) struct MemoryStore {
    created: Mutex<Vec<PropertySnapshot>>,
    drafts: Mutex<Vec<PropertySnapshot>>,
}

impl MemoryStore {
    pub(super) fn created(&self) -> Vec<PropertySnapshot> {
        self.created.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn drafts(&self) -> Vec<PropertySnapshot> {
        self.drafts.lock().expect("store mutex poisoned").clone()
    }
}

impl PropertyStore for MemoryStore {
    fn create(&self, snapshot: &PropertySnapshot) -> Result<PropertyId, StoreError> {
        let mut guard = self.created.lock().expect("store mutex poisoned");
        guard.push(snapshot.clone());
        Ok(PropertyId(format!("prop-{:06}", guard.len())))
    }

    fn save_draft(&self, snapshot: &PropertySnapshot) -> Result<DraftId, StoreError> {
        let mut guard = self.drafts.lock().expect("store mutex poisoned");
        guard.push(snapshot.clone());
        Ok(DraftId(format!("draft-{:06}", guard.len())))
    }
}

/// Store whose first call fails so retry behavior can be exercised.
pub(super) struct FlakyStore {
    inner: MemoryStore,
    failed_once: AtomicBool,
}

impl Default for FlakyStore {
    fn default() -> Self {
        Self {
            inner: MemoryStore::default(),
            failed_once: AtomicBool::new(false),
        }
    }
}

impl FlakyStore {
    pub(super) fn created(&self) -> Vec<PropertySnapshot> {
        self.inner.created()
    }

    fn fail_first(&self) -> Result<(), StoreError> {
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("database offline".to_string()));
        }
        Ok(())
    }
}

impl PropertyStore for FlakyStore {
    fn create(&self, snapshot: &PropertySnapshot) -> Result<PropertyId, StoreError> {
        self.fail_first()?;
        self.inner.create(snapshot)
    }

    fn save_draft(&self, snapshot: &PropertySnapshot) -> Result<DraftId, StoreError> {
        self.fail_first()?;
        self.inner.save_draft(snapshot)
    }
}

/// Store that is permanently down.
pub(super) struct UnavailableStore;

impl PropertyStore for UnavailableStore {
    fn create(&self, _snapshot: &PropertySnapshot) -> Result<PropertyId, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn save_draft(&self, _snapshot: &PropertySnapshot) -> Result<DraftId, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Fixed token table mirroring the service's static directory.
pub(super) struct TokenDirectory;

impl SessionDirectory for TokenDirectory {
    fn current_role(&self, token: &str) -> Option<Role> {
        match token {
            "admin-token" => Some(Role::Admin),
            "manager-token" => Some(Role::Manager),
            "staff-token" => Some(Role::Staff),
            "viewer-token" => Some(Role::ReadOnly),
            _ => None,
        }
    }
}

pub(super) fn controller() -> (WizardController<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (WizardController::new(engine(), store.clone()), store)
}

pub(super) fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

pub(super) fn number(value: f64) -> FieldValue {
    FieldValue::Number(value)
}

pub(super) fn fill_basics<S: PropertyStore>(controller: &mut WizardController<S>) {
    controller
        .update_field("property_reference", text("APOLLO-A201"))
        .expect("known field");
    controller
        .update_field("property_type", text("apartment"))
        .expect("known field");
    controller
        .update_field("bedrooms", number(2.0))
        .expect("known field");
    controller
        .update_field("bathrooms", number(1.0))
        .expect("known field");
}

pub(super) fn fill_location<S: PropertyStore>(controller: &mut WizardController<S>) {
    controller
        .update_field("address_line1", text("214 Grand Ave"))
        .expect("known field");
    controller
        .update_field("city", text("Des Moines"))
        .expect("known field");
    controller
        .update_field("state", text("IA"))
        .expect("known field");
    controller
        .update_field("postal_code", text("50309"))
        .expect("known field");
}

pub(super) fn fill_financial<S: PropertyStore>(controller: &mut WizardController<S>) {
    controller
        .update_field("monthly_rent", number(1180.0))
        .expect("known field");
    controller
        .update_field("available_from", text("2026-10-01"))
        .expect("known field");
}

pub(super) fn fill_contact<S: PropertyStore>(controller: &mut WizardController<S>) {
    controller
        .update_field("owner_name", text("Apollo Holdings LLC"))
        .expect("known field");
    controller
        .update_field("owner_email", text("owners@apollo.example.com"))
        .expect("known field");
}

/// Controller with every required field filled, still on the first step.
pub(super) fn completed_controller() -> (WizardController<MemoryStore>, Arc<MemoryStore>) {
    let (mut controller, store) = controller();
    fill_basics(&mut controller);
    fill_location(&mut controller);
    fill_financial(&mut controller);
    fill_contact(&mut controller);
    (controller, store)
}
