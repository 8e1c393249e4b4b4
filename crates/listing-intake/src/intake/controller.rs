use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::catalog::{FieldKind, StepCategory};
use super::completion::{completion, CompletionReport};
use super::domain::{FieldErrorMap, FieldValue, PropertySnapshot, Role, WizardPhase};
use super::policy;
use super::schema::CatalogError;
use super::store::{DraftId, PropertyId, PropertyStore, StoreError};
use super::validation::ValidationEngine;

/// Misuse of the controller surface. These are caller defects, distinct
/// from user-input problems (which come back as error maps).
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("step index {index} outside catalog of {len} steps")]
    StepOutOfRange { index: usize, len: usize },
    #[error("another operation is in flight for this session")]
    OperationInFlight,
    #[error("session already completed")]
    SessionComplete,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Why a submit or draft save did not produce a receipt.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("snapshot failed full validation")]
    Rejected { errors: FieldErrorMap, step: usize },
    #[error("another operation is in flight for this session")]
    InFlight,
    #[error("session already completed")]
    SessionComplete,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// Now on the step at this index.
    Entered(usize),
    /// Forward move refused; the current step surfaced these errors.
    Blocked { errors: FieldErrorMap },
}

/// Successful create acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    pub property_id: PropertyId,
}

/// Successful draft-save acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftReceipt {
    pub draft_id: DraftId,
}

/// One field of a step as the rendering collaborator sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
}

/// Serializable view of the current step, already filtered through the
/// sensitive-field policy for the viewing role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub key: &'static str,
    pub title: &'static str,
    pub category: StepCategory,
    pub index: usize,
    pub total_steps: usize,
    pub dirty: bool,
    pub fields: Vec<FieldView>,
    pub errors: FieldErrorMap,
}

/// Stateful core of one wizard session.
///
/// Owns the snapshot exclusively, tracks the current step and surfaced
/// errors, and orchestrates validation, completion tracking, and the
/// persistence collaborator. One controller per in-progress property;
/// the session model is single-threaded, so the only guard needed is the
/// at-most-one-operation-in-flight flag.
pub struct WizardController<S> {
    engine: Arc<ValidationEngine>,
    store: Arc<S>,
    snapshot: PropertySnapshot,
    step_index: usize,
    errors_by_step: BTreeMap<usize, FieldErrorMap>,
    dirty_steps: BTreeSet<usize>,
    phase: WizardPhase,
    pending: bool,
    last_failure: Option<String>,
}

impl<S> WizardController<S>
where
    S: PropertyStore,
{
    pub fn new(engine: Arc<ValidationEngine>, store: Arc<S>) -> Self {
        Self {
            engine,
            store,
            snapshot: PropertySnapshot::new(),
            step_index: 0,
            errors_by_step: BTreeMap::new(),
            dirty_steps: BTreeSet::new(),
            phase: WizardPhase::Editing,
            pending: false,
            last_failure: None,
        }
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Apply one field edit. Never re-validates (validation happens at
    /// step boundaries, not per keystroke) and never waits on a pending
    /// submit or draft save; typing is not queued.
    pub fn update_field(&mut self, name: &str, value: FieldValue) -> Result<(), WizardError> {
        let owner_index = self.owning_step(name)?;

        self.snapshot.set(name, value);
        self.after_edit(owner_index, name);
        Ok(())
    }

    /// Empty a field the same way an edit would.
    pub fn clear_field(&mut self, name: &str) -> Result<(), WizardError> {
        let owner_index = self.owning_step(name)?;

        self.snapshot.clear(name);
        self.after_edit(owner_index, name);
        Ok(())
    }

    fn owning_step(&self, name: &str) -> Result<usize, WizardError> {
        if self.phase.is_terminal() {
            return Err(WizardError::SessionComplete);
        }
        match self.engine.catalog().step_owning(name) {
            Some((index, _)) => Ok(index),
            None => Err(WizardError::UnknownField(name.to_string())),
        }
    }

    fn after_edit(&mut self, owner_index: usize, name: &str) {
        // Optimistically clear the surfaced error for the edited field;
        // the next boundary validation recomputes the map wholesale.
        if let Some(errors) = self.errors_by_step.get_mut(&owner_index) {
            errors.remove(name);
            if errors.is_empty() {
                self.errors_by_step.remove(&owner_index);
            }
        }
        self.dirty_steps.insert(owner_index);

        if self.phase == WizardPhase::Error {
            self.phase = WizardPhase::Editing;
        }
    }

    /// Jump to a step by ordinal. Forward moves validate the step being
    /// left and are refused while its data is invalid; backward moves
    /// (and staying put) never re-validate.
    pub fn go_to_step(&mut self, target: usize) -> Result<Navigation, WizardError> {
        if self.phase.is_terminal() {
            return Err(WizardError::SessionComplete);
        }
        if self.pending {
            return Err(WizardError::OperationInFlight);
        }

        let len = self.engine.catalog().len();
        if target >= len {
            return Err(WizardError::StepOutOfRange { index: target, len });
        }

        if target > self.step_index {
            let current_key = self
                .engine
                .catalog()
                .step_at(self.step_index)
                .map(|step| step.key)
                .ok_or(WizardError::StepOutOfRange {
                    index: self.step_index,
                    len,
                })?;

            self.phase = WizardPhase::Validating;
            let errors = self.engine.validate_step(current_key, &self.snapshot)?;

            if !errors.is_empty() {
                self.errors_by_step.insert(self.step_index, errors.clone());
                self.phase = WizardPhase::Editing;
                return Ok(Navigation::Blocked { errors });
            }

            self.errors_by_step.remove(&self.step_index);
            self.dirty_steps.remove(&self.step_index);
        }

        self.step_index = target;
        self.phase = WizardPhase::Editing;
        Ok(Navigation::Entered(target))
    }

    pub fn advance(&mut self) -> Result<Navigation, WizardError> {
        let next = self.step_index + 1;
        self.go_to_step(next)
    }

    pub fn retreat(&mut self) -> Result<Navigation, WizardError> {
        let previous = self.step_index.saturating_sub(1);
        self.go_to_step(previous)
    }

    /// Full-entity gate and create call. On validation failure the
    /// session jumps to the first invalid step with the error map
    /// surfaced and the store untouched. On store failure the snapshot
    /// survives; retrying is just calling `submit` again.
    pub fn submit(&mut self) -> Result<SubmitReceipt, SubmitError> {
        if self.phase.is_terminal() {
            return Err(SubmitError::SessionComplete);
        }
        if self.pending {
            return Err(SubmitError::InFlight);
        }

        self.phase = WizardPhase::Validating;
        let outcome = self.engine.validate_entity(&self.snapshot);

        if !outcome.valid {
            let step = self
                .engine
                .first_invalid_step(&outcome.errors)
                .unwrap_or(self.step_index);

            self.surface_entity_errors(&outcome.errors);
            self.step_index = step;
            self.phase = WizardPhase::Error;
            return Err(SubmitError::Rejected {
                errors: outcome.errors,
                step,
            });
        }

        self.pending = true;
        self.phase = WizardPhase::Submitting;
        let result = self.store.create(&self.snapshot);
        self.pending = false;

        match result {
            Ok(property_id) => {
                info!(property_id = %property_id.0, "property record created");
                self.phase = WizardPhase::Complete;
                self.errors_by_step.clear();
                self.last_failure = None;
                Ok(SubmitReceipt { property_id })
            }
            Err(error) => {
                self.phase = WizardPhase::Error;
                self.last_failure = Some(error.to_string());
                Err(SubmitError::Store(error))
            }
        }
    }

    /// Persist the snapshot as-is. Drafts are incomplete by design, so
    /// the full-entity gate is bypassed; the single-flight guard still
    /// applies.
    pub fn save_draft(&mut self) -> Result<DraftReceipt, SubmitError> {
        if self.phase.is_terminal() {
            return Err(SubmitError::SessionComplete);
        }
        if self.pending {
            return Err(SubmitError::InFlight);
        }

        self.pending = true;
        let result = self.store.save_draft(&self.snapshot);
        self.pending = false;

        match result {
            Ok(draft_id) => {
                info!(draft_id = %draft_id.0, "draft saved");
                self.last_failure = None;
                Ok(DraftReceipt { draft_id })
            }
            Err(error) => {
                self.phase = WizardPhase::Error;
                self.last_failure = Some(error.to_string());
                Err(SubmitError::Store(error))
            }
        }
    }

    fn surface_entity_errors(&mut self, errors: &FieldErrorMap) {
        self.errors_by_step.clear();
        for (field, message) in errors {
            if let Some((index, _)) = self.engine.catalog().step_owning(field) {
                self.errors_by_step
                    .entry(index)
                    .or_default()
                    .insert(field.clone(), message.clone());
            }
        }
    }

    /// Current step for the rendering collaborator, filtered through the
    /// sensitive-field policy: fields the role may not view are omitted
    /// outright, values and all.
    pub fn current_step(&self, role: Role) -> StepView {
        let catalog = self.engine.catalog();
        let step = catalog
            .step_at(self.step_index)
            .expect("current step index always within catalog");

        let fields = step
            .fields
            .iter()
            .filter(|spec| policy::can_view(role, spec.name))
            .map(|spec| FieldView {
                name: spec.name,
                label: spec.label,
                kind: spec.kind,
                required: spec.required,
                value: self.snapshot.get(spec.name).cloned(),
            })
            .collect();

        let errors = self
            .errors_by_step
            .get(&self.step_index)
            .map(|errors| {
                errors
                    .iter()
                    .filter(|(field, _)| policy::can_view(role, field))
                    .map(|(field, message)| (field.clone(), message.clone()))
                    .collect()
            })
            .unwrap_or_default();

        StepView {
            key: step.key,
            title: step.title,
            category: step.category,
            index: self.step_index,
            total_steps: catalog.len(),
            dirty: self.dirty_steps.contains(&self.step_index),
            fields,
            errors,
        }
    }

    pub fn step_errors(&self, index: usize) -> Option<&FieldErrorMap> {
        self.errors_by_step.get(&index)
    }

    /// Completion recomputed from the live snapshot; independent of any
    /// error state.
    pub fn completion(&self) -> CompletionReport {
        completion(&self.snapshot, self.engine.catalog())
    }

    /// Outbound copy of the snapshot for the given role, passed through
    /// the sensitive-field choke point.
    pub fn sanitized_snapshot(&self, role: Role) -> PropertySnapshot {
        policy::sanitize(&self.snapshot, role)
    }
}
