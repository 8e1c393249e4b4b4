//! The wizard engine for rental property intake.
//!
//! An ordered step catalog drives a per-session controller that owns the
//! in-progress snapshot, validates at step boundaries, tracks completion
//! per category, and funnels every outbound representation through the
//! sensitive-field policy.

pub mod catalog;
pub mod completion;
pub mod controller;
pub mod domain;
pub mod policy;
pub mod router;
pub mod schema;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{
    CrossRule, FieldConstraint, FieldKind, FieldSpec, StepCatalog, StepCategory, StepTemplate,
};
pub use completion::{completion, CategoryCompletion, CompletionReport};
pub use controller::{
    DraftReceipt, FieldView, Navigation, StepView, SubmitError, SubmitReceipt, WizardController,
    WizardError,
};
pub use domain::{FieldErrorMap, FieldValue, PropertySnapshot, Role, WizardPhase};
pub use router::{intake_router, WizardSessions, ROLE_TOKEN_HEADER};
pub use schema::{CatalogError, SchemaRegistry};
pub use store::{DraftId, PropertyId, PropertyStore, SessionDirectory, StoreError};
pub use validation::{EntityValidation, ValidationEngine};
