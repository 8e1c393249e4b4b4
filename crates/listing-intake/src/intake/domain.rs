use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Value a single form field may hold.
///
/// The wizard operates on a closed set of value kinds so that validation
/// and completion tracking never see untyped data. JSON bodies map onto
/// the variants untagged: booleans, numbers, strings, string arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// A field counts as filled when it carries usable content: non-blank
    /// text, a non-empty list, or any number/flag.
    pub fn is_filled(&self) -> bool {
        match self {
            FieldValue::Text(value) => !value.trim().is_empty(),
            FieldValue::List(values) => !values.is_empty(),
            FieldValue::Number(_) | FieldValue::Flag(_) => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }
}

/// Per-field error messages keyed by field name (dotted paths for nested
/// structure). Recomputed wholesale per validation pass; an empty map
/// means the validated scope is clean.
pub type FieldErrorMap = BTreeMap<String, String>;

/// The accumulated working state of one property record being built.
///
/// Owned exclusively by the wizard controller for the lifetime of a
/// session. Validation and completion tracking read it; only controller
/// field edits write it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySnapshot {
    fields: BTreeMap<String, FieldValue>,
}

impl PropertySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Remove a field entirely; returns whether it was present.
    pub fn clear(&mut self, name: &str) -> bool {
        self.fields.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_text)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(FieldValue::as_number)
    }

    pub fn is_filled(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .map(FieldValue::is_filled)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

/// Caller-supplied actor role for policy decisions.
///
/// Resolved by the external session collaborator per operation; the wizard
/// never stores or infers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Staff,
    ReadOnly,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
            Role::ReadOnly => "readonly",
        }
    }

    /// Privileged roles may see sensitive fields unredacted.
    pub const fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "staff" => Some(Role::Staff),
            "readonly" | "read_only" => Some(Role::ReadOnly),
            _ => None,
        }
    }
}

/// Lifecycle phase of one wizard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardPhase {
    Editing,
    Validating,
    Submitting,
    Error,
    Complete,
}

impl WizardPhase {
    pub const fn label(self) -> &'static str {
        match self {
            WizardPhase::Editing => "editing",
            WizardPhase::Validating => "validating",
            WizardPhase::Submitting => "submitting",
            WizardPhase::Error => "error",
            WizardPhase::Complete => "complete",
        }
    }

    /// Terminal phase: the session is done and the caller discards it.
    pub const fn is_terminal(self) -> bool {
        matches!(self, WizardPhase::Complete)
    }
}
