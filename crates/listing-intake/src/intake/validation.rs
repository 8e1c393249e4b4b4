use chrono::NaiveDate;
use serde::Serialize;

use super::catalog::{CrossRule, FieldConstraint, FieldKind, FieldSpec, StepCatalog};
use super::domain::{FieldErrorMap, FieldValue, PropertySnapshot};
use super::schema::{CatalogError, SchemaRegistry};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Outcome of the full-entity pre-submit gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityValidation {
    pub valid: bool,
    pub errors: FieldErrorMap,
}

/// Validates snapshots against the declared step schemas.
///
/// Fail-soft over user data: problems come back as error maps, never as
/// `Err`. The `Err` channel is reserved for catalog misuse (an unknown
/// step key), which is a programming error.
#[derive(Debug)]
pub struct ValidationEngine {
    registry: SchemaRegistry,
}

impl ValidationEngine {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn standard() -> Self {
        Self::new(SchemaRegistry::standard())
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &StepCatalog {
        self.registry.catalog()
    }

    /// Validate one step. Every field of the step is evaluated; one
    /// field's failure never suppresses another's. Within a single field
    /// the rule chain stops at the first failure.
    pub fn validate_step(
        &self,
        step_key: &str,
        snapshot: &PropertySnapshot,
    ) -> Result<FieldErrorMap, CatalogError> {
        let step = self.registry.schema_for(step_key)?;
        let mut errors = FieldErrorMap::new();

        for spec in &step.fields {
            if let Some(message) = check_field(spec, snapshot) {
                errors.insert(spec.name.to_string(), message);
            }
        }

        for rule in &step.rules {
            apply_rule(rule, snapshot, &mut errors);
        }

        Ok(errors)
    }

    /// The authoritative pre-submit gate: union of all step validations
    /// plus the entity-level rules.
    pub fn validate_entity(&self, snapshot: &PropertySnapshot) -> EntityValidation {
        let mut errors = FieldErrorMap::new();

        for step in self.registry.catalog().steps() {
            for spec in &step.fields {
                if let Some(message) = check_field(spec, snapshot) {
                    errors.insert(spec.name.to_string(), message);
                }
            }
            for rule in &step.rules {
                apply_rule(rule, snapshot, &mut errors);
            }
        }

        for rule in self.registry.entity_rules() {
            apply_rule(rule, snapshot, &mut errors);
        }

        EntityValidation {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Lowest-ordinal step owning an offending field, for "jump to first
    /// invalid step".
    pub fn first_invalid_step(&self, errors: &FieldErrorMap) -> Option<usize> {
        errors
            .keys()
            .filter_map(|field| self.registry.catalog().step_owning(field))
            .map(|(index, _)| index)
            .min()
    }
}

fn check_field(spec: &FieldSpec, snapshot: &PropertySnapshot) -> Option<String> {
    let value = match snapshot.get(spec.name) {
        Some(value) if value.is_filled() => value,
        _ => {
            if spec.required {
                return Some(format!("{} is required", spec.label));
            }
            return None;
        }
    };

    if let Some(message) = check_kind(spec, value) {
        return Some(message);
    }

    check_constraint(spec, value)
}

fn check_kind(spec: &FieldSpec, value: &FieldValue) -> Option<String> {
    let matches = matches!(
        (spec.kind, value),
        (FieldKind::Text, FieldValue::Text(_))
            | (FieldKind::Number, FieldValue::Number(_))
            | (FieldKind::Flag, FieldValue::Flag(_))
            | (FieldKind::List, FieldValue::List(_))
    );

    if matches {
        None
    } else {
        Some(format!(
            "{} must be a {} value",
            spec.label,
            spec.kind.label()
        ))
    }
}

fn check_constraint(spec: &FieldSpec, value: &FieldValue) -> Option<String> {
    match (&spec.constraint, value) {
        (FieldConstraint::Unconstrained, _) => None,
        (FieldConstraint::Range { min, max }, FieldValue::Number(number)) => {
            if number < min || number > max {
                Some(format!(
                    "{} must be between {} and {}",
                    spec.label, min, max
                ))
            } else {
                None
            }
        }
        (FieldConstraint::Length { min, max }, FieldValue::Text(text)) => {
            let count = text.trim().chars().count();
            if count < *min || count > *max {
                Some(format!(
                    "{} must be {}-{} characters",
                    spec.label, min, max
                ))
            } else {
                None
            }
        }
        (FieldConstraint::OneOf(accepted), FieldValue::Text(text)) => {
            if accepted.contains(&text.trim()) {
                None
            } else {
                Some(format!(
                    "{} must be one of: {}",
                    spec.label,
                    accepted.join(", ")
                ))
            }
        }
        (FieldConstraint::IsoDate, FieldValue::Text(text)) => {
            if parse_date(text).is_some() {
                None
            } else {
                Some(format!("{} must be a date in YYYY-MM-DD format", spec.label))
            }
        }
        (FieldConstraint::Email, FieldValue::Text(text)) => {
            let trimmed = text.trim();
            match trimmed.split_once('@') {
                Some((local, domain))
                    if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') =>
                {
                    None
                }
                _ => Some(format!("{} must be a valid email address", spec.label)),
            }
        }
        // Kind check already failed-fast for mismatched shapes.
        _ => None,
    }
}

fn apply_rule(rule: &CrossRule, snapshot: &PropertySnapshot, errors: &mut FieldErrorMap) {
    match rule {
        CrossRule::DateOrder {
            start,
            end,
            message,
        } => {
            let start_date = snapshot.text(start).and_then(parse_date);
            let end_date = snapshot.text(end).and_then(parse_date);
            if let (Some(start_date), Some(end_date)) = (start_date, end_date) {
                if end_date <= start_date {
                    errors.insert((*end).to_string(), (*message).to_string());
                }
            }
        }
        CrossRule::AnyOf { fields, message } => {
            if !fields.iter().any(|field| snapshot.is_filled(field)) {
                if let Some(anchor) = fields.first() {
                    errors.insert((*anchor).to_string(), (*message).to_string());
                }
            }
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}
