use std::collections::BTreeSet;

use super::catalog::{CrossRule, FieldConstraint, StepCatalog, StepTemplate};

/// Catalog misconfiguration. These are programming errors: the service
/// verifies the catalog at startup and refuses to boot on failure.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown wizard step '{0}'")]
    UnknownStep(String),
    #[error("step catalog misconfigured: {0}")]
    Definition(String),
}

/// Lookup surface over the step catalog plus entity-level cross rules.
///
/// Schemas compose: the full-entity schema is the union of every step
/// schema together with the rules registered here.
#[derive(Debug)]
pub struct SchemaRegistry {
    catalog: StepCatalog,
    entity_rules: Vec<CrossRule>,
}

impl SchemaRegistry {
    pub fn standard() -> Self {
        Self::new(StepCatalog::standard())
    }

    pub fn new(catalog: StepCatalog) -> Self {
        Self {
            catalog,
            entity_rules: vec![CrossRule::AnyOf {
                fields: &["owner_phone", "owner_email"],
                message: "provide at least one owner contact (phone or email)",
            }],
        }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn entity_rules(&self) -> &[CrossRule] {
        &self.entity_rules
    }

    pub fn schema_for(&self, step_key: &str) -> Result<&StepTemplate, CatalogError> {
        self.catalog
            .step(step_key)
            .ok_or_else(|| CatalogError::UnknownStep(step_key.to_string()))
    }

    /// Startup gate: reject duplicate step keys, duplicate field names,
    /// malformed constraints, and rules over fields the catalog does not
    /// declare.
    pub fn verify(&self) -> Result<(), CatalogError> {
        let mut step_keys = BTreeSet::new();
        let mut field_names = BTreeSet::new();

        for step in self.catalog.steps() {
            if !step_keys.insert(step.key) {
                return Err(CatalogError::Definition(format!(
                    "duplicate step key '{}'",
                    step.key
                )));
            }

            for spec in &step.fields {
                if !field_names.insert(spec.name) {
                    return Err(CatalogError::Definition(format!(
                        "field '{}' declared by more than one step",
                        spec.name
                    )));
                }
                verify_constraint(spec.name, &spec.constraint)?;
            }
        }

        for step in self.catalog.steps() {
            for rule in &step.rules {
                verify_rule(rule, &field_names)?;
            }
        }
        for rule in &self.entity_rules {
            verify_rule(rule, &field_names)?;
        }

        Ok(())
    }
}

fn verify_constraint(field: &str, constraint: &FieldConstraint) -> Result<(), CatalogError> {
    match constraint {
        FieldConstraint::Range { min, max } if min > max => Err(CatalogError::Definition(
            format!("field '{field}' has an inverted numeric range"),
        )),
        FieldConstraint::Length { min, max } if min > max => Err(CatalogError::Definition(
            format!("field '{field}' has an inverted length range"),
        )),
        FieldConstraint::OneOf(values) if values.is_empty() => Err(CatalogError::Definition(
            format!("field '{field}' enumerates no accepted values"),
        )),
        _ => Ok(()),
    }
}

fn verify_rule(rule: &CrossRule, field_names: &BTreeSet<&str>) -> Result<(), CatalogError> {
    match rule {
        CrossRule::DateOrder { start, end, .. } => {
            for name in [start, end] {
                if !field_names.contains(name) {
                    return Err(CatalogError::Definition(format!(
                        "date-order rule references undeclared field '{name}'"
                    )));
                }
            }
            Ok(())
        }
        CrossRule::AnyOf { fields, .. } => {
            if fields.is_empty() {
                return Err(CatalogError::Definition(
                    "any-of rule lists no fields".to_string(),
                ));
            }
            for name in *fields {
                if !field_names.contains(name) {
                    return Err(CatalogError::Definition(format!(
                        "any-of rule references undeclared field '{name}'"
                    )));
                }
            }
            Ok(())
        }
    }
}
