use serde::Serialize;

use super::catalog::{StepCatalog, StepCategory};
use super::domain::PropertySnapshot;

/// Fill progress for one category of required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCompletion {
    pub category: StepCategory,
    pub label: &'static str,
    pub filled: usize,
    pub required: usize,
    pub percent: u8,
}

/// Derived progress view; recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub categories: Vec<CategoryCompletion>,
    pub overall: u8,
}

impl CompletionReport {
    pub fn category(&self, category: StepCategory) -> Option<&CategoryCompletion> {
        self.categories.iter().find(|entry| entry.category == category)
    }
}

/// Compute per-category and overall completion from the snapshot and the
/// required-field catalog. Pure and linear in the number of tracked
/// fields; cheap enough to run on every keystroke. No validation happens
/// here — completion and validation are independent passes.
pub fn completion(snapshot: &PropertySnapshot, catalog: &StepCatalog) -> CompletionReport {
    let mut categories: Vec<CategoryCompletion> = Vec::new();

    for step in catalog.steps() {
        let entry = match categories
            .iter_mut()
            .find(|entry| entry.category == step.category)
        {
            Some(entry) => entry,
            None => {
                categories.push(CategoryCompletion {
                    category: step.category,
                    label: step.category.label(),
                    filled: 0,
                    required: 0,
                    percent: 0,
                });
                categories.last_mut().expect("entry just pushed")
            }
        };

        for spec in step.required_fields() {
            entry.required += 1;
            if snapshot.is_filled(spec.name) {
                entry.filled += 1;
            }
        }
    }

    let mut filled_total = 0;
    let mut required_total = 0;
    for entry in &mut categories {
        entry.percent = percentage(entry.filled, entry.required);
        filled_total += entry.filled;
        required_total += entry.required;
    }

    CompletionReport {
        categories,
        overall: percentage(filled_total, required_total),
    }
}

/// A category with zero required fields counts as complete.
fn percentage(filled: usize, required: usize) -> u8 {
    if required == 0 {
        return 100;
    }
    ((filled as f64 / required as f64) * 100.0).round() as u8
}
