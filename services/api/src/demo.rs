use crate::infra::InMemoryPropertyStore;
use clap::Args;
use listing_intake::error::AppError;
use listing_intake::intake::{
    policy, FieldValue, Navigation, Role, SchemaRegistry, StepView, SubmitError, ValidationEngine,
    WizardController,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Role used for the sanitized snapshot printouts (admin, manager,
    /// staff, readonly). Defaults to staff to show redaction at work.
    #[arg(long)]
    pub(crate) view_role: Option<String>,
    /// Skip the deliberately-broken navigation portion of the script.
    #[arg(long)]
    pub(crate) skip_failures: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        view_role,
        skip_failures,
    } = args;

    let view_role = view_role
        .as_deref()
        .and_then(Role::parse)
        .unwrap_or(Role::Staff);

    let registry = SchemaRegistry::standard();
    registry.verify()?;
    let engine = Arc::new(ValidationEngine::new(registry));
    let store = Arc::new(InMemoryPropertyStore::default());
    let mut wizard = WizardController::new(engine, store);

    println!("Listing intake demo (viewing as {})", view_role.label());
    print_step("opening step", &wizard.current_step(view_role));

    if !skip_failures {
        println!("\nAttempting to advance with an empty step:");
        match wizard.go_to_step(1) {
            Ok(Navigation::Blocked { errors }) => {
                for (field, message) in &errors {
                    println!("  {field}: {message}");
                }
            }
            other => println!("  unexpected outcome: {other:?}"),
        }
    }

    println!("\nFilling the wizard:");
    let edits: &[(&str, FieldValue)] = &[
        ("property_reference", text("APOLLO-A201")),
        ("property_type", text("apartment")),
        ("bedrooms", FieldValue::Number(2.0)),
        ("bathrooms", FieldValue::Number(1.0)),
        ("summary", text("Sunny two-bedroom near Gray's Lake")),
        ("address_line1", text("214 Grand Ave")),
        ("city", text("Des Moines")),
        ("state", text("IA")),
        ("postal_code", text("50309")),
        ("monthly_rent", FieldValue::Number(1180.0)),
        ("security_deposit", FieldValue::Number(1180.0)),
        ("available_from", text("2026-10-01")),
        ("listing_expires", text("2026-12-01")),
        (
            "amenities",
            FieldValue::List(vec!["dishwasher".to_string(), "in-unit laundry".to_string()]),
        ),
        ("pets_allowed", FieldValue::Flag(true)),
        ("lockbox_code", text("9911")),
        ("owner_name", text("Apollo Holdings LLC")),
        ("owner_email", text("owners@apollo.example.com")),
    ];

    for (name, value) in edits {
        if let Err(err) = wizard.update_field(name, value.clone()) {
            println!("  edit rejected for {name}: {err}");
        }
    }

    let progress = wizard.completion();
    println!("\nCompletion after data entry:");
    for category in &progress.categories {
        println!(
            "  {:<10} {:>3}% ({}/{} required)",
            category.label, category.percent, category.filled, category.required
        );
    }
    println!("  overall    {:>3}%", progress.overall);

    println!("\nSanitized snapshot as {}:", view_role.label());
    let snapshot = wizard.sanitized_snapshot(view_role);
    match serde_json::to_string_pretty(&snapshot) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => println!("  snapshot failed to render: {err}"),
    }

    if view_role.is_privileged() {
        println!("\nSensitive previews (masked for display):");
        for field in policy::SENSITIVE_FIELDS {
            if let Some(value) = snapshot.text(field) {
                println!("  {field}: {}", policy::mask(value));
            }
        }
    }

    println!("\nSaving a draft:");
    match wizard.save_draft() {
        Ok(receipt) => println!("  draft stored as {}", receipt.draft_id.0),
        Err(err) => println!("  draft failed: {err}"),
    }

    println!("\nSubmitting:");
    match wizard.submit() {
        Ok(receipt) => println!("  property record created as {}", receipt.property_id.0),
        Err(SubmitError::Rejected { errors, step }) => {
            println!("  rejected at step {step}:");
            for (field, message) in &errors {
                println!("    {field}: {message}");
            }
        }
        Err(err) => println!("  submit failed: {err}"),
    }

    println!("\nFinal phase: {}", wizard.phase().label());
    Ok(())
}

fn print_step(heading: &str, step: &StepView) {
    println!(
        "{heading}: {} ({}/{}) with {} visible fields",
        step.title,
        step.index + 1,
        step.total_steps,
        step.fields.len()
    );
}

fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}
