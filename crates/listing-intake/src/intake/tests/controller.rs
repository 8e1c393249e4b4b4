use std::sync::Arc;

use super::common::*;
use crate::intake::controller::{Navigation, SubmitError, WizardController, WizardError};
use crate::intake::domain::{Role, WizardPhase};
use crate::intake::store::StoreError;

#[test]
fn forward_navigation_is_blocked_while_the_step_is_invalid() {
    let (mut controller, _store) = controller();

    match controller.advance() {
        Ok(Navigation::Blocked { errors }) => {
            assert!(errors.contains_key("property_reference"));
        }
        other => panic!("expected blocked navigation, got {other:?}"),
    }

    assert_eq!(controller.step_index(), 0);
    assert!(controller.step_errors(0).is_some());
    assert_eq!(controller.phase(), WizardPhase::Editing);
}

#[test]
fn forward_navigation_proceeds_once_the_step_is_clean() {
    let (mut controller, _store) = controller();
    fill_basics(&mut controller);

    match controller.advance() {
        Ok(Navigation::Entered(index)) => assert_eq!(index, 1),
        other => panic!("expected entered, got {other:?}"),
    }
    assert_eq!(controller.step_index(), 1);
    assert!(controller.step_errors(0).is_none());
}

#[test]
fn backward_navigation_never_validates_the_step_being_left() {
    let (mut controller, _store) = controller();
    fill_basics(&mut controller);
    controller.advance().expect("basics are clean");

    // Location is untouched and invalid, but retreat is unconditional.
    match controller.retreat() {
        Ok(Navigation::Entered(index)) => assert_eq!(index, 0),
        other => panic!("expected entered, got {other:?}"),
    }
}

#[test]
fn editing_a_field_optimistically_clears_its_surfaced_error() {
    let (mut controller, _store) = controller();

    controller.advance().expect("navigation call succeeds");
    assert!(controller
        .step_errors(0)
        .is_some_and(|errors| errors.contains_key("property_reference")));

    controller
        .update_field("property_reference", text("APOLLO-A201"))
        .expect("known field");
    let remaining = controller.step_errors(0).expect("other errors remain");
    assert!(!remaining.contains_key("property_reference"));
}

#[test]
fn unknown_fields_are_rejected_without_touching_the_snapshot() {
    let (mut controller, _store) = controller();

    match controller.update_field("garage_spaces", number(2.0)) {
        Err(WizardError::UnknownField(name)) => assert_eq!(name, "garage_spaces"),
        other => panic!("expected unknown field error, got {other:?}"),
    }
    assert!(controller.sanitized_snapshot(Role::Admin).is_empty());
}

#[test]
fn out_of_range_navigation_is_a_caller_defect() {
    let (mut controller, _store) = controller();

    match controller.go_to_step(99) {
        Err(WizardError::StepOutOfRange { index, len }) => {
            assert_eq!(index, 99);
            assert_eq!(len, 6);
        }
        other => panic!("expected out-of-range error, got {other:?}"),
    }
}

#[test]
fn submit_without_property_reference_never_reaches_the_store() {
    let (mut controller, store) = completed_controller();
    controller
        .clear_field("property_reference")
        .expect("known field");
    let before = controller.sanitized_snapshot(Role::Admin);

    match controller.submit() {
        Err(SubmitError::Rejected { errors, step }) => {
            assert!(errors.contains_key("property_reference"));
            assert_eq!(step, 0);
        }
        other => panic!("expected rejected submit, got {other:?}"),
    }

    assert!(store.created().is_empty());
    assert_eq!(controller.sanitized_snapshot(Role::Admin), before);
    assert_eq!(controller.phase(), WizardPhase::Error);
    // The session jumped to the first invalid step with errors surfaced.
    assert_eq!(controller.step_index(), 0);
    assert!(controller.step_errors(0).is_some());
}

#[test]
fn valid_submit_creates_the_record_and_completes_the_session() {
    let (mut controller, store) = completed_controller();

    let receipt = controller.submit().expect("snapshot is complete");
    assert_eq!(receipt.property_id.0, "prop-000001");
    assert_eq!(controller.phase(), WizardPhase::Complete);
    assert_eq!(store.created().len(), 1);

    // Terminal session refuses further edits and submits.
    assert!(matches!(
        controller.update_field("summary", text("late edit")),
        Err(WizardError::SessionComplete)
    ));
    assert!(matches!(
        controller.submit(),
        Err(SubmitError::SessionComplete)
    ));
}

#[test]
fn store_failure_preserves_the_snapshot_for_retry() {
    let store = Arc::new(FlakyStore::default());
    let mut controller = WizardController::new(engine(), store.clone());
    fill_basics(&mut controller);
    fill_location(&mut controller);
    fill_financial(&mut controller);
    fill_contact(&mut controller);

    match controller.submit() {
        Err(SubmitError::Store(StoreError::Unavailable(_))) => {}
        other => panic!("expected store failure, got {other:?}"),
    }
    assert_eq!(controller.phase(), WizardPhase::Error);
    assert!(controller.last_failure().is_some());

    // Retry is just another submit; the snapshot survived intact.
    let receipt = controller.submit().expect("store recovered");
    assert_eq!(receipt.property_id.0, "prop-000001");
    assert_eq!(controller.phase(), WizardPhase::Complete);
    assert_eq!(store.created().len(), 1);
}

#[test]
fn empty_draft_saves_with_exactly_one_store_call() {
    let (mut controller, store) = controller();

    let receipt = controller.save_draft().expect("drafts bypass validation");
    assert_eq!(receipt.draft_id.0, "draft-000001");
    assert_eq!(store.drafts().len(), 1);
    assert!(store.drafts()[0].is_empty());
    assert_eq!(controller.phase(), WizardPhase::Editing);
}

#[test]
fn draft_failure_parks_the_session_in_error_until_the_next_edit() {
    let store = Arc::new(UnavailableStore);
    let mut controller = WizardController::new(engine(), store);

    match controller.save_draft() {
        Err(SubmitError::Store(StoreError::Unavailable(_))) => {}
        other => panic!("expected store failure, got {other:?}"),
    }
    assert_eq!(controller.phase(), WizardPhase::Error);

    controller
        .update_field("summary", text("recovering"))
        .expect("known field");
    assert_eq!(controller.phase(), WizardPhase::Editing);
}

#[test]
fn current_step_omits_sensitive_fields_for_unprivileged_roles() {
    let (mut controller, _store) = completed_controller();
    controller
        .update_field("lockbox_code", text("9911"))
        .expect("known field");
    controller.go_to_step(4).expect("prior steps are clean");

    let staff_view = controller.current_step(Role::Staff);
    assert!(staff_view
        .fields
        .iter()
        .all(|field| field.name != "lockbox_code"));

    let admin_view = controller.current_step(Role::Admin);
    let lockbox = admin_view
        .fields
        .iter()
        .find(|field| field.name == "lockbox_code")
        .expect("admin sees the field");
    assert_eq!(lockbox.value, Some(text("9911")));
}

#[test]
fn sanitized_snapshot_respects_the_viewing_role() {
    let (mut controller, _store) = controller();
    controller
        .update_field("alarm_code", text("0042"))
        .expect("known field");
    controller
        .update_field("city", text("Des Moines"))
        .expect("known field");

    let staff = controller.sanitized_snapshot(Role::Staff);
    assert!(staff.get("alarm_code").is_none());
    assert!(staff.get("city").is_some());

    let admin = controller.sanitized_snapshot(Role::Admin);
    assert!(admin.get("alarm_code").is_some());
}

#[test]
fn completion_reflects_edits_immediately() {
    let (mut controller, _store) = controller();
    assert_eq!(controller.completion().overall, 0);

    fill_basics(&mut controller);
    let after_basics = controller.completion().overall;
    assert!(after_basics > 0);

    controller.clear_field("bedrooms").expect("known field");
    assert!(controller.completion().overall < after_basics);
}

#[test]
fn forward_jump_only_validates_the_step_being_left() {
    let (mut controller, _store) = controller();
    fill_basics(&mut controller);

    // Jumping from basics straight to amenities validates basics only;
    // the skipped location step is caught by the submit gate instead.
    match controller.go_to_step(3) {
        Ok(Navigation::Entered(index)) => assert_eq!(index, 3),
        other => panic!("expected entered, got {other:?}"),
    }
}
