use serde_json::json;

use super::common::*;
use crate::intake::domain::{PropertySnapshot, Role};
use crate::intake::policy::{
    can_view, find_sensitive, is_sensitive, mask, sanitize, sanitize_json, SENSITIVE_FIELDS,
};

#[test]
fn registry_membership_covers_bare_and_dotted_names() {
    assert!(is_sensitive("lockbox_code"));
    assert!(is_sensitive("access.lockbox_code"));
    assert!(is_sensitive("property.access.alarm_code"));
    assert!(!is_sensitive("monthly_rent"));
    assert!(!is_sensitive("lockbox_code_hint"));
}

#[test]
fn privileged_roles_see_sensitive_fields() {
    for field in SENSITIVE_FIELDS {
        assert!(can_view(Role::Admin, field));
        assert!(can_view(Role::Manager, field));
        assert!(!can_view(Role::Staff, field));
        assert!(!can_view(Role::ReadOnly, field));
    }
    assert!(can_view(Role::ReadOnly, "monthly_rent"));
}

#[test]
fn sanitize_strips_sensitive_fields_for_unprivileged_roles() {
    let mut snapshot = PropertySnapshot::new();
    snapshot.set("property_reference", text("APOLLO-A201"));
    snapshot.set("lockbox_code", text("9911"));
    snapshot.set("gate_code", text("4411"));

    let sanitized = sanitize(&snapshot, Role::Staff);
    assert!(sanitized.get("lockbox_code").is_none());
    assert!(sanitized.get("gate_code").is_none());
    assert!(sanitized.get("property_reference").is_some());
}

#[test]
fn sanitize_returns_an_identical_copy_for_privileged_roles() {
    let mut snapshot = PropertySnapshot::new();
    snapshot.set("property_reference", text("APOLLO-A201"));
    snapshot.set("lockbox_code", text("9911"));

    assert_eq!(sanitize(&snapshot, Role::Admin), snapshot);
    assert_eq!(sanitize(&snapshot, Role::Manager), snapshot);
}

#[test]
fn sanitize_json_removes_sensitive_keys_at_every_depth() {
    let value = json!({
        "property_reference": "APOLLO-A201",
        "access": {
            "lockbox_code": "9911",
            "showing_instructions": "call ahead",
            "devices": [
                { "smart_lock_pin": "443322", "battery": "ok" }
            ]
        }
    });

    let sanitized = sanitize_json(value.clone(), Role::Staff);
    assert!(find_sensitive(&sanitized).is_none());
    assert_eq!(
        sanitized["access"]["showing_instructions"],
        json!("call ahead")
    );
    assert_eq!(sanitized["access"]["devices"][0]["battery"], json!("ok"));

    // Privileged callers get the graph unchanged.
    assert_eq!(sanitize_json(value.clone(), Role::Manager), value);
}

#[test]
fn find_sensitive_reports_nested_leaks() {
    let value = json!({
        "wrapper": [{ "deep": { "alarm_code": "0000" } }]
    });
    assert_eq!(find_sensitive(&value).as_deref(), Some("alarm_code"));

    let clean = json!({ "wrapper": [{ "deep": { "city": "Des Moines" } }] });
    assert!(find_sensitive(&clean).is_none());
}

#[test]
fn mask_preserves_edges_with_a_fixed_run() {
    assert_eq!(mask("secret1234"), "se****34");
    assert_eq!(mask("443322"), "44****22");
}

#[test]
fn mask_hides_short_values_entirely() {
    assert_eq!(mask("ab"), "****");
    assert_eq!(mask("abcd"), "****");
    assert_eq!(mask(""), "****");
    // Five characters is the first length where the edges survive.
    assert_eq!(mask("abcde"), "ab****de");
}
