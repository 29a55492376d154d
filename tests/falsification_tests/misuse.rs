//! Falsification Tests: Category B - Misuse Rejection (L006-L009)
//!
//! Claims: every violation of the install/restore pairing discipline is
//! rejected loudly, and rejection never disturbs existing bindings.

use std::sync::Arc;
use std::time::Duration;

use demora::{handler_fn, restore_latency_for, simulate_latency_for, HandlerTable, LatencyError};

fn notes_table() -> HandlerTable<String, String> {
    let t = HandlerTable::new("notes");
    t.register("create", handler_fn(|body: String| format!("ok: {body}")))
        .unwrap();
    t
}

/// L006: Double install is rejected and the backup survives
///
/// # Falsification Attempt
/// Install twice without a restore; a second success, or a replaced
/// backup binding, falsifies the no-silent-overwrite claim.
#[tokio::test]
async fn l006_double_install_rejected() {
    let t = notes_table();
    simulate_latency_for(&t, "create", Duration::from_millis(5)).unwrap();
    let saved = t.handler("old_create").unwrap();

    let err = simulate_latency_for(&t, "create", Duration::from_millis(5)).unwrap_err();
    assert!(
        matches!(err, LatencyError::AlreadyInstalled { .. }),
        "L006 FALSIFIED: second install did not raise AlreadyInstalled: {err}"
    );

    let still_saved = t.handler("old_create").unwrap();
    assert!(
        Arc::ptr_eq(&saved, &still_saved),
        "L006 FALSIFIED: rejected install replaced the preserved original"
    );

    // The true original is still what a restore reinstates.
    restore_latency_for(&t, "create").unwrap();
    assert_eq!(
        t.dispatch("create", "body".to_string()).await.unwrap(),
        "ok: body"
    );
}

/// L007: Restore without install is rejected
///
/// # Falsification Attempt
/// Restore on a never-wrapped pair and on an already-restored pair; a
/// silent success either time falsifies the pairing claim.
#[test]
fn l007_restore_without_install_rejected() {
    let t = notes_table();

    let err = restore_latency_for(&t, "create").unwrap_err();
    assert!(
        matches!(err, LatencyError::NotInstalled { .. }),
        "L007 FALSIFIED: restore on never-wrapped pair succeeded"
    );

    simulate_latency_for(&t, "create", Duration::from_millis(5)).unwrap();
    restore_latency_for(&t, "create").unwrap();
    let err = restore_latency_for(&t, "create").unwrap_err();
    assert!(
        matches!(err, LatencyError::NotInstalled { .. }),
        "L007 FALSIFIED: second restore succeeded"
    );
}

/// L008: Install on a missing handler fails fast
///
/// # Falsification Attempt
/// Install on a name the target never exposed; anything but an immediate
/// MissingHandler error falsifies the precondition check.
#[test]
fn l008_missing_handler_fails_fast() {
    let t = notes_table();
    let err = simulate_latency_for(&t, "destroy", Duration::from_secs(1)).unwrap_err();
    assert!(
        matches!(err, LatencyError::MissingHandler { .. }),
        "L008 FALSIFIED: install on missing handler returned {err}"
    );
    assert!(err.to_string().contains("destroy"));
    assert!(err.to_string().contains("notes"));
}

/// L009: Reserved-name collision is a loud failure
///
/// # Falsification Attempt
/// Occupy the backup name with a user registration, then install; a
/// silent overwrite of either binding falsifies the fail-loudly claim.
#[tokio::test]
async fn l009_reserved_name_collision_loud() {
    let t = notes_table();
    t.register("old_create", handler_fn(|body: String| format!("impostor: {body}")))
        .unwrap();

    let err = simulate_latency_for(&t, "create", Duration::from_millis(5)).unwrap_err();
    assert!(
        matches!(err, LatencyError::ReservedName { .. }),
        "L009 FALSIFIED: reserved-name collision not rejected"
    );

    // Both bindings answer exactly as registered.
    assert_eq!(
        t.dispatch("create", "x".to_string()).await.unwrap(),
        "ok: x"
    );
    assert_eq!(
        t.dispatch("old_create", "x".to_string()).await.unwrap(),
        "impostor: x"
    );
}
