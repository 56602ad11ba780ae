use super::*;

fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| (*s).to_owned()).collect()
}

fn failure(id: &str, email: &str, error: &str) -> DispatchFailure {
    DispatchFailure {
        id: id.to_owned(),
        email: email.to_owned(),
        error: error.to_owned(),
    }
}

#[test]
fn reconcile_keeps_submission_order() {
    let wire = WirePartition {
        success: ids(&["c", "a"]),
        failed: vec![failure("b", "b@x.io", "mailbox full")],
    };
    let report = reconcile(&ids(&["a", "b", "c"]), wire);
    assert_eq!(report.success, ids(&["a", "c"]));
    assert_eq!(report.failed, vec![failure("b", "b@x.io", "mailbox full")]);
    assert_eq!(report.total(), 3);
    assert!(report.is_partial());
}

#[test]
fn unmentioned_ids_become_failures() {
    let wire = WirePartition {
        success: ids(&["a"]),
        failed: Vec::new(),
    };
    let report = reconcile(&ids(&["a", "b"]), wire);
    assert_eq!(report.success, ids(&["a"]));
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "b");
    assert_eq!(report.failed[0].error, NO_STATUS_REASON);
}

#[test]
fn unknown_and_duplicate_ids_are_collapsed() {
    let wire = WirePartition {
        success: ids(&["a", "a", "zzz"]),
        failed: vec![
            failure("b", "", "first"),
            failure("b", "", "second"),
            failure("ghost", "", "nope"),
        ],
    };
    let report = reconcile(&ids(&["a", "b", "a"]), wire);
    assert_eq!(report.success, ids(&["a"]));
    assert_eq!(report.failed, vec![failure("b", "", "first")]);
    assert_eq!(report.total(), 2);
}

#[test]
fn failure_wins_over_conflicting_success() {
    let wire = WirePartition {
        success: ids(&["a"]),
        failed: vec![failure("a", "", "bounced")],
    };
    let report = reconcile(&ids(&["a"]), wire);
    assert!(report.success.is_empty());
    assert_eq!(report.failed[0].error, "bounced");
}

#[test]
fn wire_partition_tolerates_missing_fields() {
    let wire: WirePartition =
        serde_json::from_str(r#"{"failed":[{"id":"x","error":"invalid address"}]}"#).unwrap();
    assert!(wire.success.is_empty());
    assert_eq!(wire.failed, vec![failure("x", "", "invalid address")]);
}

#[test]
fn wire_partition_treats_null_as_absent() {
    let wire: WirePartition = serde_json::from_str(
        r#"{"success":["a1"],"failed":[{"id":"a2","email":null,"error":null},{"id":"a3","email":null,"error":"No email address"}]}"#,
    )
    .unwrap();
    assert_eq!(wire.success, ids(&["a1"]));
    assert_eq!(
        wire.failed,
        vec![failure("a2", "", ""), failure("a3", "", "No email address")]
    );

    let empty: WirePartition =
        serde_json::from_str(r#"{"success":null,"failed":null}"#).unwrap();
    assert_eq!(empty, WirePartition::default());
}

#[test]
fn summaries_distinguish_outcomes() {
    assert_eq!(BatchReport::default().summary(), "no badges to send");

    let all = BatchReport {
        success: ids(&["a", "b"]),
        failed: Vec::new(),
    };
    assert_eq!(all.summary(), "sent 2 badge(s)");
    assert!(!all.has_failures());

    let none = BatchReport {
        success: Vec::new(),
        failed: vec![failure("a", "", "x")],
    };
    assert_eq!(none.summary(), "no badges delivered; 1 recipient(s) failed");
    assert!(!none.is_partial());

    let some = BatchReport {
        success: ids(&["a"]),
        failed: vec![failure("b", "", "x")],
    };
    assert_eq!(some.summary(), "sent 1 of 2 badge(s); 1 recipient(s) failed");

    let err: BadgeResult<BatchReport> = Err(BadgeError::transport(Some(500), "boom"));
    assert_eq!(
        describe_attempt(&err),
        "nothing was sent: transport error: boom"
    );
    assert_eq!(describe_attempt(&Ok(some)), "sent 1 of 2 badge(s); 1 recipient(s) failed");
}

#[test]
fn outcomes_cover_every_recipient() {
    let report = BatchReport {
        success: ids(&["a"]),
        failed: vec![failure("b", "", "x")],
    };
    let outcomes = report.outcomes();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].id(), "a");
    assert!(matches!(report.outcome("b"), Some(DispatchOutcome::Failed(_))));
    assert_eq!(
        report.outcome("a"),
        Some(DispatchOutcome::Delivered("a".to_owned()))
    );
    assert_eq!(report.outcome("nobody"), None);
}

#[test]
fn missing_emails_are_filled_from_lookup() {
    let mut report = BatchReport {
        success: Vec::new(),
        failed: vec![failure("a", "", "x"), failure("b", "kept@x.io", "y")],
    };
    report.fill_missing_emails(|id| (id == "a" || id == "b").then_some("roster@x.io"));
    assert_eq!(report.failed[0].email, "roster@x.io");
    assert_eq!(report.failed[1].email, "kept@x.io");
}
