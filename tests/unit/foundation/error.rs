use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BadgeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(BadgeError::fetch("x").to_string().contains("fetch error:"));
    assert!(BadgeError::encode("x").to_string().contains("encode error:"));
    assert!(BadgeError::render("x").to_string().contains("render error:"));
    assert!(
        BadgeError::transport(Some(500), "x")
            .to_string()
            .contains("transport error:")
    );
    assert!(BadgeError::not_ready("x").to_string().contains("not ready:"));
    assert!(
        BadgeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn transport_carries_status() {
    let err = BadgeError::transport(Some(503), "upstream down");
    assert!(err.is_transport());
    match err {
        BadgeError::Transport { status, message } => {
            assert_eq!(status, Some(503));
            assert_eq!(message, "upstream down");
        }
        other => panic!("unexpected variant: {other:?}"),
    }
    assert!(!BadgeError::fetch("x").is_transport());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BadgeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let err: BadgeError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(err, BadgeError::Serde(_)));
}
