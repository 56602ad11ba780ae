use super::*;
use std::collections::BTreeMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn empty_document_gives_defaults() {
    let cfg = BadgeConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, BadgeConfig::default());
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.dispatch_base_url(), "http://localhost:3000");
    assert_eq!(cfg.fetch_timeout(), Duration::from_secs(10));
}

#[test]
fn parses_camel_case_document() {
    let cfg = BadgeConfig::from_json_str(
        r##"{
            "origin": "https://events.example.com",
            "apiBaseUrl": "https://api.example.com",
            "brandColor": "#FF0000",
            "footerLabel": "SPEAKER",
            "scale": 2,
            "maxInFlight": 3,
            "verification": { "size": 300, "ecLevel": "M" }
        }"##,
    )
    .unwrap();
    assert_eq!(cfg.brand_color.rgba8(), Rgba8::opaque(255, 0, 0));
    assert_eq!(cfg.footer_label, "SPEAKER");
    assert_eq!(cfg.scale, 2.0);
    assert_eq!(cfg.max_in_flight, 3);
    assert_eq!(cfg.verification.size, 300);
    assert_eq!(cfg.verification.margin, 1);
    assert_eq!(cfg.dispatch_base_url(), "https://api.example.com");

    let opts = cfg.compositor_opts();
    assert_eq!(opts.origin, "https://events.example.com");
    assert_eq!(opts.footer_label, "SPEAKER");
    assert_eq!(opts.verification, cfg.verification);
}

#[test]
fn unknown_fields_are_rejected() {
    let err = BadgeConfig::from_json_str(r#"{"orign":"x"}"#).unwrap_err();
    assert!(matches!(err, BadgeError::Serde(_)));
}

#[test]
fn overrides_replace_fields() {
    let mut cfg = BadgeConfig::default();
    cfg.apply_overrides_from(env(&[
        (ENV_ORIGIN, "https://badges.example.com"),
        (ENV_API_BASE_URL, " https://api.example.com "),
        (ENV_MAX_IN_FLIGHT, "2"),
        (ENV_SCALE, "1.5"),
    ]))
    .unwrap();
    assert_eq!(cfg.origin, "https://badges.example.com");
    assert_eq!(cfg.api_base_url.as_deref(), Some("https://api.example.com"));
    assert_eq!(cfg.max_in_flight, 2);
    assert_eq!(cfg.scale, 1.5);
}

#[test]
fn blank_overrides_are_ignored() {
    let mut cfg = BadgeConfig::default();
    cfg.apply_overrides_from(env(&[(ENV_ORIGIN, "  ")])).unwrap();
    assert_eq!(cfg.origin, BadgeConfig::default().origin);
}

#[test]
fn malformed_overrides_fail() {
    let mut cfg = BadgeConfig::default();
    let err = cfg
        .apply_overrides_from(env(&[(ENV_MAX_IN_FLIGHT, "lots")]))
        .unwrap_err();
    assert!(err.to_string().contains(ENV_MAX_IN_FLIGHT));
    assert!(cfg.apply_overrides_from(env(&[(ENV_SCALE, "x")])).is_err());
}

#[test]
fn validate_rejects_unusable_values() {
    let bad = [
        BadgeConfig {
            origin: String::new(),
            ..BadgeConfig::default()
        },
        BadgeConfig {
            scale: -1.0,
            ..BadgeConfig::default()
        },
        BadgeConfig {
            max_in_flight: 0,
            ..BadgeConfig::default()
        },
        BadgeConfig {
            dispatch_timeout_ms: 0,
            ..BadgeConfig::default()
        },
    ];
    for cfg in bad {
        assert!(matches!(cfg.validate(), Err(BadgeError::Validation(_))));
    }

    let mut cfg = BadgeConfig::default();
    cfg.verification.size = 0;
    assert!(cfg.validate().is_err());

    cfg.verification.size = MAX_MARK_SIZE + 1;
    assert!(matches!(cfg.validate(), Err(BadgeError::Validation(_))));
    cfg.verification.size = MAX_MARK_SIZE;
    assert!(cfg.validate().is_ok());
}

#[test]
fn oversized_mark_in_document_fails_validation() {
    let cfg = BadgeConfig::from_json_str(r#"{"verification": {"size": 200000}}"#).unwrap();
    assert!(matches!(cfg.validate(), Err(BadgeError::Validation(_))));
}

#[test]
fn file_paths_resolve_against_config_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("badge.json");
    std::fs::write(
        &path,
        r#"{"assetsRoot":"assets","fontsDir":"/abs/fonts"}"#,
    )
    .unwrap();
    let cfg = BadgeConfig::from_json_file(&path).unwrap();
    assert_eq!(cfg.assets_root, Some(tmp.path().join("assets")));
    assert_eq!(cfg.fonts_dir, Some(PathBuf::from("/abs/fonts")));

    assert!(BadgeConfig::from_json_file(&tmp.path().join("missing.json")).is_err());
}
