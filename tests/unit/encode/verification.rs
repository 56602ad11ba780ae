use super::*;

/// Decode every QR symbol in a PNG, padding it with a light border first.
fn scan(png: &[u8]) -> Vec<String> {
    const PAD: u32 = 16;
    let img = image::load_from_memory(png).unwrap().to_luma8();
    let (w, h) = img.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        (w + 2 * PAD) as usize,
        (h + 2 * PAD) as usize,
        |x, y| {
            let (x, y) = (x as u32, y as u32);
            if x < PAD || y < PAD || x >= w + PAD || y >= h + PAD {
                255
            } else {
                img.get_pixel(x - PAD, y - PAD).0[0]
            }
        },
    );
    prepared
        .detect_grids()
        .into_iter()
        .map(|g| g.decode().unwrap().1)
        .collect()
}

#[test]
fn payload_shape_is_exact() {
    let p = VerificationPayload::new("https://events.example.com", "a1").unwrap();
    assert_eq!(p.as_str(), "https://events.example.com/attendee/a1");
    assert_eq!(p.to_string(), p.as_str());
    assert_eq!(p.origin(), "https://events.example.com");
    assert_eq!(p.attendee_id(), "a1");
}

#[test]
fn changing_origin_keeps_attendee_portion() {
    let a = VerificationPayload::new("https://a.example.com", "att-42").unwrap();
    let b = VerificationPayload::new("http://localhost:3000/", "att-42").unwrap();
    assert_ne!(a, b);
    assert_eq!(a.attendee_id(), b.attendee_id());
    assert_eq!(b.as_str(), "http://localhost:3000/attendee/att-42");
    assert!(a.as_str().ends_with("/attendee/att-42"));
}

#[test]
fn payload_rejects_unembeddable_input() {
    assert!(VerificationPayload::new("", "a1").is_err());
    assert!(VerificationPayload::new("/", "a1").is_err());
    assert!(VerificationPayload::new("https://x", "").is_err());
    assert!(VerificationPayload::new("https://x", "a/b").is_err());
    assert!(VerificationPayload::new("https://x", "a b").is_err());
    assert!(VerificationPayload::new("https://x", "a?b").is_err());
    assert!(VerificationPayload::new("https://x", "a#b").is_err());
    assert!(VerificationPayload::new("https://x", "a\tb").is_err());
    assert!(VerificationPayload::new("https://x", "a\u{7}b").is_err());
    assert!(VerificationPayload::new("https://x", "a-b_c.9~").is_ok());
}

#[test]
fn encoding_is_deterministic() {
    let p = VerificationPayload::new("https://events.example.com", "a1").unwrap();
    let opts = VerificationOpts::default();
    let a = encode_verification(&p, &opts).unwrap();
    let b = encode_verification(&p, &opts).unwrap();
    assert_eq!(a.png, b.png);
    assert_eq!(a.modules, b.modules);
    assert_eq!(a.payload, p);
}

#[test]
fn mark_scans_back_to_payload() {
    let p = VerificationPayload::new("https://events.example.com/", "att-42").unwrap();
    let mark = encode_verification(&p, &VerificationOpts::default()).unwrap();
    assert_eq!(scan(&mark.png), vec!["https://events.example.com/attendee/att-42"]);

    let low = VerificationOpts {
        size: 160,
        ec_level: EcLevel::L,
        ..VerificationOpts::default()
    };
    let mark = encode_verification(&p, &low).unwrap();
    assert_eq!(scan(&mark.png), vec![p.as_str()]);
}

#[test]
fn different_ids_give_different_marks() {
    let opts = VerificationOpts::default();
    let a = encode_verification(&VerificationPayload::new("https://x.io", "a1").unwrap(), &opts)
        .unwrap();
    let b = encode_verification(&VerificationPayload::new("https://x.io", "a2").unwrap(), &opts)
        .unwrap();
    assert_ne!(a.png, b.png);
}

#[test]
fn mark_is_requested_size_and_two_tone() {
    let p = VerificationPayload::new("https://events.example.com", "a1").unwrap();
    let opts = VerificationOpts {
        dark: ColorDef(Rgba8::opaque(10, 20, 30)),
        ..VerificationOpts::default()
    };
    let mark = encode_verification(&p, &opts).unwrap();
    assert_eq!(mark.size, 250);
    // Version >= 1 symbols are at least 21 modules wide.
    assert!(mark.modules >= 21);

    let img = image::load_from_memory(&mark.png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (250, 250));
    let mut saw_dark = false;
    for px in img.pixels() {
        match px.0 {
            [10, 20, 30, 255] => saw_dark = true,
            [255, 255, 255, 255] => {}
            other => panic!("unexpected pixel {other:?}"),
        }
    }
    assert!(saw_dark);
    // Quiet zone: the top-left corner pixel is light.
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
}

#[test]
fn finder_pattern_is_dark_inside_quiet_zone() {
    let p = VerificationPayload::new("https://x.io", "a1").unwrap();
    let opts = VerificationOpts {
        size: 290,
        margin: 4,
        ..VerificationOpts::default()
    };
    let mark = encode_verification(&p, &opts).unwrap();
    let img = image::load_from_memory(&mark.png).unwrap().to_rgba8();
    let total = mark.modules + 2 * opts.margin;
    // Centre of the first module of the top-left finder pattern.
    let px = (opts.margin * opts.size + opts.size / 2) / total;
    assert_eq!(img.get_pixel(px, px).0, [0, 0, 0, 255]);
}

#[test]
fn too_small_size_is_an_encode_error() {
    let p = VerificationPayload::new("https://x.io", "a1").unwrap();
    let opts = VerificationOpts {
        size: 10,
        ..VerificationOpts::default()
    };
    assert!(matches!(
        encode_verification(&p, &opts),
        Err(BadgeError::Encode(_))
    ));
}

#[test]
fn oversized_mark_is_an_encode_error() {
    let p = VerificationPayload::new("https://x.io", "a1").unwrap();
    let opts = VerificationOpts {
        size: 200_000,
        ..VerificationOpts::default()
    };
    match encode_verification(&p, &opts) {
        Err(BadgeError::Encode(msg)) => assert!(msg.contains("4096")),
        other => panic!("expected encode error, got {other:?}"),
    }
}

#[test]
fn opts_deserialize_with_defaults() {
    let opts: VerificationOpts =
        serde_json::from_value(serde_json::json!({"ecLevel": "M", "dark": "#112233"})).unwrap();
    assert_eq!(opts.ec_level, EcLevel::M);
    assert_eq!(opts.size, 250);
    assert_eq!(opts.margin, 1);
    assert_eq!(opts.dark.rgba8(), Rgba8::opaque(0x11, 0x22, 0x33));
}
