use super::*;

fn image(w: u32, h: u32) -> Arc<PreparedImage> {
    Arc::new(PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(vec![0; (w * h * 4) as usize]),
    })
}

#[test]
fn describe_preserves_paint_order_and_content() {
    let mut scene = Scene::new(Canvas::BADGE);
    scene.push(Layer::Fill {
        slot: Slot::Background,
        rect: Canvas::BADGE.rect(),
        color: Rgba8::WHITE,
    });
    scene.push(Layer::Image {
        slot: Slot::EventLogo,
        rect: Rect::new(20.0, 20.0, 100.0, 100.0),
        image: image(4, 2),
        sampling: Sampling::Smooth,
    });
    scene.push(Layer::Text {
        slot: Slot::Name,
        text: "JANE DOE".to_owned(),
        anchor: Point::new(300.0, 200.0),
        style: TextStyle {
            size: 40.0,
            weight: 700,
            color: Rgba8::BLACK,
        },
    });

    let desc = scene.describe();
    let slots: Vec<Slot> = desc.iter().map(LayerDesc::slot).collect();
    assert_eq!(slots, vec![Slot::Background, Slot::EventLogo, Slot::Name]);
    assert_eq!(desc[2].text(), Some("JANE DOE"));
    assert_eq!(desc[0].text(), None);
    match &desc[1] {
        LayerDesc::Image { source_size, .. } => assert_eq!(*source_size, (4, 2)),
        other => panic!("unexpected layer {other:?}"),
    }
}

#[test]
fn layer_desc_serializes_with_kind_tag() {
    let layer = Layer::Text {
        slot: Slot::JobTitle,
        text: "CTO".to_owned(),
        anchor: Point::new(300.0, 250.0),
        style: TextStyle {
            size: 24.0,
            weight: 500,
            color: Rgba8::BLACK,
        },
    };
    assert_eq!(layer.slot(), Slot::JobTitle);
    let v = serde_json::to_value(layer.describe()).unwrap();
    assert_eq!(v["kind"], "text");
    assert_eq!(v["slot"], "job_title");
    assert_eq!(v["text"], "CTO");
}
