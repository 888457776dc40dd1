use std::io::Cursor;

use super::*;

fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn text_must_not_be_blank() {
    assert!(Watermark::text("   ").is_err());
    assert!(Watermark::image(Vec::new()).is_err());
    assert_eq!(Watermark::text("hi").unwrap().kind(), WatermarkKind::Text);
}

#[test]
fn opacity_is_clamped() {
    let wm = Watermark::text("x").unwrap();
    assert_eq!(wm.clone().with_opacity(150).opacity_percent(), 100);
    assert_eq!(wm.clone().with_opacity(-5).opacity_percent(), 0);
    assert_eq!(wm.with_opacity(42).opacity(), 0.42);
}

#[test]
fn preset_record_parses_with_original_shape() {
    let json = r#"{
        "id": 1718000000000,
        "type": "text",
        "content": "(c) studio",
        "name": "Text: (c) studio",
        "size": "large",
        "position": "top-left",
        "opacity": 70,
        "created": "2024-06-10T00:00:00.000Z"
    }"#;
    let wm = Watermark::from_preset_json(json).unwrap();
    assert_eq!(wm.id(), Some("1718000000000"));
    assert_eq!(wm.name(), Some("Text: (c) studio"));
    assert_eq!(wm.size(), SizeClass::Large);
    assert_eq!(wm.position(), Position::TopLeft);
    assert_eq!(wm.opacity_percent(), 70);
    assert_eq!(wm.content(), &WatermarkContent::Text("(c) studio".to_string()));
}

#[test]
fn malformed_preset_fields_are_normalized() {
    let json = r#"{"type":"text","content":"x","size":"xxl","position":"nowhere","opacity":"250"}"#;
    let wm = Watermark::from_preset_json(json).unwrap();
    assert_eq!(wm.size(), SizeClass::Medium);
    assert_eq!(wm.position(), Position::BottomRight);
    assert_eq!(wm.opacity_percent(), 100);

    let json = r#"{"type":"text","content":"x","opacity":-3.6}"#;
    assert_eq!(Watermark::from_preset_json(json).unwrap().opacity_percent(), 0);

    let json = r#"{"type":"text","content":"x","opacity":null}"#;
    assert_eq!(Watermark::from_preset_json(json).unwrap().opacity_percent(), 100);
}

#[test]
fn unknown_type_or_blank_text_is_rejected() {
    assert!(Watermark::from_preset_json(r#"{"type":"audio","content":"x"}"#).is_err());
    assert!(Watermark::from_preset_json(r#"{"type":"text","content":"  "}"#).is_err());
    assert!(Watermark::from_preset_json("not json").is_err());
}

#[test]
fn serde_deserialize_goes_through_preset_rules() {
    let wm: Watermark =
        serde_json::from_str(r#"{"type":"image","content":"data:image/png;base64,AAAA"}"#)
            .unwrap();
    assert_eq!(wm.kind(), WatermarkKind::Image);
}

#[test]
fn alpha_output_rule() {
    let opaque_text = Watermark::text("x").unwrap();
    assert!(!opaque_text.needs_alpha_output());
    assert!(opaque_text.with_opacity(99).needs_alpha_output());

    let opaque_img = Watermark::image(png_bytes([255, 0, 0, 255])).unwrap();
    assert!(!opaque_img.needs_alpha_output());

    let translucent_img = Watermark::image(png_bytes([255, 0, 0, 128])).unwrap();
    assert!(translucent_img.needs_alpha_output());

    let broken_img = Watermark::image(b"definitely not an image".to_vec()).unwrap();
    assert!(!broken_img.needs_alpha_output());
}
