use super::*;

#[test]
fn escape_xml_handles_markup_characters() {
    assert_eq!(
        escape_xml(r#"<b>"Tom" & 'Jerry'</b>"#),
        "&lt;b&gt;&quot;Tom&quot; &amp; &apos;Jerry&apos;&lt;/b&gt;"
    );
    assert_eq!(escape_xml("a\u{0}b"), "ab");
    assert_eq!(escape_xml("© 2024"), "© 2024");
}

#[test]
fn rasterize_shape_without_fonts() {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4">
        <rect x="0" y="0" width="2" height="4" fill="#ff0000"/>
    </svg>"##;
    let frame = rasterize(svg, &FontSet::empty(), 8, 8).unwrap();
    assert_eq!((frame.width, frame.height), (8, 8));
    assert_eq!(frame.pixel(1, 1), [255, 0, 0, 255]);
    assert_eq!(frame.pixel(6, 6), [0, 0, 0, 0]);
}

#[test]
fn rasterize_rejects_bad_markup() {
    assert!(rasterize("<svg", &FontSet::empty(), 4, 4).is_err());
}

#[test]
fn empty_font_set_has_no_faces() {
    let fonts = FontSet::empty();
    assert!(fonts.is_empty());
    assert_eq!(fonts.face_count(), 0);
}

#[test]
fn missing_fonts_dir_keeps_system_faces() {
    let fonts = FontSet::with_fonts_dir(Path::new("/definitely/not/a/fonts/dir"));
    assert_eq!(fonts.face_count(), FontSet::system().face_count());
}

#[test]
fn condensed_unknown_family_still_resolves_a_face() {
    let fonts = FontSet::system();
    if fonts.is_empty() {
        return;
    }
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="40">
        <text x="2" y="30" font-family="No Such Family" font-stretch="ultra-condensed" font-size="30" fill="#000000">W</text>
    </svg>"##;
    let frame = rasterize(svg, &fonts, 40, 40).unwrap();
    assert!(!frame.is_blank());
}
