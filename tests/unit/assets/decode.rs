use std::io::Cursor;

use base64::Engine as _;

use super::*;

fn encode_png(rgba: Vec<u8>, w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_frame_png_dimensions_and_premul() {
    let buf = encode_png(vec![100u8, 50u8, 200u8, 128u8], 1, 1);
    let frame = decode_frame(&buf).unwrap();
    assert_eq!((frame.width, frame.height), (1, 1));
    assert_eq!(
        frame.data,
        vec![
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn corrupt_source_is_a_decode_error() {
    assert!(matches!(decode_frame(b""), Err(OvermarkError::Decode(_))));
    assert!(matches!(
        decode_frame(b"\x89PNG\r\n\x1a\nbroken"),
        Err(OvermarkError::Decode(_))
    ));
}

#[test]
fn corrupt_watermark_is_an_asset_error() {
    assert!(matches!(
        decode_watermark_asset(b"nope"),
        Err(OvermarkError::WatermarkAsset(_))
    ));
    assert!(matches!(
        decode_watermark_asset(b"data:image/png;base64,!!!"),
        Err(OvermarkError::WatermarkAsset(_))
    ));
}

#[test]
fn data_url_watermark_decodes() {
    let png = encode_png(vec![0, 255, 0, 255], 1, 1);
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);
    let url = format!("data:image/png;base64,{b64}");
    let frame = decode_watermark_asset(url.as_bytes()).unwrap();
    assert_eq!(frame.pixel(0, 0), [0, 255, 0, 255]);
}

#[test]
fn non_data_url_passes_through() {
    let raw = b"\x89PNG...";
    assert_eq!(strip_data_url(raw).unwrap().as_ref(), raw);
    assert_eq!(strip_data_url(b"data:text/plain,abc").unwrap().as_ref(), b"abc");
    assert!(strip_data_url(b"data:nothing").is_err());
}
