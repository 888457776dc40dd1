use std::io::Cursor;

use super::*;
use crate::geometry::resolver::resolve;
use crate::geometry::table::{Position, SizeClass};

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn black_surface(w: u32, h: u32) -> Surface {
    Surface::new(Frame::filled(w, h, [0, 0, 0, 255]).unwrap())
}

fn renderer() -> WatermarkRenderer {
    WatermarkRenderer::new(FontSet::empty())
}

#[test]
fn image_watermark_fills_placement_box() {
    let mut surface = black_surface(100, 100);
    let wm = Watermark::image(png(4, 4, [255, 0, 0, 255])).unwrap();
    let placement = resolve(100, 100, SizeClass::Medium, Position::BottomRight);

    let report = renderer().render(&mut surface, &placement, &wm).unwrap();

    assert_eq!(report, RenderReport::Watermark);
    let f = surface.frame();
    assert_eq!(f.pixel(85, 85), [255, 0, 0, 255]);
    assert_eq!(f.pixel(0, 0), [0, 0, 0, 255]);
    assert_eq!(f.pixel(70, 70), [0, 0, 0, 255]);
}

#[test]
fn opacity_is_restored_after_render() {
    let mut surface = black_surface(100, 100);
    let wm = Watermark::image(png(2, 2, [255, 255, 255, 255]))
        .unwrap()
        .with_opacity(30);
    let placement = resolve(100, 100, SizeClass::Small, Position::TopLeft);

    renderer().render(&mut surface, &placement, &wm).unwrap();
    assert_eq!(surface.opacity(), 1.0);
}

#[test]
fn opacity_restored_when_placeholder_drawn() {
    let mut surface = black_surface(50, 50);
    let wm = Watermark::image(b"not an image".to_vec())
        .unwrap()
        .with_opacity(10);
    let placement = resolve(50, 50, SizeClass::Large, Position::Center);

    let report = renderer().render(&mut surface, &placement, &wm).unwrap();
    assert!(report.placeholder_used());
    assert_eq!(surface.opacity(), 1.0);
}

#[test]
fn second_render_is_unaffected_by_first() {
    let white = png(2, 2, [255, 255, 255, 255]);
    let faint = Watermark::image(white.clone())
        .unwrap()
        .with_opacity(20)
        .with_position(Position::TopLeft);
    let full = Watermark::image(white)
        .unwrap()
        .with_position(Position::BottomRight);

    let mut surface = black_surface(100, 100);
    let r = renderer();
    r.render(&mut surface, &resolve(100, 100, faint.size(), faint.position()), &faint)
        .unwrap();
    r.render(&mut surface, &resolve(100, 100, full.size(), full.position()), &full)
        .unwrap();

    let f = surface.frame();
    assert_eq!(f.pixel(85, 85), [255, 255, 255, 255]);
    let faint_px = f.pixel(10, 10);
    assert!((i16::from(faint_px[0]) - 51).abs() <= 2);
}

#[test]
fn bad_asset_draws_opaque_placeholder() {
    let mut surface = black_surface(100, 100);
    let wm = Watermark::image(b"data:image/png;base64,@@@".to_vec()).unwrap();
    let placement = resolve(100, 100, SizeClass::Medium, Position::BottomRight);

    let report = renderer().render(&mut surface, &placement, &wm).unwrap();

    match report {
        RenderReport::Placeholder { reason } => assert!(reason.contains("watermark asset")),
        other => panic!("expected placeholder, got {other:?}"),
    }
    assert_ne!(surface.frame().pixel(74, 74), [0, 0, 0, 255]);
    assert_eq!(surface.frame().pixel(0, 0), [0, 0, 0, 255]);
}

#[test]
fn text_without_fonts_falls_back_to_placeholder() {
    let mut surface = black_surface(100, 100);
    let wm = Watermark::text("© me").unwrap();
    let placement = resolve(100, 100, SizeClass::Medium, Position::BottomRight);

    let report = renderer().render(&mut surface, &placement, &wm).unwrap();
    assert!(report.placeholder_used());
    assert_ne!(surface.frame().pixel(85, 85), [0, 0, 0, 255]);
}

#[test]
fn contain_fit_centers_wide_assets() {
    let asset = Frame::filled(4, 2, [0, 0, 255, 255]).unwrap();
    let (scaled, dx, dy) = contain_fit(&asset, 20, 20).unwrap();
    assert_eq!((scaled.width, scaled.height), (20, 10));
    assert_eq!((dx, dy), (0, 5));
}

#[test]
fn contain_fit_keeps_exact_size() {
    let asset = Frame::filled(10, 10, [1, 2, 3, 255]).unwrap();
    let (scaled, dx, dy) = contain_fit(&asset, 10, 10).unwrap();
    assert_eq!(scaled, asset);
    assert_eq!((dx, dy), (0, 0));
}
