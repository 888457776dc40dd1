use super::*;

const FRAMES: [(u32, u32); 6] = [
    (100, 100),
    (1920, 1080),
    (1080, 1920),
    (640, 480),
    (33, 7),
    (4000, 3000),
];

#[test]
fn box_is_square_and_scaled_from_shorter_side() {
    for (w, h) in FRAMES {
        for size in SizeClass::ALL {
            let p = resolve(w, h, size, Position::Center);
            let expected = size.scale_factor() * f64::from(w.min(h));
            assert_eq!(p.width, p.height);
            assert_eq!(p.width, expected);
        }
    }
}

#[test]
fn every_position_stays_inside_the_frame() {
    for (w, h) in FRAMES {
        for size in SizeClass::ALL {
            for position in Position::ALL {
                let p = resolve(w, h, size, position);
                assert!(
                    p.fits_within(w, h),
                    "{size} {position} on {w}x{h} escaped: {p:?}"
                );
            }
        }
    }
}

#[test]
fn bottom_right_medium_on_square_frame() {
    let p = resolve(100, 100, SizeClass::Medium, Position::BottomRight);
    assert_eq!(p.width, 25.0);
    assert_eq!(p.origin_x, 73.0);
    assert_eq!(p.origin_y, 73.0);
    assert_eq!(
        p.to_pixel_rect(),
        PixelRect {
            x: 73,
            y: 73,
            width: 25,
            height: 25
        }
    );
}

#[test]
fn corners_use_padding() {
    let pad = padding_for(1920, 1080);
    assert!((pad - 21.6).abs() < 1e-9);

    let tl = resolve(1920, 1080, SizeClass::Small, Position::TopLeft);
    assert_eq!((tl.origin_x, tl.origin_y), (pad, pad));

    let tr = resolve(1920, 1080, SizeClass::Small, Position::TopRight);
    assert!((tr.right() - (1920.0 - pad)).abs() < 1e-9);

    let bl = resolve(1920, 1080, SizeClass::Small, Position::BottomLeft);
    assert!((bl.bottom() - (1080.0 - pad)).abs() < 1e-9);
}

#[test]
fn center_is_centered() {
    let p = resolve(640, 480, SizeClass::Large, Position::Center);
    assert!((p.origin_x + p.width / 2.0 - 320.0).abs() < 1e-9);
    assert!((p.origin_y + p.height / 2.0 - 240.0).abs() < 1e-9);
}

#[test]
fn resolution_is_idempotent() {
    for position in Position::ALL {
        let a = resolve(1279, 719, SizeClass::Large, position);
        let b = resolve(1279, 719, SizeClass::Large, position);
        assert_eq!(a.origin_x.to_bits(), b.origin_x.to_bits());
        assert_eq!(a.origin_y.to_bits(), b.origin_y.to_bits());
        assert_eq!(a.width.to_bits(), b.width.to_bits());
        assert_eq!(a.height.to_bits(), b.height.to_bits());
    }
}

#[test]
fn malformed_keys_resolve_to_medium_bottom_right() {
    let lenient = resolve_keys(800, 600, "gigantic", "somewhere");
    let explicit = resolve(800, 600, SizeClass::Medium, Position::BottomRight);
    assert_eq!(lenient, explicit);
}
