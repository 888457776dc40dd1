use super::*;
use crate::foundation::error::OvermarkError;

fn black(w: u32, h: u32) -> Surface {
    Surface::new(Frame::filled(w, h, [0, 0, 0, 255]).unwrap())
}

#[test]
fn opacity_defaults_to_one() {
    assert_eq!(black(2, 2).opacity(), 1.0);
}

#[test]
fn scope_restores_after_early_error() {
    let mut s = black(2, 2);
    let res: OvermarkResult<()> = s.with_opacity(0.3, |inner| {
        assert!((inner.opacity() - 0.3).abs() < f32::EPSILON);
        Err(OvermarkError::watermark_asset("boom"))
    });
    assert!(res.is_err());
    assert_eq!(s.opacity(), 1.0);
}

#[test]
fn scope_restores_after_panic() {
    let mut s = black(2, 2);
    let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _scope = s.scoped_opacity(0.1);
        panic!("draw failed");
    }));
    assert!(caught.is_err());
    assert_eq!(s.opacity(), 1.0);
}

#[test]
fn nested_scopes_unwind_in_order() {
    let mut s = black(2, 2);
    {
        let mut outer = s.scoped_opacity(0.5);
        {
            let inner = outer.scoped_opacity(0.2);
            assert!((inner.opacity() - 0.2).abs() < f32::EPSILON);
        }
        assert!((outer.opacity() - 0.5).abs() < f32::EPSILON);
    }
    assert_eq!(s.opacity(), 1.0);
}

#[test]
fn draw_layer_respects_opacity() {
    let mut s = black(2, 1);
    let white = Frame::filled(1, 1, [255, 255, 255, 255]).unwrap();

    s.draw_layer(0, 0, &white).unwrap();
    s.with_opacity(0.5, |inner| inner.draw_layer(1, 0, &white))
        .unwrap();

    let f = s.frame();
    assert_eq!(f.pixel(0, 0), [255, 255, 255, 255]);
    let half = f.pixel(1, 0);
    assert!((i16::from(half[0]) - 128).abs() <= 1);
    assert_eq!(half[3], 255);
}

#[test]
fn draw_layer_clips_outside() {
    let mut s = black(2, 2);
    let white = Frame::filled(2, 2, [255, 255, 255, 255]).unwrap();
    s.draw_layer(5, 5, &white).unwrap();
    assert!(s.frame().data.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}
