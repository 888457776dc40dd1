use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_half_opacity_blends() {
    let dst = [0, 0, 0, 255];
    let src = [255, 255, 255, 255];
    let out = over(dst, src, 0.5);
    assert_eq!(out[3], 255);
    assert!((i16::from(out[0]) - 128).abs() <= 1);
}

#[test]
fn over_at_clips_to_destination() {
    let (dw, dh) = (4u32, 4u32);
    let mut dst = [0u8, 0, 0, 255].repeat((dw * dh) as usize);
    let src = [255u8, 255, 255, 255].repeat(9);

    over_at(&mut dst, dw, dh, &src, 3, 3, (2, 2), 1.0).unwrap();

    let px = |x: usize, y: usize| {
        let i = (y * dw as usize + x) * 4;
        [dst[i], dst[i + 1], dst[i + 2], dst[i + 3]]
    };
    assert_eq!(px(0, 0), [0, 0, 0, 255]);
    assert_eq!(px(1, 1), [0, 0, 0, 255]);
    assert_eq!(px(2, 2), [255, 255, 255, 255]);
    assert_eq!(px(3, 3), [255, 255, 255, 255]);
}

#[test]
fn over_at_negative_origin() {
    let mut dst = [0u8, 0, 0, 255].repeat(4);
    let src = [255u8, 0, 0, 255].repeat(4);
    over_at(&mut dst, 2, 2, &src, 2, 2, (-1, -1), 1.0).unwrap();
    assert_eq!(&dst[0..4], &[255, 0, 0, 255]);
    assert_eq!(&dst[4..8], &[0, 0, 0, 255]);
}

#[test]
fn over_at_rejects_bad_sizes() {
    let mut dst = vec![0u8; 16];
    assert!(over_at(&mut dst, 2, 2, &[0u8; 3], 1, 1, (0, 0), 1.0).is_err());
}

#[test]
fn scale_alpha_halves_channels() {
    let mut buf = vec![200u8, 100, 0, 200];
    scale_alpha_in_place(&mut buf, 0.5);
    assert_eq!(buf, vec![100, 50, 0, 100]);
}
