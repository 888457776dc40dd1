use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over for premultiplied pixels, with `src` first scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let weight = opacity_weight(opacity);
    let src_alpha = mul_div255_u8(u16::from(src[3]), weight);
    if src_alpha == 0 {
        return dst;
    }

    let keep = 255 - u16::from(src_alpha);
    std::array::from_fn(|i| {
        let s = if i == 3 {
            src_alpha
        } else {
            mul_div255_u8(u16::from(src[i]), weight)
        };
        s.saturating_add(mul_div255_u8(u16::from(dst[i]), keep))
    })
}

/// [`over`] applied pixel-by-pixel over two equal-length RGBA8 buffers.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> OvermarkResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(OvermarkError::validation(format!(
            "cannot blend {} bytes onto {} bytes of rgba8",
            src.len(),
            dst.len()
        )));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let blended = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&blended);
    }
    Ok(())
}

/// Composite `src` (a `src_w x src_h` premultiplied buffer) onto `dst` at `(x, y)`.
///
/// Pixels falling outside `dst` are clipped.
#[allow(clippy::too_many_arguments)]
pub fn over_at(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    src: &[u8],
    src_w: u32,
    src_h: u32,
    (x, y): (i64, i64),
    opacity: f32,
) -> OvermarkResult<()> {
    if dst.len() != (dst_w as usize) * (dst_h as usize) * 4
        || src.len() != (src_w as usize) * (src_h as usize) * 4
    {
        return Err(OvermarkError::validation(
            "over_at expects buffers matching width*height*4",
        ));
    }

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src_w)).min(i64::from(dst_w));
    let y1 = (y + i64::from(src_h)).min(i64::from(dst_h));
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let run = ((x1 - x0) as usize) * 4;
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        let sx = (x0 - x) as usize;
        let s_off = (sy * src_w as usize + sx) * 4;
        let d_off = (dy as usize * dst_w as usize + x0 as usize) * 4;
        over_in_place(
            &mut dst[d_off..d_off + run],
            &src[s_off..s_off + run],
            opacity,
        )?;
    }
    Ok(())
}

/// Scale every channel of a premultiplied buffer by `factor`.
pub fn scale_alpha_in_place(buf: &mut [u8], factor: f32) {
    let weight = opacity_weight(factor);
    buf.iter_mut()
        .for_each(|c| *c = mul_div255_u8(u16::from(*c), weight));
}

/// `[0, 1]` opacity as an 8-bit weight. NaN counts as transparent.
fn opacity_weight(opacity: f32) -> u16 {
    if opacity.is_nan() {
        return 0;
    }
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u16
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
