use crate::foundation::core::Frame;
use crate::foundation::error::{OvermarkError, OvermarkResult};

/// Separable Gaussian blur of a premultiplied frame, used for the text drop shadow.
///
/// Edges clamp. A radius of zero returns an unchanged copy.
pub fn gaussian_blur(frame: &Frame, radius: u32, sigma: f32) -> OvermarkResult<Frame> {
    if radius == 0 {
        return Ok(frame.clone());
    }

    let kernel = kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; frame.data.len()];
    let mut out = vec![0u8; frame.data.len()];

    convolve(&frame.data, &mut tmp, frame.width, frame.height, &kernel, Axis::X);
    convolve(&tmp, &mut out, frame.width, frame.height, &kernel, Axis::Y);
    Frame::from_premul(frame.width, frame.height, out)
}

/// Normalized kernel in 16.16 fixed point; weights sum to exactly `1 << 16`.
fn kernel_q16(radius: u32, sigma: f32) -> OvermarkResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(OvermarkError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let raw: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();

    let mut weights: Vec<u32> = raw
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Rounding drift goes to the center tap.
    let total: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + (65536 - total)).clamp(0, 65536) as u32;
    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn convolve(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i32;
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + d).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out + c] = ((a + 32768) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
