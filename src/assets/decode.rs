use std::borrow::Cow;

use base64::Engine as _;

use crate::foundation::core::Frame;
use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decode encoded still-image bytes into a premultiplied [`Frame`].
///
/// Failures are [`OvermarkError::Decode`]: the source is unreadable or corrupt.
pub fn decode_frame(bytes: &[u8]) -> OvermarkResult<Frame> {
    if bytes.is_empty() {
        return Err(OvermarkError::decode("source image is empty"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| OvermarkError::decode(format!("decode image from memory: {e}")))?;
    frame_from_dynamic(dyn_img)
}

/// Decode a watermark asset (raw encoded bytes or a `data:` URL).
///
/// Failures are [`OvermarkError::WatermarkAsset`] so callers can recover with a placeholder.
pub fn decode_watermark_asset(bytes: &[u8]) -> OvermarkResult<Frame> {
    let raw = strip_data_url(bytes)?;
    let dyn_img = image::load_from_memory(&raw)
        .map_err(|e| OvermarkError::watermark_asset(format!("decode watermark image: {e}")))?;
    frame_from_dynamic(dyn_img).map_err(|e| OvermarkError::watermark_asset(e.to_string()))
}

/// Return the payload of a `data:` URL, or the input unchanged when it is not one.
pub fn strip_data_url(bytes: &[u8]) -> OvermarkResult<Cow<'_, [u8]>> {
    if !bytes.starts_with(b"data:") {
        return Ok(Cow::Borrowed(bytes));
    }
    let comma = bytes
        .iter()
        .position(|&b| b == b',')
        .ok_or_else(|| OvermarkError::watermark_asset("data URL has no payload separator"))?;
    let header = &bytes[5..comma];
    let payload = &bytes[comma + 1..];

    if header.ends_with(b";base64") {
        let cleaned: Vec<u8> = payload
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&cleaned)
            .map_err(|e| OvermarkError::watermark_asset(format!("data URL base64: {e}")))?;
        Ok(Cow::Owned(decoded))
    } else {
        Ok(Cow::Borrowed(payload))
    }
}

fn frame_from_dynamic(dyn_img: image::DynamicImage) -> OvermarkResult<Frame> {
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    Frame::from_premul(width, height, data)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
