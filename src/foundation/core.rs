use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::foundation::math::{mul_div255_u16, unpremultiply_rgba8_in_place};

/// A decoded raster surface.
///
/// Pixels are **premultiplied** RGBA8, tightly packed, row-major. This is the single pixel
/// representation used between decode, render and encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Fully transparent frame.
    pub fn transparent(width: u32, height: u32) -> OvermarkResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Frame filled with a single premultiplied color.
    pub fn filled(width: u32, height: u32, premul: [u8; 4]) -> OvermarkResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: premul.repeat(len / 4),
        })
    }

    /// Wrap existing premultiplied bytes, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> OvermarkResult<Self> {
        let len = byte_len(width, height)?;
        if data.len() != len {
            return Err(OvermarkError::validation(format!(
                "frame buffer size mismatch: got {} bytes, expected {len} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Premultiplied pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = self.index(x, y);
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// True when at least one pixel is not fully opaque.
    pub fn has_translucency(&self) -> bool {
        self.data.chunks_exact(4).any(|px| px[3] != 255)
    }

    /// True when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Straight-alpha RGBA8 copy, suitable for alpha-capable encoders.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Opaque RGB8 copy flattened over `bg_rgb`.
    pub fn flatten_to_rgb8(&self, bg_rgb: [u8; 3]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() / 4 * 3);
        for px in self.data.chunks_exact(4) {
            let inv = 255u16 - u16::from(px[3]);
            for c in 0..3 {
                let v = u16::from(px[c]) + mul_div255_u16(u16::from(bg_rgb[c]), inv);
                out.push(v.min(255) as u8);
            }
        }
        out
    }
}

fn byte_len(width: u32, height: u32) -> OvermarkResult<usize> {
    if width == 0 || height == 0 {
        return Err(OvermarkError::validation("frame width/height must be non-zero"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| OvermarkError::validation("frame buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
