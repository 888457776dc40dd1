use serde::Serialize;

use crate::geometry::table::{PADDING_FRACTION, Position, SizeClass};

/// Pixel box where a watermark is drawn on a given frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Placement {
    /// Left edge in frame pixels.
    pub origin_x: f64,
    /// Top edge in frame pixels.
    pub origin_y: f64,
    /// Box width in pixels.
    pub width: f64,
    /// Box height in pixels.
    pub height: f64,
}

/// Integer pixel box derived from a [`Placement`].
///
/// The origin may lie outside the frame; drawing clips to the frame bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Right edge (exclusive).
    pub fn right(&self) -> f64 {
        self.origin_x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> f64 {
        self.origin_y + self.height
    }

    /// True when the box lies within `[0, w] x [0, h]`.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.origin_x >= 0.0
            && self.origin_y >= 0.0
            && self.right() <= f64::from(frame_width)
            && self.bottom() <= f64::from(frame_height)
    }

    /// Round to whole pixels. Width and height are at least one pixel.
    pub fn to_pixel_rect(&self) -> PixelRect {
        PixelRect {
            x: self.origin_x.round() as i64,
            y: self.origin_y.round() as i64,
            width: (self.width.round() as u32).max(1),
            height: (self.height.round() as u32).max(1),
        }
    }
}

/// Edge padding for a frame, in pixels.
pub fn padding_for(frame_width: u32, frame_height: u32) -> f64 {
    PADDING_FRACTION * shorter_side(frame_width, frame_height)
}

/// Compute where a watermark of `size` sits on a `frame_width x frame_height` frame.
///
/// Pure and deterministic: identical inputs always produce bit-identical output.
pub fn resolve(
    frame_width: u32,
    frame_height: u32,
    size: SizeClass,
    position: Position,
) -> Placement {
    let shorter = shorter_side(frame_width, frame_height);
    let mark = size.scale_factor() * shorter;
    let padding = PADDING_FRACTION * shorter;

    let (ax, ay) = position.anchors();
    Placement {
        origin_x: ax.offset(f64::from(frame_width), mark, padding),
        origin_y: ay.offset(f64::from(frame_height), mark, padding),
        width: mark,
        height: mark,
    }
}

/// [`resolve`] for raw preset keys; unknown keys take the table defaults.
pub fn resolve_keys(frame_width: u32, frame_height: u32, size: &str, position: &str) -> Placement {
    resolve(
        frame_width,
        frame_height,
        SizeClass::parse_lenient(size),
        Position::parse_lenient(position),
    )
}

fn shorter_side(frame_width: u32, frame_height: u32) -> f64 {
    f64::from(frame_width.min(frame_height))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/resolver.rs"]
mod tests;
