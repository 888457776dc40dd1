//! Size-class and position lookup tables.
//!
//! These tables are the single source for the enum-to-value mappings used by the geometry
//! resolver, the renderer and the transcoder filter builder. Unknown keys normalize to
//! [`DEFAULT_SIZE`] (medium) and [`DEFAULT_POSITION`] (bottom-right); they are never rejected.

use serde::{Deserialize, Serialize};

/// Watermark size relative to the shorter frame dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeClass {
    /// 15% of the shorter side.
    Small,
    /// 25% of the shorter side.
    #[default]
    Medium,
    /// 35% of the shorter side.
    Large,
}

/// Watermark anchor position within the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// Top-left corner, inset by the padding.
    TopLeft,
    /// Top-right corner, inset by the padding.
    TopRight,
    /// Bottom-left corner, inset by the padding.
    BottomLeft,
    /// Bottom-right corner, inset by the padding.
    #[default]
    BottomRight,
    /// Centered on both axes.
    Center,
}

/// Placement of the watermark along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// `padding`
    Start,
    /// `(frame - mark) / 2`
    Center,
    /// `frame - mark - padding`
    End,
}

/// Size used when a preset carries an unknown size key.
pub const DEFAULT_SIZE: SizeClass = SizeClass::Medium;
/// Position used when a preset carries an unknown position key.
pub const DEFAULT_POSITION: Position = Position::BottomRight;
/// Edge padding as a fraction of the shorter frame dimension.
pub const PADDING_FRACTION: f64 = 0.02;

const SIZE_TABLE: [(SizeClass, &str, f64); 3] = [
    (SizeClass::Small, "small", 0.15),
    (SizeClass::Medium, "medium", 0.25),
    (SizeClass::Large, "large", 0.35),
];

const POSITION_TABLE: [(Position, &str, Anchor, Anchor); 5] = [
    (Position::TopLeft, "top-left", Anchor::Start, Anchor::Start),
    (Position::TopRight, "top-right", Anchor::End, Anchor::Start),
    (Position::BottomLeft, "bottom-left", Anchor::Start, Anchor::End),
    (Position::BottomRight, "bottom-right", Anchor::End, Anchor::End),
    (Position::Center, "center", Anchor::Center, Anchor::Center),
];

impl SizeClass {
    /// All size classes, smallest first.
    pub const ALL: [SizeClass; 3] = [SizeClass::Small, SizeClass::Medium, SizeClass::Large];

    /// Fraction of `min(frame_width, frame_height)` covered by the watermark box.
    pub fn scale_factor(self) -> f64 {
        SIZE_TABLE
            .iter()
            .find(|(s, _, _)| *s == self)
            .map(|(_, _, f)| *f)
            .unwrap_or(0.25)
    }

    /// Stable key used in presets.
    pub fn as_str(self) -> &'static str {
        SIZE_TABLE
            .iter()
            .find(|(s, _, _)| *s == self)
            .map(|(_, k, _)| *k)
            .unwrap_or("medium")
    }

    /// Parse a preset key, normalizing unknown values to [`DEFAULT_SIZE`].
    pub fn parse_lenient(key: &str) -> Self {
        let key = normalize_key(key);
        match SIZE_TABLE.iter().find(|(_, k, _)| *k == key) {
            Some((s, _, _)) => *s,
            None => {
                tracing::debug!(key = %key, "unknown size class, using default");
                DEFAULT_SIZE
            }
        }
    }
}

impl Position {
    /// All positions in table order.
    pub const ALL: [Position; 5] = [
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
        Position::Center,
    ];

    /// Horizontal and vertical anchors for this position.
    pub fn anchors(self) -> (Anchor, Anchor) {
        POSITION_TABLE
            .iter()
            .find(|(p, _, _, _)| *p == self)
            .map(|(_, _, x, y)| (*x, *y))
            .unwrap_or((Anchor::End, Anchor::End))
    }

    /// Stable key used in presets.
    pub fn as_str(self) -> &'static str {
        POSITION_TABLE
            .iter()
            .find(|(p, _, _, _)| *p == self)
            .map(|(_, k, _, _)| *k)
            .unwrap_or("bottom-right")
    }

    /// Parse a preset key, normalizing unknown values to [`DEFAULT_POSITION`].
    pub fn parse_lenient(key: &str) -> Self {
        let key = normalize_key(key);
        match POSITION_TABLE.iter().find(|(_, k, _, _)| *k == key) {
            Some((p, _, _, _)) => *p,
            None => {
                tracing::debug!(key = %key, "unknown position, using default");
                DEFAULT_POSITION
            }
        }
    }
}

impl Anchor {
    /// Offset of the watermark along this axis, in pixels.
    pub fn offset(self, frame: f64, mark: f64, padding: f64) -> f64 {
        match self {
            Anchor::Start => padding,
            Anchor::Center => (frame - mark) / 2.0,
            Anchor::End => frame - mark - padding,
        }
    }

    /// The same offset as an ffmpeg `overlay` expression.
    ///
    /// `main` and `overlay` are the filter's size variables for this axis
    /// (`main_w`/`overlay_w` or `main_h`/`overlay_h`).
    pub fn filter_expr(self, main: &str, overlay: &str, padding: f64) -> String {
        match self {
            Anchor::Start => format!("{padding:.2}"),
            Anchor::Center => format!("({main}-{overlay})/2"),
            Anchor::End => format!("{main}-{overlay}-{padding:.2}"),
        }
    }
}

impl std::fmt::Display for SizeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/table.rs"]
mod tests;
