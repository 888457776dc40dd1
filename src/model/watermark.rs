use serde::Deserialize;

use crate::assets::decode::decode_watermark_asset;
use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::geometry::table::{Position, SizeClass};

/// Which kind of overlay a [`Watermark`] draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatermarkKind {
    Text,
    Image,
}

/// Watermark payload.
#[derive(Clone, PartialEq, Eq)]
pub enum WatermarkContent {
    /// Text drawn with the built-in text style.
    Text(String),
    /// Encoded image bytes, or a `data:` URL holding them.
    Image(Vec<u8>),
}

impl std::fmt::Debug for WatermarkContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Self::Image(b) => write!(f, "Image({} bytes)", b.len()),
        }
    }
}

/// User-defined overlay descriptor. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Watermark {
    id: Option<String>,
    name: Option<String>,
    content: WatermarkContent,
    size: SizeClass,
    position: Position,
    opacity_percent: u8,
}

impl Watermark {
    /// Text watermark with default size, position and full opacity.
    pub fn text(content: impl Into<String>) -> OvermarkResult<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(OvermarkError::validation("watermark text must be non-empty"));
        }
        Ok(Self::with_content(WatermarkContent::Text(content)))
    }

    /// Image watermark from encoded bytes or a `data:` URL.
    ///
    /// Decodability is checked at render time; a bad asset renders as a placeholder.
    pub fn image(bytes: impl Into<Vec<u8>>) -> OvermarkResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(OvermarkError::validation("watermark image must be non-empty"));
        }
        Ok(Self::with_content(WatermarkContent::Image(bytes)))
    }

    fn with_content(content: WatermarkContent) -> Self {
        Self {
            id: None,
            name: None,
            content,
            size: SizeClass::default(),
            position: Position::default(),
            opacity_percent: 100,
        }
    }

    pub fn with_size(mut self, size: SizeClass) -> Self {
        self.size = size;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set opacity in percent; values outside `[0, 100]` are clamped.
    pub fn with_opacity(mut self, percent: i64) -> Self {
        self.opacity_percent = percent.clamp(0, 100) as u8;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> WatermarkKind {
        match self.content {
            WatermarkContent::Text(_) => WatermarkKind::Text,
            WatermarkContent::Image(_) => WatermarkKind::Image,
        }
    }

    pub fn content(&self) -> &WatermarkContent {
        &self.content
    }

    pub fn size(&self) -> SizeClass {
        self.size
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn opacity_percent(&self) -> u8 {
        self.opacity_percent
    }

    /// Opacity as a multiplier in `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        f32::from(self.opacity_percent) / 100.0
    }

    /// Whether a container image/video must be saved in an alpha-capable format.
    ///
    /// True when opacity is below 100% or the image asset has translucent pixels. An
    /// undecodable asset counts as opaque (the placeholder is opaque).
    pub fn needs_alpha_output(&self) -> bool {
        if self.opacity_percent < 100 {
            return true;
        }
        match &self.content {
            WatermarkContent::Text(_) => false,
            WatermarkContent::Image(bytes) => decode_watermark_asset(bytes)
                .map(|frame| frame.has_translucency())
                .unwrap_or(false),
        }
    }

    /// Parse a saved preset record.
    ///
    /// Accepts the preset shape `{id, type, content, name, size, position, opacity, created}`.
    /// Unknown size/position keys normalize to medium/bottom-right and opacity is clamped.
    pub fn from_preset_json(json: &str) -> OvermarkResult<Self> {
        let record: PresetRecord = serde_json::from_str(json)
            .map_err(|e| OvermarkError::validation(format!("invalid watermark preset: {e}")))?;
        Self::try_from(record)
    }
}

#[derive(Deserialize)]
struct PresetRecord {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(rename = "type")]
    kind: String,
    content: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    opacity: Option<serde_json::Value>,
}

impl TryFrom<PresetRecord> for Watermark {
    type Error = OvermarkError;

    fn try_from(r: PresetRecord) -> OvermarkResult<Self> {
        let base = match r.kind.trim().to_ascii_lowercase().as_str() {
            "text" => Watermark::text(r.content)?,
            "image" => Watermark::image(r.content.into_bytes())?,
            other => {
                return Err(OvermarkError::validation(format!(
                    "unknown watermark type '{other}'"
                )));
            }
        };

        let mut wm = base
            .with_size(SizeClass::parse_lenient(r.size.as_deref().unwrap_or("")))
            .with_position(Position::parse_lenient(r.position.as_deref().unwrap_or("")))
            .with_opacity(lenient_opacity(r.opacity.as_ref()));
        wm.name = r.name;
        wm.id = r.id.and_then(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        Ok(wm)
    }
}

impl<'de> Deserialize<'de> for Watermark {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = PresetRecord::deserialize(deserializer)?;
        Watermark::try_from(record).map_err(serde::de::Error::custom)
    }
}

fn lenient_opacity(v: Option<&serde_json::Value>) -> i64 {
    let parsed = match v {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => f.round().clamp(0.0, 100.0) as i64,
        _ => 100,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/watermark.rs"]
mod tests;
