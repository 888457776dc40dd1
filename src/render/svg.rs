use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::Context;

use crate::foundation::core::Frame;
use crate::foundation::error::{OvermarkError, OvermarkResult};

/// Font database shared by every text raster in a process or batch.
#[derive(Clone, Debug)]
pub struct FontSet {
    db: Arc<usvg::fontdb::Database>,
}

impl FontSet {
    /// System fonts, loaded once per process.
    pub fn system() -> Self {
        static SYSTEM: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
        let db = SYSTEM.get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts");
            Arc::new(db)
        });
        Self { db: db.clone() }
    }

    /// System fonts plus every `ttf`/`otf`/`ttc` file directly inside `dir`.
    pub fn with_fonts_dir(dir: &Path) -> Self {
        let mut db = (*Self::system().db).clone();
        load_fonts_from_dir(&mut db, dir);
        Self { db: Arc::new(db) }
    }

    /// No fonts at all. Text drawn with this set always falls back to the placeholder.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    fn options(&self) -> usvg::Options<'static> {
        usvg::Options {
            fontdb: self.db.clone(),
            font_resolver: font_resolver(),
            ..Default::default()
        }
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::system()
    }
}

/// Parse `markup` and rasterize it into a premultiplied `width x height` frame.
///
/// The SVG's own size is stretched to the target size.
pub fn rasterize(markup: &str, fonts: &FontSet, width: u32, height: u32) -> OvermarkResult<Frame> {
    let tree = usvg::Tree::from_str(markup, &fonts.options()).context("parse svg markup")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| OvermarkError::validation("svg raster size must be non-zero"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    Frame::from_premul(width, height, pixmap.take())
}

/// Escape text for use as SVG character data or attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "fonts directory is not readable");
        return;
    };

    for path in rd.flatten().map(|e| e.path()) {
        let is_font = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
            .unwrap_or(false);
        if !is_font || !path.is_file() {
            continue;
        }
        if let Err(err) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), %err, "skipping unreadable font");
        }
    }
}

/// Resolve the requested family, then generic families, then any face at all.
///
/// Stretch is always queried as normal: watermark markup never sets `font-stretch`, and a
/// condensed request must still land on a face rather than on the any-face fallback.
fn font_resolver() -> usvg::FontResolver<'static> {
    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<usvg::fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                })
                .collect();
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg.rs"]
mod tests;
