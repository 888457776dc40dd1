use std::path::Path;

use crate::foundation::error::{OvermarkError, OvermarkResult};

/// Broad media class of an input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff"];
const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "m4v", "mov", "webm", "mkv", "avi", "3gp"];

/// Classify an input by content first, then by file extension.
///
/// Content sniffing wins so that a mislabeled file still takes the right path. An empty file
/// is classified by extension only, so its decode error comes from the matching pipeline.
pub fn classify(file_name: &str, bytes: &[u8]) -> OvermarkResult<MediaKind> {
    if !bytes.is_empty() {
        if image::guess_format(bytes).is_ok() {
            return Ok(MediaKind::Image);
        }
        if looks_like_video(bytes) {
            return Ok(MediaKind::Video);
        }
    }

    match extension_of(file_name).as_deref() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Ok(MediaKind::Image),
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext) => Ok(MediaKind::Video),
        _ => Err(OvermarkError::unsupported(format!(
            "'{file_name}' is neither a supported image nor a video"
        ))),
    }
}

/// Lowercase extension of `file_name`, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Suggested download name for a processed file: `watermarked_<stem>.<ext>`.
pub fn output_file_name(source_name: &str, ext: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("media");
    format!("watermarked_{stem}.{ext}")
}

fn looks_like_video(bytes: &[u8]) -> bool {
    // ISO BMFF (mp4/mov/3gp): box size then `ftyp`.
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return true;
    }
    // Matroska / WebM EBML header.
    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return true;
    }
    // AVI
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"AVI "
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
