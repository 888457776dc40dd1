/// Convenience result type used across overmark.
pub type OvermarkResult<T> = Result<T, OvermarkError>;

/// Top-level error taxonomy.
///
/// Every failure is scoped to the single file being processed. Batch drivers report the
/// `Display` form of the final error only.
#[derive(thiserror::Error, Debug)]
pub enum OvermarkError {
    /// Invalid caller-provided data (watermark descriptor, settings, frame sizes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Source media is unreadable or corrupt.
    #[error("decode error: {0}")]
    Decode(String),

    /// The watermark asset could not be drawn. Recovered locally by the renderer.
    #[error("watermark asset error: {0}")]
    WatermarkAsset(String),

    /// The external transcoder is not installed or not usable.
    #[error("transcoder unavailable: {0}")]
    TranscoderUnavailable(String),

    /// The external transcoder ran but failed.
    #[error("transcoder error: {0}")]
    TranscoderRuntime(String),

    /// The synthetic clip encoder failed.
    #[error("clip synthesis error: {0}")]
    ClipSynthesis(String),

    /// Output encoding failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The input is neither a supported image nor a video.
    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),

    /// A video job exhausted its fallback chain. Carries the last tier's cause only.
    #[error("video overlay failed during {stage}: {source}")]
    Overlay {
        /// Stage that produced the terminal failure.
        stage: crate::video::job::JobStage,
        /// Underlying cause from that stage.
        #[source]
        source: Box<OvermarkError>,
    },

    /// The batch was aborted before this file finished.
    #[error("cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OvermarkError {
    /// Build a [`OvermarkError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`OvermarkError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`OvermarkError::WatermarkAsset`] value.
    pub fn watermark_asset(msg: impl Into<String>) -> Self {
        Self::WatermarkAsset(msg.into())
    }

    /// Build a [`OvermarkError::TranscoderUnavailable`] value.
    pub fn transcoder_unavailable(msg: impl Into<String>) -> Self {
        Self::TranscoderUnavailable(msg.into())
    }

    /// Build a [`OvermarkError::TranscoderRuntime`] value.
    pub fn transcoder(msg: impl Into<String>) -> Self {
        Self::TranscoderRuntime(msg.into())
    }

    /// Build a [`OvermarkError::ClipSynthesis`] value.
    pub fn clip_synthesis(msg: impl Into<String>) -> Self {
        Self::ClipSynthesis(msg.into())
    }

    /// Build a [`OvermarkError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`OvermarkError::UnsupportedMedia`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedMedia(msg.into())
    }

    /// Innermost overmark error, looking through [`OvermarkError::Overlay`] wrappers.
    pub fn root_cause(&self) -> &OvermarkError {
        match self {
            Self::Overlay { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True when the root cause is unreadable source media.
    pub fn is_decode(&self) -> bool {
        matches!(self.root_cause(), Self::Decode(_))
    }

    /// True when the root cause is cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
