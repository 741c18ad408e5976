//! Audio/stream backend contract.

use async_trait::async_trait;

use crate::error::AudioError;

/// Placeholder used when the stream reports no usable title or artist.
pub const UNKNOWN_LABEL: &str = "[Unknown]";

/// Title some stream players report when the stream has no metadata.
const GENERIC_STREAM_TITLE: &str = "stream";

/// Now-playing metadata read from the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl StreamMetadata {
    /// Returns the `"{artist} - {title}"` label shown on the panel.
    ///
    /// Missing, blank, or generic (`"stream"` without an artist) values are
    /// replaced by [`UNKNOWN_LABEL`].
    ///
    /// # Example
    /// ```
    /// use inkclock::StreamMetadata;
    ///
    /// let md = StreamMetadata { title: Some("stream".into()), artist: None };
    /// assert_eq!(md.label(), "[Unknown] - [Unknown]");
    /// ```
    pub fn label(&self) -> String {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let mut title = clean(&self.title);
        let artist = clean(&self.artist);
        if artist.is_none() && title.as_deref() == Some(GENERIC_STREAM_TITLE) {
            title = None;
        }
        format!(
            "{} - {}",
            artist.as_deref().unwrap_or(UNKNOWN_LABEL),
            title.as_deref().unwrap_or(UNKNOWN_LABEL)
        )
    }
}

/// Network audio player driven by the alarm controller.
#[async_trait]
pub trait AudioBackend: Send {
    /// Starts (or restarts) playback of `uri`.
    async fn play(&mut self, uri: &str) -> Result<(), AudioError>;

    /// Stops playback.
    async fn stop(&mut self) -> Result<(), AudioError>;

    /// Sets output volume, `0..=100`.
    async fn set_volume(&mut self, volume: u8) -> Result<(), AudioError>;

    /// Reads the current stream metadata.
    async fn read_metadata(&mut self) -> Result<StreamMetadata, AudioError>;
}
