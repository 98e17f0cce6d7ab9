//! Analyzer configuration
//!
//! All fields are defaulted, so an empty YAML document yields the stock
//! configuration:
//!
//! ```yaml
//! audio_media_tag: 15
//! video_media_tag: 16
//! audio_sampling_rate: 8000
//! video_sampling_rate: 90000
//! stats_interval_secs: 1
//! normalization:
//!   window_capacity: 100
//!   media_tag: 16
//!   stream_type: media
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::{MediaType, PacketMeta, StreamType};
use crate::{AnalysisError, Result};

/// Top-level analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Media tag identifying audio packets
    pub audio_media_tag: u8,
    /// Media tag identifying video packets
    pub video_media_tag: u8,
    /// RTP clock rate for audio sessions in Hz
    pub audio_sampling_rate: u32,
    /// RTP clock rate for every non-audio session in Hz
    pub video_sampling_rate: u32,
    /// Capture-time cadence of per-session statistics reports
    pub stats_interval_secs: u64,
    pub normalization: NormalizationConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            audio_media_tag: 15,
            video_media_tag: 16,
            audio_sampling_rate: 8000,
            video_sampling_rate: 90_000,
            stats_interval_secs: 1,
            normalization: NormalizationConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::unreadable(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.audio_sampling_rate == 0 || self.video_sampling_rate == 0 {
            return Err(AnalysisError::config("sampling rates must be non-zero"));
        }
        if self.normalization.window_capacity == 0 {
            return Err(AnalysisError::config("normalization.window_capacity must be non-zero"));
        }
        if self.stats_interval_secs == 0 {
            return Err(AnalysisError::config("stats_interval_secs must be non-zero"));
        }
        Ok(())
    }

    /// Classify a packet media tag.
    pub fn media_type(&self, media_tag: u8) -> MediaType {
        if media_tag == self.audio_media_tag {
            MediaType::Audio
        } else if media_tag == self.video_media_tag {
            MediaType::Video
        } else {
            MediaType::Other(media_tag)
        }
    }

    /// RTP clock rate for a session of the given media type.
    pub fn sampling_rate(&self, media_type: MediaType) -> u32 {
        match media_type {
            MediaType::Audio => self.audio_sampling_rate,
            MediaType::Video | MediaType::Other(_) => self.video_sampling_rate,
        }
    }
}

/// Which frames feed clock normalization, and how many samples the offset
/// window keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    pub window_capacity: usize,
    /// Media tag the first packet of a frame must carry
    pub media_tag: u8,
    /// Stream type the owning session must have
    pub stream_type: StreamType,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self { window_capacity: 100, media_tag: 16, stream_type: StreamType::Media }
    }
}

impl NormalizationConfig {
    /// Whether a frame takes part in normalization and export.
    pub fn accepts(&self, first_packet: &PacketMeta, stream_type: StreamType) -> bool {
        first_packet.media_tag == self.media_tag && stream_type == self.stream_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn empty_document_is_default() -> Result<()> {
        assert_eq!(AnalyzerConfig::from_yaml_str("")?, AnalyzerConfig::default());
        assert_eq!(AnalyzerConfig::from_yaml_str("{}")?, AnalyzerConfig::default());
        Ok(())
    }

    #[test]
    fn partial_documents_keep_defaults() -> Result<()> {
        let config = AnalyzerConfig::from_yaml_str(
            "video_media_tag: 98\nnormalization:\n  media_tag: 98\n  window_capacity: 20\n",
        )?;

        assert_eq!(config.video_media_tag, 98);
        assert_eq!(config.audio_media_tag, 15);
        assert_eq!(config.normalization.window_capacity, 20);
        assert_eq!(config.normalization.stream_type, StreamType::Media);
        assert_eq!(config.media_type(98), MediaType::Video);
        assert_eq!(config.media_type(16), MediaType::Other(16));
        Ok(())
    }

    #[test]
    fn invalid_documents_are_config_errors() {
        let unknown = AnalyzerConfig::from_yaml_str("no_such_key: 1");
        assert!(matches!(unknown, Err(AnalysisError::Config { .. })));

        let zero_window = AnalyzerConfig::from_yaml_str("normalization:\n  window_capacity: 0\n");
        assert!(matches!(zero_window, Err(AnalysisError::Config { .. })));
    }

    #[test]
    fn sampling_rate_by_media_type() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.sampling_rate(config.media_type(15)), 8000);
        assert_eq!(config.sampling_rate(config.media_type(16)), 90_000);
        assert_eq!(config.sampling_rate(config.media_type(33)), 90_000);
    }

    #[test]
    fn normalization_predicate() {
        let predicate = NormalizationConfig::default();
        let video = PacketMeta { media_tag: 16, ..Default::default() };
        let audio = PacketMeta { media_tag: 15, ..Default::default() };

        assert!(predicate.accepts(&video, StreamType::Media));
        assert!(!predicate.accepts(&video, StreamType::Fec));
        assert!(!predicate.accepts(&audio, StreamType::Media));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let result = AnalyzerConfig::from_path("/definitely/not/here.yaml");
        assert!(matches!(result, Err(AnalysisError::UnreadableSource { .. })));
    }
}
