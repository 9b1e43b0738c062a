//! TOML configuration for the playback pipeline

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::format::SampleEncoding;

/// Per-encoding sample-rate allow-lists applied during format negotiation.
/// An empty list means no restriction for that encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    /// Allowed PCM/float device rates.
    pub pcm: Vec<u32>,
    /// Allowed DoP container rates.
    pub dop: Vec<u32>,
}

impl RateLimits {
    /// Whether `rate` may be offered to the device for `encoding`.
    pub fn allows(&self, encoding: SampleEncoding, rate: u32) -> bool {
        let list = match encoding {
            SampleEncoding::Dop => &self.dop,
            _ => &self.pcm,
        };
        list.is_empty() || list.contains(&rate)
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Device buffer latency in milliseconds.
    pub latency_ms: u32,
    /// Use event-driven buffer signaling when the device supports it,
    /// otherwise poll at half the latency.
    pub event_sync: bool,
    /// Minimum free frames before a refill is worth performing.
    pub refill_threshold: usize,
    /// Negotiation rate restrictions.
    pub rate_limits: RateLimits,
    /// Log level filter (tracing syntax).
    pub log_level: String,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            latency_ms: 200,
            event_sync: true,
            refill_threshold: 10,
            rate_limits: RateLimits::default(),
            log_level: "info".to_string(),
        }
    }
}

impl PipeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from a path if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("config load failed, using defaults: {e}");
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Write configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| Error::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipeConfig::default();
        assert_eq!(config.latency_ms, 200);
        assert!(config.event_sync);
        assert_eq!(config.refill_threshold, 10);
        assert!(config.rate_limits.pcm.is_empty());
    }

    #[test]
    fn test_rate_limits_empty_allows_everything() {
        let limits = RateLimits::default();
        assert!(limits.allows(SampleEncoding::Pcm, 44100));
        assert!(limits.allows(SampleEncoding::Dop, 352_800));
    }

    #[test]
    fn test_rate_limits_filter_per_encoding() {
        let limits = RateLimits {
            pcm: vec![44100, 48000],
            dop: vec![176_400],
        };
        assert!(limits.allows(SampleEncoding::Pcm, 48000));
        assert!(!limits.allows(SampleEncoding::Pcm, 96000));
        assert!(limits.allows(SampleEncoding::Dop, 176_400));
        assert!(!limits.allows(SampleEncoding::Dop, 352_800));
        // float shares the PCM list
        assert!(limits.allows(SampleEncoding::Float, 44100));
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dacpipe.toml");
        let mut config = PipeConfig::default();
        config.latency_ms = 50;
        config.rate_limits.dop = vec![176_400, 352_800];
        config.save(&path).unwrap();
        let loaded = PipeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_falls_back_to_defaults() {
        let config = PipeConfig::load_or_default(Path::new("/nonexistent/dacpipe.toml"));
        assert_eq!(config, PipeConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: PipeConfig = toml::from_str("latency_ms = 80").unwrap();
        assert_eq!(config.latency_ms, 80);
        assert!(config.event_sync);
    }
}
