//! Configuration for the rule engine and file discovery.
//!
//! Every threshold and allow-set the rule engine consults lives here,
//! so both observed rule variants (space-based vs. hyphen-count
//! filename check, axis allow-sets vs. resolution-pair allow-set) are
//! plain configuration rather than code changes. Defaults reproduce
//! the original production rule set.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::rules::Severity;

/// Filename convention check variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilenameRule {
    /// A half-width space in the file name is a violation, unless the
    /// name also contains recognized full-width punctuation.
    HalfWidthSpace { severity: Severity },

    /// The number of hyphens in the file name must be in `allowed`.
    HyphenCount {
        allowed: BTreeSet<usize>,
        severity: Severity,
    },
}

/// Dimension check variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionRule {
    /// Width and height are validated independently against allow-sets.
    Axes {
        widths: BTreeSet<u32>,
        heights: BTreeSet<u32>,
    },

    /// The (width, height) pair must be one of the listed resolutions.
    Pairs { resolutions: BTreeSet<(u32, u32)> },
}

/// Thresholds and allow-sets for rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Filename convention variant to apply.
    pub filename: FilenameRule,

    /// Frame rates at or below this value (fps) are errors.
    pub min_frame_rate: f64,

    /// Video bit rates below this value (bps) are errors.
    pub min_video_bitrate_bps: u64,

    /// Audio bit rates below this value (bps) are errors.
    pub min_audio_bitrate_bps: u64,

    /// Overall container bit rates below this value (bps) are errors
    /// for video files; so is a missing overall bit rate.
    pub min_overall_bitrate_bps: u64,

    /// Dimension check variant to apply.
    pub dimensions: DimensionRule,

    /// Expected video codec names; matching is a case-insensitive
    /// substring test, and a mismatch is only a warning.
    pub allowed_video_codecs: Vec<String>,

    /// Video durations above this value (ms) are warnings.
    pub max_video_duration_ms: u64,

    /// Video files above this size (bytes) are errors.
    pub max_video_size_bytes: u64,

    /// Image files above this size (bytes) are errors.
    pub max_image_size_bytes: u64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            filename: FilenameRule::HalfWidthSpace {
                severity: Severity::Warning,
            },
            min_frame_rate: 20.0,
            min_video_bitrate_bps: 1_000_000,
            min_audio_bitrate_bps: 64_000,
            min_overall_bitrate_bps: 500_000,
            dimensions: DimensionRule::Axes {
                widths: [540, 720, 960, 1080, 1280].into_iter().collect(),
                heights: [540, 607, 720, 960, 1280, 1920].into_iter().collect(),
            },
            allowed_video_codecs: vec!["h264".to_string(), "avc".to_string()],
            max_video_duration_ms: 60_000,
            max_video_size_bytes: 60 * 1024 * 1024,
            max_image_size_bytes: 150 * 1024,
        }
    }
}

/// Top-level configuration: rule thresholds plus the extension
/// allow-lists used when expanding directory inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub rules: RuleConfig,

    /// Extensions treated as video when walking directories.
    pub video_extensions: Vec<String>,

    /// Extensions treated as images when walking directories.
    pub image_extensions: Vec<String>,
}

impl CoreConfig {
    /// Create a configuration with the default rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file. Missing fields fall back
    /// to their defaults.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency. Called before a configuration is
    /// handed to the pipeline.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.rules.min_frame_rate > 0.0) {
            return Err(CoreError::Config(
                "min_frame_rate must be positive".to_string(),
            ));
        }
        if self.rules.min_video_bitrate_bps == 0
            || self.rules.min_audio_bitrate_bps == 0
            || self.rules.min_overall_bitrate_bps == 0
        {
            return Err(CoreError::Config(
                "bit rate thresholds must be positive".to_string(),
            ));
        }
        if self.rules.max_video_size_bytes == 0 || self.rules.max_image_size_bytes == 0 {
            return Err(CoreError::Config(
                "file size ceilings must be positive".to_string(),
            ));
        }
        match &self.rules.dimensions {
            DimensionRule::Axes { widths, heights } => {
                if widths.is_empty() || heights.is_empty() {
                    return Err(CoreError::Config(
                        "dimension allow-sets must not be empty".to_string(),
                    ));
                }
            }
            DimensionRule::Pairs { resolutions } => {
                if resolutions.is_empty() {
                    return Err(CoreError::Config(
                        "resolution allow-set must not be empty".to_string(),
                    ));
                }
            }
        }
        if let FilenameRule::HyphenCount { allowed, .. } = &self.rules.filename {
            if allowed.is_empty() {
                return Err(CoreError::Config(
                    "hyphen count allow-set must not be empty".to_string(),
                ));
            }
        }
        if self.rules.allowed_video_codecs.is_empty() {
            return Err(CoreError::Config(
                "allowed_video_codecs must not be empty".to_string(),
            ));
        }
        if self.video_extensions.is_empty() && self.image_extensions.is_empty() {
            return Err(CoreError::Config(
                "at least one extension allow-list must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// True when the extension (without dot) is in either allow-list.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.video_extensions
            .iter()
            .chain(self.image_extensions.iter())
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            rules: RuleConfig::default(),
            video_extensions: ["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            image_extensions: ["jpg", "jpeg", "png", "gif", "bmp", "tiff"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_thresholds_match_production_rules() {
        let rules = RuleConfig::default();
        assert_eq!(rules.min_frame_rate, 20.0);
        assert_eq!(rules.min_video_bitrate_bps, 1_000_000);
        assert_eq!(rules.min_audio_bitrate_bps, 64_000);
        assert_eq!(rules.max_video_size_bytes, 60 * 1024 * 1024);
        assert_eq!(rules.max_image_size_bytes, 150 * 1024);
        match rules.dimensions {
            DimensionRule::Axes { widths, heights } => {
                assert!(widths.contains(&1280));
                assert!(heights.contains(&607));
            }
            DimensionRule::Pairs { .. } => panic!("default dimension rule should be Axes"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_thresholds() {
        let mut config = CoreConfig::default();
        config.rules.min_video_bitrate_bps = 0;
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.rules.min_frame_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_allow_sets() {
        let mut config = CoreConfig::default();
        config.rules.dimensions = DimensionRule::Pairs {
            resolutions: BTreeSet::new(),
        };
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.rules.filename = FilenameRule::HyphenCount {
            allowed: BTreeSet::new(),
            severity: Severity::Warning,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        let config = CoreConfig::default();
        assert!(config.is_allowed_extension("mp4"));
        assert!(config.is_allowed_extension("MP4"));
        assert!(config.is_allowed_extension("Jpg"));
        assert!(!config.is_allowed_extension("txt"));
        assert!(!config.is_allowed_extension("mp3"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = CoreConfig::default();
        config.rules.filename = FilenameRule::HyphenCount {
            allowed: [3, 4].into_iter().collect(),
            severity: Severity::Error,
        };
        config.rules.dimensions = DimensionRule::Pairs {
            resolutions: [(1280, 720), (1920, 1080)].into_iter().collect(),
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: CoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: CoreConfig =
            serde_json::from_str(r#"{"rules": {"min_frame_rate": 24.0}}"#).unwrap();
        assert_eq!(parsed.rules.min_frame_rate, 24.0);
        assert_eq!(parsed.rules.min_audio_bitrate_bps, 64_000);
        assert!(parsed.is_allowed_extension("mkv"));
    }
}
