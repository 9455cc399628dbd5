//! Rule evaluation: maps one file's probed attributes to a [`Verdict`].
//!
//! Evaluation is pure and total. Every applicable rule runs (no
//! short-circuiting), so one file can carry several violations, and any
//! probe failure is converted into a `PROCESSING_ERROR` violation
//! instead of propagating. Violations are reported in rule-evaluation
//! order; the overall severity tier is the maximum severity present.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{DimensionRule, FilenameRule, RuleConfig};
use crate::media::{MediaAttributes, MediaKind, Metric, ProbeError};

/// Stable identifiers for each rule violation.
pub mod codes {
    pub const FILENAME_SPACE: &str = "FILENAME_SPACE";
    pub const FILENAME_HYPHENS: &str = "FILENAME_HYPHENS";
    pub const UNSUPPORTED_KIND: &str = "UNSUPPORTED_KIND";
    pub const FRAME_RATE_LOW: &str = "FRAME_RATE_LOW";
    pub const FRAME_RATE_INVALID: &str = "FRAME_RATE_INVALID";
    pub const VIDEO_BITRATE_LOW: &str = "VIDEO_BITRATE_LOW";
    pub const VIDEO_BITRATE_INVALID: &str = "VIDEO_BITRATE_INVALID";
    pub const AUDIO_BITRATE_LOW: &str = "AUDIO_BITRATE_LOW";
    pub const AUDIO_BITRATE_INVALID: &str = "AUDIO_BITRATE_INVALID";
    pub const OVERALL_BITRATE_LOW: &str = "OVERALL_BITRATE_LOW";
    pub const OVERALL_BITRATE_INVALID: &str = "OVERALL_BITRATE_INVALID";
    pub const WIDTH_NONSTANDARD: &str = "WIDTH_NONSTANDARD";
    pub const HEIGHT_NONSTANDARD: &str = "HEIGHT_NONSTANDARD";
    pub const RESOLUTION_NONSTANDARD: &str = "RESOLUTION_NONSTANDARD";
    pub const NO_DIMENSIONS: &str = "NO_DIMENSIONS";
    pub const CODEC_MISMATCH: &str = "CODEC_MISMATCH";
    pub const DURATION_LONG: &str = "DURATION_LONG";
    pub const VIDEO_TOO_LARGE: &str = "VIDEO_TOO_LARGE";
    pub const IMAGE_TOO_LARGE: &str = "IMAGE_TOO_LARGE";
    pub const PROCESSING_ERROR: &str = "PROCESSING_ERROR";
}

/// Probe error messages are truncated to keep the display compact.
const MAX_ERROR_MESSAGE_LEN: usize = 50;

/// Full-width punctuation that exempts a file name from the
/// half-width-space check.
const FULL_WIDTH_EXEMPT: [char; 9] = ['　', '，', '。', '；', '：', '（', '）', '【', '】'];

/// Violation severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Outcome tier for a whole file: the maximum severity among its
/// violations, Clean when there are none that rise to Warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overall {
    Clean,
    Warning,
    Error,
}

impl Overall {
    fn from_violations(violations: &[Violation]) -> Self {
        let max = violations.iter().map(|v| v.severity).max();
        match max {
            Some(Severity::Error) => Overall::Error,
            Some(Severity::Warning) => Overall::Warning,
            _ => Overall::Clean,
        }
    }
}

impl fmt::Display for Overall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overall::Clean => write!(f, "CLEAN"),
            Overall::Warning => write!(f, "WARNING"),
            Overall::Error => write!(f, "ERROR"),
        }
    }
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable rule identifier, see [`codes`].
    pub code: String,

    /// Violation severity level
    pub severity: Severity,

    /// User-facing reason.
    pub message: String,
}

impl Violation {
    pub fn new(code: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

/// The complete evaluation result for one file. Immutable once
/// published to the result queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub path: PathBuf,
    pub file_name: String,
    pub file_size_bytes: Option<u64>,
    pub attributes: MediaAttributes,
    pub violations: Vec<Violation>,
    pub overall: Overall,

    /// Assigned when the file was queued for processing; establishes a
    /// stable submission order independent of completion order.
    pub sequence: u64,
}

impl Verdict {
    fn new(
        path: &Path,
        file_size_bytes: Option<u64>,
        attributes: MediaAttributes,
        violations: Vec<Violation>,
        sequence: u64,
    ) -> Self {
        let overall = Overall::from_violations(&violations);
        Self {
            path: path.to_path_buf(),
            file_name: file_name_of(path),
            file_size_bytes,
            attributes,
            violations,
            overall,
            sequence,
        }
    }

    /// True when this verdict carries a violation with the given code.
    pub fn has_violation(&self, code: &str) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        message.to_string()
    } else {
        let truncated: String = message.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Evaluates probed media attributes against the configured rule set.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    config: RuleConfig,
}

impl RuleEngine {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    /// Evaluate one file. Never fails: a probe error becomes a single
    /// `PROCESSING_ERROR` violation with a truncated message.
    pub fn evaluate(
        &self,
        path: &Path,
        file_size_bytes: Option<u64>,
        probed: Result<MediaAttributes, ProbeError>,
        sequence: u64,
    ) -> Verdict {
        let attributes = match probed {
            Ok(attributes) => attributes,
            Err(err) => {
                let violation = Violation::new(
                    codes::PROCESSING_ERROR,
                    Severity::Error,
                    truncate_message(&err.to_string(), MAX_ERROR_MESSAGE_LEN),
                );
                return Verdict::new(
                    path,
                    file_size_bytes,
                    MediaAttributes::default(),
                    vec![violation],
                    sequence,
                );
            }
        };

        let mut violations = Vec::new();
        let file_name = file_name_of(path);

        self.check_filename(&file_name, &mut violations);

        if attributes.kind == MediaKind::Unknown {
            violations.push(Violation::new(
                codes::UNSUPPORTED_KIND,
                Severity::Error,
                "not a standard video or image file",
            ));
        } else {
            self.check_frame_rate(&attributes, &mut violations);
            self.check_video_bitrate(&attributes, &mut violations);
            self.check_audio_bitrate(&attributes, &mut violations);
            self.check_overall_bitrate(&attributes, &mut violations);
            self.check_dimensions(&attributes, &mut violations);
            self.check_codec(&attributes, &mut violations);
            self.check_duration(&attributes, &mut violations);
            self.check_file_size(file_size_bytes, attributes.kind, &mut violations);
        }

        Verdict::new(path, file_size_bytes, attributes, violations, sequence)
    }

    fn check_filename(&self, file_name: &str, violations: &mut Vec<Violation>) {
        match &self.config.filename {
            FilenameRule::HalfWidthSpace { severity } => {
                let exempt = file_name.chars().any(|c| FULL_WIDTH_EXEMPT.contains(&c));
                if file_name.contains(' ') && !exempt {
                    violations.push(Violation::new(
                        codes::FILENAME_SPACE,
                        *severity,
                        "file name contains a half-width space",
                    ));
                }
            }
            FilenameRule::HyphenCount { allowed, severity } => {
                let count = file_name.matches('-').count();
                if !allowed.contains(&count) {
                    violations.push(Violation::new(
                        codes::FILENAME_HYPHENS,
                        *severity,
                        format!("file name contains {count} hyphens, which is not allowed"),
                    ));
                }
            }
        }
    }

    fn check_frame_rate(&self, attributes: &MediaAttributes, violations: &mut Vec<Violation>) {
        match &attributes.frame_rate {
            Metric::Value(fps) if *fps <= self.config.min_frame_rate => {
                violations.push(Violation::new(
                    codes::FRAME_RATE_LOW,
                    Severity::Error,
                    format!(
                        "frame rate {fps:.2} fps is at or below the minimum of {} fps",
                        self.config.min_frame_rate
                    ),
                ));
            }
            Metric::Invalid(raw) => violations.push(Violation::new(
                codes::FRAME_RATE_INVALID,
                Severity::Error,
                format!("frame rate value '{raw}' is not numeric"),
            )),
            _ => {}
        }
    }

    fn check_video_bitrate(&self, attributes: &MediaAttributes, violations: &mut Vec<Violation>) {
        match &attributes.video_bitrate_bps {
            Metric::Value(bps) if *bps < self.config.min_video_bitrate_bps => {
                violations.push(Violation::new(
                    codes::VIDEO_BITRATE_LOW,
                    Severity::Error,
                    format!(
                        "video bit rate {} kbps is below the minimum of {} kbps",
                        bps / 1000,
                        self.config.min_video_bitrate_bps / 1000
                    ),
                ));
            }
            Metric::Invalid(raw) => violations.push(Violation::new(
                codes::VIDEO_BITRATE_INVALID,
                Severity::Error,
                format!("video bit rate value '{raw}' is not numeric"),
            )),
            _ => {}
        }
    }

    fn check_audio_bitrate(&self, attributes: &MediaAttributes, violations: &mut Vec<Violation>) {
        match &attributes.audio_bitrate_bps {
            Metric::Value(bps) if *bps < self.config.min_audio_bitrate_bps => {
                violations.push(Violation::new(
                    codes::AUDIO_BITRATE_LOW,
                    Severity::Error,
                    format!(
                        "audio bit rate {} kbps is below the minimum of {} kbps",
                        bps / 1000,
                        self.config.min_audio_bitrate_bps / 1000
                    ),
                ));
            }
            Metric::Invalid(raw) => violations.push(Violation::new(
                codes::AUDIO_BITRATE_INVALID,
                Severity::Error,
                format!("audio bit rate value '{raw}' is not numeric"),
            )),
            _ => {}
        }
    }

    fn check_overall_bitrate(&self, attributes: &MediaAttributes, violations: &mut Vec<Violation>) {
        if attributes.kind != MediaKind::Video {
            return;
        }
        match &attributes.overall_bitrate_bps {
            Metric::Missing => violations.push(Violation::new(
                codes::OVERALL_BITRATE_LOW,
                Severity::Error,
                "no overall bit rate reported for video file",
            )),
            Metric::Value(bps) if *bps < self.config.min_overall_bitrate_bps => {
                violations.push(Violation::new(
                    codes::OVERALL_BITRATE_LOW,
                    Severity::Error,
                    format!(
                        "overall bit rate {} kbps is below the minimum of {} kbps",
                        bps / 1000,
                        self.config.min_overall_bitrate_bps / 1000
                    ),
                ));
            }
            Metric::Invalid(raw) => violations.push(Violation::new(
                codes::OVERALL_BITRATE_INVALID,
                Severity::Error,
                format!("overall bit rate value '{raw}' is not numeric"),
            )),
            Metric::Value(_) => {}
        }
    }

    fn check_dimensions(&self, attributes: &MediaAttributes, violations: &mut Vec<Violation>) {
        let (width, height) = match (attributes.width.get(), attributes.height.get()) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                violations.push(Violation::new(
                    codes::NO_DIMENSIONS,
                    Severity::Error,
                    "no dimension info",
                ));
                return;
            }
        };

        match &self.config.dimensions {
            DimensionRule::Axes { widths, heights } => {
                if !widths.contains(&width) {
                    violations.push(Violation::new(
                        codes::WIDTH_NONSTANDARD,
                        Severity::Error,
                        format!("width {width} is not a standard value"),
                    ));
                }
                if !heights.contains(&height) {
                    violations.push(Violation::new(
                        codes::HEIGHT_NONSTANDARD,
                        Severity::Error,
                        format!("height {height} is not a standard value"),
                    ));
                }
            }
            DimensionRule::Pairs { resolutions } => {
                if !resolutions.contains(&(width, height)) {
                    violations.push(Violation::new(
                        codes::RESOLUTION_NONSTANDARD,
                        Severity::Error,
                        format!("resolution {width}x{height} is not a standard value"),
                    ));
                }
            }
        }
    }

    fn check_codec(&self, attributes: &MediaAttributes, violations: &mut Vec<Violation>) {
        if attributes.kind != MediaKind::Video {
            return;
        }
        let Some(codec) = &attributes.video_codec else {
            return;
        };
        let codec_lower = codec.to_lowercase();
        let matched = self
            .config
            .allowed_video_codecs
            .iter()
            .any(|allowed| codec_lower.contains(&allowed.to_lowercase()));
        if !matched {
            violations.push(Violation::new(
                codes::CODEC_MISMATCH,
                Severity::Warning,
                format!("video codec '{codec}' is not in the expected set"),
            ));
        }
    }

    fn check_duration(&self, attributes: &MediaAttributes, violations: &mut Vec<Violation>) {
        if attributes.kind != MediaKind::Video {
            return;
        }
        if let Some(ms) = attributes.duration_ms.get() {
            if ms > self.config.max_video_duration_ms {
                violations.push(Violation::new(
                    codes::DURATION_LONG,
                    Severity::Warning,
                    format!(
                        "duration {:.1}s exceeds {:.1}s, flagged for review",
                        ms as f64 / 1000.0,
                        self.config.max_video_duration_ms as f64 / 1000.0
                    ),
                ));
            }
        }
    }

    fn check_file_size(
        &self,
        file_size_bytes: Option<u64>,
        kind: MediaKind,
        violations: &mut Vec<Violation>,
    ) {
        let Some(size) = file_size_bytes else {
            return;
        };
        match kind {
            MediaKind::Video if size > self.config.max_video_size_bytes => {
                violations.push(Violation::new(
                    codes::VIDEO_TOO_LARGE,
                    Severity::Error,
                    format!(
                        "video file size {} exceeds the {} ceiling",
                        crate::format::format_size(Some(size)),
                        crate::format::format_size(Some(self.config.max_video_size_bytes))
                    ),
                ));
            }
            MediaKind::Image if size > self.config.max_image_size_bytes => {
                violations.push(Violation::new(
                    codes::IMAGE_TOO_LARGE,
                    Severity::Error,
                    format!(
                        "image file size {} exceeds the {} ceiling",
                        crate::format::format_size(Some(size)),
                        crate::format::format_size(Some(self.config.max_image_size_bytes))
                    ),
                ));
            }
            _ => {}
        }
    }
}
