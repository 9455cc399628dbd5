//! Metadata probing via ffprobe.
//!
//! The pipeline only depends on the [`MetadataProbe`] trait; the
//! shipped implementation shells out to `ffprobe` and maps its JSON
//! output into [`MediaAttributes`]. The JSON mapping is a separate pure
//! function so it can be tested without an ffprobe binary present.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use thiserror::Error;

use super::{MediaAttributes, MediaKind, Metric};

/// Codecs that ffprobe reports as a "video" stream but that identify a
/// still image container.
const IMAGE_CODECS: [&str; 6] = ["mjpeg", "png", "gif", "bmp", "tiff", "webp"];

/// Errors raised while extracting metadata from a file.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to execute ffprobe: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ffprobe exited with error: {0}")]
    Failed(String),

    #[error("failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// External metadata extraction for one file.
///
/// Implementations must be callable from the worker thread. Probing may
/// partially fail; any attribute the probe cannot determine is reported
/// as `Missing` or `Invalid` rather than an error.
pub trait MetadataProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<MediaAttributes, ProbeError>;
}

/// FFprobe command executor
#[derive(Debug, Default, Clone)]
pub struct FfprobeProbe;

impl FfprobeProbe {
    /// Create a new FfprobeProbe instance
    pub fn new() -> Self {
        Self
    }

    /// Execute ffprobe and return its JSON output.
    fn execute(path: &Path) -> Result<Value, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::FileNotFound(path.to_path_buf()));
        }

        let mut cmd = Command::new("ffprobe");
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path);

        log::debug!("running: ffprobe {}", path.display());

        let output = cmd.output()?;
        if !output.status.success() {
            return Err(ProbeError::Failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl MetadataProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<MediaAttributes, ProbeError> {
        let json = Self::execute(path)?;
        Ok(attributes_from_json(&json))
    }
}

/// Maps an ffprobe JSON document into [`MediaAttributes`].
///
/// Absent fields become `Missing`; fields that are present but not
/// numerically interpretable become `Invalid` with the raw text kept.
pub fn attributes_from_json(json: &Value) -> MediaAttributes {
    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let video = streams
        .iter()
        .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("video"));
    let audio = streams
        .iter()
        .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("audio"));
    let format = json.get("format");

    let video_codec = video
        .and_then(|s| s.get("codec_name"))
        .and_then(|c| c.as_str())
        .map(str::to_string);

    let kind = match (&video, &video_codec) {
        (Some(_), Some(codec)) if IMAGE_CODECS.iter().any(|ic| codec.eq_ignore_ascii_case(ic)) => {
            MediaKind::Image
        }
        (Some(_), _) => MediaKind::Video,
        (None, _) => MediaKind::Unknown,
    };

    let duration_ms = match duration_field(format.and_then(|f| f.get("duration")))
    {
        Metric::Missing => duration_field(video.and_then(|s| s.get("duration"))),
        parsed => parsed,
    };

    MediaAttributes {
        duration_ms,
        width: dimension_field(video.and_then(|s| s.get("width"))),
        height: dimension_field(video.and_then(|s| s.get("height"))),
        frame_rate: frame_rate_field(video),
        video_bitrate_bps: bitrate_field(video.and_then(|s| s.get("bit_rate"))),
        audio_bitrate_bps: bitrate_field(audio.and_then(|s| s.get("bit_rate"))),
        overall_bitrate_bps: bitrate_field(format.and_then(|f| f.get("bit_rate"))),
        video_codec,
        kind,
    }
}

/// ffprobe reports bit rates as strings ("964000") in most containers,
/// but some muxers emit JSON numbers.
fn bitrate_field(value: Option<&Value>) -> Metric<u64> {
    match value {
        None | Some(Value::Null) => Metric::Missing,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => Metric::Value(v),
            None => Metric::Invalid(n.to_string()),
        },
        Some(Value::String(s)) => match s.trim().parse::<u64>() {
            Ok(v) => Metric::Value(v),
            Err(_) => Metric::Invalid(s.clone()),
        },
        Some(other) => Metric::Invalid(other.to_string()),
    }
}

fn dimension_field(value: Option<&Value>) -> Metric<u32> {
    match value {
        None | Some(Value::Null) => Metric::Missing,
        Some(Value::Number(n)) => match n.as_u64().and_then(|v| u32::try_from(v).ok()) {
            Some(v) => Metric::Value(v),
            None => Metric::Invalid(n.to_string()),
        },
        Some(Value::String(s)) => match s.trim().parse::<u32>() {
            Ok(v) => Metric::Value(v),
            Err(_) => Metric::Invalid(s.clone()),
        },
        Some(other) => Metric::Invalid(other.to_string()),
    }
}

/// Duration arrives as fractional seconds; stored as milliseconds.
fn duration_field(value: Option<&Value>) -> Metric<u64> {
    let seconds = match value {
        None | Some(Value::Null) => return Metric::Missing,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) => v,
            None => return Metric::Invalid(n.to_string()),
        },
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => return Metric::Invalid(s.clone()),
        },
        Some(other) => return Metric::Invalid(other.to_string()),
    };
    if seconds.is_finite() && seconds >= 0.0 {
        Metric::Value((seconds * 1000.0).round() as u64)
    } else {
        Metric::Invalid(seconds.to_string())
    }
}

/// Frame rates are rational strings ("30000/1001"); "0/0" means the
/// stream has no frame rate (still images), which is Missing, not
/// Invalid.
fn frame_rate_field(video: Option<&Value>) -> Metric<f64> {
    let raw = video
        .and_then(|s| s.get("avg_frame_rate").or_else(|| s.get("r_frame_rate")))
        .and_then(|v| v.as_str());
    let Some(raw) = raw else {
        return Metric::Missing;
    };

    let parsed = match raw.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>();
            let den = den.trim().parse::<f64>();
            match (num, den) {
                (Ok(n), Ok(d)) if d != 0.0 => Some(n / d),
                (Ok(n), Ok(d)) if d == 0.0 && n == 0.0 => return Metric::Missing,
                _ => None,
            }
        }
        None => raw.trim().parse::<f64>().ok(),
    };

    match parsed {
        Some(fps) if fps > 0.0 && fps.is_finite() => Metric::Value(fps),
        Some(_) => Metric::Missing,
        None => Metric::Invalid(raw.to_string()),
    }
}
