//! Media attribute model and metadata probing.
//!
//! `MediaAttributes` is the typed view of what the external probe
//! reports for one file. Every numeric field is a [`Metric`], because
//! probing may partially fail: a value can be missing entirely, present
//! but unparseable, or parsed. The rule engine treats those three states
//! differently, so they must stay distinct here.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod probe;

pub use probe::{FfprobeProbe, MetadataProbe, ProbeError};

/// Classification of a probed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Image,
    Unknown,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Image => write!(f, "image"),
            MediaKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A probed value that may be absent or present-but-unparseable.
///
/// `Invalid` keeps the raw text the probe reported so error messages can
/// show what was actually in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Metric<T> {
    Missing,
    Invalid(String),
    Value(T),
}

impl<T> Metric<T> {
    /// Returns the parsed value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Value(v) => Some(v),
            _ => None,
        }
    }

    /// True when the probe reported nothing for this field.
    pub fn is_missing(&self) -> bool {
        matches!(self, Metric::Missing)
    }

    /// True when the probe reported something that could not be parsed.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Metric::Invalid(_))
    }
}

impl<T: Copy> Metric<T> {
    /// Copies the parsed value out, if any.
    pub fn get(&self) -> Option<T> {
        match self {
            Metric::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl<T> Default for Metric<T> {
    fn default() -> Self {
        Metric::Missing
    }
}

impl<T> From<Option<T>> for Metric<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Metric::Value(v),
            None => Metric::Missing,
        }
    }
}

/// Container- and track-level technical attributes for one media file,
/// as reported by a [`MetadataProbe`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaAttributes {
    /// Total duration in milliseconds.
    pub duration_ms: Metric<u64>,

    /// Frame width in pixels.
    pub width: Metric<u32>,

    /// Frame height in pixels.
    pub height: Metric<u32>,

    /// Video frame rate in frames per second.
    pub frame_rate: Metric<f64>,

    /// Video track bit rate in bits per second.
    pub video_bitrate_bps: Metric<u64>,

    /// Audio track bit rate in bits per second.
    pub audio_bitrate_bps: Metric<u64>,

    /// Overall container bit rate in bits per second.
    pub overall_bitrate_bps: Metric<u64>,

    /// Video codec name as reported by the probe.
    pub video_codec: Option<String>,

    /// File classification derived from the probed tracks.
    pub kind: MediaKind,
}

impl Default for MediaKind {
    fn default() -> Self {
        MediaKind::Unknown
    }
}
