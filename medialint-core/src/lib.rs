//! Core library for media file quality validation.
//!
//! This crate probes technical metadata from media files with ffprobe,
//! evaluates it against a configurable rule set (resolution, bit rates,
//! frame rate, file naming, size ceilings), and runs batches through a
//! background pipeline that a presentation layer polls without blocking.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use medialint_core::{CoreConfig, FfprobeProbe, Session};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::new();
//! let mut session = Session::new(config, Arc::new(FfprobeProbe::new())).unwrap();
//!
//! session.submit(vec![PathBuf::from("/path/to/media")]);
//! while !session.is_idle() {
//!     for (num, verdict) in session.drain() {
//!         println!("#{num} {} -> {:?}", verdict.file_name, verdict.overall);
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! for (num, verdict) in session.drain() {
//!     println!("#{num} {} -> {:?}", verdict.file_name, verdict.overall);
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod discovery;
pub mod error;
pub mod format;
pub mod media;
pub mod pipeline;
pub mod rules;
pub mod session;

// Re-exports for public API
pub use aggregate::{Aggregator, Counts, Row, SortColumn, SortDirection};
pub use config::{CoreConfig, DimensionRule, FilenameRule, RuleConfig};
pub use error::{CoreError, CoreResult};
pub use format::{format_bitrate_kbps, format_duration_ms, format_size};
pub use media::{FfprobeProbe, MediaAttributes, MediaKind, MetadataProbe, Metric, ProbeError};
pub use pipeline::{CancelToken, ProgressSnapshot, Supervisor};
pub use rules::{Overall, RuleEngine, Severity, Verdict, Violation};
pub use session::Session;
