//! Result aggregation: stable ordering, running counts, and the
//! sortable view over all verdicts produced so far.
//!
//! Sorting follows the display values, not the raw fields: numeric-like
//! columns are parsed fuzzily (unit suffixes stripped, "H:MM:SS"
//! durations to seconds, "WxH" resolutions to pixel area) and values
//! that fail to parse always group at the far end of the range, so
//! N/A and invalid entries stay together in either direction.

use std::cmp::Ordering;

use crate::format::{
    format_bitrate_kbps, format_duration_ms, format_frame_rate, format_resolution, format_size,
    parse_display_duration, parse_display_resolution, parse_leading_number,
};
use crate::media::{MediaKind, Metric};
use crate::rules::{Overall, Verdict};

/// Columns of the result view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Sequence,
    FileName,
    FileSize,
    Duration,
    Width,
    Height,
    Resolution,
    FrameRate,
    VideoBitrate,
    AudioBitrate,
    IssueSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One verdict plus its current display position. The display number is
/// reassigned on every re-sort; the verdict's `sequence` never changes.
#[derive(Debug, Clone)]
pub struct Row {
    pub verdict: Verdict,
    pub display_num: u64,
}

impl Row {
    /// Display text for one column, formatted the way the consumer
    /// shows it. Invalid probed values render as "invalid", absent ones
    /// as "N/A".
    pub fn cell(&self, column: SortColumn) -> String {
        let attrs = &self.verdict.attributes;
        match column {
            SortColumn::Sequence => self.verdict.sequence.to_string(),
            SortColumn::FileName => self.verdict.file_name.clone(),
            SortColumn::FileSize => format_size(self.verdict.file_size_bytes),
            SortColumn::Duration => {
                metric_cell(&attrs.duration_ms, |ms| format_duration_ms(Some(*ms)))
            }
            SortColumn::Width => metric_cell(&attrs.width, |w| w.to_string()),
            SortColumn::Height => metric_cell(&attrs.height, |h| h.to_string()),
            SortColumn::Resolution => format_resolution(attrs.width.get(), attrs.height.get()),
            SortColumn::FrameRate => {
                metric_cell(&attrs.frame_rate, |fps| format_frame_rate(Some(*fps)))
            }
            SortColumn::VideoBitrate => {
                metric_cell(&attrs.video_bitrate_bps, |bps| format_bitrate_kbps(Some(*bps)))
            }
            SortColumn::AudioBitrate => {
                metric_cell(&attrs.audio_bitrate_bps, |bps| format_bitrate_kbps(Some(*bps)))
            }
            SortColumn::IssueSummary => {
                if self.verdict.violations.is_empty() {
                    "passed".to_string()
                } else {
                    let codes: Vec<&str> =
                        self.verdict.violations.iter().map(|v| v.code.as_str()).collect();
                    codes.join(", ")
                }
            }
        }
    }
}

fn metric_cell<T>(metric: &Metric<T>, fmt: impl Fn(&T) -> String) -> String {
    match metric {
        Metric::Missing => "N/A".to_string(),
        Metric::Invalid(_) => "invalid".to_string(),
        Metric::Value(v) => fmt(v),
    }
}

/// Running counts over all ingested verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub videos: u64,
    pub images: u64,
    pub problems: u64,
    pub total: u64,
}

/// Consumes drained verdicts and maintains the sortable display view.
#[derive(Debug, Default)]
pub struct Aggregator {
    rows: Vec<Row>,
    counts: Counts,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a verdict in first-seen order and returns its display
    /// position.
    pub fn ingest(&mut self, verdict: Verdict) -> u64 {
        match verdict.attributes.kind {
            MediaKind::Video => self.counts.videos += 1,
            MediaKind::Image => self.counts.images += 1,
            MediaKind::Unknown => {}
        }
        if verdict.overall != Overall::Clean {
            self.counts.problems += 1;
        }
        self.counts.total += 1;

        let display_num = self.rows.len() as u64 + 1;
        self.rows.push(Row {
            verdict,
            display_num,
        });
        display_num
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.counts = Counts::default();
    }

    /// Stable re-sort: primary key is the severity tier (problem files
    /// first when ascending, mirrored when descending, like the
    /// original list view), secondary key is the requested column.
    /// Display numbers are reassigned; verdict sequence numbers are
    /// not touched.
    pub fn sort(&mut self, column: SortColumn, direction: SortDirection) {
        let descending = direction == SortDirection::Descending;
        self.rows.sort_by(|a, b| {
            let ordering = tier_rank(a.verdict.overall)
                .cmp(&tier_rank(b.verdict.overall))
                .then_with(|| compare_cells(column, a, b, descending));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.display_num = index as u64 + 1;
        }
    }
}

fn tier_rank(overall: Overall) -> u8 {
    match overall {
        Overall::Error => 0,
        Overall::Warning => 1,
        Overall::Clean => 2,
    }
}

fn compare_cells(column: SortColumn, a: &Row, b: &Row, descending: bool) -> Ordering {
    let cell_a = a.cell(column);
    let cell_b = b.cell(column);
    if is_numeric_column(column) {
        // Unparseable values take the extreme for the direction, so
        // after the (possible) global reversal they land at the end.
        let fallback = if descending {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        let key_a = numeric_key(column, &cell_a).unwrap_or(fallback);
        let key_b = numeric_key(column, &cell_b).unwrap_or(fallback);
        key_a.total_cmp(&key_b)
    } else {
        cell_a.cmp(&cell_b)
    }
}

fn is_numeric_column(column: SortColumn) -> bool {
    !matches!(column, SortColumn::FileName | SortColumn::IssueSummary)
}

fn numeric_key(column: SortColumn, cell: &str) -> Option<f64> {
    match column {
        SortColumn::Duration => parse_display_duration(cell),
        SortColumn::Resolution => parse_display_resolution(cell),
        _ => parse_leading_number(cell),
    }
}
