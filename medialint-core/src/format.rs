//! Display formatting for media attributes and fuzzy parsers for sorting.
//!
//! The aggregator sorts the formatted display values, not the raw fields,
//! so the parsers here must be able to read back what the formatters
//! produce ("964 kbps", "01:02:05", "1280x720") and reject "N/A".

/// Formats a byte count with decimal units (B, KB, MB, GB, TB),
/// e.g. 3071741 -> "2.93MB". `None` formats as "N/A".
#[must_use]
pub fn format_size(size_bytes: Option<u64>) -> String {
    let Some(bytes) = size_bytes else {
        return "N/A".to_string();
    };
    if bytes == 0 {
        return "0B".to_string();
    }

    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{value:.2}{}", UNITS[unit])
    }
}

/// Formats a duration in milliseconds as "H:MM:SS", or "MM:SS" when under
/// an hour. `None` formats as "N/A".
#[must_use]
pub fn format_duration_ms(ms: Option<u64>) -> String {
    let Some(ms) = ms else {
        return "N/A".to_string();
    };
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Formats a bit rate in bps as whole kbps, e.g. 964000 -> "964 kbps".
#[must_use]
pub fn format_bitrate_kbps(bps: Option<u64>) -> String {
    match bps {
        Some(bps) => format!("{:.0} kbps", bps as f64 / 1000.0),
        None => "N/A".to_string(),
    }
}

/// Formats a frame rate as "25.00 fps".
#[must_use]
pub fn format_frame_rate(fps: Option<f64>) -> String {
    match fps {
        Some(fps) => format!("{fps:.2} fps"),
        None => "N/A".to_string(),
    }
}

/// Formats a (width, height) pair as "1280x720".
#[must_use]
pub fn format_resolution(width: Option<u32>, height: Option<u32>) -> String {
    match (width, height) {
        (Some(w), Some(h)) => format!("{w}x{h}"),
        _ => "N/A".to_string(),
    }
}

/// Parses the leading numeric part of a display value, ignoring any unit
/// suffix ("964 kbps" -> 964.0, "2.93MB" -> 2.93). Returns None for
/// values with no leading number ("N/A", "invalid", "").
#[must_use]
pub fn parse_leading_number(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-')))
        .map_or(trimmed.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    trimmed[..end].parse::<f64>().ok()
}

/// Parses an "H:MM:SS" or "MM:SS" display duration into seconds.
#[must_use]
pub fn parse_display_duration(value: &str) -> Option<f64> {
    let parts: Vec<&str> = value.split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [m, s] => (0.0, m.trim().parse::<f64>().ok()?, s.trim().parse::<f64>().ok()?),
        [h, m, s] => (
            h.trim().parse::<f64>().ok()?,
            m.trim().parse::<f64>().ok()?,
            s.trim().parse::<f64>().ok()?,
        ),
        _ => return None,
    };
    Some(h * 3600.0 + m * 60.0 + s)
}

/// Parses a "WxH" display resolution into its pixel area.
#[must_use]
pub fn parse_display_resolution(value: &str) -> Option<f64> {
    let (w, h) = value.split_once(['x', 'X'])?;
    let w = w.trim().parse::<f64>().ok()?;
    let h = h.trim().parse::<f64>().ok()?;
    Some(w * h)
}
