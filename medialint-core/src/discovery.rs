//! File discovery: expands input paths into candidate files.
//!
//! Explicitly selected files are yielded as-is; directory inputs are
//! walked recursively and filtered by the configured extension
//! allow-list (case-insensitive). Unreadable entries are logged and
//! skipped, never aborting the walk. The cancellation token is checked
//! per entry so a stop request halts enumeration within one item.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::CoreConfig;
use crate::pipeline::CancelToken;

/// Expands `inputs` into candidate file paths, feeding each one to
/// `sink` in discovery order. Not restartable once cancelled.
pub fn discover<F>(inputs: &[PathBuf], config: &CoreConfig, cancel: &CancelToken, mut sink: F)
where
    F: FnMut(PathBuf),
{
    for input in inputs {
        if cancel.is_cancelled() {
            return;
        }
        if input.is_dir() {
            walk_directory(input, config, cancel, &mut sink);
        } else if input.is_file() {
            // Explicitly selected files bypass the extension filter.
            sink(input.clone());
        } else {
            log::warn!("skipping unreadable input: {}", input.display());
        }
    }
}

fn walk_directory<F>(dir: &Path, config: &CoreConfig, cancel: &CancelToken, sink: &mut F)
where
    F: FnMut(PathBuf),
{
    for entry in WalkDir::new(dir) {
        if cancel.is_cancelled() {
            return;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry under {}: {err}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let allowed = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| config.is_allowed_extension(ext))
            .unwrap_or(false);
        if allowed {
            sink(entry.into_path());
        }
    }
}
