//! Presentation-side facade over the pipeline and the aggregator.
//!
//! A [`Session`] is what a consumer (CLI, UI) holds: it submits work,
//! polls for finished verdicts on its own schedule, and reads the
//! aggregated view. All methods are non-blocking except [`Session::clear`],
//! which waits for the worker to wind down before resetting.

use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregate::{Aggregator, Counts, Row, SortColumn, SortDirection};
use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::media::MetadataProbe;
use crate::pipeline::{ProgressSnapshot, Supervisor};
use crate::rules::Verdict;

pub struct Session {
    supervisor: Supervisor,
    aggregator: Aggregator,
}

impl Session {
    /// Builds a session from a validated configuration and a probe
    /// implementation.
    pub fn new(config: CoreConfig, probe: Arc<dyn MetadataProbe>) -> CoreResult<Self> {
        Ok(Self {
            supervisor: Supervisor::new(config, probe)?,
            aggregator: Aggregator::new(),
        })
    }

    /// Queues input paths for discovery and processing. Safe to call
    /// while a run is already active; the new paths join the queue.
    pub fn submit(&self, paths: Vec<PathBuf>) {
        self.supervisor.submit(paths);
    }

    /// Requests cooperative cancellation of the active run.
    pub fn cancel(&self) {
        self.supervisor.cancel();
    }

    /// Drains all verdicts finished since the last call, folds them
    /// into the aggregate view, and returns them with their assigned
    /// display positions, in completion order.
    pub fn drain(&mut self) -> Vec<(u64, Verdict)> {
        self.supervisor
            .poll_results()
            .into_iter()
            .map(|verdict| {
                let display_num = self.aggregator.ingest(verdict.clone());
                (display_num, verdict)
            })
            .collect()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.supervisor.progress()
    }

    /// True when no worker is active. Finished verdicts may still be
    /// waiting in the result queue; keep draining until empty.
    pub fn is_idle(&self) -> bool {
        !self.supervisor.is_running()
    }

    pub fn counts(&self) -> Counts {
        self.aggregator.counts()
    }

    pub fn rows(&self) -> &[Row] {
        self.aggregator.rows()
    }

    pub fn sort(&mut self, column: SortColumn, direction: SortDirection) {
        self.aggregator.sort(column, direction);
    }

    /// Stops any active run, empties every queue and the aggregate
    /// view, and resets progress and sequence counters.
    pub fn clear(&mut self) {
        self.supervisor.clear();
        self.aggregator.clear();
    }
}
