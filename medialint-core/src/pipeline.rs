//! Background processing pipeline.
//!
//! One worker thread per active run, decoupled from the consumer by two
//! FIFO channels: the work queue carries discovered paths (with their
//! sequence numbers assigned at enqueue time) and the result queue
//! carries finished [`Verdict`]s. The consumer polls; nothing in here
//! blocks it. Cancellation is cooperative: the worker checks the flag
//! at the top of each loop iteration and at every discovery yield
//! point, and always finishes the file it is on.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use crate::config::CoreConfig;
use crate::discovery;
use crate::error::CoreResult;
use crate::media::{MetadataProbe, ProbeError};
use crate::rules::{RuleEngine, Verdict};

/// Cooperative cancellation flag shared between the supervisor, the
/// worker loop, and the discovery walk.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Point-in-time view of worker progress. Counters are written only by
/// the worker thread; the presentation side reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub processed: u64,
    pub total: u64,
    pub current_file: String,
}

#[derive(Debug, Default)]
struct ProgressState {
    processed: AtomicU64,
    total: AtomicU64,
    current_file: Mutex<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
    Stopping,
}

#[derive(Debug)]
struct WorkItem {
    sequence: u64,
    path: PathBuf,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns the worker lifecycle and the two queues.
///
/// State machine: `Idle -> Running -> {Idle (drained), Stopping -> Idle
/// (cancelled)}`. At most one worker is active per run; a `submit`
/// while Running only adds work.
pub struct Supervisor {
    config: Arc<CoreConfig>,
    probe: Arc<dyn MetadataProbe>,
    state: Arc<Mutex<RunState>>,
    cancel: CancelToken,
    progress: Arc<ProgressState>,
    sequence: Arc<AtomicU64>,
    batch_tx: Sender<Vec<PathBuf>>,
    batch_rx: Receiver<Vec<PathBuf>>,
    work_tx: Sender<WorkItem>,
    work_rx: Receiver<WorkItem>,
    result_tx: Sender<Verdict>,
    result_rx: Receiver<Verdict>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Supervisor {
    /// Creates a supervisor for a validated configuration.
    pub fn new(config: CoreConfig, probe: Arc<dyn MetadataProbe>) -> CoreResult<Self> {
        config.validate()?;
        let (batch_tx, batch_rx) = unbounded();
        let (work_tx, work_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        Ok(Self {
            config: Arc::new(config),
            probe,
            state: Arc::new(Mutex::new(RunState::Idle)),
            cancel: CancelToken::new(),
            progress: Arc::new(ProgressState::default()),
            sequence: Arc::new(AtomicU64::new(0)),
            batch_tx,
            batch_rx,
            work_tx,
            work_rx,
            result_tx,
            result_rx,
            worker: Mutex::new(None),
        })
    }

    /// Enqueues input paths for discovery and processing, starting the
    /// worker if none is active.
    pub fn submit(&self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }

        loop {
            let mut state = lock(&self.state);
            match *state {
                RunState::Running => {
                    // The worker's drained check holds the same lock,
                    // so it cannot exit between our observing Running
                    // and the send.
                    let _ = self.batch_tx.send(paths);
                    return;
                }
                RunState::Idle => {
                    if self.cancel.is_cancelled() {
                        // Leftovers from a cancelled run must not be
                        // silently processed by the new one.
                        self.discard_pending_work();
                        self.cancel.reset();
                    }
                    let _ = self.batch_tx.send(paths);
                    *state = RunState::Running;
                    let handle = self.spawn_worker();
                    *lock(&self.worker) = Some(handle);
                    return;
                }
                RunState::Stopping => {
                    // The previous worker is winding down; wait for it
                    // before starting a fresh run.
                    drop(state);
                    self.join_worker();
                }
            }
        }
    }

    /// Requests cooperative cancellation. The in-flight file finishes;
    /// queued-but-unprocessed items stay in the work queue until
    /// [`Supervisor::clear`].
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        self.cancel.cancel();
        if *state == RunState::Running {
            *state = RunState::Stopping;
        }
    }

    /// Non-blocking drain of the result queue, in completion order.
    pub fn poll_results(&self) -> Vec<Verdict> {
        self.result_rx.try_iter().collect()
    }

    /// Current progress counters and in-flight file name.
    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            processed: self.progress.processed.load(Ordering::SeqCst),
            total: self.progress.total.load(Ordering::SeqCst),
            current_file: lock(&self.progress.current_file).clone(),
        }
    }

    /// True while a worker is active (Running or Stopping).
    pub fn is_running(&self) -> bool {
        *lock(&self.state) != RunState::Idle
    }

    /// Cancels, waits for the worker to exit, then empties the queues
    /// and resets all counters. The join happens before the drain, so
    /// a finishing worker can never publish into a cleared queue.
    pub fn clear(&self) {
        self.cancel();
        self.join_worker();
        self.discard_pending_work();
        while self.result_rx.try_recv().is_ok() {}
        self.progress.processed.store(0, Ordering::SeqCst);
        self.progress.total.store(0, Ordering::SeqCst);
        lock(&self.progress.current_file).clear();
        self.sequence.store(0, Ordering::SeqCst);
        self.cancel.reset();
        *lock(&self.state) = RunState::Idle;
    }

    fn discard_pending_work(&self) {
        while self.batch_rx.try_recv().is_ok() {}
        while self.work_rx.try_recv().is_ok() {}
    }

    fn join_worker(&self) {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("worker thread panicked");
            }
        }
    }

    fn spawn_worker(&self) -> JoinHandle<()> {
        let ctx = WorkerContext {
            config: Arc::clone(&self.config),
            engine: RuleEngine::new(self.config.rules.clone()),
            probe: Arc::clone(&self.probe),
            state: Arc::clone(&self.state),
            cancel: self.cancel.clone(),
            progress: Arc::clone(&self.progress),
            sequence: Arc::clone(&self.sequence),
            batch_rx: self.batch_rx.clone(),
            work_tx: self.work_tx.clone(),
            work_rx: self.work_rx.clone(),
            result_tx: self.result_tx.clone(),
        };
        std::thread::Builder::new()
            .name("medialint-worker".to_string())
            .spawn(move || ctx.run())
            .expect("failed to spawn worker thread")
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.join_worker();
    }
}

struct WorkerContext {
    config: Arc<CoreConfig>,
    engine: RuleEngine,
    probe: Arc<dyn MetadataProbe>,
    state: Arc<Mutex<RunState>>,
    cancel: CancelToken,
    progress: Arc<ProgressState>,
    sequence: Arc<AtomicU64>,
    batch_rx: Receiver<Vec<PathBuf>>,
    work_tx: Sender<WorkItem>,
    work_rx: Receiver<WorkItem>,
    result_tx: Sender<Verdict>,
}

impl WorkerContext {
    fn run(self) {
        log::debug!("worker started");
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            // Pull pending submissions through discovery first, so the
            // work queue holds items in discovery order.
            match self.batch_rx.try_recv() {
                Ok(batch) => {
                    self.enqueue_batch(&batch);
                    continue;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => break,
            }

            match self.work_rx.try_recv() {
                Ok(item) => self.process(item),
                Err(TryRecvError::Empty) => {
                    // Decide "drained" under the state lock so a
                    // concurrent submit cannot slip between the check
                    // and the exit.
                    let mut state = lock(&self.state);
                    if self.batch_rx.is_empty() && self.work_rx.is_empty() {
                        *state = RunState::Idle;
                        log::debug!("worker drained, exiting");
                        return;
                    }
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }
        *lock(&self.state) = RunState::Idle;
        log::debug!("worker stopped");
    }

    fn enqueue_batch(&self, batch: &[PathBuf]) {
        discovery::discover(batch, &self.config, &self.cancel, |path| {
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            self.progress.total.fetch_add(1, Ordering::SeqCst);
            let _ = self.work_tx.send(WorkItem { sequence, path });
        });
    }

    fn process(&self, item: WorkItem) {
        let file_name = item
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        *lock(&self.progress.current_file) = file_name;

        // Nothing from a single file may take the worker down; a panic
        // inside probing or evaluation becomes an error verdict.
        let verdict = catch_unwind(AssertUnwindSafe(|| {
            let file_size = std::fs::metadata(&item.path).ok().map(|m| m.len());
            let probed = self.probe.probe(&item.path);
            self.engine
                .evaluate(&item.path, file_size, probed, item.sequence)
        }))
        .unwrap_or_else(|_| {
            log::error!("evaluation panicked for {}", item.path.display());
            self.engine.evaluate(
                &item.path,
                None,
                Err(ProbeError::Failed(
                    "internal error while evaluating file".to_string(),
                )),
                item.sequence,
            )
        });

        let _ = self.result_tx.send(verdict);
        self.progress.processed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());

        token.reset();
        assert!(!clone.is_cancelled());
    }

    #[test]
    fn test_progress_starts_empty() {
        struct NoProbe;
        impl MetadataProbe for NoProbe {
            fn probe(
                &self,
                _path: &std::path::Path,
            ) -> Result<crate::media::MediaAttributes, ProbeError> {
                Ok(crate::media::MediaAttributes::default())
            }
        }

        let supervisor = Supervisor::new(CoreConfig::default(), Arc::new(NoProbe)).unwrap();
        let progress = supervisor.progress();
        assert_eq!(progress.processed, 0);
        assert_eq!(progress.total, 0);
        assert_eq!(progress.current_file, "");
        assert!(!supervisor.is_running());
    }
}
