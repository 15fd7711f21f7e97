//! Chromosome-parallel task execution.
//!
//! Every numeric operation decomposes into one task per chromosome and
//! hands the whole batch to [`OperationScheduler::run_all`], which fans
//! the tasks out over a bounded worker pool and fans the results back in
//! over a channel, one "done" message per task. A separate abort channel
//! lets [`OperationScheduler::abort`] wake the waiting caller
//! immediately; in-flight tasks observe the shared [`CancelToken`] and
//! bail out of their inner loops.
//!
//! Only one batch may hold the pool at a time: concurrent `run_all`
//! callers serialize on an internal lock rather than spawning competing
//! pools.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Sender, bounded, select};
use log::{debug, info, warn};

use bintrack_core::models::ChromosomeCatalog;

use crate::errors::OperationError;
use crate::progress::{ProgressEvent, ProgressListener};

/// Cooperative cancellation flag handed to every task closure. Long
/// inner loops call [`CancelToken::check`] so an abort lands promptly.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Bail out of a loop once cancellation was requested.
    pub fn check(&self) -> Result<(), OperationError> {
        if self.is_cancelled() {
            Err(OperationError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One chromosome's unit of work. The chromosome index is only used to
/// weight progress reporting; the closure owns whatever slice of the
/// input it needs.
pub struct Task<'a, T> {
    chromosome: usize,
    work: Box<dyn FnOnce(&CancelToken) -> Result<T, OperationError> + Send + 'a>,
}

impl<'a, T> Task<'a, T> {
    pub fn new<F>(chromosome: usize, work: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Result<T, OperationError> + Send + 'a,
    {
        Task {
            chromosome,
            work: Box::new(work),
        }
    }

    pub fn chromosome(&self) -> usize {
        self.chromosome
    }
}

struct ActiveRun {
    token: CancelToken,
    abort_tx: Sender<()>,
}

///
/// Executes one batch of per-chromosome tasks at a time on a bounded
/// worker pool and reports weighted progress to registered listeners.
///
/// The scheduler is an explicit service object: operations receive a
/// handle at construction instead of reaching for ambient global state.
///
pub struct OperationScheduler {
    threads: usize,
    run_lock: Mutex<()>,
    active: Mutex<Option<ActiveRun>>,
    listeners: Mutex<Vec<Arc<dyn ProgressListener>>>,
}

impl Default for OperationScheduler {
    fn default() -> Self {
        OperationScheduler::new()
    }
}

impl OperationScheduler {
    /// A scheduler sized to the available processing units.
    pub fn new() -> Self {
        OperationScheduler::with_threads(num_cpus::get())
    }

    /// A scheduler with an explicit worker count (minimum one).
    pub fn with_threads(threads: usize) -> Self {
        OperationScheduler {
            threads: threads.max(1),
            run_lock: Mutex::new(()),
            active: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn add_progress_listener(&self, listener: Arc<dyn ProgressListener>) {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .push(listener);
    }

    pub fn remove_progress_listener(&self, listener: &Arc<dyn ProgressListener>) {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .retain(|registered| !Arc::ptr_eq(registered, listener));
    }

    fn emit(&self, event: ProgressEvent) {
        // snapshot outside the lock so a listener may re-enter the
        // scheduler (e.g. to abort) without deadlocking
        let listeners: Vec<_> = self
            .listeners
            .lock()
            .expect("listener registry poisoned")
            .clone();
        for listener in listeners {
            listener.progress(event);
        }
    }

    /// Request cancellation of the run in flight. A no-op when idle, safe
    /// to call repeatedly and from any thread.
    pub fn abort(&self) {
        let active = self.active.lock().expect("active run slot poisoned");
        if let Some(run) = active.as_ref() {
            run.token.cancel();
            let _ = run.abort_tx.try_send(());
        }
    }

    ///
    /// Run every task to completion and return their results in
    /// submission order, regardless of which worker finished first.
    ///
    /// Returns `Ok(None)` when the run was aborted; a task error cancels
    /// the remaining tasks and is surfaced as `Err`; partial results are
    /// never returned.
    ///
    pub fn run_all<'a, T: Send + 'a>(
        &self,
        catalog: &ChromosomeCatalog,
        tasks: Vec<Task<'a, T>>,
    ) -> Result<Option<Vec<T>>, OperationError> {
        let _guard = self.run_lock.lock().expect("scheduler run lock poisoned");

        self.emit(ProgressEvent::Starting);
        if tasks.is_empty() {
            self.emit(ProgressEvent::Complete);
            return Ok(Some(Vec::new()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;

        let token = CancelToken::new();
        let (abort_tx, abort_rx) = bounded::<()>(1);
        *self.active.lock().expect("active run slot poisoned") = Some(ActiveRun {
            token: token.clone(),
            abort_tx,
        });

        let total_tasks = tasks.len();
        let genome_length = catalog.total_length().max(1) as f64;
        info!(
            "Running {} chromosome tasks on {} workers",
            total_tasks, self.threads
        );

        let (done_tx, done_rx) = bounded::<(usize, usize, Result<T, OperationError>)>(total_tasks);

        let mut slots: Vec<Option<T>> = (0..total_tasks).map(|_| None).collect();
        let mut finished_length = 0u64;
        let mut percent = 0.0f64;
        let mut aborted = false;
        let mut failure: Option<OperationError> = None;

        // a driver thread feeds the pool so the calling thread is free to
        // drain the done channel while workers are busy
        std::thread::scope(|threads| {
            let worker_token = token.clone();
            threads.spawn(move || {
                pool.scope(|scope| {
                    for (slot, task) in tasks.into_iter().enumerate() {
                        let done_tx = done_tx.clone();
                        let token = worker_token.clone();
                        scope.spawn(move |_| {
                            let chromosome = task.chromosome;
                            let result = if token.is_cancelled() {
                                // never started: cancelled before a worker got to it
                                Err(OperationError::Cancelled)
                            } else {
                                (task.work)(&token)
                            };
                            let _ = done_tx.send((slot, chromosome, result));
                        });
                    }
                });
                drop(done_tx);
            });

            let mut remaining = total_tasks;
            while remaining > 0 {
                select! {
                    recv(done_rx) -> message => {
                        let Ok((slot, chromosome, result)) = message else { break };
                        remaining -= 1;
                        match result {
                            Ok(value) => {
                                if let Some(chromo) = catalog.get(chromosome) {
                                    finished_length += u64::from(chromo.length);
                                }
                                let reached =
                                    (finished_length as f64 / genome_length * 100.0).min(100.0);
                                percent = percent.max(reached);
                                slots[slot] = Some(value);
                                debug!(
                                    "Task for chromosome {} finished ({:.1}%)",
                                    chromosome, percent
                                );
                                if !aborted && failure.is_none() {
                                    self.emit(ProgressEvent::InProgress(percent));
                                }
                            }
                            Err(OperationError::Cancelled) => {
                                // a sibling observed the stop flag, nothing to record
                            }
                            Err(error) => {
                                if failure.is_none() {
                                    warn!(
                                        "Task for chromosome {} failed, cancelling siblings: {}",
                                        chromosome, error
                                    );
                                    token.cancel();
                                    failure = Some(error);
                                }
                            }
                        }
                    }
                    recv(abort_rx) -> _ => {
                        if !aborted {
                            warn!("Abort requested, {} tasks outstanding", remaining);
                            aborted = true;
                        }
                    }
                }
            }
        });

        *self.active.lock().expect("active run slot poisoned") = None;

        if let Some(error) = failure {
            self.emit(ProgressEvent::Aborted);
            return Err(error);
        }
        if aborted {
            self.emit(ProgressEvent::Aborted);
            return Ok(None);
        }

        self.emit(ProgressEvent::Complete);
        let results = slots
            .into_iter()
            .map(|slot| slot.expect("every task reported a result"))
            .collect();
        Ok(Some(results))
    }
}
