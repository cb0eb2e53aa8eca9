//! Concurrent thumbnail pipeline.
//!
//! Takes a scanned [`Catalog`] and makes sure every record has a cached
//! thumbnail. One unit of work is queued per record on a rayon pool; each
//! unit runs [`resolve_thumbnail`] and reports exactly one
//! [`ThumbnailOutcome`], whatever happens to it (success, decode failure,
//! timeout or cancellation).
//!
//! ## Fan-out
//!
//! By default a run gets its own pool with one thread per record, so a unit
//! stuck on a slow file never keeps another record from starting. Setting
//! `pipeline.max_threads` opts into a fixed pool shared by every run.
//!
//! ## Modes
//!
//! - [`Pipeline::run`]: block until every record is done and return a
//!   [`PipelineReport`].
//! - [`Pipeline::run_with`]: same, but call back from the worker thread as
//!   each record completes, for progressive display.
//! - [`Pipeline::spawn`]: run in the background. The returned
//!   [`PipelineHandle`] streams outcomes, can cancel the run, and joins to
//!   the report.
//!
//! Records complete in any order. Outcomes carry the record's catalog index.
//!
//! ## Timeouts
//!
//! With a unit timeout configured, the work itself runs on a dedicated
//! thread and the pool task waits for it with `recv_timeout`. A unit that
//! overruns has its cancel token tripped, so its decode aborts at the next
//! read, and is reported as [`ThumbnailError::TimedOut`].

use crate::cache::{CacheStats, InflightLocks, ThumbnailCache};
use crate::cancel::CancelToken;
use crate::config::{SiftConfig, effective_threads};
use crate::imaging::{
    RustBackend, Thumbnail, ThumbnailBackend, ThumbnailError, ThumbnailSettings,
    resolve_thumbnail,
};
use crate::types::Catalog;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What happened to one record.
#[derive(Debug, Clone)]
pub struct ThumbnailOutcome {
    /// Position of the record in the catalog passed to the pipeline.
    pub index: usize,
    pub source_path: PathBuf,
    pub result: Result<Thumbnail, ThumbnailError>,
}

impl ThumbnailOutcome {
    /// Whether the display layer can show a thumbnail for this record.
    pub fn displayable(&self) -> bool {
        self.result.is_ok()
    }

    pub fn thumb_path(&self) -> Option<&Path> {
        self.result.as_ref().ok().map(|t| t.path.as_path())
    }

    pub fn error(&self) -> Option<&ThumbnailError> {
        self.result.as_ref().err()
    }

    /// Write the thumbnail path into the matching record of `catalog`.
    ///
    /// Ignored when the index is out of range or points at a different
    /// source, e.g. an outcome from a stale run.
    pub fn apply_to(&self, catalog: &mut Catalog) {
        match catalog.get_mut(self.index) {
            Some(record) if record.source_path == self.source_path => {
                record.thumb_path = self.thumb_path().map(Path::to_path_buf);
            }
            _ => {}
        }
    }
}

/// Result of a complete pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    /// The input catalog with `thumb_path` filled in where resolution succeeded.
    pub catalog: Catalog,
    /// One outcome per record, in completion order.
    pub outcomes: Vec<ThumbnailOutcome>,
    pub stats: CacheStats,
}

/// Thumbnail pipeline bound to one backend and cache.
///
/// Cheap to clone. Clones share the cache, the single-flight locks and the
/// capped pool, if any.
#[derive(Clone)]
pub struct Pipeline {
    backend: Arc<dyn ThumbnailBackend>,
    cache: Arc<ThumbnailCache>,
    locks: Arc<InflightLocks>,
    /// Fixed pool when `max_threads` caps the width; otherwise built per run.
    pool: Option<Arc<rayon::ThreadPool>>,
    settings: ThumbnailSettings,
    unit_timeout: Option<Duration>,
}

impl Pipeline {
    pub fn new(
        config: &SiftConfig,
        backend: Arc<dyn ThumbnailBackend>,
    ) -> Result<Self, PipelineError> {
        let pool = match effective_threads(&config.pipeline) {
            Some(threads) => {
                debug!("worker pool: capped at {threads} threads");
                Some(Arc::new(build_pool(threads)?))
            }
            None => None,
        };

        Ok(Self {
            backend,
            cache: Arc::new(ThumbnailCache::from_config(&config.cache)),
            locks: Arc::new(InflightLocks::new()),
            pool,
            settings: ThumbnailSettings::from_config(&config.thumbnails),
            unit_timeout: config.pipeline.unit_timeout(),
        })
    }

    /// Pipeline backed by [`RustBackend`].
    pub fn with_rust_backend(config: &SiftConfig) -> Result<Self, PipelineError> {
        Self::new(config, Arc::new(RustBackend::new()))
    }

    /// Override the per-unit timeout. `None` disables it.
    pub fn with_unit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.unit_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    pub fn settings(&self) -> ThumbnailSettings {
        self.settings
    }

    /// Process every record and block until all of them are done.
    pub fn run(&self, catalog: Catalog, cancel: &CancelToken) -> PipelineReport {
        self.run_with(catalog, cancel, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_outcome` from the worker thread
    /// as each record completes.
    pub fn run_with<F>(
        &self,
        mut catalog: Catalog,
        cancel: &CancelToken,
        on_outcome: F,
    ) -> PipelineReport
    where
        F: Fn(&ThumbnailOutcome) + Sync,
    {
        let total = catalog.len();
        info!("generating thumbnails for {total} records");

        // Sized to the record count: no unit ever blocks on send.
        let (tx, rx) = mpsc::sync_channel(total.max(1));
        let records = &catalog;
        let on_outcome = &on_outcome;
        let dispatch = move || {
            rayon::scope(|s| {
                for (index, record) in records.iter().enumerate() {
                    let tx = tx.clone();
                    let source = record.source_path.clone();
                    s.spawn(move |_| {
                        let outcome = self.process_unit(index, source, cancel);
                        on_outcome(&outcome);
                        // Receiver outlives the scope.
                        let _ = tx.send(outcome);
                    });
                }
            })
        };
        match self.run_pool(total) {
            Ok(pool) => pool.install(dispatch),
            Err(e) => {
                warn!("cannot start {total} workers ({e}), using the global pool");
                dispatch();
            }
        }

        let mut stats = CacheStats::default();
        let mut outcomes = Vec::with_capacity(total);
        for outcome in rx {
            stats.record(&outcome.result);
            outcome.apply_to(&mut catalog);
            outcomes.push(outcome);
        }

        info!("thumbnails done: {stats}");
        PipelineReport {
            catalog,
            outcomes,
            stats,
        }
    }

    /// Run in the background and return immediately.
    pub fn spawn(&self, catalog: Catalog) -> PipelineHandle {
        let cancel = CancelToken::new();
        let (events_tx, events) = mpsc::channel();
        let pipeline = self.clone();
        let token = cancel.clone();

        let worker = std::thread::spawn(move || {
            pipeline.run_with(catalog, &token, |outcome| {
                // The handle may already be gone; the report still collects it.
                let _ = events_tx.send(outcome.clone());
            })
        });

        PipelineHandle {
            events,
            cancel,
            worker: Some(worker),
        }
    }

    /// The shared capped pool, or a fresh one with a thread per record.
    fn run_pool(
        &self,
        units: usize,
    ) -> Result<Arc<rayon::ThreadPool>, rayon::ThreadPoolBuildError> {
        match &self.pool {
            Some(pool) => Ok(Arc::clone(pool)),
            None => build_pool(units.max(1)).map(Arc::new),
        }
    }

    fn process_unit(
        &self,
        index: usize,
        source: PathBuf,
        parent: &CancelToken,
    ) -> ThumbnailOutcome {
        let result = if parent.is_cancelled() {
            Err(ThumbnailError::Cancelled)
        } else {
            let cancel = parent.child();
            match self.unit_timeout {
                Some(limit) => self.resolve_with_timeout(&source, &cancel, limit),
                None => self.resolve(&source, &cancel),
            }
        };

        if let Err(e) = &result {
            match e {
                ThumbnailError::Cancelled => debug!("{}: cancelled", source.display()),
                _ => warn!("{}: {e}", source.display()),
            }
        }

        ThumbnailOutcome {
            index,
            source_path: source,
            result,
        }
    }

    fn resolve(&self, source: &Path, cancel: &CancelToken) -> Result<Thumbnail, ThumbnailError> {
        resolve_thumbnail(
            self.backend.as_ref(),
            &self.cache,
            &self.locks,
            source,
            &self.settings,
            cancel,
        )
    }

    fn resolve_with_timeout(
        &self,
        source: &Path,
        cancel: &CancelToken,
        limit: Duration,
    ) -> Result<Thumbnail, ThumbnailError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let unit = self.clone();
        let owned_source = source.to_path_buf();
        let token = cancel.clone();

        std::thread::Builder::new()
            .name("sift-unit".into())
            .spawn(move || {
                let _ = tx.send(unit.resolve(&owned_source, &token));
            })?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                Err(ThumbnailError::TimedOut(limit))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ThumbnailError::WorkerLost),
        }
    }
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("sift-worker-{i}"))
        .build()
}

/// A pipeline run in progress.
///
/// Dropping the handle cancels the run.
pub struct PipelineHandle {
    events: Receiver<ThumbnailOutcome>,
    cancel: CancelToken,
    worker: Option<JoinHandle<PipelineReport>>,
}

impl PipelineHandle {
    /// Outcomes as records complete. Disconnects when the run is over.
    pub fn events(&self) -> &Receiver<ThumbnailOutcome> {
        &self.events
    }

    /// Stop the run. Units not yet started report
    /// [`ThumbnailError::Cancelled`]; decodes in flight abort at their next read.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the run to finish and return its report.
    pub fn join(mut self) -> PipelineReport {
        let worker = self.worker.take();
        match worker.map(JoinHandle::join) {
            Some(Ok(report)) => report,
            Some(Err(panic)) => std::panic::resume_unwind(panic),
            // `worker` is only taken here, and `join` consumes the handle.
            None => unreachable!("pipeline handle joined twice"),
        }
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.cancel.cancel();
        }
    }
}
