//! The folder currently being browsed.
//!
//! A [`BrowseSession`] owns the catalog of one folder at a time. Opening a
//! folder scans it, orders it and starts the thumbnail pipeline in the
//! background; opening another folder cancels whatever the previous one still
//! had in flight. Thumbnail paths are merged into the catalog as outcomes
//! arrive, and ratings live on the records for as long as the session does.

use crate::cache::CacheStats;
use crate::config::CatalogConfig;
use crate::pipeline::{Pipeline, PipelineHandle, ThumbnailOutcome};
use crate::scan::{ScanError, scan_folder, sort_catalog};
use crate::types::Catalog;
use log::{debug, info};
use std::path::{Path, PathBuf};

pub struct BrowseSession {
    pipeline: Pipeline,
    ordering: CatalogConfig,
    folder: Option<PathBuf>,
    catalog: Catalog,
    handle: Option<PipelineHandle>,
}

impl BrowseSession {
    pub fn new(pipeline: Pipeline, ordering: CatalogConfig) -> Self {
        Self {
            pipeline,
            ordering,
            folder: None,
            catalog: Catalog::new(),
            handle: None,
        }
    }

    /// Switch to `folder`: cancel the previous run, scan, order, and start
    /// generating thumbnails in the background.
    ///
    /// On a scan failure the session keeps showing nothing rather than the
    /// previous folder.
    pub fn open(&mut self, folder: &Path) -> Result<&Catalog, ScanError> {
        self.close();

        let mut catalog = scan_folder(folder)?;
        sort_catalog(
            &mut catalog,
            self.ordering.sort,
            &self.ordering.numeric_prefix,
        );
        info!("browsing {} ({} images)", folder.display(), catalog.len());

        self.handle = Some(self.pipeline.spawn(catalog.clone()));
        self.folder = Some(folder.to_path_buf());
        self.catalog = catalog;
        Ok(&self.catalog)
    }

    /// Cancel in-flight work and forget the current folder.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!("cancelling thumbnails for abandoned folder");
            }
            handle.cancel();
        }
        self.folder = None;
        self.catalog.clear();
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Merge every outcome that has arrived since the last call and return them.
    pub fn poll(&mut self) -> Vec<ThumbnailOutcome> {
        let Some(handle) = &self.handle else {
            return Vec::new();
        };
        let outcomes: Vec<_> = handle.events().try_iter().collect();
        for outcome in &outcomes {
            outcome.apply_to(&mut self.catalog);
        }
        outcomes
    }

    /// Block until the current folder's thumbnails are all resolved.
    ///
    /// Returns `None` when no run is in progress.
    pub fn wait(&mut self) -> Option<CacheStats> {
        let handle = self.handle.take()?;
        let report = handle.join();
        for outcome in &report.outcomes {
            outcome.apply_to(&mut self.catalog);
        }
        Some(report.stats)
    }

    /// Set the in-memory rating of the record at `index`. Returns `false`
    /// when there is no such record.
    pub fn set_rating(&mut self, index: usize, rating: i32) -> bool {
        match self.catalog.get_mut(index) {
            Some(record) => {
                record.rating = rating;
                true
            }
            None => false,
        }
    }
}

impl Drop for BrowseSession {
    fn drop(&mut self) {
        self.close();
    }
}
