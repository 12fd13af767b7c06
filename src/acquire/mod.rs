//! Bulk image acquisition for a product manifest.
//!
//! A run creates the download folder, samples the manifest per
//! `(group_id, entity_name)`, collapses rows sharing a URL into one task and
//! fetches every task, in parallel or one at a time. Each task ends as
//! `<root>/<group_id>/<entity_name>/<index>_<basename>`: the fetched image,
//! the file left by an earlier run, or a 100×100 black placeholder when the
//! URL kept failing. Only failing to create the root folder aborts a run.

mod fetch;
mod placeholder;
mod pool;
mod progress;
mod replicate;
mod task;

use std::path::PathBuf;
use std::time::Duration;

use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::http_client::RetryConfig;
use crate::manifest::{
    DEFAULT_LIMIT_PER_GROUP, Manifest, deduplicate_by_link, has_usable_key, sample_per_group,
};

pub use fetch::{FetchError, HttpFetcher, ImageFetcher, MAX_IMAGE_BYTES};
pub use placeholder::{PLACEHOLDER_SIZE, write_placeholder};
pub use progress::AcquireProgress;
pub use replicate::ReplicationMode;
pub use task::{TaskOutcome, destination_path, url_basename};

use pool::{Dispatch, run_tasks};

/// Default number of fetch attempts per URL.
pub const DEFAULT_RETRIES: usize = 3;
/// Default pause after a failed attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);
/// Default whole-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for one acquisition run.
#[derive(Clone, Debug)]
pub struct AcquireOptions {
    /// Root folder that receives `<group_id>/<entity_name>/` subfolders.
    pub download_folder: PathBuf,
    /// Fan tasks out over a worker pool instead of running them in order.
    pub parallel: bool,
    /// Upper bound on rows sampled per `(group_id, entity_name)`.
    ///
    /// Zero is raised to one: every usable partition keeps at least one row.
    pub limit_per_group: usize,
    /// Fetch attempts per URL before falling back to a placeholder.
    ///
    /// Zero is raised to one: every task makes at least one request.
    pub retries: usize,
    pub retry_delay: Duration,
    /// Whole-request timeout used by [`HttpFetcher`].
    pub request_timeout: Duration,
    /// Pool size; `None` uses one worker per available processing unit.
    pub worker_count: Option<usize>,
    /// Fixes the sampling RNG; `None` draws a fresh seed each run.
    pub seed: Option<u64>,
    pub replication: ReplicationMode,
}

impl AcquireOptions {
    pub fn new(download_folder: impl Into<PathBuf>) -> Self {
        Self {
            download_folder: download_folder.into(),
            ..Self::default()
        }
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retries.max(1),
            delay: self.retry_delay,
        }
    }

    fn dispatch(&self) -> Dispatch {
        if !self.parallel {
            return Dispatch::Sequential;
        }
        let workers = self.worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        Dispatch::Parallel {
            workers: workers.max(1),
        }
    }
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            download_folder: PathBuf::new(),
            parallel: true,
            limit_per_group: DEFAULT_LIMIT_PER_GROUP,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            worker_count: None,
            seed: None,
            replication: ReplicationMode::Off,
        }
    }
}

/// Counts describing what a run did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AcquireSummary {
    pub manifest_rows: usize,
    /// Rows dropped before sampling because `group_id` or `entity_name`
    /// cannot be used as a folder name.
    pub unusable_key: usize,
    pub sampled_rows: usize,
    /// Sampled rows without an image link.
    pub no_link: usize,
    /// Distinct links fetched (or skipped) this run.
    pub tasks: usize,
    pub downloaded: usize,
    pub skipped_existing: usize,
    /// Links that failed every attempt and got a placeholder file.
    pub placeholders: usize,
    /// Links that failed every attempt and got no file at all.
    pub placeholder_failures: usize,
    pub replicated: usize,
    pub replication_failures: usize,
}

impl AcquireSummary {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Downloaded => self.downloaded += 1,
            TaskOutcome::Skipped => self.skipped_existing += 1,
            TaskOutcome::Placeholder => self.placeholders += 1,
            TaskOutcome::PlaceholderFailed => self.placeholder_failures += 1,
        }
    }
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("Failed to create download folder {path}: {source}")]
    CreateRoot {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Download every sampled image over plain HTTP.
pub fn acquire(manifest: &Manifest, options: &AcquireOptions) -> Result<AcquireSummary, AcquireError> {
    let fetcher = HttpFetcher::new(options.request_timeout);
    acquire_with(manifest, options, &fetcher, &mut None)
}

/// Run acquisition with a caller-supplied fetcher and optional progress callback.
///
/// Progress callbacks run on the calling thread, once per finished task.
pub fn acquire_with(
    manifest: &Manifest,
    options: &AcquireOptions,
    fetcher: &dyn ImageFetcher,
    progress: &mut Option<&mut dyn FnMut(AcquireProgress)>,
) -> Result<AcquireSummary, AcquireError> {
    let root = options.download_folder.as_path();
    std::fs::create_dir_all(root).map_err(|source| AcquireError::CreateRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let rows = manifest.indexed_rows();
    let limit = options.limit_per_group.max(1);
    let sampled = match options.seed {
        Some(seed) => sample_per_group(&rows, limit, &mut StdRng::seed_from_u64(seed)),
        None => sample_per_group(&rows, limit, &mut rand::rng()),
    };
    let tasks = deduplicate_by_link(&sampled);

    let mut summary = AcquireSummary {
        manifest_rows: rows.len(),
        unusable_key: rows.iter().filter(|row| !has_usable_key(row)).count(),
        sampled_rows: sampled.len(),
        no_link: sampled.iter().filter(|row| row.image_link.is_none()).count(),
        tasks: tasks.len(),
        ..AcquireSummary::default()
    };
    if summary.unusable_key > 0 {
        warn!(
            "Skipped {} manifest rows whose group_id or entity_name is not a valid folder name",
            summary.unusable_key
        );
    }
    info!(
        "Acquiring {} unique images from {} sampled rows into {}",
        summary.tasks,
        summary.sampled_rows,
        root.display()
    );

    let retry = options.retry_config();
    let outcomes = run_tasks(
        &tasks,
        options.dispatch(),
        |item| task::fetch_task(item, root, fetcher, retry),
        progress,
    );
    for outcome in outcomes {
        summary.record(outcome);
    }

    if options.replication == ReplicationMode::HardLinkOrCopy {
        let report = replicate::replicate_duplicates(root, &sampled, &tasks);
        summary.replicated = report.replicated;
        summary.replication_failures = report.failures;
    }

    info!(
        "Acquisition finished: {} downloaded, {} already present, {} placeholders, {} without file",
        summary.downloaded, summary.skipped_existing, summary.placeholders, summary.placeholder_failures
    );
    Ok(summary)
}

#[cfg(test)]
mod tests;
