use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::fetch::{FetchError, ImageFetcher};
use super::placeholder::write_placeholder;
use crate::http_client::{RetryConfig, retry_fixed};
use crate::manifest::DownloadTask;

/// File name used when a link has no usable last path segment.
const FALLBACK_BASENAME: &str = "image";

/// How a single download task resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The image was fetched and written.
    Downloaded,
    /// The destination already existed; nothing was fetched.
    Skipped,
    /// Every attempt failed and a placeholder was written.
    Placeholder,
    /// Every attempt failed and the placeholder could not be written either.
    PlaceholderFailed,
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to write image: {0}")]
    Write(#[from] io::Error),
}

/// `<root>/<group_id>/<entity_name>/<index>_<basename(link)>`.
pub fn destination_path(
    root: &Path,
    group_id: &str,
    entity_name: &str,
    index: usize,
    image_link: &str,
) -> PathBuf {
    root.join(group_id)
        .join(entity_name)
        .join(format!("{index}_{}", url_basename(image_link)))
}

/// Last non-empty path segment of a link, as written in the link.
///
/// Query, fragment and any `scheme://host` prefix are cut first; the segment
/// is not percent-decoded or re-encoded.
pub fn url_basename(link: &str) -> String {
    let without_suffix = link.split(['?', '#']).next().unwrap_or_default();
    let path = match without_suffix.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |slash| &rest[slash..]),
        None => without_suffix,
    };
    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .filter(|name| crate::manifest::is_path_segment(name))
        .map_or_else(|| FALLBACK_BASENAME.to_string(), str::to_string)
}

pub(super) fn task_destination(root: &Path, task: &DownloadTask) -> PathBuf {
    destination_path(
        root,
        &task.group_id,
        &task.entity_name,
        task.index,
        &task.image_link,
    )
}

/// Fetch one task's image into its destination, falling back to a placeholder.
///
/// Never fails: every error ends up in the returned outcome and the log.
pub(super) fn fetch_task(
    task: &DownloadTask,
    root: &Path,
    fetcher: &dyn ImageFetcher,
    retry: RetryConfig,
) -> TaskOutcome {
    let dest = task_destination(root, task);
    if let Some(parent) = dest.parent()
        && let Err(err) = fs::create_dir_all(parent)
    {
        warn!("Failed to create folder {}: {err}", parent.display());
        return TaskOutcome::PlaceholderFailed;
    }
    if dest.exists() {
        debug!("Skipping existing image {}", dest.display());
        return TaskOutcome::Skipped;
    }

    let result = retry_fixed(
        retry,
        || -> Result<(), AttemptError> {
            let bytes = fetcher.fetch(&task.image_link)?;
            write_atomically(&dest, &bytes)?;
            Ok(())
        },
        |attempt, err| {
            warn!(
                "Error downloading {} (attempt {attempt}/{}): {err}",
                task.image_link,
                retry.max_attempts.max(1)
            );
        },
    );
    if result.is_ok() {
        return TaskOutcome::Downloaded;
    }

    match write_placeholder(&dest) {
        Ok(()) => TaskOutcome::Placeholder,
        Err(err) => {
            warn!("Failed to write placeholder {}: {err}", dest.display());
            TaskOutcome::PlaceholderFailed
        }
    }
}

/// Write through a sibling `.part` file so a partial image is never visible at `dest`.
pub(super) fn write_atomically(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = dest.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".part");
    let tmp = dest.with_file_name(tmp_name);
    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.flush()
    });
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, dest).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}
