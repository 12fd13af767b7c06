use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::manifest::{DownloadTask, ManifestRow};

use super::task::{destination_path, task_destination};

/// Whether deduplicated images are also placed under every referencing row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationMode {
    /// One file per distinct URL, under its representative row only.
    #[default]
    Off,
    /// Hard-link (or copy, when linking fails) the representative's file to
    /// every other sampled row that shares its URL.
    HardLinkOrCopy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct ReplicationReport {
    pub replicated: usize,
    pub failures: usize,
}

/// Place each representative's file at the path of every other sampled row with the same link.
///
/// Targets that already exist and representatives with no file on disk are skipped.
pub(super) fn replicate_duplicates(
    root: &Path,
    sampled: &[ManifestRow],
    tasks: &[DownloadTask],
) -> ReplicationReport {
    let by_link: HashMap<&str, &DownloadTask> = tasks
        .iter()
        .map(|task| (task.image_link.as_str(), task))
        .collect();
    let mut report = ReplicationReport::default();
    for row in sampled {
        let Some(link) = row.image_link.as_deref() else {
            continue;
        };
        let Some(task) = by_link.get(link) else {
            continue;
        };
        if task.index == row.index {
            continue;
        }
        let source = task_destination(root, task);
        if !source.is_file() {
            debug!("No file to replicate for {link}");
            continue;
        }
        let target = destination_path(root, &row.group_id, &row.entity_name, row.index, link);
        if target.exists() {
            continue;
        }
        let linked = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| {
                fs::hard_link(&source, &target).or_else(|_| fs::copy(&source, &target).map(|_| ()))
            });
        match linked {
            Ok(()) => report.replicated += 1,
            Err(err) => {
                warn!(
                    "Failed to replicate {} to {}: {err}",
                    source.display(),
                    target.display()
                );
                report.failures += 1;
            }
        }
    }
    report
}
