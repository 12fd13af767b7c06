use super::*;

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use tempfile::tempdir;

use crate::manifest::ManifestRecord;

/// Serves fixed bytes per URL and records every request.
#[derive(Default)]
struct RecordingFetcher {
    failing: BTreeSet<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl RecordingFetcher {
    fn failing(links: &[&str]) -> Self {
        Self {
            failing: links.iter().map(|link| link.to_string()).collect(),
            ..Self::default()
        }
    }

    fn calls_for(&self, link: &str) -> usize {
        self.calls.lock().unwrap().get(link).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl ImageFetcher for RecordingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        if self.failing.contains(url) {
            return Err(FetchError::Transport("connection refused".to_string()));
        }
        Ok(format!("bytes of {url}").into_bytes())
    }
}

fn options(root: &Path) -> AcquireOptions {
    AcquireOptions {
        retry_delay: Duration::ZERO,
        seed: Some(42),
        worker_count: Some(4),
        ..AcquireOptions::new(root)
    }
}

fn sample_manifest() -> Manifest {
    [
        ManifestRecord::new("748919", "item_weight", Some("https://img.test/I/a.jpg")),
        ManifestRecord::new("748919", "item_weight", Some("https://img.test/I/b.jpg")),
        ManifestRecord::new("916768", "item_volume", Some("https://img.test/I/a.jpg")),
        ManifestRecord::new("459516", "wattage", Some("https://img.test/I/c.png")),
        ManifestRecord::new("459516", "wattage", None),
    ]
    .into_iter()
    .collect()
}

fn written_files(root: &Path) -> BTreeSet<String> {
    fn walk(dir: &Path, root: &Path, out: &mut BTreeSet<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                out.insert(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    let mut out = BTreeSet::new();
    walk(root, root, &mut out);
    out
}

#[test]
fn fetches_each_distinct_link_once() {
    let root = tempdir().unwrap();
    let fetcher = RecordingFetcher::default();
    let summary = acquire_with(&sample_manifest(), &options(root.path()), &fetcher, &mut None).unwrap();

    assert_eq!(fetcher.calls_for("https://img.test/I/a.jpg"), 1);
    assert_eq!(fetcher.total_calls(), 3);
    assert_eq!(
        summary,
        AcquireSummary {
            manifest_rows: 5,
            sampled_rows: 5,
            no_link: 1,
            tasks: 3,
            downloaded: 3,
            ..AcquireSummary::default()
        }
    );
    let files = written_files(root.path());
    assert_eq!(files.len(), 3);
    assert!(files.contains("748919/item_weight/1_b.jpg"));
    assert!(files.contains("459516/wattage/3_c.png"));
}

#[test]
fn second_run_makes_no_requests() {
    let root = tempdir().unwrap();
    let manifest = sample_manifest();
    let first = RecordingFetcher::default();
    acquire_with(&manifest, &options(root.path()), &first, &mut None).unwrap();
    let before = written_files(root.path());

    let second = RecordingFetcher::default();
    let summary = acquire_with(&manifest, &options(root.path()), &second, &mut None).unwrap();

    assert_eq!(second.total_calls(), 0);
    assert_eq!(summary.skipped_existing, 3);
    assert_eq!(written_files(root.path()), before);
}

#[test]
fn failing_link_is_retried_then_replaced_by_placeholder() {
    let root = tempdir().unwrap();
    let fetcher = RecordingFetcher::failing(&["https://img.test/I/c.png"]);
    let summary = acquire_with(&sample_manifest(), &options(root.path()), &fetcher, &mut None).unwrap();

    assert_eq!(fetcher.calls_for("https://img.test/I/c.png"), DEFAULT_RETRIES);
    assert_eq!(summary.placeholders, 1);
    assert_eq!(summary.downloaded, 2);
    let placeholder = image::open(root.path().join("459516/wattage/3_c.png"))
        .unwrap()
        .to_rgb8();
    assert_eq!(placeholder.dimensions(), (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE));
    assert!(placeholder.pixels().all(|pixel| pixel.0 == [0, 0, 0]));
}

#[test]
fn parallel_and_sequential_write_the_same_paths() {
    let manifest: Manifest = (0..60)
        .map(|idx| {
            ManifestRecord::new(
                format!("{}", idx % 3),
                if idx % 2 == 0 { "width" } else { "height" },
                Some(format!("https://img.test/{}.jpg", idx % 17).as_str()),
            )
        })
        .collect();
    let failing = ["https://img.test/4.jpg", "https://img.test/9.jpg"];

    let parallel_root = tempdir().unwrap();
    let parallel = acquire_with(
        &manifest,
        &options(parallel_root.path()),
        &RecordingFetcher::failing(&failing),
        &mut None,
    )
    .unwrap();

    let sequential_root = tempdir().unwrap();
    let sequential = acquire_with(
        &manifest,
        &AcquireOptions {
            parallel: false,
            ..options(sequential_root.path())
        },
        &RecordingFetcher::failing(&failing),
        &mut None,
    )
    .unwrap();

    assert_eq!(parallel, sequential);
    assert_eq!(
        written_files(parallel_root.path()),
        written_files(sequential_root.path())
    );
}

#[test]
fn sampling_caps_rows_per_group() {
    let manifest: Manifest = (0..30)
        .map(|idx| {
            ManifestRecord::new(
                "1",
                "depth",
                Some(format!("https://img.test/{idx}.jpg").as_str()),
            )
        })
        .collect();
    let root = tempdir().unwrap();
    let fetcher = RecordingFetcher::default();
    let summary = acquire_with(
        &manifest,
        &AcquireOptions {
            limit_per_group: 7,
            ..options(root.path())
        },
        &fetcher,
        &mut None,
    )
    .unwrap();

    assert_eq!(summary.sampled_rows, 7);
    assert_eq!(fetcher.total_calls(), 7);
    assert_eq!(written_files(root.path()).len(), 7);
}

#[test]
fn replication_places_shared_image_under_every_row() {
    let root = tempdir().unwrap();
    let fetcher = RecordingFetcher::default();
    let summary = acquire_with(
        &sample_manifest(),
        &AcquireOptions {
            replication: ReplicationMode::HardLinkOrCopy,
            ..options(root.path())
        },
        &fetcher,
        &mut None,
    )
    .unwrap();

    assert_eq!(fetcher.calls_for("https://img.test/I/a.jpg"), 1);
    assert_eq!(summary.replicated, 1);
    let files = written_files(root.path());
    assert!(files.contains("748919/item_weight/0_a.jpg"));
    assert!(files.contains("916768/item_volume/2_a.jpg"));
    assert_eq!(
        fs::read(root.path().join("748919/item_weight/0_a.jpg")).unwrap(),
        fs::read(root.path().join("916768/item_volume/2_a.jpg")).unwrap()
    );
}

#[test]
fn progress_reports_every_task() {
    let root = tempdir().unwrap();
    let mut updates = Vec::new();
    let mut on_progress = |update: AcquireProgress| updates.push(update);
    let mut progress: Option<&mut dyn FnMut(AcquireProgress)> = Some(&mut on_progress);
    acquire_with(
        &sample_manifest(),
        &options(root.path()),
        &RecordingFetcher::default(),
        &mut progress,
    )
    .unwrap();

    assert_eq!(updates.len(), 3);
    assert_eq!(updates.last(), Some(&AcquireProgress { processed: 3, total: 3 }));
}

#[test]
fn blocked_entity_folder_is_counted_and_batch_continues() {
    let root = tempdir().unwrap();
    let group = root.path().join("459516");
    fs::create_dir_all(&group).unwrap();
    fs::write(group.join("wattage"), b"not a folder").unwrap();
    let fetcher = RecordingFetcher::default();

    let summary = acquire_with(&sample_manifest(), &options(root.path()), &fetcher, &mut None).unwrap();

    assert_eq!(summary.placeholder_failures, 1);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.placeholders, 0);
    assert_eq!(fetcher.calls_for("https://img.test/I/c.png"), 0);
    assert!(root.path().join("748919/item_weight/1_b.jpg").is_file());
}

#[test]
fn rows_with_unusable_keys_are_counted() {
    let manifest: Manifest = [
        ManifestRecord::new("1", "width", Some("https://img.test/ok.jpg")),
        ManifestRecord::new("..", "width", Some("https://img.test/up.jpg")),
        ManifestRecord::new("2", "a/b", Some("https://img.test/nested.jpg")),
    ]
    .into_iter()
    .collect();
    let root = tempdir().unwrap();
    let fetcher = RecordingFetcher::default();

    let summary = acquire_with(&manifest, &options(root.path()), &fetcher, &mut None).unwrap();

    assert_eq!(summary.manifest_rows, 3);
    assert_eq!(summary.unusable_key, 2);
    assert_eq!(summary.sampled_rows, 1);
    assert_eq!(fetcher.total_calls(), 1);
    assert_eq!(written_files(root.path()), BTreeSet::from(["1/width/0_ok.jpg".to_string()]));
}

#[test]
fn zero_retries_and_limit_are_raised_to_one() {
    let root = tempdir().unwrap();
    let fetcher = RecordingFetcher::failing(&["https://img.test/I/c.png"]);
    let summary = acquire_with(
        &sample_manifest(),
        &AcquireOptions {
            retries: 0,
            limit_per_group: 0,
            ..options(root.path())
        },
        &fetcher,
        &mut None,
    )
    .unwrap();

    assert_eq!(summary.sampled_rows, 3);
    assert_eq!(fetcher.total_calls(), summary.tasks);
    assert_eq!(summary.placeholders + summary.downloaded, summary.tasks);
}

#[test]
fn unusable_root_is_fatal() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, b"not a folder").unwrap();
    let err = acquire_with(
        &sample_manifest(),
        &options(&blocker.join("images")),
        &RecordingFetcher::default(),
        &mut None,
    )
    .unwrap_err();
    assert!(matches!(err, AcquireError::CreateRoot { .. }));
}
