//! Tabular manifest of product images: loading, re-indexing, per-group sampling
//! and URL deduplication.

mod dedup;
mod loader;
mod sampling;

use std::path::PathBuf;

use thiserror::Error;

pub use dedup::{DownloadTask, deduplicate_by_link};
pub use sampling::{DEFAULT_LIMIT_PER_GROUP, sample_per_group};
pub(crate) use sampling::{has_usable_key, is_path_segment};

/// Column holding the opaque group identifier.
pub const GROUP_ID_COLUMN: &str = "group_id";
/// Column holding the entity name.
pub const ENTITY_NAME_COLUMN: &str = "entity_name";
/// Column holding the image URL.
pub const IMAGE_LINK_COLUMN: &str = "image_link";
/// Optional column holding the raw measurement text.
pub const ENTITY_VALUE_COLUMN: &str = "entity_value";

/// One manifest line as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestRecord {
    pub group_id: String,
    pub entity_name: String,
    /// `None` when the cell is empty.
    pub image_link: Option<String>,
    pub entity_value: Option<String>,
}

impl ManifestRecord {
    pub fn new(
        group_id: impl Into<String>,
        entity_name: impl Into<String>,
        image_link: Option<&str>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            entity_name: entity_name.into(),
            image_link: image_link.map(str::to_string),
            entity_value: None,
        }
    }
}

/// A manifest record with its position in the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestRow {
    /// 0-based position in the loaded manifest; disambiguates shared file names.
    pub index: usize,
    pub group_id: String,
    pub entity_name: String,
    pub image_link: Option<String>,
    pub entity_value: Option<String>,
}

/// In-memory manifest, kept in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<ManifestRecord>,
}

impl Manifest {
    pub fn new(records: Vec<ManifestRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ManifestRecord] {
        &self.records
    }

    /// Rows tagged with sequential indices in input order.
    pub fn indexed_rows(&self) -> Vec<ManifestRow> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| ManifestRow {
                index,
                group_id: record.group_id.clone(),
                entity_name: record.entity_name.clone(),
                image_link: record.image_link.clone(),
                entity_value: record.entity_value.clone(),
            })
            .collect()
    }
}

impl FromIterator<ManifestRecord> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to open manifest {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Manifest is missing required column {0:?}")]
    MissingColumn(&'static str),
}
