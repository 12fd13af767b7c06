use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use super::{
    ENTITY_NAME_COLUMN, ENTITY_VALUE_COLUMN, GROUP_ID_COLUMN, IMAGE_LINK_COLUMN, Manifest,
    ManifestError, ManifestRecord,
};

struct ColumnLayout {
    group_id: usize,
    entity_name: usize,
    image_link: usize,
    entity_value: Option<usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self, ManifestError> {
        let find = |name: &str| headers.iter().position(|header| header.trim() == name);
        let require = |name: &'static str| find(name).ok_or(ManifestError::MissingColumn(name));
        Ok(Self {
            group_id: require(GROUP_ID_COLUMN)?,
            entity_name: require(ENTITY_NAME_COLUMN)?,
            image_link: require(IMAGE_LINK_COLUMN)?,
            entity_value: find(ENTITY_VALUE_COLUMN),
        })
    }

    fn record(&self, row: &StringRecord) -> ManifestRecord {
        let text = |idx: usize| row.get(idx).unwrap_or("").to_string();
        let optional = |idx: usize| {
            row.get(idx)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        ManifestRecord {
            group_id: text(self.group_id),
            entity_name: text(self.entity_name),
            image_link: optional(self.image_link),
            entity_value: self.entity_value.and_then(optional),
        }
    }
}

impl Manifest {
    /// Load a manifest from a CSV file with a header row.
    pub fn from_csv_path(path: &Path) -> Result<Self, ManifestError> {
        let file = File::open(path).map_err(|source| ManifestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    /// Load a manifest from CSV text with a header row.
    ///
    /// `group_id`, `entity_name` and `image_link` are required; `entity_value`
    /// is read when present and other columns are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ManifestError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let layout = ColumnLayout::from_headers(reader.headers()?)?;
        let mut records = Vec::new();
        for row in reader.records() {
            records.push(layout.record(&row?));
        }
        Ok(Self::new(records))
    }
}
