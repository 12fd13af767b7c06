use std::collections::BTreeMap;

use super::ManifestRow;

/// One fetch per distinct image URL, placed under its representative row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTask {
    pub index: usize,
    pub group_id: String,
    pub entity_name: String,
    pub image_link: String,
}

/// Collapse rows sharing an `image_link` into a single task.
///
/// The first row seen for a link becomes its representative. Tasks come back
/// sorted by link and rows without a link are left out.
pub fn deduplicate_by_link(rows: &[ManifestRow]) -> Vec<DownloadTask> {
    let mut by_link: BTreeMap<&str, DownloadTask> = BTreeMap::new();
    for row in rows {
        let Some(link) = row.image_link.as_deref() else {
            continue;
        };
        by_link.entry(link).or_insert_with(|| DownloadTask {
            index: row.index,
            group_id: row.group_id.clone(),
            entity_name: row.entity_name.clone(),
            image_link: link.to_string(),
        });
    }
    by_link.into_values().collect()
}
