use std::collections::BTreeMap;

use rand::Rng;
use tracing::warn;

use super::ManifestRow;

/// Default cap on rows kept per `(group_id, entity_name)` partition.
pub const DEFAULT_LIMIT_PER_GROUP: usize = 5000;

/// Draw up to `limit_per_group` rows, without replacement, from every
/// `(group_id, entity_name)` partition.
///
/// Partitions are visited in sorted key order; rows inside a partition come
/// out in draw order. Rows whose key is empty or unusable as a path segment
/// belong to no partition and are dropped.
pub fn sample_per_group<R: Rng + ?Sized>(
    rows: &[ManifestRow],
    limit_per_group: usize,
    rng: &mut R,
) -> Vec<ManifestRow> {
    let mut partitions: BTreeMap<(&str, &str), Vec<&ManifestRow>> = BTreeMap::new();
    for row in rows {
        if !has_usable_key(row) {
            warn!(
                "Dropping manifest row {} with unusable group key ({:?}, {:?})",
                row.index, row.group_id, row.entity_name
            );
            continue;
        }
        partitions
            .entry((row.group_id.as_str(), row.entity_name.as_str()))
            .or_default()
            .push(row);
    }

    let mut sampled = Vec::new();
    for members in partitions.into_values() {
        let amount = members.len().min(limit_per_group);
        for position in rand::seq::index::sample(rng, members.len(), amount) {
            sampled.push(members[position].clone());
        }
    }
    sampled
}

/// Whether both parts of the row's partition key can name a folder.
pub(crate) fn has_usable_key(row: &ManifestRow) -> bool {
    is_path_segment(&row.group_id) && is_path_segment(&row.entity_name)
}

/// Whether `value` names exactly one directory level.
pub(crate) fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\'])
        && !value.contains('\0')
}
