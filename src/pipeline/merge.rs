use crate::types::{IgnoreList, KnownTrackerSet, OutputDataset, TrackerRecord};
use tracing::debug;

/// Filter candidates against the curated dataset and ignore list, then sort.
///
/// Records from the two extractor passes are not deduplicated against each
/// other; a tracker found by both shows up twice for the reviewer to resolve.
pub fn merge(
    known: &KnownTrackerSet,
    ignore: &IgnoreList,
    candidates: Vec<TrackerRecord>,
) -> OutputDataset {
    let mut trackers: Vec<TrackerRecord> = candidates
        .into_iter()
        .filter(|record| {
            let normalized = record.normalized_name();
            if normalized.is_empty() {
                return false;
            }
            if known.contains(&normalized) {
                debug!(name = %record.name, "already in curated dataset");
                return false;
            }
            if ignore.contains(&normalized) {
                debug!(name = %record.name, "on ignore list");
                return false;
            }
            true
        })
        .collect();

    trackers.sort_by(|a, b| a.name.cmp(&b.name));
    OutputDataset { trackers }
}
