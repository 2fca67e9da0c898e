//! Per-release exclusive track counts for a cover.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::models::Mbid;
use crate::normalize::ReleasePool;

/// How many of a cover member's tracks no other member holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Contribution {
    /// Pool index of the release.
    pub index: usize,
    pub id: Mbid,
    pub title: String,
    /// Size of the release's canonical track set.
    pub tracks: usize,
    pub contribution: usize,
}

/// Exclusive track count for each member of a cover, in cover order.
pub fn exclusive_counts(sets: &[&[String]]) -> Vec<usize> {
    let mut holders: FxHashMap<&str, usize> = FxHashMap::default();
    for set in sets {
        for track in set.iter() {
            *holders.entry(track.as_str()).or_default() += 1;
        }
    }
    sets.iter()
        .map(|set| set.iter().filter(|t| holders[t.as_str()] == 1).count())
        .collect()
}

/// Contribution records for a cover drawn from the pool.
pub fn contributions(cover: &[usize], pool: &ReleasePool) -> Vec<Contribution> {
    let counts = exclusive_counts(&pool.track_sets(cover));
    cover
        .iter()
        .zip(counts)
        .map(|(&index, contribution)| {
            let normalized = &pool.releases[index];
            Contribution {
                index,
                id: normalized.release.id.clone(),
                title: normalized.release.title.clone(),
                tracks: normalized.tracks.len(),
                contribution,
            }
        })
        .collect()
}

/// Order for display: contribution descending, then title.
pub fn rank(records: &mut [Contribution]) {
    records.sort_by(|a, b| {
        b.contribution
            .cmp(&a.contribution)
            .then_with(|| a.title.cmp(&b.title))
    });
}
