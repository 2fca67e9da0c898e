//! Release normalization and deduplication.
//!
//! Reduces each release to its canonical track set (sorted, deduplicated
//! canonical titles of its non-video, non-ignored tracks) and keeps one
//! representative per class of releases with equal canonical sets. The
//! resulting pool is the solver's universe.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{Release, ReleaseGroup};
use crate::resolver::TitleMaps;
use crate::solver::TrackIndex;

/// A release paired with its canonical track set.
#[derive(Clone, Debug, Serialize)]
pub struct NormalizedRelease {
    pub release: Release,
    pub tracks: Vec<String>,
}

/// Drop release groups carrying any of the given secondary types (case-insensitive).
pub fn filter_by_secondary_type(groups: Vec<ReleaseGroup>, discard: &[String]) -> Vec<ReleaseGroup> {
    groups
        .into_iter()
        .filter(|group| {
            let discarded = group
                .secondary_types
                .iter()
                .any(|s| discard.iter().any(|d| d.eq_ignore_ascii_case(s)));
            if discarded {
                log::debug!(
                    "release group discarded by secondary type: {} {:?}",
                    group.title,
                    group.secondary_types
                );
            }
            !discarded
        })
        .collect()
}

/// Every distinct non-video track title across the groups.
pub fn distinct_titles(groups: &[ReleaseGroup]) -> BTreeSet<String> {
    groups
        .iter()
        .flat_map(|g| g.releases.iter())
        .flat_map(|r| r.tracks())
        .filter(|t| !t.is_video)
        .map(|t| t.title.clone())
        .collect()
}

/// Canonical track set of a release under the given title maps.
pub fn canonical_tracks(release: &Release, maps: &TitleMaps) -> Vec<String> {
    let mut tracks: Vec<String> = release
        .tracks()
        .filter(|t| !t.is_video && !maps.is_ignored(&t.title))
        .map(|t| maps.canonical(&t.title).to_string())
        .collect();
    tracks.sort();
    tracks.dedup();
    tracks
}

/// Keep the first release of each class of equal canonical track sets.
/// Releases left with no tracks are dropped.
pub fn dedup_releases(releases: Vec<Release>, maps: &TitleMaps) -> Vec<NormalizedRelease> {
    let total = releases.len();
    let mut seen: FxHashMap<Vec<String>, usize> = FxHashMap::default();
    let mut unique: Vec<NormalizedRelease> = Vec::new();

    for release in releases {
        let tracks = canonical_tracks(&release, maps);
        if tracks.is_empty() {
            log::debug!("release has no remaining tracks: {}", release.title);
            continue;
        }
        match seen.get(&tracks) {
            Some(&kept) => log::debug!(
                "release {} duplicates {}",
                release.title,
                unique[kept].release.title
            ),
            None => {
                seen.insert(tracks.clone(), unique.len());
                unique.push(NormalizedRelease { release, tracks });
            }
        }
    }

    log::debug!("deduplicated {} releases into {}", total, unique.len());
    unique
}

/// The deduplicated release pool the solver works over.
#[derive(Clone, Debug, Default)]
pub struct ReleasePool {
    pub releases: Vec<NormalizedRelease>,
}

impl ReleasePool {
    pub fn build(groups: Vec<ReleaseGroup>, maps: &TitleMaps) -> Self {
        let releases = groups.into_iter().flat_map(|g| g.releases).collect();
        Self {
            releases: dedup_releases(releases, maps),
        }
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Map each canonical track to the pool indices of releases holding it.
    pub fn track_index(&self) -> TrackIndex {
        let mut index = TrackIndex::default();
        for (i, r) in self.releases.iter().enumerate() {
            for track in &r.tracks {
                index.entry(track.clone()).or_default().push(i);
            }
        }
        index
    }

    /// Canonical track sets for the releases at the given indices.
    pub fn track_sets(&self, indices: &[usize]) -> Vec<&[String]> {
        indices
            .iter()
            .map(|&i| self.releases[i].tracks.as_slice())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Track;

    fn releases() -> Vec<Release> {
        vec![
            Release::with_titles("r0", &["a", "b", "c"]),
            Release::with_titles("r1", &["b", "c", "a"]),
            Release::with_titles("r2", &["d", "e", "f"]),
            Release::with_titles("r3", &["b", "c", "d"]),
        ]
    }

    #[test]
    fn test_dedup_release_pairs() {
        let r = releases();
        let maps = TitleMaps::default();
        let cases: Vec<(Vec<usize>, usize)> = vec![
            (vec![0, 0], 1),
            (vec![0, 1], 1),
            (vec![0, 2], 2),
            (vec![0, 3], 2),
            (vec![1, 2], 2),
            (vec![1, 3], 2),
            (vec![2, 3], 2),
            (vec![0, 1, 2], 2),
            (vec![0, 1, 3], 2),
            (vec![0, 2, 3], 3),
            (vec![0, 1, 2, 3], 3),
        ];
        for (picks, want) in cases {
            let input: Vec<Release> = picks.iter().map(|&i| r[i].clone()).collect();
            let result = dedup_releases(input, &maps);
            assert_eq!(result.len(), want, "picks {:?}", picks);
        }
    }

    #[test]
    fn test_dedup_keeps_first_encountered() {
        let r = releases();
        let result = dedup_releases(vec![r[1].clone(), r[0].clone()], &TitleMaps::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].release.title, "r1");
        assert_eq!(result[0].tracks, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_canonical_tracks_apply_maps() {
        let mut maps = TitleMaps::default();
        maps.substitution.insert("Yesterday".into(), "Yesterday!".into());
        maps.substitution.insert("Yesterday!".into(), "Yesterday!".into());
        maps.ignore.insert("Creep (Live)".into());

        let mut release = Release::with_titles("r", &["Yesterday", "Creep (Live)", "Yesterday!", "Airbag"]);
        release.media[0].tracks.push(Track {
            title: "Airbag (Video)".into(),
            is_video: true,
            ..Track::default()
        });

        assert_eq!(canonical_tracks(&release, &maps), vec!["Airbag", "Yesterday!"]);
    }

    #[test]
    fn test_ignored_representative_excludes_whole_class() {
        let mut maps = TitleMaps::default();
        maps.substitution.insert("Dont Stop".into(), "Don't Stop".into());
        maps.substitution.insert("Don't Stop".into(), "Don't Stop".into());
        maps.ignore.insert("Don't Stop".into());

        let release = Release::with_titles("r", &["Dont Stop", "Go"]);
        assert_eq!(canonical_tracks(&release, &maps), vec!["Go"]);
    }

    #[test]
    fn test_empty_releases_leave_pool() {
        let mut maps = TitleMaps::default();
        maps.ignore.insert("a".into());
        let result = dedup_releases(vec![Release::with_titles("only a", &["a"])], &maps);
        assert!(result.is_empty());
    }

    #[test]
    fn test_filter_by_secondary_type() {
        let groups = vec![
            ReleaseGroup {
                title: "Studio".into(),
                ..ReleaseGroup::default()
            },
            ReleaseGroup {
                title: "Concert".into(),
                secondary_types: vec!["Live".into()],
                ..ReleaseGroup::default()
            },
            ReleaseGroup {
                title: "Remixes".into(),
                secondary_types: vec!["Remix".into(), "Compilation".into()],
                ..ReleaseGroup::default()
            },
        ];
        let kept = filter_by_secondary_type(groups, &["live".to_string(), "remix".to_string()]);
        let titles: Vec<&str> = kept.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Studio"]);
    }

    #[test]
    fn test_track_index() {
        let pool = ReleasePool::build(
            vec![ReleaseGroup {
                releases: releases(),
                ..ReleaseGroup::default()
            }],
            &TitleMaps::default(),
        );
        assert_eq!(pool.len(), 3);
        let index = pool.track_index();
        assert_eq!(index["a"], vec![0]);
        assert_eq!(index["b"], vec![0, 2]);
        assert_eq!(index["d"], vec![1, 2]);
        assert_eq!(index.len(), 6);
    }

    #[test]
    fn test_distinct_titles_skip_video() {
        let mut release = Release::with_titles("r", &["a", "b"]);
        release.media[0].tracks.push(Track {
            title: "clip".into(),
            is_video: true,
            ..Track::default()
        });
        let groups = vec![ReleaseGroup {
            releases: vec![release],
            ..ReleaseGroup::default()
        }];
        let titles: Vec<String> = distinct_titles(&groups).into_iter().collect();
        assert_eq!(titles, vec!["a", "b"]);
    }
}
