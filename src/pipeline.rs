//! The `setcover` run: catalog → filter → resolve → pool → solve → reports.

use anyhow::{Context, Result};
use std::thread;
use std::time::{Duration, Instant};

use crate::library::LibraryProvider;
use crate::models::{Mbid, RunStats};
use crate::musicbrainz::CatalogSource;
use crate::normalize::{distinct_titles, filter_by_secondary_type, ReleasePool};
use crate::progress::{create_spinner, finish_spinner, format_duration};
use crate::prompt::Confirm;
use crate::report::{build_reports, CoverReport};
use crate::resolver::TitleResolver;
use crate::solver::{CancelToken, CoverSolver};

/// Options of a `setcover` run.
#[derive(Debug, Clone, Default)]
pub struct CoverConfig {
    pub artist: String,
    /// Secondary release-group types to discard (case-insensitive).
    pub discard_secondary: Vec<String>,
    pub discard_alternates: bool,
    pub official_only: bool,
    /// Ignore titles already in the owned library.
    pub remainder: bool,
    pub timeout: Option<Duration>,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct CoverOutcome {
    pub artist: Mbid,
    pub reports: Vec<CoverReport>,
    pub stats: RunStats,
}

pub fn run_setcover(
    config: &CoverConfig,
    catalog: &dyn CatalogSource,
    library: &dyn LibraryProvider,
    confirm: &dyn Confirm,
) -> Result<CoverOutcome> {
    let start = Instant::now();
    let mut stats = RunStats::default();
    log::debug!("set cover configuration: {:?}", config);

    let artist = catalog
        .resolve_artist(&config.artist)
        .with_context(|| format!("Artist ID could not be retrieved for '{}'", config.artist))?;

    let spinner = create_spinner("Retrieving music...");
    let groups = catalog
        .release_groups(&artist, config.official_only)
        .context("Failed to retrieve releases")?;
    stats.release_groups = groups.len();
    stats.releases = groups.iter().map(|g| g.releases.len()).sum();
    finish_spinner(
        &spinner,
        "Retrieved",
        &format!("{} releases in {} groups", stats.releases, stats.release_groups),
    );

    let groups = filter_by_secondary_type(groups, &config.discard_secondary);
    stats.release_groups_kept = groups.len();
    stats.log_phase("retrieval");

    let owned: Vec<String> = if config.remainder {
        let listing = library.owned_tracks(&artist);
        if let Some(err) = &listing.error {
            log::warn!("library listing incomplete: {}", err);
        }
        listing.tracks.into_iter().map(|t| t.title).collect()
    } else {
        Vec::new()
    };
    stats.owned_titles = owned.len();

    let titles = distinct_titles(&groups);
    let mut resolver = TitleResolver::new(confirm, config.discard_alternates);
    let maps = resolver.resolve(&titles, &owned);
    let resolution = resolver.stats();
    stats.distinct_titles = titles.len();
    stats.alternate_titles = resolution.alternates;
    stats.prompted_alternates = resolution.prompted_alternates;
    stats.prompted_merges = resolution.prompted_merges;
    stats.equivalence_classes = resolution.classes;
    stats.ignored_titles = maps.ignore.len();
    stats.log_phase("resolution");

    let pool = ReleasePool::build(groups, &maps);
    let index = pool.track_index();
    stats.pool_size = pool.len();
    stats.canonical_tracks = index.len();
    stats.log_phase("normalization");

    let cancel = CancelToken::new();
    if let Some(timeout) = config.timeout {
        let watchdog = cancel.clone();
        thread::spawn(move || {
            thread::sleep(timeout);
            watchdog.cancel();
        });
    }

    let spinner = create_spinner("Calculating set covers...");
    let search = CoverSolver::with_cancel(cancel).solve(&index);
    stats.covers = search.covers.len();
    stats.minimum_size = search.minimum.unwrap_or(0);
    stats.search_complete = search.complete;
    finish_spinner(
        &spinner,
        "Solved",
        &format!("{} minimum covers of size {}", stats.covers, stats.minimum_size),
    );
    if !search.complete {
        log::warn!(
            "search cancelled after {}; covers may not be minimum",
            format_duration(start.elapsed())
        );
    }

    let reports = build_reports(&search.covers, &pool);
    for report in &reports {
        log::debug!("set cover result {}: {:?}", report.index, report.releases);
    }

    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    stats.log_phase("search");

    Ok(CoverOutcome {
        artist,
        reports,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{LibraryError, Listing};
    use crate::models::{OwnedTrack, Release, ReleaseGroup};
    use crate::prompt::{AcceptDefaults, Scripted};
    use anyhow::bail;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    struct FakeCatalog {
        groups: Vec<ReleaseGroup>,
    }

    impl CatalogSource for FakeCatalog {
        fn resolve_artist(&self, query: &str) -> Result<Mbid> {
            if query == "nobody" {
                bail!("nothing returned from search");
            }
            Ok(Mbid("a74b1b7f-71a5-4011-9441-d0b5e4122711".to_string()))
        }

        fn release_groups(&self, _artist: &Mbid, _official_only: bool) -> Result<Vec<ReleaseGroup>> {
            Ok(self.groups.clone())
        }
    }

    struct FakeLibrary(Vec<&'static str>);

    impl LibraryProvider for FakeLibrary {
        fn owned_tracks(&self, _artist: &Mbid) -> Listing {
            Listing {
                tracks: self
                    .0
                    .iter()
                    .map(|t| OwnedTrack {
                        title: t.to_string(),
                        ..OwnedTrack::default()
                    })
                    .collect(),
                error: Some(LibraryError::Parse(vec!["bad".to_string()])),
            }
        }
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog {
            groups: vec![
                ReleaseGroup {
                    title: "Album".into(),
                    releases: vec![
                        Release::with_titles("Album", &["One", "Two", "Three"]),
                        Release::with_titles("Album (Reissue)", &["Three", "Two", "One"]),
                    ],
                    ..ReleaseGroup::default()
                },
                ReleaseGroup {
                    title: "Single".into(),
                    releases: vec![Release::with_titles("Single", &["Four", "One (Live)"])],
                    ..ReleaseGroup::default()
                },
                ReleaseGroup {
                    title: "Live at Home".into(),
                    secondary_types: vec!["Live".into()],
                    releases: vec![Release::with_titles("Live at Home", &["One", "Two", "Three", "Four"])],
                    ..ReleaseGroup::default()
                },
            ],
        }
    }

    fn config() -> CoverConfig {
        CoverConfig {
            artist: "Someone".into(),
            discard_secondary: vec!["live".into()],
            ..CoverConfig::default()
        }
    }

    #[test]
    fn test_run_covers_filtered_catalog() {
        let outcome = run_setcover(&config(), &catalog(), &FakeLibrary(vec![]), &AcceptDefaults).unwrap();
        assert_eq!(outcome.stats.release_groups, 3);
        assert_eq!(outcome.stats.release_groups_kept, 2);
        assert_eq!(outcome.stats.pool_size, 2);
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].size, 2);
        assert!(outcome.stats.search_complete);
    }

    #[test]
    fn test_run_discarding_alternates() {
        let mut config = config();
        config.discard_alternates = true;
        let outcome = run_setcover(&config, &catalog(), &FakeLibrary(vec![]), &AcceptDefaults).unwrap();
        assert_eq!(outcome.stats.alternate_titles, 1);
        let single = outcome.reports[0]
            .releases
            .iter()
            .find(|r| r.title == "Single")
            .unwrap();
        assert_eq!(single.tracks, 1);
    }

    #[test]
    fn test_run_remainder_ignores_owned_titles() {
        let mut config = config();
        config.remainder = true;
        config.discard_alternates = true;
        let library = FakeLibrary(vec!["One", "Two", "Three"]);
        let outcome = run_setcover(&config, &catalog(), &library, &Scripted::default()).unwrap();
        assert_eq!(outcome.stats.owned_titles, 3);
        assert_eq!(outcome.reports.len(), 1);
        let titles: Vec<&str> = outcome.reports[0].releases.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Single"]);
    }

    /// Vertex cover of a random graph: each release is a vertex holding the
    /// tracks of its edges. Far too many minimum covers to enumerate quickly.
    fn hard_catalog(releases: usize, tracks: usize) -> FakeCatalog {
        let mut rng = StdRng::seed_from_u64(7);
        let mut titles = BTreeSet::new();
        while titles.len() < tracks {
            let title: String = (0..12).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
            titles.insert(title);
        }
        let mut holdings: Vec<Vec<String>> = vec![Vec::new(); releases];
        for title in titles {
            let a = rng.gen_range(0..releases);
            let b = (a + rng.gen_range(1..releases)) % releases;
            holdings[a].push(title.clone());
            holdings[b].push(title);
        }
        FakeCatalog {
            groups: vec![ReleaseGroup {
                title: "Everything".into(),
                releases: holdings
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Release::with_titles(&format!("Release {}", i), t.as_slice()))
                    .collect(),
                ..ReleaseGroup::default()
            }],
        }
    }

    #[test]
    fn test_timeout_cancels_search() {
        let mut config = config();
        config.timeout = Some(Duration::from_millis(50));
        let start = Instant::now();
        let outcome =
            run_setcover(&config, &hard_catalog(80, 300), &FakeLibrary(vec![]), &AcceptDefaults).unwrap();

        assert!(!outcome.stats.search_complete);
        assert!(start.elapsed() < Duration::from_secs(30));
        for report in &outcome.reports {
            assert_eq!(report.size, outcome.stats.minimum_size);
        }
    }

    #[test]
    fn test_unresolved_artist_is_fatal() {
        let mut config = config();
        config.artist = "nobody".into();
        let result = run_setcover(&config, &catalog(), &FakeLibrary(vec![]), &AcceptDefaults);
        assert!(result.is_err());
    }
}
