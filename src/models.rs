//! Core data models for release cover computation.
//!
//! This module contains the catalog types handed over by the catalog source,
//! the owned-library track record, and the run statistics used for
//! instrumentation.

use serde::Serialize;
use std::time::Duration;

// ============================================================================
// Identifiers
// ============================================================================

/// MusicBrainz identifier (artist, release, release group or track).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Mbid(pub String);

impl Mbid {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the string has the canonical 8-4-4-4-12 hex layout.
    pub fn is_valid(s: &str) -> bool {
        let groups: Vec<&str> = s.split('-').collect();
        let lens = [8, 4, 4, 4, 12];
        groups.len() == lens.len()
            && groups
                .iter()
                .zip(lens)
                .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
    }
}

impl std::fmt::Display for Mbid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Catalog Models
// ============================================================================

/// A track as it appears on a medium.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Track {
    pub title: String,
    pub position: Option<u32>,
    pub length: Option<Duration>,
    /// Set when the underlying recording is a video.
    pub is_video: bool,
}

impl Track {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// One disc, side or digital medium of a release.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Medium {
    pub format: Option<String>,
    pub tracks: Vec<Track>,
}

/// A concrete edition (album, EP, single) with its media.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Release {
    pub id: Mbid,
    pub title: String,
    pub status: Option<String>,
    pub media: Vec<Medium>,
}

impl Release {
    /// Build a single-medium release from plain titles.
    pub fn with_titles<S: AsRef<str>>(title: &str, tracks: &[S]) -> Self {
        Self {
            title: title.to_string(),
            media: vec![Medium {
                format: None,
                tracks: tracks.iter().map(|t| Track::new(t.as_ref())).collect(),
            }],
            ..Self::default()
        }
    }

    /// All tracks across all media, in medium order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.media.iter().flat_map(|m| m.tracks.iter())
    }
}

/// Editions of the same work, grouped as the catalog groups them.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReleaseGroup {
    pub id: Mbid,
    pub title: String,
    pub primary_type: Option<String>,
    pub secondary_types: Vec<String>,
    pub releases: Vec<Release>,
}

// ============================================================================
// Library Models
// ============================================================================

/// A track already present in the collector's library.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OwnedTrack {
    pub id: String,
    pub title: String,
    pub position: Option<u32>,
    pub length: Option<Duration>,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run counters, logged as JSON at the end of each phase.
#[derive(Default, Debug, Clone, Serialize)]
pub struct RunStats {
    // Retrieval
    pub release_groups: usize,
    pub release_groups_kept: usize,
    pub releases: usize,
    pub owned_titles: usize,

    // Title resolution
    pub distinct_titles: usize,
    pub alternate_titles: usize,
    pub prompted_alternates: usize,
    pub prompted_merges: usize,
    pub equivalence_classes: usize,
    pub ignored_titles: usize,

    // Normalization
    pub pool_size: usize,
    pub canonical_tracks: usize,

    // Search
    pub covers: usize,
    pub minimum_size: usize,
    pub search_complete: bool,

    // Timing
    pub elapsed_seconds: f64,
}

impl RunStats {
    /// Log stats at debug level in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            log::debug!("[STATS:{}]\n{}", phase, json);
        }
    }
}
