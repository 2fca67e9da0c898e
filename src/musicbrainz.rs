//! MusicBrainz web-service catalog source.
//!
//! Resolves an artist and browses every release credited to it, with media
//! and recordings, then regroups releases under their release groups.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::models::{Mbid, Medium, Release, ReleaseGroup, Track};

const BASE_URL: &str = "https://musicbrainz.org/ws/2";
const USER_AGENT: &str = concat!("release-cover/", env!("CARGO_PKG_VERSION"), " ( https://musicbrainz.org )");
const RATE_LIMIT: Duration = Duration::from_secs(1);
const PAGE_SIZE: usize = 100;
const BODY_LIMIT: u64 = 10_000_000;

/// Where release groups come from.
pub trait CatalogSource {
    /// Artist id for an MBID or a free-text search query.
    fn resolve_artist(&self, query: &str) -> Result<Mbid>;

    /// Every release group of the artist, each carrying its releases.
    fn release_groups(&self, artist: &Mbid, official_only: bool) -> Result<Vec<ReleaseGroup>>;
}

pub struct MusicBrainzClient {
    base_url: String,
    last_request: Mutex<Instant>,
    agent: ureq::Agent,
}

impl MusicBrainzClient {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder().user_agent(USER_AGENT).build();
        Self {
            base_url: BASE_URL.to_string(),
            last_request: Mutex::new(Instant::now() - RATE_LIMIT),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn wait_rate_limit(&self) {
        let mut last = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
        let elapsed = last.elapsed();
        if elapsed < RATE_LIMIT {
            std::thread::sleep(RATE_LIMIT - elapsed);
        }
        *last = Instant::now();
    }

    /// Rate-limited GET returning the body; non-2xx statuses become errors.
    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        self.wait_rate_limit();

        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.agent.get(&url).query("fmt", "json");
        for (key, value) in params {
            request = request.query(*key, *value);
        }
        log::debug!("musicbrainz GET {} {:?}", url, params);

        let resp = match request.config().http_status_as_error(false).build().call() {
            Ok(resp) => resp,
            Err(err) => bail!("musicbrainz request failed (transport) url={url}: {err}"),
        };
        let code = resp.status();
        let body = resp
            .into_body()
            .with_config()
            .limit(BODY_LIMIT)
            .read_to_string()
            .context("musicbrainz response read failed")?;
        if code.as_u16() >= 400 {
            let snippet: String = body.trim().chars().take(300).collect();
            bail!("musicbrainz request failed (status {code}) url={url}: {snippet}");
        }
        Ok(body)
    }
}

impl Default for MusicBrainzClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogSource for MusicBrainzClient {
    fn resolve_artist(&self, query: &str) -> Result<Mbid> {
        if Mbid::is_valid(query) {
            return Ok(Mbid(query.to_string()));
        }
        let body = self.get("artist", &[("query", query), ("limit", "1")])?;
        let parsed: ArtistSearchResponse =
            serde_json::from_str(&body).context("musicbrainz artist search parse failed")?;
        match parsed.artists.into_iter().next() {
            Some(artist) => {
                log::debug!("artist '{}' resolved to {} ({})", query, artist.name, artist.id);
                Ok(Mbid(artist.id))
            }
            None => bail!("not an MBID and nothing returned from search: {query}"),
        }
    }

    fn release_groups(&self, artist: &Mbid, official_only: bool) -> Result<Vec<ReleaseGroup>> {
        let limit = PAGE_SIZE.to_string();
        let mut releases: Vec<ReleaseResult> = Vec::new();
        loop {
            let offset = releases.len().to_string();
            let mut params = vec![
                ("artist", artist.as_str()),
                ("inc", "release-groups+media+recordings"),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ];
            if official_only {
                params.push(("status", "official"));
            }
            let body = self.get("release", &params)?;
            let page: ReleaseBrowseResponse =
                serde_json::from_str(&body).context("musicbrainz release browse parse failed")?;

            let received = page.releases.len();
            releases.extend(page.releases);
            log::debug!("fetched {}/{} releases", releases.len(), page.release_count);
            if received == 0 || releases.len() >= page.release_count {
                break;
            }
        }
        Ok(group_releases(releases))
    }
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<ArtistResult>,
}

#[derive(Debug, Deserialize)]
struct ArtistResult {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseBrowseResponse {
    #[serde(rename = "release-count", default)]
    release_count: usize,
    #[serde(default)]
    releases: Vec<ReleaseResult>,
}

#[derive(Debug, Deserialize)]
struct ReleaseResult {
    id: String,
    title: String,
    status: Option<String>,
    #[serde(rename = "release-group")]
    release_group: Option<ReleaseGroupResult>,
    #[serde(default)]
    media: Vec<MediumResult>,
}

#[derive(Debug, Deserialize)]
struct ReleaseGroupResult {
    id: String,
    title: String,
    #[serde(rename = "primary-type")]
    primary_type: Option<String>,
    #[serde(rename = "secondary-types", default)]
    secondary_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MediumResult {
    format: Option<String>,
    #[serde(default)]
    tracks: Vec<TrackResult>,
}

#[derive(Debug, Deserialize)]
struct TrackResult {
    title: String,
    position: Option<u32>,
    /// Milliseconds.
    length: Option<u64>,
    recording: Option<RecordingResult>,
}

#[derive(Debug, Deserialize)]
struct RecordingResult {
    #[serde(default)]
    video: bool,
}

impl From<TrackResult> for Track {
    fn from(t: TrackResult) -> Self {
        Track {
            title: t.title,
            position: t.position,
            length: t.length.map(Duration::from_millis),
            is_video: t.recording.map_or(false, |r| r.video),
        }
    }
}

impl From<MediumResult> for Medium {
    fn from(m: MediumResult) -> Self {
        Medium {
            format: m.format,
            tracks: m.tracks.into_iter().map(Track::from).collect(),
        }
    }
}

/// Regroup browsed releases under their release groups, keeping first-seen
/// order of groups and of releases within each group.
fn group_releases(releases: Vec<ReleaseResult>) -> Vec<ReleaseGroup> {
    let mut position: FxHashMap<String, usize> = FxHashMap::default();
    let mut groups: Vec<ReleaseGroup> = Vec::new();

    for r in releases {
        let rg = r.release_group.unwrap_or_else(|| ReleaseGroupResult {
            id: String::new(),
            title: r.title.clone(),
            primary_type: None,
            secondary_types: Vec::new(),
        });
        let release = Release {
            id: Mbid(r.id),
            title: r.title,
            status: r.status,
            media: r.media.into_iter().map(Medium::from).collect(),
        };
        let slot = *position.entry(rg.id.clone()).or_insert_with(|| {
            groups.push(ReleaseGroup {
                id: Mbid(rg.id),
                title: rg.title,
                primary_type: rg.primary_type,
                secondary_types: rg.secondary_types,
                releases: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].releases.push(release);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "release-count": 3,
        "release-offset": 0,
        "releases": [
            {
                "id": "11111111-1111-1111-1111-111111111111",
                "title": "Pablo Honey",
                "status": "Official",
                "release-group": {
                    "id": "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa",
                    "title": "Pablo Honey",
                    "primary-type": "Album",
                    "secondary-types": []
                },
                "media": [{
                    "format": "CD",
                    "tracks": [
                        {"title": "You", "position": 1, "length": 208000, "recording": {"video": false}},
                        {"title": "Creep", "position": 2, "length": 238000, "recording": {"video": false}}
                    ]
                }]
            },
            {
                "id": "22222222-2222-2222-2222-222222222222",
                "title": "Creep",
                "status": "Official",
                "release-group": {
                    "id": "bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb",
                    "title": "Creep",
                    "primary-type": "Single",
                    "secondary-types": ["Live"]
                },
                "media": [{
                    "format": "Digital Media",
                    "tracks": [
                        {"title": "Creep (Live)", "position": 1, "length": null, "recording": {"video": true}}
                    ]
                }]
            },
            {
                "id": "33333333-3333-3333-3333-333333333333",
                "title": "Pablo Honey (Collector's Edition)",
                "release-group": {
                    "id": "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa",
                    "title": "Pablo Honey",
                    "primary-type": "Album"
                },
                "media": []
            }
        ]
    }"#;

    #[test]
    fn test_parse_release_page() {
        let page: ReleaseBrowseResponse = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.release_count, 3);
        assert_eq!(page.releases.len(), 3);
        assert!(page.releases[2].status.is_none());
    }

    #[test]
    fn test_group_releases() {
        let page: ReleaseBrowseResponse = serde_json::from_str(PAGE).unwrap();
        let groups = group_releases(page.releases);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Pablo Honey");
        assert_eq!(groups[0].releases.len(), 2);
        assert_eq!(groups[0].releases[1].title, "Pablo Honey (Collector's Edition)");
        assert_eq!(groups[1].secondary_types, vec!["Live"]);

        let creep = &groups[0].releases[0].media[0].tracks[1];
        assert_eq!(creep.title, "Creep");
        assert_eq!(creep.position, Some(2));
        assert_eq!(creep.length, Some(Duration::from_secs(238)));

        let live = &groups[1].releases[0].media[0].tracks[0];
        assert!(live.is_video);
        assert_eq!(live.length, None);
    }

    #[test]
    fn test_parse_artist_search() {
        let body = r#"{"created": "2024-01-01T00:00:00Z", "count": 1, "offset": 0,
            "artists": [{"id": "a74b1b7f-71a5-4011-9441-d0b5e4122711", "name": "Radiohead", "score": 100}]}"#;
        let parsed: ArtistSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.artists[0].name, "Radiohead");

        let empty: ArtistSearchResponse = serde_json::from_str(r#"{"artists": []}"#).unwrap();
        assert!(empty.artists.is_empty());
    }

    #[test]
    fn test_mbid_query_skips_search() {
        let client = MusicBrainzClient::new();
        let id = client
            .resolve_artist("a74b1b7f-71a5-4011-9441-d0b5e4122711")
            .unwrap();
        assert_eq!(id.as_str(), "a74b1b7f-71a5-4011-9441-d0b5e4122711");
    }
}
