//! Owned-library provider backed by the `beet` command line.
//!
//! Used with `--remainder`: titles already in the collector's library are
//! ignored so covers are computed over what is still missing.

use serde::Deserialize;
use std::process::Command;
use std::time::Duration;

use crate::models::{Mbid, OwnedTrack};

/// One JSON object per track, filled in by beets' template engine.
const TRACK_FORMAT: &str =
    r#"{"id":"$mb_releasetrackid","title":"$title","length_str":"$length","position_str":"$track"}"#;

#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    #[error("beet executable not found")]
    NotFound,
    #[error("Could not run `{0}`:\n\n{1}")]
    Io(String, std::io::Error),
    #[error("Command `{0}` did not exit cleanly: {1}")]
    Command(String, String),
    #[error("{} malformed line(s) in library listing:\n{}", .0.len(), .0.join("\n"))]
    Parse(Vec<String>),
}

/// Tracks read from the library, plus whatever went wrong reading them.
/// A listing can carry both: malformed lines are skipped, the rest kept.
#[derive(Debug, Default)]
pub struct Listing {
    pub tracks: Vec<OwnedTrack>,
    pub error: Option<LibraryError>,
}

pub trait LibraryProvider {
    fn owned_tracks(&self, artist: &Mbid) -> Listing;
}

#[derive(Debug, Clone)]
pub struct BeetsLibrary {
    program: String,
}

impl BeetsLibrary {
    pub fn new() -> Self {
        Self {
            program: "beet".to_string(),
        }
    }
}

impl Default for BeetsLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryProvider for BeetsLibrary {
    fn owned_tracks(&self, artist: &Mbid) -> Listing {
        let query = format!("mb_artistids:{}", artist);
        let args = ["ls", "-f", TRACK_FORMAT, query.as_str()];
        let command_line = format!("{} {}", self.program, args.join(" "));
        log::debug!("listing library: {}", command_line);

        let output = match Command::new(&self.program).args(args).output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Listing {
                    tracks: Vec::new(),
                    error: Some(LibraryError::NotFound),
                }
            }
            Err(e) => {
                return Listing {
                    tracks: Vec::new(),
                    error: Some(LibraryError::Io(command_line, e)),
                }
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Listing {
                tracks: Vec::new(),
                error: Some(LibraryError::Command(command_line, stderr)),
            };
        }

        parse_listing(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Debug, Deserialize)]
struct ListingLine {
    #[serde(default)]
    id: String,
    title: String,
    #[serde(default)]
    length_str: String,
    #[serde(default)]
    position_str: String,
}

/// Parse `beet ls` output, one JSON object per line (optionally wrapped in
/// single quotes). Bad lines are collected into a single parse error.
pub fn parse_listing(output: &str) -> Listing {
    let mut tracks = Vec::new();
    let mut problems = Vec::new();

    for line in output.lines() {
        let line = line.trim().trim_matches('\'');
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ListingLine>(line) {
            Ok(parsed) => tracks.push(OwnedTrack {
                id: parsed.id,
                title: parsed.title,
                position: parse_position(&parsed.position_str),
                length: parse_length(&parsed.length_str),
            }),
            Err(e) => problems.push(format!("problem parsing line \"{}\": {}", line, e)),
        }
    }

    Listing {
        tracks,
        error: (!problems.is_empty()).then_some(LibraryError::Parse(problems)),
    }
}

/// `m:ss` or `h:mm:ss` track length.
pub fn parse_length(s: &str) -> Option<Duration> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let mut secs: u64 = 0;
    for (i, part) in parts.iter().enumerate() {
        let value: u64 = part.parse().ok()?;
        if i > 0 && value >= 60 {
            return None;
        }
        secs = secs * 60 + value;
    }
    Some(Duration::from_secs(secs))
}

pub fn parse_position(s: &str) -> Option<u32> {
    s.trim().parse().ok()
}
