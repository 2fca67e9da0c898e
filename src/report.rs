//! Rendering of minimum covers for the terminal or as JSON.

use serde::Serialize;
use std::fmt::Write;

use crate::contribution::{contributions, rank, Contribution};
use crate::normalize::ReleasePool;

const TABLE_HEADER: &str = "Contribution | Release(s)";

/// One minimum cover with its members ranked by contribution.
#[derive(Debug, Clone, Serialize)]
pub struct CoverReport {
    pub index: usize,
    pub size: usize,
    pub releases: Vec<Contribution>,
}

/// Build ranked reports for every cover, in cover order.
pub fn build_reports(covers: &[Vec<usize>], pool: &ReleasePool) -> Vec<CoverReport> {
    covers
        .iter()
        .enumerate()
        .map(|(index, cover)| {
            let mut releases = contributions(cover, pool);
            rank(&mut releases);
            CoverReport {
                index,
                size: cover.len(),
                releases,
            }
        })
        .collect()
}

/// Table for one cover. Rows group releases with equal contribution.
pub fn render_cover(report: &CoverReport) -> String {
    let rule = "\u{2014}".repeat(TABLE_HEADER.len());
    let mut out = String::new();

    let _ = writeln!(out, "\n> Set Cover {}, {} releases", report.index, report.size);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{}", TABLE_HEADER);
    let _ = writeln!(out, "{}", rule);

    for row in report.releases.chunk_by(|a, b| a.contribution == b.contribution) {
        let titles: Vec<&str> = row.iter().map(|r| r.title.as_str()).collect();
        let _ = writeln!(out, "{:<14} {}", row[0].contribution, titles.join("; "));
    }

    let all: Vec<&str> = report.releases.iter().map(|r| r.title.as_str()).collect();
    let _ = writeln!(out, "\nRelease Titles:");
    let _ = writeln!(out, "{}", all.join("; "));
    out
}

pub fn render_text(reports: &[CoverReport]) -> String {
    reports.iter().map(render_cover).collect()
}

pub fn render_json(reports: &[CoverReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}
