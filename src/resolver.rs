//! Title identity resolution.
//!
//! Decides which track titles count as "the same song" before the cover
//! problem is built. Produces a substitution map (title → canonical
//! representative) and an ignore set (titles excluded from covering).
//!
//! ## Algorithm
//!
//! 1. **Alternate classification**: titles with a qualifier clause are
//!    alternates when the clause holds a known version term; unrecognized
//!    clauses are confirmed through the injected [`Confirm`] capability.
//! 2. **Discard**: with `discard_alternates`, alternates go straight to the
//!    ignore set.
//! 3. **Clustering**: pairs with equal alternate status and similarity above
//!    [`MERGE_THRESHOLD`] are merge candidates; alternate pairs must also share
//!    a similar root ([`ROOT_THRESHOLD`]). Candidates whose cleaned forms differ
//!    are confirmed.
//! 4. **Canonicalization**: confirmed pairs are unioned; each class maps to its
//!    longest member (ties: lexical order). Ignoring one member ignores the class.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

use crate::prompt::Confirm;
use crate::titles::{classify_qualifier, clean_title, root_title, similarity, Qualifier};

/// Minimum similarity (exclusive) for two titles to be merge candidates.
pub const MERGE_THRESHOLD: f64 = 0.6;

/// Minimum root similarity (exclusive) for two alternates to be merge candidates.
pub const ROOT_THRESHOLD: f64 = 0.5;

// ============================================================================
// Output
// ============================================================================

/// Substitution and ignore tables produced by resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleMaps {
    pub substitution: FxHashMap<String, String>,
    pub ignore: FxHashSet<String>,
}

impl TitleMaps {
    /// Canonical identity of a title; titles outside any class stand for themselves.
    pub fn canonical<'a>(&'a self, title: &'a str) -> &'a str {
        self.substitution
            .get(title)
            .map(String::as_str)
            .unwrap_or(title)
    }

    /// True when the title, or the representative of its class, is ignored.
    pub fn is_ignored(&self, title: &str) -> bool {
        self.ignore.contains(title) || self.ignore.contains(self.canonical(title))
    }
}

/// Counters gathered while resolving.
#[derive(Debug, Clone, Default)]
pub struct ResolutionStats {
    pub alternates: usize,
    pub prompted_alternates: usize,
    pub prompted_merges: usize,
    pub classes: usize,
}

// ============================================================================
// Disjoint Set
// ============================================================================

struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] { (ra, rb) } else { (rb, ra) };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}

// ============================================================================
// Resolver
// ============================================================================

pub struct TitleResolver<'a> {
    confirm: &'a dyn Confirm,
    discard_alternates: bool,
    alternate_answers: FxHashMap<String, bool>,
    stats: ResolutionStats,
}

impl<'a> TitleResolver<'a> {
    pub fn new(confirm: &'a dyn Confirm, discard_alternates: bool) -> Self {
        Self {
            confirm,
            discard_alternates,
            alternate_answers: FxHashMap::default(),
            stats: ResolutionStats::default(),
        }
    }

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    /// Whether a title denotes an alternate version. Unrecognized qualifiers
    /// are asked about once per title per run.
    pub fn is_alternate(&mut self, title: &str) -> bool {
        match classify_qualifier(title) {
            Qualifier::Plain | Qualifier::Structural => false,
            Qualifier::Alternate => true,
            Qualifier::Unknown => {
                if let Some(&answer) = self.alternate_answers.get(title) {
                    return answer;
                }
                self.stats.prompted_alternates += 1;
                let answer = self
                    .confirm
                    .confirm(&format!("Is this an alternate track: {}", title), true);
                self.alternate_answers.insert(title.to_string(), answer);
                answer
            }
        }
    }

    /// Build the substitution and ignore tables for a set of distinct titles.
    /// `owned` titles (already in the collector's library) start out ignored.
    pub fn resolve<S: AsRef<str>>(&mut self, titles: &BTreeSet<String>, owned: &[S]) -> TitleMaps {
        let mut ignore: FxHashSet<String> = owned.iter().map(|t| t.as_ref().to_string()).collect();

        let mut remaining: Vec<&str> = Vec::with_capacity(titles.len());
        let mut alternate: Vec<bool> = Vec::with_capacity(titles.len());
        for title in titles {
            let is_alt = self.is_alternate(title);
            if is_alt {
                self.stats.alternates += 1;
                if self.discard_alternates {
                    log::debug!("track marked as an alternate: {}", title);
                    ignore.insert(title.clone());
                    continue;
                }
            }
            remaining.push(title);
            alternate.push(is_alt);
        }

        let mut classes = DisjointSet::new(remaining.len());
        for (i, j) in candidate_pairs(&remaining, &alternate) {
            if classes.find(i) == classes.find(j) {
                continue;
            }
            let (a, b) = (remaining[i], remaining[j]);
            if clean_title(a) != clean_title(b) {
                self.stats.prompted_merges += 1;
                let question = format!("Are tracks \"{}\" and \"{}\" equal?", a, b);
                if !self.confirm.confirm(&question, true) {
                    continue;
                }
            }
            classes.union(i, j);
        }

        let mut members: FxHashMap<usize, Vec<&str>> = FxHashMap::default();
        for (i, title) in remaining.iter().enumerate() {
            members.entry(classes.find(i)).or_default().push(*title);
        }

        let mut substitution = FxHashMap::default();
        let mut groups: Vec<Vec<&str>> = members.into_values().filter(|m| m.len() > 1).collect();
        groups.sort();
        for mut group in groups {
            group.sort_by(|a, b| {
                b.chars()
                    .count()
                    .cmp(&a.chars().count())
                    .then_with(|| a.cmp(b))
            });
            let representative = group[0];
            log::debug!("titles determined to be equivalent: {:?} -> {}", group, representative);
            if group.iter().any(|t| ignore.contains(*t)) {
                ignore.insert(representative.to_string());
            }
            for title in &group {
                substitution.insert(title.to_string(), representative.to_string());
            }
            self.stats.classes += 1;
        }

        TitleMaps {
            substitution,
            ignore,
        }
    }
}

/// Index pairs (i < j) that pass the similarity checks, in lexical pair order.
fn candidate_pairs(titles: &[&str], alternate: &[bool]) -> Vec<(usize, usize)> {
    let roots: Vec<String> = titles
        .iter()
        .zip(alternate)
        .map(|(t, &alt)| if alt { root_title(t) } else { String::new() })
        .collect();

    (0..titles.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let roots = &roots;
            (i + 1..titles.len())
                .filter(move |&j| {
                    if alternate[i] != alternate[j] {
                        return false;
                    }
                    if similarity(titles[i], titles[j]) <= MERGE_THRESHOLD {
                        return false;
                    }
                    !(alternate[i] && similarity(&roots[i], &roots[j]) <= ROOT_THRESHOLD)
                })
                .map(move |j| (i, j))
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
