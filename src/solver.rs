//! Exact minimum set cover search.
//!
//! Enumerates every minimum-cardinality set of releases whose canonical
//! tracks cover the whole track universe. The search is a branch-and-bound
//! over the hitting-set dual:
//!
//! - branch on the rarest uncovered track, once per release holding it;
//! - taking a release marks all of its tracks covered;
//! - a branch with tracks left whose partial cover already reaches the best
//!   known size is abandoned.
//!
//! ## Concurrency
//!
//! Branches run on the rayon pool. Up to [`SPAWN_DEPTH`] levels each branch
//! is spawned as its own task; deeper levels recurse on the current worker.
//! The best known size sits behind a single `RwLock` and is the only shared
//! mutable state. Completed covers are sent over a channel that is drained
//! only after the scope has joined every branch.
//!
//! Branch state is a bit mask over a dense track array, so each branch copies
//! a handful of words instead of a map.

use crossbeam_channel::{unbounded, Sender};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Canonical track → indices of the releases containing it.
pub type TrackIndex = FxHashMap<String, Vec<usize>>;

/// Search levels that spawn a task per branch; deeper levels run inline.
pub const SPAWN_DEPTH: usize = 6;

// ============================================================================
// Cancellation
// ============================================================================

/// Shared flag checked at every branch entry.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Problem Encoding
// ============================================================================

/// Fixed-width set of uncovered track ids.
#[derive(Clone, Debug, PartialEq, Eq)]
struct TrackMask(Vec<u64>);

impl TrackMask {
    fn full(len: usize) -> Self {
        let mut words = vec![u64::MAX; len.div_ceil(64)];
        if len % 64 != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1u64 << (len % 64)) - 1;
            }
        }
        Self(words)
    }

    fn clear(&mut self, id: usize) {
        self.0[id / 64] &= !(1u64 << (id % 64));
    }

    fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(w * 64 + bit)
            })
        })
    }
}

/// Dense form of a track index.
#[derive(Debug)]
struct Problem {
    /// Per track id: releases holding it, sorted.
    covering: Vec<Vec<usize>>,
    /// Per release index: track ids it holds.
    holdings: Vec<Vec<usize>>,
}

impl Problem {
    fn from_index(index: &TrackIndex) -> Self {
        let mut names: Vec<&String> = index.keys().collect();
        names.sort();

        let covering: Vec<Vec<usize>> = names
            .iter()
            .map(|name| {
                let mut releases = index[*name].clone();
                releases.sort_unstable();
                releases.dedup();
                releases
            })
            .collect();

        let release_count = covering
            .iter()
            .flat_map(|c| c.iter())
            .max()
            .map_or(0, |&r| r + 1);
        let mut holdings = vec![Vec::new(); release_count];
        for (track, releases) in covering.iter().enumerate() {
            for &r in releases {
                holdings[r].push(track);
            }
        }

        Self { covering, holdings }
    }

    /// Uncovered track with the fewest covering releases (lowest id on ties).
    fn rarest(&self, mask: &TrackMask) -> Option<usize> {
        mask.ids().min_by_key(|&t| (self.covering[t].len(), t))
    }

    fn take(&self, mask: &TrackMask, partial: &[usize], release: usize) -> (TrackMask, Vec<usize>) {
        let mut next_mask = mask.clone();
        for &t in &self.holdings[release] {
            next_mask.clear(t);
        }
        let mut next_partial = Vec::with_capacity(partial.len() + 1);
        next_partial.extend_from_slice(partial);
        next_partial.push(release);
        (next_mask, next_partial)
    }
}

// ============================================================================
// Search
// ============================================================================

/// Result of a cover search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverSearch {
    /// Every minimum cover, each sorted, deduplicated by content, in lexical order.
    pub covers: Vec<Vec<usize>>,
    /// Size of the covers; `None` when no cover exists or none was found in time.
    pub minimum: Option<usize>,
    /// False when the search was cancelled before finishing.
    pub complete: bool,
}

enum Step {
    Covered,
    Prune,
    Branch(usize),
}

struct Search<'a> {
    problem: &'a Problem,
    best: RwLock<usize>,
    results: Sender<Vec<usize>>,
    cancel: &'a CancelToken,
}

impl<'a> Search<'a> {
    fn best(&self) -> usize {
        *self.best.read().unwrap_or_else(|e| e.into_inner())
    }

    fn step(&self, mask: &TrackMask, partial: &[usize]) -> Step {
        match self.problem.rarest(mask) {
            None => Step::Covered,
            Some(_) if partial.len() >= self.best() => Step::Prune,
            Some(track) => Step::Branch(track),
        }
    }

    fn complete(&self, partial: Vec<usize>) {
        let mut best = self.best.write().unwrap_or_else(|e| e.into_inner());
        if partial.len() <= *best {
            *best = partial.len();
            let _ = self.results.send(partial);
        }
    }

    fn explore<'s>(&'s self, scope: &rayon::Scope<'s>, mask: TrackMask, partial: Vec<usize>, depth: usize) {
        if self.cancel.is_cancelled() {
            return;
        }
        let track = match self.step(&mask, &partial) {
            Step::Covered => return self.complete(partial),
            Step::Prune => return,
            Step::Branch(track) => track,
        };
        for &release in &self.problem.covering[track] {
            let (next_mask, next_partial) = self.problem.take(&mask, &partial, release);
            if depth < SPAWN_DEPTH {
                scope.spawn(move |s| self.explore(s, next_mask, next_partial, depth + 1));
            } else {
                self.explore_inline(next_mask, next_partial);
            }
        }
    }

    fn explore_inline(&self, mask: TrackMask, partial: Vec<usize>) {
        if self.cancel.is_cancelled() {
            return;
        }
        let track = match self.step(&mask, &partial) {
            Step::Covered => return self.complete(partial),
            Step::Prune => return,
            Step::Branch(track) => track,
        };
        for &release in &self.problem.covering[track] {
            let (next_mask, next_partial) = self.problem.take(&mask, &partial, release);
            self.explore_inline(next_mask, next_partial);
        }
    }
}

/// Minimum cover solver with an optional cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CoverSolver {
    cancel: CancelToken,
}

impl CoverSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self { cancel }
    }

    pub fn solve(&self, index: &TrackIndex) -> CoverSearch {
        let problem = Problem::from_index(index);
        let (sender, receiver) = unbounded();
        let search = Search {
            problem: &problem,
            best: RwLock::new(usize::MAX),
            results: sender,
            cancel: &self.cancel,
        };

        let root = TrackMask::full(problem.covering.len());
        rayon::scope(|s| search.explore(s, root, Vec::new(), 0));
        drop(search);

        let candidates: Vec<Vec<usize>> = receiver.into_iter().collect();
        let minimum = candidates.iter().map(Vec::len).min();
        let covers: BTreeSet<Vec<usize>> = candidates
            .into_iter()
            .filter(|c| Some(c.len()) == minimum)
            .map(|mut c| {
                c.sort_unstable();
                c
            })
            .collect();

        CoverSearch {
            covers: covers.into_iter().collect(),
            minimum,
            complete: !self.cancel.is_cancelled(),
        }
    }
}

/// Every minimum cover of the index (uncancellable search).
pub fn minimum_covers(index: &TrackIndex) -> Vec<Vec<usize>> {
    CoverSolver::new().solve(index).covers
}

// ============================================================================
// TESTS
// ============================================================================
