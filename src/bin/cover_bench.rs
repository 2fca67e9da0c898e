//! Time the cover solver on seeded random instances
//!
//! Usage: cover-bench [--seed N] [--workers N]

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use release_cover::progress::format_duration;
use release_cover::solver::{CoverSolver, TrackIndex};

#[derive(Parser)]
#[command(name = "cover-bench")]
#[command(about = "Time the minimum set cover search on random track/release instances")]
struct Args {
    #[arg(long, default_value = "1")]
    seed: u64,

    #[arg(long, default_value = "0")]
    workers: usize,
}

/// (tracks, releases) per instance.
const SIZES: &[(usize, usize)] = &[(25, 10), (50, 15), (100, 20)];

/// Each track lands on 1..=3 random releases.
fn random_index(rng: &mut StdRng, tracks: usize, releases: usize) -> TrackIndex {
    (0..tracks)
        .map(|t| {
            let holders = rng.gen_range(1..=3.min(releases));
            let mut held: Vec<usize> = (0..holders).map(|_| rng.gen_range(0..releases)).collect();
            held.sort_unstable();
            held.dedup();
            (format!("track {:03}", t), held)
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    println!("{:<10} {:<10} {:<8} {:<8} {}", "tracks", "releases", "minimum", "covers", "elapsed");
    for &(tracks, releases) in SIZES {
        let index = random_index(&mut rng, tracks, releases);
        let start = Instant::now();
        let search = CoverSolver::new().solve(&index);
        let minimum = search.minimum.map_or("-".to_string(), |m| m.to_string());
        println!(
            "{:<10} {:<10} {:<8} {:<8} {}",
            tracks,
            releases,
            minimum,
            search.covers.len(),
            format_duration(start.elapsed())
        );
    }

    Ok(())
}
