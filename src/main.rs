use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use release_cover::docs::write_markdown_tree;
use release_cover::library::BeetsLibrary;
use release_cover::musicbrainz::MusicBrainzClient;
use release_cover::pipeline::{run_setcover, CoverConfig};
use release_cover::progress::{format_duration, set_log_only};
use release_cover::prompt::{AcceptDefaults, Confirm, TerminalPrompt};
use release_cover::report::{render_json, render_text};

#[derive(Parser)]
#[command(name = "release-cover")]
#[command(about = "Find the fewest releases that together hold every song by an artist")]
struct Args {
    /// Write debug logs to this file (default: warnings to stderr)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Hide spinners and print one line per phase
    #[arg(long, global = true)]
    log_only: bool,

    /// Worker threads for the cover search (0 = one per core)
    #[arg(long, default_value = "0", global = true)]
    workers: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute every minimum set cover of an artist's releases
    Setcover {
        /// Artist MBID or search query
        artist: String,

        /// Discard release groups with these secondary types (comma-separated, e.g. "live,remix")
        #[arg(long, value_delimiter = ',')]
        dsec: Vec<String>,

        /// Discard alternate tracks (acoustic, remix, live, ...)
        #[arg(long)]
        dalt: bool,

        /// Only official releases
        #[arg(long)]
        official: bool,

        /// Ignore tracks already in the beets library
        #[arg(short, long)]
        remainder: bool,

        /// Accept every default answer without prompting
        #[arg(short, long)]
        yes: bool,

        /// Stop searching after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Print covers as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate the Markdown documentation for every command
    #[command(hide = true)]
    Docgen {
        /// Output directory
        #[arg(default_value = "docs")]
        dir: PathBuf,
    },
}

fn init_logging(output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            WriteLogger::init(LevelFilter::Debug, Config::default(), file)
                .context("Failed to initialize logger")?;
        }
        None => {
            TermLogger::init(
                LevelFilter::Warn,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            )
            .context("Failed to initialize logger")?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.output.as_ref())?;
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    match args.command {
        Command::Setcover {
            artist,
            dsec,
            dalt,
            official,
            remainder,
            yes,
            timeout,
            json,
        } => {
            let config = CoverConfig {
                artist,
                discard_secondary: dsec.into_iter().map(|s| s.trim().to_string()).collect(),
                discard_alternates: dalt,
                official_only: official,
                remainder,
                timeout: timeout.map(Duration::from_secs),
            };

            let confirm: &dyn Confirm = if yes { &AcceptDefaults } else { &TerminalPrompt };
            let catalog = MusicBrainzClient::new();
            let library = BeetsLibrary::new();

            let outcome = run_setcover(&config, &catalog, &library, confirm)?;

            if json {
                println!("{}", render_json(&outcome.reports).context("Failed to serialize covers")?);
            } else {
                print!("{}", render_text(&outcome.reports));
                if outcome.reports.is_empty() {
                    println!("No set cover found.");
                }
            }

            if !outcome.stats.search_complete {
                eprintln!("Search timed out; covers shown are the best found, not proven minimum.");
            }
            log::debug!(
                "finished {} in {}",
                outcome.artist,
                format_duration(Duration::from_secs_f64(outcome.stats.elapsed_seconds))
            );
        }
        Command::Docgen { dir } => {
            let written = write_markdown_tree(&mut Args::command(), &dir)?;
            println!("Wrote {} pages to {:?}", written, dir);
        }
    }

    Ok(())
}
