use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use tracklist_resolve::catalog::SqliteCatalog;
use tracklist_resolve::config::{parse_seconds, Mode, ResolverConfig};
use tracklist_resolve::dedupe::dedupe_with_report;
use tracklist_resolve::logging::{init_logging, LoggingOptions};
use tracklist_resolve::models::{CandidateResult, MatchOutcome};
use tracklist_resolve::progress::{create_spinner, format_duration, set_log_only};
use tracklist_resolve::resolver::Resolver;
use tracklist_resolve::safety::validate_index_path;
use tracklist_resolve::shutdown::install_cancel_flag;
use tracklist_resolve::tracklist::load_tracklists;

#[derive(Parser)]
#[command(name = "tracklist-resolve")]
#[command(about = "Deduplicate scraped tracklists and resolve each track against a catalog")]
struct Args {
    /// Log-only mode: no progress bars, periodic progress lines instead
    #[arg(long, global = true)]
    log_only: bool,

    /// Debug-level events for every search
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a searchable catalog index from a JSON export
    Index {
        /// JSON array of {catalog_id, artist, title}
        export: PathBuf,

        /// Index to create (.sqlite3 or .db); replaced if it exists
        output: PathBuf,
    },

    /// Resolve tracklists against a catalog index
    Resolve {
        /// Catalog index built by `index`
        #[arg(long)]
        catalog: PathBuf,

        /// Tracklist files (`ARTIST - TITLE` lines, or .json)
        #[arg(required = true)]
        tracklists: Vec<PathBuf>,

        #[arg(long, value_enum, default_value = "fast")]
        mode: Mode,

        /// Override the mode's acceptance threshold (0.0 - 1.0)
        #[arg(long)]
        threshold: Option<f64>,

        /// Override the mode's delay between searches, in seconds
        #[arg(long)]
        delay: Option<f64>,

        /// Override the mode's maximum random extra delay, in seconds
        #[arg(long)]
        jitter: Option<f64>,

        /// Leading results of each search to score
        #[arg(long)]
        max_candidates: Option<usize>,

        /// Write outcomes here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write run statistics as JSON
        #[arg(long)]
        stats: Option<PathBuf>,
    },
}

struct ResolveArgs {
    catalog: PathBuf,
    tracklists: Vec<PathBuf>,
    config: ResolverConfig,
    output: Option<PathBuf>,
    stats: Option<PathBuf>,
}

fn build_config(
    mode: Mode,
    threshold: Option<f64>,
    delay: Option<f64>,
    jitter: Option<f64>,
    max_candidates: Option<usize>,
) -> Result<ResolverConfig> {
    let mut config = ResolverConfig::for_mode(mode);
    if let Some(threshold) = threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(delay) = delay {
        config = config.with_delay(parse_seconds("delay", delay)?);
    }
    if let Some(jitter) = jitter {
        config = config.with_jitter(parse_seconds("jitter", jitter)?);
    }
    if let Some(max_candidates) = max_candidates {
        config = config.with_max_candidates(max_candidates);
    }
    config.validate()?;
    Ok(config)
}

fn run_index(export: &Path, output: &Path) -> Result<()> {
    validate_index_path(output, &[export])?;
    let start = Instant::now();

    eprintln!("Reading catalog export: {:?}", export);
    let text = std::fs::read_to_string(export)
        .with_context(|| format!("Failed to read catalog export {:?}", export))?;
    let entries: Vec<CandidateResult> =
        serde_json::from_str(&text).context("Failed to parse catalog export")?;

    if output.exists() {
        std::fs::remove_file(output).context("Failed to remove existing index file")?;
    }

    eprintln!("Creating catalog index: {:?}", output);
    let mut catalog = SqliteCatalog::create(output)?;

    let spinner = create_spinner("Writing entries and building FTS index");
    let inserted = catalog.insert_entries(&entries)?;
    spinner.finish_with_message(format!("Indexed {} entries", inserted));

    let spinner = create_spinner("Optimizing index");
    catalog.optimize()?;
    spinner.finish_with_message("Index optimized");

    let skipped = entries.len().saturating_sub(inserted);
    if skipped > 0 {
        warn!(skipped, "index.duplicate_ids");
    }

    let file_size = std::fs::metadata(output)?.len();

    eprintln!("\n{:=<60}", "");
    eprintln!("Index complete!");
    eprintln!("  Entries: {}", inserted);
    eprintln!("  Duplicate ids skipped: {}", skipped);
    eprintln!("  Index size: {:.2} MB", file_size as f64 / 1_048_576.0);
    eprintln!("  Elapsed: {}", format_duration(start.elapsed()));
    eprintln!("{:=<60}", "");

    Ok(())
}

fn run_resolve(args: ResolveArgs) -> Result<()> {
    let parsed = load_tracklists(&args.tracklists)?;
    for invalid in &parsed.invalid {
        warn!(error = %invalid, "tracklist.invalid_record");
    }

    let entries_seen = parsed.entries_seen();
    let raw_count = parsed.records.len();
    let deduped = dedupe_with_report(parsed.records);
    info!(
        raw = raw_count,
        unique = deduped.tracks.len(),
        duplicates = deduped.discarded,
        invalid = parsed.invalid.len(),
        "tracklist.ready"
    );

    let catalog = SqliteCatalog::open(&args.catalog)?;
    let limiter = args.config.rate_limiter();
    let resolver = Resolver::new(catalog, &limiter, args.config);

    let config = resolver.config();
    info!(
        threshold = config.acceptance_threshold,
        delay_ms = limiter.min_interval().as_millis() as u64,
        jitter_ms = config.jitter.as_millis() as u64,
        max_candidates = config.max_candidates,
        "resolve.config"
    );

    let cancel = install_cancel_flag()?;

    let run = resolver.resolve_all(&deduped.tracks, &cancel);

    write_outcomes(&run.outcomes, args.output.as_deref())?;
    if let Some(path) = &args.stats {
        run.stats.write_to_file(path)?;
    }

    let stats = &run.stats;
    eprintln!("\n{:=<60}", "");
    if run.cancelled {
        eprintln!("Resolution cancelled after {} of {} tracks", stats.total_tracks, deduped.tracks.len());
    } else {
        eprintln!("Resolution complete!");
    }
    eprintln!("  Scraped entries: {}", entries_seen);
    eprintln!("  Unique tracks: {}", deduped.tracks.len());
    eprintln!("  Tracks matched: {}", stats.matched_summary());
    eprintln!(
        "    exact: {}, quoted: {}, title only: {}, artist only: {}",
        stats.matched_exact, stats.matched_quoted, stats.matched_title_only, stats.matched_artist_only
    );
    eprintln!("  Tracks not found: {}", stats.not_found);
    eprintln!(
        "  Searches: {} ({} failed, {} abandoned)",
        stats.search_calls, stats.search_failures, stats.strategies_abandoned
    );
    eprintln!("  Elapsed: {:.2}s", stats.elapsed_seconds);
    eprintln!("{:=<60}", "");

    for outcome in run.not_found() {
        eprintln!("  not found: {} - {}", outcome.track.artist(), outcome.track.title());
    }

    Ok(())
}

fn write_outcomes(outcomes: &[MatchOutcome], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file {:?}", path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, outcomes)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            serde_json::to_writer_pretty(&mut writer, outcomes)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    set_log_only(args.log_only);
    init_logging(LoggingOptions {
        verbose: args.verbose,
        log_only: args.log_only,
    })?;

    match args.command {
        Command::Index { export, output } => run_index(&export, &output),
        Command::Resolve {
            catalog,
            tracklists,
            mode,
            threshold,
            delay,
            jitter,
            max_candidates,
            output,
            stats,
        } => {
            let config = build_config(mode, threshold, delay, jitter, max_candidates)?;
            info!(?mode, "resolve.mode");
            run_resolve(ResolveArgs {
                catalog,
                tracklists,
                config,
                output,
                stats,
            })
        }
    }
}
