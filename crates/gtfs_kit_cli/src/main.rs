use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser as ClapParser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, Level};

use gtfs_kit_core::{BoundingBox, Feed, Parser, ParserConfig, ProgressHandler, Writer};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, ClapParser)]
#[command(name = "gtfs-kit")]
#[command(about = "Read, check and rewrite GTFS feeds")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Reject values that are tolerated by default (bad URLs, `H:MM` times, invalid calendar dates, ...)
    #[arg(short = 's', long = "strict", global = true)]
    strict: bool,

    /// Keep non-standard columns of agency, stops, routes and trips
    #[arg(short = 'a', long = "additional-fields", global = true)]
    additional_fields: bool,

    /// Log per-table progress
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Hide the progress bar
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a feed and print a JSON summary of its contents
    Inspect {
        /// Feed directory or zip archive
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        #[arg(short = 'p', long = "pretty")]
        pretty: bool,
    },
    /// Load a feed and write it back out as normalized GTFS
    Rewrite {
        /// Feed directory or zip archive
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Output directory, created if missing
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = ParserConfig {
        strict: args.strict,
        parse_additional_fields: args.additional_fields,
    };

    match &args.command {
        Command::Inspect { input, pretty } => {
            let feed = load(input, config, args.quiet)?;
            let summary = FeedSummary::new(input, &feed);
            let json = if *pretty {
                serde_json::to_string_pretty(&summary)?
            } else {
                serde_json::to_string(&summary)?
            };
            println!("{}", json);
        }
        Command::Rewrite { input, output } => {
            if output.is_file() {
                bail!("output {} is a file, expected a directory", output.display());
            }
            let feed = load(input, config, args.quiet)?;
            let started_at = Instant::now();
            Writer::new()
                .write_to_dir(&feed, output)
                .with_context(|| format!("write feed to {}", output.display()))?;
            info!("feed written in {:?}", started_at.elapsed());
        }
    }
    Ok(())
}

fn load(input: &Path, config: ParserConfig, quiet: bool) -> anyhow::Result<Feed> {
    let started_at = Instant::now();
    let parser = Parser::new(config);
    let feed = if quiet {
        parser.parse_path(input)
    } else {
        let progress = IndicatifHandler::new();
        let result = parser.with_progress(&progress).parse_path(input);
        progress.finish(result.is_ok());
        result
    }
    .with_context(|| format!("load feed {}", input.display()))?;
    info!("feed loaded in {:?}", started_at.elapsed());
    Ok(feed)
}

struct IndicatifHandler {
    loading_pb: ProgressBar,
}

impl IndicatifHandler {
    fn new() -> Self {
        let loading_pb = ProgressBar::new(0);
        loading_pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {percent}% {msg}",
            )
            .unwrap()
            .progress_chars("#>-"),
        );
        loading_pb.set_message("Waiting to load tables...");
        Self { loading_pb }
    }

    fn finish(&self, success: bool) {
        if success {
            self.loading_pb.finish_with_message("Loading complete");
        } else {
            self.loading_pb.abandon_with_message("Loading failed");
        }
    }
}

impl ProgressHandler for IndicatifHandler {
    fn on_start_table(&self, file: &str) {
        self.loading_pb.set_message(format!("Loading {}", file));
    }

    fn on_finish_table(&self, file: &str, rows: u64) {
        self.loading_pb
            .set_message(format!("Loaded {} ({} rows)", file, rows));
        self.loading_pb.inc(1);
    }

    fn set_total_tables(&self, count: usize) {
        self.loading_pb.set_length(count as u64);
        self.loading_pb.set_message("Starting load...");
    }
}

#[derive(Debug, Serialize)]
struct FeedSummary {
    input: String,
    publisher: Option<String>,
    agencies: usize,
    stops: usize,
    routes: usize,
    routes_by_category: BTreeMap<&'static str, usize>,
    trips: usize,
    stop_times: usize,
    services: usize,
    shapes: usize,
    fares: usize,
    transfers: usize,
    levels: usize,
    pathways: usize,
    attributions: usize,
    has_frequencies: bool,
    bounding_box: Option<[f64; 4]>,
    zones: Vec<String>,
}

impl FeedSummary {
    fn new(input: &Path, feed: &Feed) -> Self {
        let mut routes_by_category = BTreeMap::new();
        for route in &feed.routes {
            *routes_by_category
                .entry(route.route_type.category().name())
                .or_insert(0) += 1;
        }
        Self {
            input: input.display().to_string(),
            publisher: feed
                .info
                .has_publisher()
                .then(|| feed.info.publisher_name.clone()),
            agencies: feed.agencies.len(),
            stops: feed.stops().len(),
            routes: feed.routes.len(),
            routes_by_category,
            trips: feed.trips.len(),
            stop_times: feed.stop_time_count(),
            services: feed.services.len(),
            shapes: feed.shapes.len(),
            fares: feed.fares.len(),
            transfers: feed.transfers.len(),
            levels: feed.levels.len(),
            pathways: feed.pathways.len(),
            attributions: feed.attributions.len(),
            has_frequencies: feed.has_frequencies(),
            bounding_box: feed.bounding_box().map(
                |BoundingBox {
                     min_lat,
                     min_lon,
                     max_lat,
                     max_lon,
                 }| [min_lat, min_lon, max_lat, max_lon],
            ),
            zones: feed.zones().iter().cloned().collect(),
        }
    }
}
