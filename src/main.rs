// faamcat - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Product loading (built-in + user-defined)
// 4. Catalogue scan and the requested query or detector run

use clap::{Args, Parser, Subcommand};
use faamcat::app::analysis::FlightSummaryExt;
use faamcat::app::catalog::{Catalog, ScanReport};
use faamcat::app::{product_mgr, readers};
use faamcat::core::detect::{ChannelNames, LevelRunParams, ProfileParams, Segment};
use faamcat::core::discovery::DiscoveryConfig;
use faamcat::core::fileset::FileSet;
use faamcat::core::model::{FileRecord, Frequency, Selection};
use faamcat::core::product::ProductRegistry;
use faamcat::core::summary::Event;
use faamcat::platform::config::{self, AppConfig, PlatformPaths};
use faamcat::util;
use faamcat::util::error::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// faamcat - catalogue FAAM flight data files and query them by flight.
///
/// Point faamcat at directories or files; it groups data files by flight and
/// product and resolves each product to one file by version, revision and
/// frequency.
#[derive(Parser, Debug)]
#[command(name = "faamcat", version, about)]
struct Cli {
    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    /// Config file to use instead of the platform default.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Directory of user-defined product definitions.
    #[arg(short = 'p', long = "product-dir", global = true)]
    product_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the flights found under the given paths.
    Flights {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Show the files of one product of one flight and the file it resolves to.
    Files {
        #[command(flatten)]
        scan: ScanArgs,

        /// Flight number (e.g. c224).
        #[arg(short = 'f', long)]
        flight: String,

        /// Product hook (e.g. core, ccp).
        #[arg(long, default_value = util::constants::CORE_HOOK)]
        hook: String,

        #[command(flatten)]
        pins: PinArgs,
    },

    /// Find steady level runs in one product of one flight.
    Runs {
        #[command(flatten)]
        target: DetectArgs,
    },

    /// Find ascending and descending profiles in one product of one flight.
    Profiles {
        #[command(flatten)]
        target: DetectArgs,
    },

    /// Query the flight summary of one flight.
    Events {
        #[command(flatten)]
        scan: ScanArgs,

        /// Flight number (e.g. c224).
        #[arg(short = 'f', long)]
        flight: String,

        /// Events current at this time ("YYYY-MM-DD HH:MM:SS").
        #[arg(long, value_parser = parse_time, conflicts_with = "name")]
        at: Option<NaiveDateTime>,

        /// Tolerance in seconds for --at.
        #[arg(long, default_value_t = util::constants::DEFAULT_EVENT_TOLERANCE_SECS, requires = "at")]
        within: i64,

        /// The event with this name (case-insensitive).
        #[arg(long)]
        name: Option<String>,
    },

    /// Show the effective configuration after defaults and validation.
    Config {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Files or directories to scan.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Version, revision and frequency pins. Fields left out keep the
/// FileSet's current pins.
#[derive(Args, Debug, Default)]
struct PinArgs {
    /// Pin the version.
    #[arg(long)]
    version: Option<u32>,

    /// Pin the revision.
    #[arg(long)]
    revision: Option<u32>,

    /// Pin the frequency: a rate in Hz or "full".
    #[arg(long = "freq")]
    frequency: Option<Frequency>,
}

impl PinArgs {
    fn selection(&self) -> Selection {
        Selection {
            version: self.version,
            revision: self.revision,
            frequency: self.frequency,
        }
    }
}

#[derive(Args, Debug)]
struct DetectArgs {
    #[command(flatten)]
    scan: ScanArgs,

    /// Flight number (e.g. c224).
    #[arg(short = 'f', long)]
    flight: String,

    /// Product hook (e.g. core, ccp).
    #[arg(long, default_value = util::constants::CORE_HOOK)]
    hook: String,

    #[command(flatten)]
    pins: PinArgs,
}

fn parse_time(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| format!("'{raw}' is not a time like 2020-01-30 10:00:00"))
}

fn main() {
    let cli = Cli::parse();

    // Config is loaded before logging so its level can apply; its warnings
    // are replayed once the subscriber exists.
    let platform_paths = PlatformPaths::resolve();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| platform_paths.config_file.clone());
    let (app_config, config_warnings) = config::load_config(&config_path);

    util::logging::init(cli.debug, app_config.log_level.as_deref());
    for w in &config_warnings {
        tracing::warn!(warning = %w, "Config warning");
    }
    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "faamcat starting"
    );

    if let Err(e) = run(&cli, &app_config, &config_path, &platform_paths) {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(
    cli: &Cli,
    app_config: &AppConfig,
    config_path: &Path,
    platform_paths: &PlatformPaths,
) -> Result<()> {
    let product_dir = cli
        .product_dir
        .as_deref()
        .unwrap_or(&platform_paths.user_products_dir);
    let (registry, product_errors) = product_mgr::build_registry(Some(product_dir));
    for e in &product_errors {
        eprintln!("warning: {e}");
    }

    let discovery = DiscoveryConfig {
        max_depth: app_config.max_depth,
        exclude_patterns: app_config.exclude_patterns.clone(),
    };

    match &cli.command {
        Command::Flights { scan } => {
            let (catalog, report) = Catalog::scan(registry, &scan.paths, &discovery);
            print_report(&report);
            list_flights(&catalog, scan.json);
        }
        Command::Files {
            scan,
            flight,
            hook,
            pins,
        } => {
            let (mut catalog, report) = Catalog::scan(registry, &scan.paths, &discovery);
            print_report(&report);
            let fileset = catalog.flight_mut(flight)?.accessor_mut(hook)?;
            fileset.update(pins.selection())?;
            show_files(fileset, scan.json)?;
        }
        Command::Runs { target } => {
            let (channels, params, _) = detection_settings(app_config);
            let catalog = scan_and_pin(registry, target, &discovery)?;
            let loaders = readers::native_loaders();
            let runs = catalog
                .analysis(&target.flight, &loaders)?
                .with_hook(target.hook.as_str())
                .with_channels(channels)
                .level_runs(&params)?;
            show_segments(&[("run", runs.as_slice())], target.scan.json);
        }
        Command::Profiles { target } => {
            let (channels, _, params) = detection_settings(app_config);
            let catalog = scan_and_pin(registry, target, &discovery)?;
            let loaders = readers::native_loaders();
            let profiles = catalog
                .analysis(&target.flight, &loaders)?
                .with_hook(target.hook.as_str())
                .with_channels(channels)
                .profiles(&params)?;
            show_segments(
                &[
                    ("ascending", profiles.ascending.as_slice()),
                    ("descending", profiles.descending.as_slice()),
                ],
                target.scan.json,
            );
        }
        Command::Events {
            scan,
            flight,
            at,
            within,
            name,
        } => {
            let (catalog, report) = Catalog::scan(registry, &scan.paths, &discovery);
            print_report(&report);
            let summary = catalog.flight(flight)?.summary()?;
            let events: Vec<&Event> = match (at, name) {
                (Some(t), _) => summary.at(*t, Duration::seconds(*within)),
                (None, Some(n)) => vec![summary.by_name(n)?],
                (None, None) => summary.events().iter().collect(),
            };
            show_events(&events, scan.json);
        }
        Command::Config { json } => {
            show_config(config_path, product_dir, &discovery, app_config, *json)?;
        }
    }
    Ok(())
}

/// Scan, then apply the command-line pins to the target product.
fn scan_and_pin(
    registry: ProductRegistry,
    target: &DetectArgs,
    discovery: &DiscoveryConfig,
) -> Result<Catalog> {
    let (mut catalog, report) = Catalog::scan(registry, &target.scan.paths, discovery);
    print_report(&report);
    catalog
        .flight_mut(&target.flight)?
        .accessor_mut(&target.hook)?
        .update(target.pins.selection())?;
    Ok(catalog)
}

/// Detector settings from the `[detection]` config section.
fn detection_settings(config: &AppConfig) -> (ChannelNames, LevelRunParams, ProfileParams) {
    let channels = ChannelNames {
        ground: config.ground_channel.clone(),
        pressure: config.pressure_channel.clone(),
        roll: config.roll_channel.clone(),
    };
    let level_runs = LevelRunParams {
        min_length: config.min_length,
        max_length: config.max_length,
        roll_limit: config.roll_limit,
        pressure_std_limit: config.pressure_std_limit,
        roll_smoothing_window: config.roll_smoothing_window,
        output_frequency: config.output_frequency,
    };
    let profiles = ProfileParams {
        window: config.profile_window,
        threshold: config.profile_threshold,
        min_length: config.profile_min_length,
    };
    (channels, level_runs, profiles)
}

#[derive(Serialize)]
struct ConfigView<'a> {
    config_file: &'a Path,
    product_dir: &'a Path,
    max_depth: usize,
    exclude_patterns: &'a [String],
    channels: ChannelNames,
    level_runs: LevelRunParams,
    profiles: ProfileParams,
    log_level: Option<&'a str>,
}

fn show_config(
    config_file: &Path,
    product_dir: &Path,
    discovery: &DiscoveryConfig,
    app_config: &AppConfig,
    json: bool,
) -> Result<()> {
    let (channels, level_runs, profiles) = detection_settings(app_config);
    // Cross-field constraints (max_length >= min_length) are only checked here.
    level_runs.validate()?;
    profiles.validate()?;

    let view = ConfigView {
        config_file,
        product_dir,
        max_depth: discovery.max_depth,
        exclude_patterns: &discovery.exclude_patterns,
        channels,
        level_runs,
        profiles,
        log_level: app_config.log_level.as_deref(),
    };

    if json {
        print_json(&view);
        return Ok(());
    }
    println!("config file:      {}", view.config_file.display());
    println!("product dir:      {}", view.product_dir.display());
    println!("max depth:        {}", view.max_depth);
    println!("exclude:          {}", view.exclude_patterns.join(", "));
    println!(
        "channels:         ground={} pressure={} roll={}",
        view.channels.ground, view.channels.pressure, view.channels.roll
    );
    println!("level runs:       {:?}", view.level_runs);
    println!("profiles:         {:?}", view.profiles);
    println!("log level:        {}", view.log_level.unwrap_or(util::constants::DEFAULT_LOG_LEVEL));
    Ok(())
}

fn print_report(report: &ScanReport) {
    for e in &report.errors {
        eprintln!("skipped: {e}");
    }
    for w in &report.warnings {
        eprintln!("warning: {w}");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => tracing::error!(error = %e, "JSON serialisation failed"),
    }
}

#[derive(Serialize)]
struct FlightRow<'a> {
    flight_number: &'a str,
    date: NaiveDate,
    hooks: Vec<&'a str>,
}

fn list_flights(catalog: &Catalog, json: bool) {
    let rows: Vec<FlightRow<'_>> = catalog
        .flights()
        .map(|f| FlightRow {
            flight_number: f.flight_number(),
            date: f.date(),
            hooks: f.hooks().collect(),
        })
        .collect();

    if json {
        print_json(&rows);
        return;
    }
    for row in rows {
        println!("{}  {}  {}", row.flight_number, row.date, row.hooks.join(", "));
    }
}

#[derive(Serialize)]
struct FilesView<'a> {
    hook: &'a str,
    selection: Selection,
    records: Vec<&'a FileRecord>,
    resolved: PathBuf,
    ambiguous: Vec<PathBuf>,
}

fn show_files(fileset: &FileSet, json: bool) -> Result<()> {
    let resolution = fileset.resolve()?;
    let view = FilesView {
        hook: fileset.hook(),
        selection: fileset.selection(),
        records: fileset.records().collect(),
        resolved: resolution.path().to_path_buf(),
        ambiguous: resolution
            .ambiguity
            .map(|a| a.candidates)
            .unwrap_or_default(),
    };

    if json {
        print_json(&view);
        return Ok(());
    }

    let show = |v: Option<String>| v.unwrap_or_else(|| "any".to_string());
    println!(
        "{}: version {}, revision {}, frequency {}",
        view.hook,
        show(view.selection.version.map(|v| v.to_string())),
        show(view.selection.revision.map(|r| r.to_string())),
        show(view.selection.frequency.map(|f| f.to_string())),
    );
    for record in &view.records {
        let marker = if record.path() == view.resolved { "*" } else { " " };
        println!(
            "{marker} v{} r{} {:>4}  {}",
            show(record.version().map(|v| v.to_string())),
            show(record.revision().map(|r| r.to_string())),
            record.frequency(),
            record
        );
    }
    if !view.ambiguous.is_empty() {
        eprintln!("warning: {} files match these pins; using the first", view.ambiguous.len());
    }
    Ok(())
}

#[derive(Debug, Serialize, PartialEq)]
struct SegmentRow<'a> {
    kind: &'a str,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    samples: usize,
}

fn segment_rows<'a>(groups: &[(&'a str, &[Segment])]) -> Vec<SegmentRow<'a>> {
    groups
        .iter()
        .flat_map(|&(kind, segments)| {
            segments.iter().map(move |s| SegmentRow {
                kind,
                start: s.start(),
                end: s.end(),
                samples: s.len(),
            })
        })
        .collect()
}

fn show_segments(groups: &[(&str, &[Segment])], json: bool) {
    let rows = segment_rows(groups);
    if json {
        print_json(&rows);
        return;
    }
    let show = |t: Option<NaiveDateTime>| t.map_or_else(|| "-".to_string(), |t| t.to_string());
    for row in &rows {
        println!("{:<10}  {}  {}  {}", row.kind, show(row.start), show(row.end), row.samples);
    }
}

fn show_events(events: &[&Event], json: bool) {
    if json {
        print_json(events);
        return;
    }
    for e in events {
        let stop = e
            .stop_time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}  {}  {}", e.start_time, stop, e.event);
    }
}
