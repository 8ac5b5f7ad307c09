use anyhow::{Context, bail};
use chrono::{DateTime, Local};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use crate::{
    config::{self, Config},
    domain::track::Track,
    history::{self, locate},
    pipeline::{self, ResolutionPipeline},
    report,
    resolver::bandcamp::BandcampResolver,
    storage::store::LinkStore,
};

#[derive(Parser)]
#[command(name = "histolink")]
#[command(version)]
#[command(about = "Finds purchase links for the tracks in a DJ history export")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// More logging, repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args)]
pub struct HistoryArgs {
    /// History file; bare names are looked up in the configured history dir
    pub history: Option<PathBuf>,

    /// Use the most recently modified file in the history dir
    #[arg(short, long, conflicts_with = "history")]
    pub latest: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve links for a history file and update the link store
    Resolve {
        #[command(flatten)]
        source: HistoryArgs,

        /// Also write the HTML report
        #[arg(short = 'r', long = "report")]
        with_report: bool,
    },
    /// Create a new link store without overwriting an existing one
    Init {
        /// History file whose tracks seed the new store
        history: Option<PathBuf>,
    },
    /// Show the most recent history file
    Latest,
    /// Write the HTML report using cached links only
    Report {
        #[command(flatten)]
        source: HistoryArgs,
    },
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Asks for a history file name until a non-empty one is entered.
fn prompt_history_name(input: &mut impl BufRead, output: &mut impl Write) -> anyhow::Result<PathBuf> {
    loop {
        write!(output, "Enter the name of the HISTORY file: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("no history file name given");
        }
        let name = line.trim();
        if !name.is_empty() {
            return Ok(PathBuf::from(name));
        }
    }
}

fn latest_history(cfg: &config::HistoryConfig) -> anyhow::Result<locate::HistoryFile> {
    let dir = cfg
        .dir
        .as_deref()
        .context("no history dir configured, set [history] dir in the config")?;
    Ok(locate::most_recent(dir)?)
}

fn pick_history_file(args: &HistoryArgs, cfg: &config::HistoryConfig) -> anyhow::Result<PathBuf> {
    if args.latest {
        let file = latest_history(cfg)?;
        println!("Most recent HISTORY file: {}", file.path.display());
        return Ok(file.path);
    }

    let name = match &args.history {
        Some(name) => name.clone(),
        None => prompt_history_name(&mut std::io::stdin().lock(), &mut std::io::stdout())?,
    };
    Ok(locate::resolve_name(cfg.dir.as_deref(), &name))
}

fn read_history(path: &Path) -> anyhow::Result<Vec<Track>> {
    let tracks = history::read_tracks(path)
        .with_context(|| format!("failed to parse history {}", path.display()))?;
    println!("Track list generated!");
    Ok(tracks)
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let cfg = Config::load_or_default(cli.config.as_deref())?;

    match &cli.command {
        Commands::Resolve {
            source,
            with_report,
        } => {
            let path = pick_history_file(source, &cfg.history)
                .context("failed to locate history file")?;
            let tracks = read_history(&path)?;

            let mut store = LinkStore::load_or_create(&cfg.store.path, cfg.store.create_if_missing)
                .context("failed to load link store")?;
            println!("Database loaded! ({} records)", store.len());

            let resolver = BandcampResolver::new(cfg.resolver.clone());
            println!("Finding links");
            let result = ResolutionPipeline::new(&resolver)
                .save_every(cfg.store.save_every)
                .run(tracks, &mut store)
                .context("failed to save link store")?;

            println!(
                "Finished: {} tracks, {} cached, {} searched, {} found, {} not found",
                result.tracks.len(),
                result.cached,
                result.searched,
                result.found,
                result.not_found()
            );
            println!("Database updated: {}", store.path().display());

            if *with_report {
                report::write_report(&result.tracks, &cfg.report)
                    .context("failed to write report")?;
                println!("HTML table generated: {}", cfg.report.output.display());
            }
        }

        Commands::Init { history } => {
            let tracks: Vec<Track> = match history {
                Some(name) => {
                    let path = locate::resolve_name(cfg.history.dir.as_deref(), name);
                    read_history(&path)?.into_iter().skip(1).collect()
                }
                None => vec![],
            };

            let store = LinkStore::create_new(&cfg.store.path, tracks)
                .context("failed to create link store")?;
            println!(
                "Database created: {} ({} records)",
                store.path().display(),
                store.len()
            );
        }

        Commands::Latest => {
            let file = latest_history(&cfg.history).context("failed to locate history file")?;
            let modified: DateTime<Local> = file.modified.into();
            println!(
                "Most recent HISTORY file: {} (modified {})",
                file.path.display(),
                modified.format("%Y-%m-%d %H:%M:%S")
            );
        }

        Commands::Report { source } => {
            let path = pick_history_file(source, &cfg.history)
                .context("failed to locate history file")?;
            let tracks = read_history(&path)?;
            let store = LinkStore::load(&cfg.store.path).context("failed to load link store")?;

            let tracks = pipeline::enrich_from_store(tracks, &store);
            report::write_report(&tracks, &cfg.report).context("failed to write report")?;
            println!("HTML table generated: {}", cfg.report.output.display());
        }
    }

    Ok(())
}
