//! announce-linker - announcement recording linker
//!
//! Subcommands:
//! - `import`: fetch bus stops and routes from the TfL API into the store
//! - `link`: fuzzy-match every unlinked stop and route end
//! - `manual`: ask the operator about whatever is still unlinked
//! - `status`: print link coverage

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use announce_common::config::{default_config_path, load_toml_config, TomlConfig};
use announce_linker::config::{CliOverrides, LinkerConfig};
use announce_linker::db::{init_database_pool, link_statistics, Coverage, SqliteLinkRepository};
use announce_linker::services::{
    AssetScanner, CandidateIndex, FuzzyMatcher, ManualPrompt, ResolutionMode, ScriptedPrompt,
    TerminalPrompt, TflClient, TransitImporter,
};
use announce_linker::LinkerError;

/// Command-line arguments for announce-linker
#[derive(Parser, Debug)]
#[command(name = "announce-linker")]
#[command(about = "Link transit stops and route ends to announcement recordings")]
#[command(version)]
struct Cli {
    /// TOML config file (default: <config dir>/announce/announce.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data folder holding the database and recordings
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// SQLite entity store path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import bus stops and routes from the TfL API
    Import,

    /// Link unlinked stops and route ends by fuzzy matching
    Link {
        /// Directory of stop announcement recordings
        #[arg(long)]
        stops_dir: Option<PathBuf>,

        /// Directory of destination announcement recordings
        #[arg(long)]
        destinations_dir: Option<PathBuf>,

        /// Minimum similarity score (0-100) to accept a match
        #[arg(long)]
        min_score: Option<u8>,
    },

    /// Resolve remaining links by operator input
    Manual {
        /// Answer from a TOML answers file instead of the terminal
        #[arg(long)]
        answers: Option<PathBuf>,
    },

    /// Show link coverage
    Status,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            root_folder: self.root_folder.clone(),
            database: self.database.clone(),
            ..CliOverrides::default()
        };
        if let Command::Link {
            stops_dir,
            destinations_dir,
            min_score,
        } = &self.command
        {
            overrides.stops_dir = stops_dir.clone();
            overrides.destinations_dir = destinations_dir.clone();
            overrides.min_score = *min_score;
        }
        overrides
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config is read before logging starts so its level can be honoured
    let config_path = cli.config.clone().or_else(default_config_path);
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path).context("Failed to load config file")?,
        None => TomlConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml_config.logging.level)),
        )
        .init();

    info!(
        "Starting announce-linker v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        _ => info!("No config file, using defaults"),
    }

    let config = LinkerConfig::resolve(&cli.overrides(), &toml_config)
        .context("Invalid configuration")?;
    info!("Root folder: {}", config.root_folder.display());
    info!("Database: {}", config.database_path.display());

    let pool = init_database_pool(&config.database_path)
        .await
        .context("Failed to open entity store")?;

    match &cli.command {
        Command::Import => {
            let client = TflClient::new(config.tfl.clone())?;
            let report = TransitImporter::new(&client, &pool)
                .run()
                .await
                .context("Import aborted")?;
            info!(
                "Imported {} stops ({} pages), {} routes, {} sections",
                report.stops, report.stop_pages, report.routes, report.sections
            );
        }

        Command::Link { .. } => {
            info!("Stop recordings: {}", config.stops_dir.display());
            info!("Destination recordings: {}", config.destinations_dir.display());

            let scanner = AssetScanner::new(config.audio_extensions.iter().cloned());
            let index =
                CandidateIndex::from_directories(&scanner, &config.stops_dir, &config.destinations_dir)
                    .context("Failed to scan recordings")?;

            let mut repo = SqliteLinkRepository::new(pool.clone());
            let report = ResolutionMode::Automatic {
                index: &index,
                matcher: FuzzyMatcher::new(config.min_score),
            }
            .run(&mut repo)
            .await
            .context("Linking aborted")?;

            info!(
                "Sections: {} linked, {} unmatched; stops: {} linked, {} unmatched",
                report.sections.linked,
                report.sections.unresolved,
                report.stops.linked,
                report.stops.unresolved
            );
        }

        Command::Manual { answers } => {
            let mut prompt: Box<dyn ManualPrompt> = match answers {
                Some(path) => Box::new(
                    ScriptedPrompt::from_toml_file(path).context("Failed to load answers file")?,
                ),
                None => Box::new(TerminalPrompt::stdio()),
            };

            let mut repo = SqliteLinkRepository::new(pool.clone());
            let result = ResolutionMode::Interactive {
                prompt: prompt.as_mut(),
                web_base: config.web_base.clone(),
            }
            .run(&mut repo)
            .await;

            match result {
                Ok(report) => info!(
                    "Manual pass done: {} linked ({} from earlier answers), {} skipped",
                    report.linked(),
                    report.sections.reused + report.stops.reused,
                    report.unresolved()
                ),
                // Every answer so far is already committed
                Err(LinkerError::InputClosed) => info!("Input closed, stopping manual pass"),
                Err(e) => return Err(e).context("Manual pass aborted"),
            }
        }

        Command::Status => {
            let stats = link_statistics(&pool).await?;
            println!("Routes:              {}", stats.routes);
            print_coverage("Stops", &stats.stops);
            print_coverage("Route origins", &stats.origins);
            print_coverage("Route destinations", &stats.destinations);
        }
    }

    pool.close().await;
    Ok(())
}

fn print_coverage(label: &str, coverage: &Coverage) {
    println!(
        "{:<20} {} / {} linked ({} manual), {} unlinked",
        format!("{}:", label),
        coverage.linked,
        coverage.total,
        coverage.manual,
        coverage.unlinked()
    );
}
