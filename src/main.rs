use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use palette_runtime::PaletteConfig;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webpalette_cli::commands::{self, RunOptions};
use webpalette_cli::{default_config_path, load_config, render, CliError, OutputFormat};

/// Web command palette - per-site commands from SITEINFO definitions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for where SITEINFO definitions come from.
#[derive(Args)]
struct SourceArgs {
    /// External SITEINFO file, repeatable; replaces the configured sources
    #[arg(long = "source", value_name = "FILE")]
    sources: Vec<String>,

    /// Local SITEINFO file; replaces the configured one
    #[arg(long, value_name = "FILE")]
    local: Option<PathBuf>,
}

impl SourceArgs {
    fn apply(self, config: &mut PaletteConfig) {
        if !self.sources.is_empty() {
            config.sources = self.sources;
        }
        if self.local.is_some() {
            config.local_siteinfo = self.local;
        }
    }
}

#[derive(Args)]
struct PageArgs {
    /// Address the page is loaded at
    #[arg(long)]
    url: String,

    /// HTML document to load as the page
    #[arg(long, value_name = "FILE")]
    html: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Text typed into the palette input
    #[arg(short, long, default_value = "")]
    query: String,

    /// Row of the filtered list to confirm
    #[arg(long, default_value_t = 0)]
    row: usize,

    #[command(flatten)]
    sources: SourceArgs,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the default configuration file location
    Path,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate SITEINFO files
    Validate {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Merge external and local SITEINFO sources
    Merge(SourceArgs),

    /// Show which definitions apply to an address
    Match {
        url: String,
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// List the commands the palette would offer on a page
    Extract {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Open the palette on a page, filter, and confirm a command
    Run(RunArgs),

    /// Print a starter SITEINFO entry for an address
    Template {
        url: String,
        /// Page title used as the entry name
        #[arg(long, default_value = "")]
        title: String,
    },

    /// Inspect configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug)?;
    info!("Starting webpalette v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref()).await?;

    match run(cli.command, config, cli.output).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

async fn run(command: Commands, mut config: PaletteConfig, output: OutputFormat) -> Result<()> {
    match command {
        Commands::Validate { files } => {
            let summary = commands::validate_files(&files);
            println!("{}", render(&summary, output)?);
            if summary.failed() > 0 {
                return Err(CliError::InvalidSources {
                    failed: summary.failed(),
                    total: summary.files.len(),
                }
                .into());
            }
        }
        Commands::Merge(sources) => {
            sources.apply(&mut config);
            let report = commands::merge_definitions(&config);
            println!("{}", render(&commands::MergeSummary::from(&report), output)?);
        }
        Commands::Match { url, sources } => {
            sources.apply(&mut config);
            let report = commands::merge_definitions(&config);
            let summary = commands::match_url(&config, &report.definitions, &url);
            println!("{}", render(&summary, output)?);
        }
        Commands::Extract { page, sources } => {
            sources.apply(&mut config);
            let html = commands::read_page(&page.url, &page.html).await?;
            let report = commands::merge_definitions(&config);
            let summary = commands::extract_commands(config, report.definitions, &html).await;
            println!("{}", render(&summary, output)?);
        }
        Commands::Run(args) => {
            args.sources.apply(&mut config);
            let html = commands::read_page(&args.page.url, &args.page.html).await?;
            let report = commands::merge_definitions(&config);
            let options = RunOptions {
                query: args.query,
                row: args.row,
            };
            let summary = commands::run_palette(config, report.definitions, &html, &options).await;
            println!("{}", render(&summary, output)?);
        }
        Commands::Template { url, title } => {
            println!("{}", commands::template(&url, &title)?);
        }
        Commands::Config(args) => match args.action {
            ConfigAction::Show => {
                let text = match output {
                    OutputFormat::Json => serde_json::to_string_pretty(&config)?,
                    _ => serde_yaml::to_string(&config)?,
                };
                println!("{}", text);
            }
            ConfigAction::Path => println!("{}", default_config_path()?.display()),
        },
    }
    Ok(())
}
