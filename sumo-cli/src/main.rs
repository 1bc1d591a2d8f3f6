use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sumo_explorer::{Explorer, ExplorerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ChildArgs, ObjectKind};

#[derive(Parser, Debug)]
#[command(name = "sumo-explorer")]
#[command(about = "Browse FMU results stored in Sumo")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.sumo/explorer.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Sumo environment, overrides the config file
    #[arg(long, global = true, env = "SUMO_ENV")]
    env: Option<String>,

    /// Log output format: pretty or json
    #[arg(long, global = true, env = "LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List cases
    Cases {
        /// Case status (keep, scratch, ...)
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        asset: Option<String>,

        /// SMDA field identifier
        #[arg(long)]
        field: Option<String>,

        #[arg(long)]
        name: Option<String>,

        /// Print at most this many cases
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// List objects under a case
    Objects {
        /// Object class
        #[arg(value_enum)]
        kind: ObjectKind,

        #[command(flatten)]
        filter: ChildArgs,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show distinct values of a metadata dimension
    Facets {
        /// Dimension, e.g. names, iterations, statuses, timestamps
        dimension: String,

        /// Object class; without it the dimension applies to cases
        #[arg(long, value_enum)]
        kind: Option<ObjectKind>,

        #[command(flatten)]
        filter: ChildArgs,
    },

    /// Aggregate surfaces server-side and write the result
    Aggregate {
        /// mean, min, max, std, p10, p50 or p90
        #[arg(short, long)]
        operation: String,

        #[command(flatten)]
        filter: ChildArgs,

        /// Output file for the irap binary surface
        #[arg(short = 'O', long)]
        output: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<ExplorerConfig> {
    let mut config = match &cli.config {
        Some(path) => ExplorerConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ExplorerConfig::load().context("Failed to load config")?,
    };
    if let Some(env) = &cli.env {
        config.env = env.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    Ok(config)
}

fn init_logging(config: &ExplorerConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config);

    tracing::debug!(env = %config.env, base_url = %config.base_url(), "Loaded configuration");
    let explorer = Explorer::new(&config).context("Failed to create Sumo client")?;

    match cli.command {
        Commands::Cases {
            status,
            asset,
            field,
            name,
            limit,
        } => {
            commands::run_cases(&explorer, status, asset, field, name, limit).await?;
        }
        Commands::Objects {
            kind,
            filter,
            limit,
        } => {
            commands::run_objects(&explorer, kind, &filter, limit).await?;
        }
        Commands::Facets {
            dimension,
            kind,
            filter,
        } => {
            commands::run_facets(&explorer, &dimension, kind, &filter).await?;
        }
        Commands::Aggregate {
            operation,
            filter,
            output,
        } => {
            commands::run_aggregate(&explorer, &operation, &filter, &output).await?;
        }
    }

    Ok(())
}
