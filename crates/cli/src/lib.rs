pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cotiza_core::config::{AppConfig, LoadOptions, LogFormat};
use cotiza_core::domain::quote::QualityTier;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "cotiza",
    about = "Cotiza operator CLI",
    long_about = "Generate priced quotes from free-text project descriptions, inspect history \
                  suggestions, and validate runtime configuration.",
    after_help = "Examples:\n  cotiza generate \"Reforma integral de un piso de 90 m2 en Madrid\" \
                  --client \"Hogar Sur\"\n  cotiza suggest owner-1 \"Reforma de cocina\"\n  cotiza \
                  doctor --json"
)]
pub struct Cli {
    /// Path to the configuration file (defaults to cotiza.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Generate a quote from a project description")]
    Generate {
        /// Free-text project description.
        description: String,
        #[arg(long, default_value = "Cliente")]
        client: String,
        #[arg(long, help = "Sector key (software, marketing, construction, ...)")]
        sector: Option<String>,
        #[arg(long, help = "Free-form price range, e.g. \"3.000 - 5.000\"")]
        price_range: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, help = "Owner key enabling history-based suggestions")]
        owner: Option<String>,
        #[arg(long, value_enum)]
        quality: Option<QualityArg>,
        #[arg(long, help = "Emit the full quote as JSON")]
        json: bool,
    },
    #[command(about = "Show the price suggestion history would make for a description")]
    Suggest {
        owner: String,
        description: String,
        #[arg(long)]
        sector: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
    #[command(about = "Validate config, database connectivity, and capability wiring")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum QualityArg {
    Basic,
    Standard,
    Premium,
}

impl From<QualityArg> for QualityTier {
    fn from(value: QualityArg) -> Self {
        match value {
            QualityArg::Basic => QualityTier::Basic,
            QualityArg::Standard => QualityTier::Standard,
            QualityArg::Premium => QualityTier::Premium,
        }
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(LoadOptions {
        config_path: cli.config.clone(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::from(2);
        }
    };

    init_logging(&config);

    let result = match cli.command {
        Command::Generate {
            description,
            client,
            sector,
            price_range,
            location,
            owner,
            quality,
            json,
        } => {
            commands::generate::run(
                &config,
                commands::generate::GenerateArgs {
                    description,
                    client,
                    sector,
                    price_range,
                    location,
                    owner,
                    quality: quality.map(QualityTier::from),
                    json,
                },
            )
            .await
        }
        Command::Suggest { owner, description, sector } => {
            commands::suggest::run(&config, &owner, &description, sector.as_deref()).await
        }
        Command::Config => commands::config::run(&config),
        Command::Doctor { json } => commands::doctor::run(&config, json).await,
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    // A second init (e.g. in tests) is not an error worth surfacing.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::Cli;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
