//! Ambient blocks host shell.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Parse configuration**: load the TOML file named by `--config` (or use
//!    defaults) and apply command-line overrides.
//! 2. **Wire observability**: install a `tracing-subscriber` stack with a JSON
//!    or pretty layer on stderr and, when configured, an OpenTelemetry OTLP
//!    span exporter.
//! 3. **Construct infrastructure**: build the [`ambient::AmbientClientFactory`]
//!    and hand it to a single [`extension::Session`].
//! 4. **Run the selected command**:
//!    - `info` prints the registration descriptor the host catalog consumes.
//!    - `run` reads newline-delimited block invocations from stdin and
//!      dispatches them until EOF.

mod config;
mod host;
mod observability;

use std::path::PathBuf;

use ambient::AmbientClientFactory;
use anyhow::Context;
use clap::{Parser, Subcommand};
use extension::{ExtensionInfo, Locale, Session};
use tokio::io::BufReader;
use tracing::info;

use crate::config::{CliConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "ambient-blocks", version, about = "Send block data to Ambient")]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `logging.format` from the configuration file.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the extension descriptor as JSON.
    Info {
        /// Locale for block texts (e.g. `en`, `ja-JP`).
        #[arg(long, default_value = "en")]
        locale: String,
    },
    /// Dispatch block invocations read from stdin, one JSON object per line.
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Info { locale } => {
            let info = ExtensionInfo::for_locale(Locale::from_tag(&locale));
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Command::Run => {
            let mut config = CliConfig::load(cli.config.as_deref())?;
            if let Some(format) = cli.log_format {
                config.logging.format = format;
            }
            run(config).await
        }
    }
}

async fn run(config: CliConfig) -> anyhow::Result<()> {
    let _guard = observability::init(&config.logging)?;

    let factory = AmbientClientFactory::new(&config.ambient)
        .context("failed to construct Ambient client")?;
    info!(base_url = %factory.base_url(), "Ambient blocks session started");

    let mut session = Session::new(factory);
    if let Some(credentials) = config.credentials {
        session.init(credentials.channel_id, credentials.write_key);
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let summary = host::run(&mut session, stdin)
        .await
        .context("failed to read block invocations from stdin")?;

    info!(
        dispatched = summary.dispatched,
        skipped = summary.skipped,
        sent = summary.sent,
        failed = summary.failed,
        "Input exhausted; session finished"
    );
    Ok(())
}
