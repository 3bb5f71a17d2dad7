use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use realme_ota::output::{dump_to_file, to_pretty_json};
use realme_ota::{
    OtaClient, OtaError, OtaVersion, ProtocolConfig, ProtocolVersion, Region, UpdateQuery,
};

#[derive(Parser, Debug)]
#[command(name = "realme-ota", author, version, long_about = None)]
#[command(about = "Query realme/ColorOS OTA update servers")]
struct Cli {
    /// Product model (ro.product.name)
    product_model: String,

    /// OTA version (ro.build.version.ota)
    ota_version: String,

    /// RealmeUI version (ro.build.version.realmeui)
    #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
    rui_version: u8,

    /// Update server: GL, CN, IN, EU (or 0-3)
    #[arg(
        short = 'r',
        long,
        visible_alias = "server",
        short_alias = 'c',
        default_value = "GL"
    )]
    region: Region,

    /// Request timeout in seconds
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Save the response into a file instead of printing it
    #[arg(short, long)]
    dump: Option<PathBuf>,

    /// Only show the given field of the response
    #[arg(short, long)]
    only: Option<String>,

    /// Only log errors
    #[arg(short, long)]
    silent: bool,

    /// Log verbosity (0 = warnings and errors, 1 = progress)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    verbosity: u8,

    /// Protocol configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging(silent: bool, verbosity: u8) {
    // Failures are reported even when silent
    let default_level = match (silent, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, _) => "info",
    };
    let filter = if silent {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<(), OtaError> {
    let config = match &cli.config {
        Some(path) => ProtocolConfig::from_file(path)?,
        None => ProtocolConfig::default(),
    };

    let mut query = UpdateQuery::new(
        cli.product_model,
        OtaVersion::parse(cli.ota_version)?,
        ProtocolVersion::try_from(cli.rui_version)?,
    )
    .region(cli.region);
    if let Some(secs) = cli.timeout {
        query = query.timeout(Duration::from_secs(secs));
    }

    let client = OtaClient::new(config)?;
    let content = client.check(&query, cli.only.as_deref()).await?;

    match &cli.dump {
        Some(path) => {
            if let Err(e) = dump_to_file(&content, path) {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!("{e}");
            }
        }
        None => println!("{}", to_pretty_json(&content)?),
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.silent, cli.verbosity);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            if let Some(hint) = e.suggestion() {
                info!("{hint}");
            }
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
