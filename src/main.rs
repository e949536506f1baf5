//! Unready - CLI Entry Point
//!
//! Runs one simulated call against a configured mock and prints the result.

use anyhow::Result;
use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use unready::config::{MockDefinition, Style};
use unready::{
    AbortController, AbortSignal, ClientError, FetchError, RequestConfig, RequestInit,
    UnreadyClient, UnreadyConfig, UnreadyFetch,
};

#[derive(Parser, Debug)]
#[command(
    name = "unready",
    about = "Simulate fetch-style and client-style API calls with canned responses",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "unready.yaml")]
    config: PathBuf,

    /// Id of the mock to use (built-in success body when omitted)
    #[arg(short, long)]
    mock: Option<String>,

    /// Request target echoed in the response
    #[arg(short, long, default_value = "mock-url")]
    url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// API shape to simulate
    #[arg(long, value_enum)]
    style: Option<Style>,

    /// Override the simulated delay (ms)
    #[arg(short, long)]
    delay_ms: Option<u64>,

    /// Abort the call after this many milliseconds
    #[arg(long, value_name = "MS")]
    abort_after_ms: Option<u64>,

    /// Reason passed to the abort (timeout-style abort when omitted)
    #[arg(long, requires = "abort_after_ms")]
    abort_reason: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let default_config = include_str!("../demos/default-config.yaml");
        println!("{}", default_config);
        return Ok(());
    }

    // Load configuration
    let config = if args.config.exists() {
        info!(path = ?args.config, "Loading configuration");
        UnreadyConfig::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Configuration file not found: {:?}", args.config);
    } else {
        info!("Using default configuration (no mocks)");
        UnreadyConfig::default()
    };

    if args.validate {
        config.validate()?;
        println!(
            "Configuration is valid ({} mocks defined)",
            config.mocks.len()
        );
        return Ok(());
    }

    let definition = match &args.mock {
        Some(id) => Some(
            config
                .find(id)
                .ok_or_else(|| anyhow::anyhow!("No mock with id '{}'", id))?,
        ),
        None => None,
    };

    let delay = match args.delay_ms {
        Some(ms) => Duration::from_millis(ms),
        None => config.delay_for(definition),
    };
    let style = args.style.unwrap_or(config.settings.default_style);
    let signal = abort_signal(args.abort_after_ms, args.abort_reason.clone());

    info!(
        mock = args.mock.as_deref().unwrap_or("<default>"),
        style = ?style,
        delay_ms = delay.as_millis() as u64,
        "Simulating call"
    );

    let report = match style {
        Style::Fetch => run_fetch(&args, definition, delay, signal).await?,
        Style::Client => run_client(&args, definition, delay, signal).await?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Build the signal for `--abort-after-ms`.
///
/// With a reason, a controller aborts with it; without, the signal behaves
/// like a timeout signal.
fn abort_signal(after_ms: Option<u64>, reason: Option<String>) -> Option<AbortSignal> {
    let after = Duration::from_millis(after_ms?);
    match reason {
        Some(reason) => {
            let controller = AbortController::new();
            let signal = controller.signal();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                controller.abort_with(reason);
            });
            Some(signal)
        }
        None => Some(AbortSignal::timeout(after)),
    }
}

async fn run_fetch(
    args: &Args,
    definition: Option<&MockDefinition>,
    delay: Duration,
    signal: Option<AbortSignal>,
) -> Result<Value> {
    let mock = definition.map(MockDefinition::spec).unwrap_or_default();
    let fetch = UnreadyFetch::new(mock).with_delay(delay);

    let mut init = RequestInit::new().method(args.method.as_str());
    init.signal = signal;

    match fetch.fetch(args.url.as_str(), init).await {
        Ok(response) => Ok(json!({
            "url": response.url(),
            "ok": response.ok(),
            "status": response.status(),
            "body": response.json::<Value>().await?,
        })),
        Err(FetchError::Aborted(reason)) => Ok(json!({
            "aborted": reason.name(),
            "reason": reason.to_string(),
        })),
        Err(err) => Err(err.into()),
    }
}

async fn run_client(
    args: &Args,
    definition: Option<&MockDefinition>,
    delay: Duration,
    signal: Option<AbortSignal>,
) -> Result<Value> {
    let mock = definition.map(MockDefinition::spec).unwrap_or_default();
    let client = UnreadyClient::new(mock).with_delay(delay);

    let mut config = RequestConfig::new()
        .method(args.method.as_str())
        .url(args.url.as_str());
    config.signal = signal;

    match client.request(config).await {
        Ok(response) => Ok(serde_json::to_value(&response)?),
        Err(ClientError::Status(err)) => Ok(json!({ "error": serde_json::to_value(&*err)? })),
        Err(ClientError::Canceled(err)) => Ok(json!({ "error": serde_json::to_value(&err)? })),
        Err(err) => Err(err.into()),
    }
}
