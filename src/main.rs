//! Stubforge - CLI entry point.
//!
//! Loads a stub configuration, optionally validates it, and can simulate
//! requests against the engine from the command line.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use stubforge::{InboundRequest, Resolution, StubEngine};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "stubforge",
    about = "HTTP stub server engine - contract validation and request simulation",
    version
)]
struct Args {
    /// Path to the stub configuration file
    #[arg(short, long, default_value = "stubforge.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Validate the configuration and exit
    #[arg(long)]
    validate: bool,

    /// Simulate a request against this url (path plus optional query)
    #[arg(short, long)]
    url: Option<String>,

    /// HTTP method for the simulated request
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request body for the simulated request
    #[arg(short, long)]
    data: Option<String>,

    /// Resolve the simulated request this many times (shows sequenced
    /// responses cycling)
    #[arg(long, default_value_t = 1)]
    repeat: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if !args.config.exists() {
        anyhow::bail!("configuration file not found: {:?}", args.config);
    }

    if args.validate {
        let config = stubforge::StubConfig::from_file(&args.config)?;
        println!(
            "Configuration is valid ({} stubs defined)",
            config.stubs.len()
        );
        return Ok(());
    }

    info!(path = ?args.config, "loading configuration");
    let engine = StubEngine::from_file(&args.config)?;

    let Some(url) = args.url else {
        println!("{} stubs loaded; pass --url to simulate a request", engine.stub_count());
        return Ok(());
    };

    let mut inbound = InboundRequest::parse(&args.method, &url);
    if let Some(data) = args.data {
        inbound = inbound.with_body(data);
    }

    for _ in 0..args.repeat.max(1) {
        match engine.resolve(&inbound) {
            Resolution::Matched { response, .. } => {
                println!("{} {}", response.status, response.body);
            }
            Resolution::NoMatch => {
                let not_found = engine.not_found_response(&inbound);
                println!("{} {}", not_found.status, not_found.body);
            }
        }
    }

    Ok(())
}
