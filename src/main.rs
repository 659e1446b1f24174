use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use whiteboard_sim::config::SimConfig;

/// Two-pulley whiteboard plotter simulator
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON file with device geometry and timing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tick period in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Motion speed in pulses per millisecond
    #[arg(long)]
    speed: Option<f64>,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };
    if let Some(tick_ms) = args.tick_ms {
        config.tick_period_ms = tick_ms;
    }
    if let Some(speed) = args.speed {
        config.speed_pulses_per_ms = speed;
    }

    if let Err(e) = whiteboard_sim::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
