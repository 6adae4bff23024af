//! Fingerpulse CLI: run heart-rate measurements from the command line.
//!
//! Usage:
//!   fingerpulse simulate [OPTIONS]    Measure a synthetic fingertip stream
//!   fingerpulse replay <PATH>         Measure a recorded JSONL sample stream
//!   fingerpulse config [--write]      Show or write the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fingerpulse_measurement::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "fingerpulse",
    about = "Camera-based heart-rate measurement",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session over a synthetic fingertip signal
    Simulate {
        /// True heart rate of the synthetic pulse
        #[arg(long, default_value = "72")]
        bpm: f64,

        /// Seconds of frames to generate
        #[arg(long, default_value = "30")]
        duration: f64,

        /// Frame rate
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Sensor noise standard deviation (0-255 units)
        #[arg(long, default_value = "0.3")]
        noise: f64,

        /// Fraction of frames disturbed by motion
        #[arg(long, default_value = "0.02")]
        motion_ratio: f64,

        /// Maximum timestamp jitter in seconds
        #[arg(long, default_value = "0")]
        jitter: f64,

        /// Simulate an uncovered lens
        #[arg(long)]
        ambient: bool,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Run a session over a recorded sample stream
    Replay {
        /// JSONL file, one {"r","g","b","t"} sample per line
        path: PathBuf,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if !fingerpulse_common::logging::init_logging(&logging) {
        eprintln!("warning: logging was already initialized");
    }

    match cli.command {
        Commands::Simulate {
            bpm,
            duration,
            fps,
            noise,
            motion_ratio,
            jitter,
            ambient,
            seed,
            json,
        } => {
            let synthetic = fingerpulse_measurement::SyntheticConfig {
                bpm,
                sample_rate_hz: fps,
                duration_secs: duration,
                noise_sigma: noise,
                motion_ratio,
                timestamp_jitter_secs: jitter,
                ambient,
                seed,
                ..Default::default()
            };
            commands::simulate::run(&config, synthetic, json).await
        }
        Commands::Replay { path, json } => commands::replay::run(&config, path, json).await,
        Commands::Config { write } => commands::config::run(&config, write),
    }
}
