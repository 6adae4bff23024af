//! Measure a recorded sample stream.

use std::path::PathBuf;

use anyhow::Context;
use fingerpulse_measurement::AppConfig;
use fingerpulse_model::parse_samples;

pub async fn run(config: &AppConfig, path: PathBuf, json: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let samples = parse_samples(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if !json {
        println!("Replaying {} samples from {}", samples.len(), path.display());
        println!();
    }
    super::measure(config, samples, json).await
}
