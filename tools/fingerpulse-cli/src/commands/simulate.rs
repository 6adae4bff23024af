//! Measure a synthetic fingertip stream.

use fingerpulse_measurement::{AppConfig, SyntheticConfig, SyntheticPulse};

pub async fn run(config: &AppConfig, synthetic: SyntheticConfig, json: bool) -> anyhow::Result<()> {
    let source = SyntheticPulse::new(synthetic)?;
    if !json {
        let s = source.config();
        println!("Simulating {:.0} BPM pulse", s.bpm);
        println!("  Frames: {} @ {}fps", s.frame_count(), s.sample_rate_hz);
        println!("  Noise: {}", s.noise_sigma);
        println!("  Motion ratio: {}", s.motion_ratio);
        println!("  Ambient: {}", s.ambient);
        println!();
    }
    super::measure(config, source, json).await
}
