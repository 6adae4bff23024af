//! Show or write the configuration.

use fingerpulse_common::config::config_file_path;
use fingerpulse_measurement::AppConfig;

pub fn run(config: &AppConfig, write: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    if write {
        AppConfig::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
