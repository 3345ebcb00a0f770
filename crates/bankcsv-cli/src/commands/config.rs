//! Config command implementation

use anyhow::{Context, Result};
use bankcsv_core::config::default_config_path;
use bankcsv_core::{ConfigSource, Settings};

pub fn cmd_config(settings: &Settings, source: &ConfigSource, show: bool) -> Result<()> {
    println!("⚙️  Configuration: {}", source);
    if let Some(path) = default_config_path() {
        println!("   Override location: {}", path.display());
    }

    if show {
        let toml = settings
            .to_toml()
            .context("Failed to serialize settings")?;
        println!();
        print!("{}", toml);
    }
    Ok(())
}
