//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use bankcsv_core::Settings;
use bankcsv_server::{parse_api_keys, ServerConfig};

pub async fn cmd_serve(
    settings: &Settings,
    host: &str,
    port: u16,
    no_auth: bool,
    static_dir: Option<&Path>,
) -> Result<()> {
    // Parse API keys from environment (comma-separated)
    let api_keys = parse_api_keys(&std::env::var("BANKCSV_API_KEYS").unwrap_or_default());

    if !no_auth && api_keys.is_empty() {
        anyhow::bail!(
            "No API keys configured.\n\
             Set BANKCSV_API_KEYS (comma-separated) or pass --no-auth for local use"
        );
    }

    println!("🚀 Starting BankCSV server...");
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    println!(
        "   Upload limit: {} MB, analysis timeout: {}s, keeping {} statements",
        settings.server.max_upload_bytes / 1024 / 1024,
        settings.server.convert_timeout_secs,
        settings.server.store_capacity
    );
    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!(
            "   🔑 API keys: {} configured (BANKCSV_API_KEYS)",
            api_keys.len()
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let config = ServerConfig {
        require_auth: !no_auth,
        api_keys,
        ..ServerConfig::from_settings(&settings.server)
    };

    let static_dir = static_dir
        .map(|p| {
            p.to_str()
                .context("Static directory path must be valid UTF-8")
        })
        .transpose()?;
    bankcsv_server::serve_with_config(settings, host, port, static_dir, config).await?;

    Ok(())
}
