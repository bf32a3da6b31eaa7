//! Terminal dashboard for browsing and reporting top memes.

use anyhow::Context;
use clap::Parser;
use log::{debug, info};
use memedash::config::{LayeredConfigOptions, MemedashConfig};
use memedash::core::Dashboard;
use memedash::tui::TuiConfig;
use std::path::{Path, PathBuf};

/// Command-line options for the dashboard.
#[derive(Parser)]
#[command(name = "memedash", version)]
struct Cli {
    /// Extra memedash.json5 layer applied over the discovered ones
    #[arg(long)]
    config: Option<PathBuf>,
    /// Memes API root, overriding config and MEMEDASH_API_URL
    #[arg(long)]
    api_url: Option<String>,
    /// Settings storage file
    #[arg(long)]
    storage: Option<PathBuf>,
    /// Append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,
}

/// Entry point for the memedash TUI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    memedash::init_logging(cli.log_file.as_deref())?;
    info!(
        "starting memedash (config_set={}, api_url_set={}, storage_set={})",
        cli.config.is_some(),
        cli.api_url.is_some(),
        cli.storage.is_some()
    );

    let cwd = std::env::current_dir().context("cwd")?;
    let config = resolve_config(&cli, &cwd)?;
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let dashboard = Dashboard::from_config(&config).context("failed to start dashboard")?;
    let tui_config = TuiConfig {
        report_limit: config.reports.limit,
    };
    memedash::tui::run(dashboard, tui_config).await
}

/// Load the layered config stack with `--config` on top, then apply overrides.
///
/// Precedence (low -> high): file layers, `MEMEDASH_API_URL`, CLI flags.
fn resolve_config(cli: &Cli, cwd: &Path) -> anyhow::Result<MemedashConfig> {
    info!("loading layered config from cwd: {}", cwd.display());
    let mut options = LayeredConfigOptions::new(cwd);
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    let layered = MemedashConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    let mut config = layered.config;
    config
        .apply_env_overrides()
        .context("invalid environment override")?;
    if let Some(api_url) = cli.api_url.as_ref() {
        config.api.base_url = api_url.trim().to_string();
    }
    if let Some(storage) = cli.storage.as_ref() {
        config.storage.path = Some(storage.display().to_string());
    }
    config.validate().context("invalid config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{Cli, resolve_config};
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn cli_flags_override_config_file() {
        let temp = tempdir().expect("tmp");
        let path = temp.path().join("override.json5");
        fs::write(
            &path,
            r#"{ api: { base_url: "http://file:8000" }, reports: { limit: 5 } }"#,
        )
        .expect("write");
        let storage = temp.path().join("storage.json");

        let cli = Cli::parse_from([
            "memedash".to_string(),
            "--config".to_string(),
            path.display().to_string(),
            "--api-url".to_string(),
            "https://memes.example.com".to_string(),
            "--storage".to_string(),
            storage.display().to_string(),
        ]);
        let config = resolve_config(&cli, temp.path()).expect("config");
        assert_eq!(config.api.base_url, "https://memes.example.com");
        assert_eq!(config.reports.limit, 5);
        assert_eq!(config.storage.resolve_path(), storage);
    }

    #[test]
    fn invalid_cli_api_url_is_rejected() {
        let temp = tempdir().expect("tmp");
        let path = temp.path().join("override.json5");
        fs::write(&path, "{}").expect("write");
        let cli = Cli::parse_from([
            "memedash".to_string(),
            "--config".to_string(),
            path.display().to_string(),
            "--api-url".to_string(),
            "memes.example.com".to_string(),
        ]);
        assert!(resolve_config(&cli, temp.path()).is_err());
    }
}
