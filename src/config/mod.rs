mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./clearcut.toml",
        "~/.config/clearcut/config.toml",
        "/etc/clearcut/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply environment variable overrides.
///
/// `REMOVE_BG_API_KEY` takes precedence over the config file so deployments
/// can keep the credential out of it.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(key) = std::env::var("REMOVE_BG_API_KEY") {
        if !key.is_empty() {
            config.removal.api_key = Some(key);
        }
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("Maximum upload size cannot be 0");
    }

    if config.removal.endpoint.is_empty() {
        anyhow::bail!("Removal endpoint cannot be empty");
    }

    if let Some(key) = &config.removal.api_key {
        if key.is_empty() {
            tracing::warn!("Removal API key is set but empty; running in fallback-only mode");
        }
    }

    Ok(())
}
