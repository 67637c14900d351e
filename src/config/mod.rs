mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Load config from default locations or fall back to defaults plus environment.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./postergrid.toml", "~/.config/postergrid/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Overlay `TMDB_*` and `S3_*` variables on top of file values.
///
/// `lookup` abstracts the environment so the mapping can be tested without
/// touching process state. An unrecognised boolean counts as `false`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("TMDB_API_KEY") {
        config.tmdb.api_key = key;
    }

    let storage = &mut config.storage;
    if let Some(v) = lookup("S3_ENABLED") {
        storage.enabled = parse_bool("S3_ENABLED", &v);
    }
    if let Some(v) = lookup("S3_ENDPOINT_URL") {
        storage.endpoint_url = Some(v).filter(|s| !s.trim().is_empty());
    }
    if let Some(v) = lookup("S3_BUCKET_NAME") {
        storage.bucket = v;
    }
    if let Some(v) = lookup("S3_ACCESS_KEY_ID") {
        storage.access_key_id = v;
    }
    if let Some(v) = lookup("S3_SECRET_ACCESS_KEY") {
        storage.secret_access_key = v;
    }
    if let Some(v) = lookup("S3_REGION") {
        storage.region = v;
    }
    if let Some(v) = lookup("S3_PATH_PREFIX") {
        storage.path_prefix = v;
    }
    if let Some(v) = lookup("S3_PUBLIC_READ") {
        storage.public_read = parse_bool("S3_PUBLIC_READ", &v);
    }
}

fn parse_bool(name: &str, value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" | "" => false,
        other => {
            tracing::warn!(variable = name, value = other, "Unrecognised boolean, treating as false");
            false
        }
    }
}

/// Check the settings a run cannot do without.
///
/// A missing or placeholder API key is fatal. Storage enabled without its
/// bucket or credentials is downgraded to local output with a warning.
pub fn validate_config(config: &mut Config) -> Result<()> {
    if !config.tmdb.has_api_key() {
        anyhow::bail!("TMDB_API_KEY is not set. Put it in the environment, a .env file or [tmdb] api_key");
    }

    if config.storage.enabled {
        let missing = config.storage.missing_settings();
        if !missing.is_empty() {
            tracing::warn!(
                missing = %missing.join(", "),
                "Object storage enabled but not fully configured; falling back to local output"
            );
            config.storage.enabled = false;
        }
    }

    if config.output.poster_count == 0 {
        anyhow::bail!("output.poster_count must be at least 1");
    }
    if config.output.max_workers == 0 {
        anyhow::bail!("output.max_workers must be at least 1");
    }
    if config.output.download_concurrency == 0 {
        anyhow::bail!("output.download_concurrency must be at least 1");
    }

    for device in &config.devices {
        let (w, h) = device.scaled_size();
        if w == 0 || h == 0 {
            anyhow::bail!("Device '{}' has an empty output size", device.name);
        }
    }

    Ok(())
}
