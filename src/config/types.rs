use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::devices::DeviceProfile;

/// Value shipped in `.env.example`; treated the same as no key.
pub const PLACEHOLDER_API_KEY: &str = "your_tmdb_api_key_here";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Replaces the built-in device list when non-empty.
    #[serde(default)]
    pub devices: Vec<DeviceProfile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,

    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    #[serde(default = "default_language")]
    pub language: String,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_tmdb_base_url(),
            image_base_url: default_image_base_url(),
            language: default_language(),
        }
    }
}

impl TmdbConfig {
    /// Whether a usable API key is present.
    pub fn has_api_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }
}

/// S3-compatible object storage.
#[derive(Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Custom endpoint (MinIO, R2, ...). AWS virtual-host URLs are used when unset.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default)]
    pub bucket: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Key prefix; leading and trailing slashes are ignored.
    #[serde(default)]
    pub path_prefix: String,

    #[serde(default = "default_true")]
    pub public_read: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint_url: None,
            bucket: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: default_region(),
            path_prefix: String::new(),
            public_read: true,
        }
    }
}

impl StorageConfig {
    /// Names of required settings that are empty.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.bucket.trim().is_empty() {
            missing.push("bucket");
        }
        if self.access_key_id.trim().is_empty() {
            missing.push("access_key_id");
        }
        if self.secret_access_key.trim().is_empty() {
            missing.push("secret_access_key");
        }
        missing
    }

    pub fn prefix(&self) -> &str {
        self.path_prefix.trim_matches('/')
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("enabled", &self.enabled)
            .field("endpoint_url", &self.endpoint_url)
            .field("bucket", &self.bucket)
            .field("access_key_id", &redact(&self.access_key_id))
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("region", &self.region)
            .field("path_prefix", &self.path_prefix)
            .field("public_read", &self.public_read)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Catalog items to sample, split between movies and series.
    #[serde(default = "default_poster_count")]
    pub poster_count: usize,

    #[serde(default = "default_download_concurrency")]
    pub download_concurrency: usize,

    /// Upper bound on concurrent device renders.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./backgrounds")
}
fn default_poster_count() -> usize {
    40
}
fn default_download_concurrency() -> usize {
    5
}
fn default_max_workers() -> usize {
    4
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            poster_count: default_poster_count(),
            download_concurrency: default_download_concurrency(),
            max_workers: default_max_workers(),
        }
    }
}

/// Mask a secret for display, keeping the last four characters.
pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

impl Config {
    /// Copy of the config with credentials masked, for printing.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        copy.tmdb.api_key = redact(&copy.tmdb.api_key);
        copy.storage.access_key_id = redact(&copy.storage.access_key_id);
        copy.storage.secret_access_key = redact(&copy.storage.secret_access_key);
        copy
    }
}
