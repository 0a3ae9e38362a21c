//! Runtime configuration
//!
//! Values come from the process environment. A `.env` file is honoured during
//! development; otherwise the bundled `assets/config.env` fills in anything
//! the environment leaves unset.

use crate::storage::default_storage_dir;
use std::path::PathBuf;
use std::time::Duration;

/// Bundled defaults, shipped inside the binary for mobile and packaged builds
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BRAND: &str = "L'Oréal";
pub const DEFAULT_CATALOG: &str = "products.json";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq)]
pub enum CatalogLocation {
    File(PathBuf),
    Url(String),
}

impl CatalogLocation {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            CatalogLocation::Url(raw.to_string())
        } else {
            CatalogLocation::File(PathBuf::from(raw))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssistantConfig {
    pub endpoint: Option<String>,
    pub model: String,
    pub web_search: bool,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: DEFAULT_MODEL.to_string(),
            web_search: true,
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub assistant: AssistantConfig,
    pub catalog: CatalogLocation,
    pub catalog_timeout: Duration,
    pub storage_dir: PathBuf,
    pub brand: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            catalog: CatalogLocation::File(PathBuf::from(DEFAULT_CATALOG)),
            catalog_timeout: Duration::from_secs(DEFAULT_CATALOG_TIMEOUT_SECS),
            storage_dir: default_storage_dir(),
            brand: DEFAULT_BRAND.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let seconds = |key: &str, default: u64| -> anyhow::Result<Duration> {
            let secs = match non_empty(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|err| anyhow::anyhow!("{key} must be a whole number: {err}"))?,
                None => default,
            };
            Ok(Duration::from_secs(secs))
        };
        let timeout = seconds("ASSISTANT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let catalog_timeout = seconds("CATALOG_TIMEOUT_SECS", DEFAULT_CATALOG_TIMEOUT_SECS)?;

        let assistant = AssistantConfig {
            endpoint: non_empty("ASSISTANT_ENDPOINT"),
            model: non_empty("ASSISTANT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            web_search: non_empty("ASSISTANT_WEB_SEARCH")
                .map(|raw| parse_flag(&raw))
                .unwrap_or(true),
            api_key: non_empty("ASSISTANT_API_KEY"),
            timeout,
        };

        let catalog = CatalogLocation::parse(
            &non_empty("CATALOG_SOURCE").unwrap_or_else(|| DEFAULT_CATALOG.to_string()),
        );
        let storage_dir = non_empty("ROUTINE_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_dir);
        let brand = non_empty("ROUTINE_BRAND").unwrap_or_else(|| DEFAULT_BRAND.to_string());

        Ok(Self {
            assistant,
            catalog,
            catalog_timeout,
            storage_dir,
            brand,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_dotenv() {
    // First try to load from .env file (desktop dev)
    if dotenvy::dotenv().is_ok() {
        return;
    }

    // Fall back to bundled config (mobile builds)
    load_bundled_config();
}

#[cfg(target_arch = "wasm32")]
pub fn load_dotenv() {
    load_bundled_config();
}

fn load_bundled_config() {
    for (key, value) in parse_env_lines(BUNDLED_CONFIG) {
        // Only set if not already set (allow env override)
        if std::env::var(key).is_err() {
            // SAFETY: called from main before the runtime or any other thread starts
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
}

fn parse_env_lines(source: &str) -> impl Iterator<Item = (&str, &str)> {
    source.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        line.split_once('=')
            .map(|(key, value)| (key.trim(), value.trim()))
    })
}
