// Catalog configuration
// Defaults overlaid with CATALOG_* environment variables

use std::path::PathBuf;

use crate::catalog::http_source::HttpSourceConfig;
use crate::discovery::FilterMode;

pub const DEFAULT_API_URL: &str = "https://altrion-server.vercel.app";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ADMIN_EMAILS: [&str; 2] = ["admin@altrion.com", "demo@altrion.com"];

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub cache_path: PathBuf,
    pub cache_enabled: bool,
    pub filter_mode: FilterMode,
    pub admin_emails: Vec<String>,
    pub development_override: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_path: default_cache_path(),
            cache_enabled: true,
            filter_mode: FilterMode::Server,
            admin_emails: DEFAULT_ADMIN_EMAILS.iter().map(|e| e.to_string()).collect(),
            development_override: false,
        }
    }
}

fn default_cache_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("course-catalog")
        .join("catalog.db")
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl CatalogConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CATALOG_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                log::warn!("CATALOG_API_URL is empty, using {}", config.base_url);
            } else {
                config.base_url = url.to_string();
            }
        }

        if let Some(value) = lookup("CATALOG_TIMEOUT_SECS") {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => log::warn!(
                    "Invalid CATALOG_TIMEOUT_SECS '{}', using {}",
                    value,
                    config.timeout_secs
                ),
            }
        }

        if let Some(path) = lookup("CATALOG_CACHE_PATH") {
            if !path.trim().is_empty() {
                config.cache_path = PathBuf::from(path.trim());
            }
        }

        if let Some(value) = lookup("CATALOG_CACHE") {
            match parse_flag(&value) {
                Some(enabled) => config.cache_enabled = enabled,
                None => log::warn!("Invalid CATALOG_CACHE '{}', cache stays enabled", value),
            }
        }

        if let Some(value) = lookup("CATALOG_FILTER_MODE") {
            match value.parse::<FilterMode>() {
                Ok(mode) => config.filter_mode = mode,
                Err(e) => log::warn!("{}, using {:?}", e, config.filter_mode),
            }
        }

        if let Some(value) = lookup("CATALOG_ADMIN_EMAILS") {
            config.admin_emails = value
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(value) = lookup("CATALOG_DEV_ADMIN") {
            match parse_flag(&value) {
                Some(enabled) => config.development_override = enabled,
                None => log::warn!("Invalid CATALOG_DEV_ADMIN '{}', override stays off", value),
            }
        }

        config
    }

    pub fn http_source_config(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}
