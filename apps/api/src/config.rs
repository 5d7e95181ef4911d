use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev/v0";

/// Key values that mean "no key was really configured".
const PLACEHOLDER_API_KEYS: [&str; 2] = ["demo_key", "your_firecrawl_api_key_here"];

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub scraper: ScraperConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            scraper: ScraperConfig::from_env()?,
        })
    }
}

/// How the scrape client picks between the live service and demo fixtures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScraperMode {
    /// Demo when no usable key is configured, live otherwise.
    #[default]
    Auto,
    Demo,
    Live,
}

impl FromStr for ScraperMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(ScraperMode::Auto),
            "demo" => Ok(ScraperMode::Demo),
            "live" => Ok(ScraperMode::Live),
            other => Err(anyhow!("SCRAPER_MODE must be auto, demo or live (got '{other}')")),
        }
    }
}

/// Settings for the external scrape/crawl service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub mode: ScraperMode,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_FIRECRAWL_API_URL.to_string(),
            mode: ScraperMode::Auto,
        }
    }
}

impl ScraperConfig {
    pub fn from_env() -> Result<Self> {
        Ok(ScraperConfig {
            api_key: std::env::var("FIRECRAWL_API_KEY").ok(),
            base_url: std::env::var("FIRECRAWL_API_URL")
                .unwrap_or_else(|_| DEFAULT_FIRECRAWL_API_URL.to_string()),
            mode: std::env::var("SCRAPER_MODE")
                .unwrap_or_default()
                .parse()?,
        })
    }

    #[cfg(test)]
    pub fn live(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: base_url.into(),
            mode: ScraperMode::Live,
        }
    }

    #[cfg(test)]
    pub fn demo() -> Self {
        Self {
            mode: ScraperMode::Demo,
            ..Default::default()
        }
    }

    /// The configured key, unless it is missing, blank or a placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !PLACEHOLDER_API_KEYS.contains(k))
    }

    pub fn is_demo(&self) -> bool {
        match self.mode {
            ScraperMode::Demo => true,
            ScraperMode::Live => false,
            ScraperMode::Auto => self.usable_api_key().is_none(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
