use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub proxy: ProxyConfig,

    pub crawler: CrawlerConfig,

    pub search: SearchConfig,

    pub alerts: AlertConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/darkwatch.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Host of the pre-established SOCKS tunnel (Tor or I2P).
    pub socks_host: String,

    pub socks_port: u16,

    /// URL fetched through the tunnel to confirm it is usable.
    pub check_url: String,

    /// Timeout for the readiness check in seconds (default: 10)
    pub check_timeout_seconds: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            socks_host: "127.0.0.1".to_string(),
            socks_port: 9050,
            check_url: "https://check.torproject.org".to_string(),
            check_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Seeds used when a crawl is started without explicit URLs.
    pub default_seeds: Vec<String>,

    pub default_depth: usize,

    pub default_max_pages: usize,

    /// Per-page fetch timeout in seconds (default: 15)
    pub fetch_timeout_seconds: u32,

    /// Pause after every fetched page in milliseconds (default: 1000)
    pub politeness_delay_ms: u64,

    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            default_seeds: vec![
                "http://directory123.onion".to_string(),
                "http://darkwebwiki.i2p".to_string(),
            ],
            default_depth: 1,
            default_max_pages: 50,
            fetch_timeout_seconds: 15,
            politeness_delay_ms: 1000,
            user_agent: "Darkwatch/1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Per-page fetch timeout in seconds (default: 15)
    pub fetch_timeout_seconds: u32,

    pub result_limit: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_seconds: 15,
            result_limit: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Keywords that escalate a search to a high-severity alert.
    pub high_risk_keywords: Vec<String>,

    /// Severity name -> integer urgency (0-10).
    pub severity_levels: HashMap<String, i32>,

    pub query_limit: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        let mut severity_levels = HashMap::new();
        severity_levels.insert("high".to_string(), 8);
        severity_levels.insert("medium".to_string(), 5);
        severity_levels.insert("low".to_string(), 2);

        Self {
            high_risk_keywords: vec![
                "weapons".to_string(),
                "explosives".to_string(),
                "hitman".to_string(),
                "fentanyl".to_string(),
                "counterfeit".to_string(),
                "ransomware".to_string(),
                "fullz".to_string(),
                "cvv dump".to_string(),
            ],
            severity_levels,
            query_limit: 50,
        }
    }
}

impl AlertConfig {
    /// Resolves a severity name against the configured map.
    /// Unknown names fall back to the documented defaults (high=8, medium=5).
    #[must_use]
    pub fn severity_for(&self, name: &str) -> i32 {
        self.severity_levels
            .get(name)
            .copied()
            .unwrap_or(match name {
                "high" => 8,
                _ => 5,
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            proxy: ProxyConfig::default(),
            crawler: CrawlerConfig::default(),
            search: SearchConfig::default(),
            alerts: AlertConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("darkwatch").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".darkwatch").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.proxy.socks_host.is_empty() {
            anyhow::bail!("Proxy host cannot be empty");
        }

        if self.crawler.default_max_pages == 0 {
            anyhow::bail!("Crawler max_pages must be > 0");
        }

        if self.crawler.fetch_timeout_seconds == 0 || self.search.fetch_timeout_seconds == 0 {
            anyhow::bail!("Fetch timeouts must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.proxy.socks_port, 9050);
        assert_eq!(config.crawler.fetch_timeout_seconds, 15);
        assert_eq!(config.alerts.severity_for("high"), 8);
        assert_eq!(config.alerts.severity_for("medium"), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_severity_fallback_for_unknown_name() {
        let mut config = AlertConfig::default();
        config.severity_levels.clear();
        assert_eq!(config.severity_for("high"), 8);
        assert_eq!(config.severity_for("medium"), 5);
        assert_eq!(config.severity_for("whatever"), 5);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[proxy]"));
        assert!(toml_str.contains("[crawler]"));
        assert!(toml_str.contains("[alerts]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [crawler]
            politeness_delay_ms = 250
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.crawler.politeness_delay_ms, 250);

        assert_eq!(config.proxy.socks_port, 9050);
    }
}
