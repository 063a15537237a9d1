use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Origins allowed by CORS. Empty allows any origin.
    pub allowed_origins: Vec<String>,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory; profile pictures land in `<path>/profile_pics`.
    pub path: String,
    pub max_upload_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            allowed_origins: Vec::new(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://blog.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./media".to_string(),
            max_upload_size: 5 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        if config.storage.max_upload_size == 0 {
            anyhow::bail!("storage.max_upload_size must be greater than zero");
        }
        Ok(config)
    }

    pub fn app_config(&self) -> blog_core::AppConfig {
        blog_core::AppConfig {
            storage_path: self.storage.path.clone(),
            max_upload_size: self.storage.max_upload_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8000");
        assert_eq!(config.database.url, "sqlite://blog.db");
        assert_eq!(config.storage.max_upload_size, 5 * 1024 * 1024);
        assert_eq!(config.server.log_format, LogFormat::Pretty);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [server]
            bind_address = "0.0.0.0:9000"
            allowed_origins = ["https://blog.example.com"]
            log_format = "json"

            [storage]
            path = "/var/lib/blog"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.server.allowed_origins, vec!["https://blog.example.com"]);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.storage.path, "/var/lib/blog");
        assert_eq!(config.storage.max_upload_size, 5 * 1024 * 1024);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn rejects_zero_upload_limit() {
        assert!(Config::parse("[storage]\nmax_upload_size = 0\n").is_err());
        assert!(Config::parse("[server]\nlog_format = \"xml\"\n").is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let config = Config::load(Path::new("/nonexistent/blog/config.toml")).unwrap();
        assert_eq!(config.storage.path, "./media");
    }
}
