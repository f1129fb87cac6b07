//! Configuration loading.
//!
//! Settings come from an optional TOML file, then from the environment:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `DATABASE_URL` | replaces `[db].url` |
//! | `PORT` | replaces the port of `[server].bind` |
//!
//! A `.env` file in the working directory is loaded first when present.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// sqlx connection string, e.g. `sqlite://data/contacts.sqlite`.
    #[serde(default = "default_db_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_db_url() -> String {
    "sqlite://data/contacts.sqlite".to_string()
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}
fn default_cache_ttl() -> u64 {
    30
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("server.bind is not a socket address: {}", self.bind))
    }
}

/// Load configuration from `path` (when given) and the process environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let _ = dotenvy::dotenv();

    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse config file")?
        }
        None => Config::default(),
    };

    apply_env_overrides(
        &mut config,
        std::env::var("DATABASE_URL").ok(),
        std::env::var("PORT").ok(),
    )?;
    validate(&config)?;
    Ok(config)
}

/// Apply `DATABASE_URL` / `PORT` values on top of file settings.
pub fn apply_env_overrides(
    config: &mut Config,
    database_url: Option<String>,
    port: Option<String>,
) -> Result<()> {
    if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
        config.db.url = url;
    }

    if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("PORT must be a number between 0 and 65535, got: {}", port))?;
        let mut addr = config.server.socket_addr()?;
        addr.set_port(port);
        config.server.bind = addr.to_string();
    }

    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    if config.db.url.trim().is_empty() {
        bail!("db.url must not be empty");
    }
    if config.db.max_connections == 0 {
        bail!("db.max_connections must be >= 1");
    }
    config.server.socket_addr()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.db.url, "sqlite://data/contacts.sqlite");
        assert_eq!(config.server.bind, "0.0.0.0:5000");
        assert!(config.cache.enabled);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[server]
bind = "127.0.0.1:8080"

[cache]
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.db.max_connections, 5);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 30);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            Some("sqlite::memory:".to_string()),
            Some("7000".to_string()),
        )
        .unwrap();
        assert_eq!(config.db.url, "sqlite::memory:");
        assert_eq!(config.server.bind, "0.0.0.0:7000");
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = Config::default();
        let err = apply_env_overrides(&mut config, None, Some("http".to_string())).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[db]\nurl = \"sqlite://file.sqlite\"\nmax_connections = 0").unwrap();
        let err = load_config(Some(file.path()));
        // DATABASE_URL may be set by the environment, but max_connections = 0 always fails
        assert!(err.is_err());
    }
}
