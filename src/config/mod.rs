use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Fixed login pairs, compared by exact equality
    #[serde(default = "default_users")]
    pub users: Vec<UserCredential>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
        }
    }
}

#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct UserCredential {
    pub username: String,
    pub password: String,
}

impl UserCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub fn default_users() -> Vec<UserCredential> {
    vec![UserCredential::new("admin", "admin123")]
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Start with the two demo materials instead of an empty list
    #[serde(default = "default_seed")]
    pub seed: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

fn default_seed() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics at /metrics
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse configuration file")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would leave nobody able to log in
    pub fn validate(&self) -> Result<()> {
        if self.auth.users.is_empty() {
            bail!("[auth] must define at least one user");
        }
        if self.auth.users.iter().any(|u| u.username.is_empty()) {
            bail!("[auth] usernames must not be empty");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.users, default_users());
        assert!(config.inventory.seed);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
            [server]
            port = 9000

            [inventory]
            seed = false

            [[auth.users]]
            username = "clerk"
            password = "hunter2"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.inventory.seed);
        assert_eq!(config.auth.users, vec![UserCredential::new("clerk", "hunter2")]);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_parse_rejects_empty_user_list() {
        let err = Config::parse("[auth]\nusers = []\n").unwrap_err();
        assert!(err.to_string().contains("at least one user"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", UserCredential::new("admin", "admin123"));
        assert!(!rendered.contains("admin123"));
    }
}
