use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error as ThisError;

pub const CONFIG_FILE: &str = "credentials.toml";
pub const ENV_PREFIX: &str = "CREDENTIALS_";

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("Configuration extract error: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("database.url must not be empty")]
    EmptyDatabaseUrl,

    #[error("database.max_connections must be at least 1, got {0}")]
    InvalidMaxConnections(u32),

    #[error("database.query_timeout_secs must be at least 1, got {0}")]
    InvalidQueryTimeout(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    /// Reported by the healthcheck (development, staging, production).
    pub environment: String,
    pub loglevel: String,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:4000".to_string(),
            environment: "development".to_string(),
            loglevel: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub max_idle_secs: u64,
    /// Upper bound for every single store operation.
    pub query_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:credentials.db".to_string(),
            max_connections: 25,
            max_idle_secs: 15 * 60,
            query_timeout_secs: 3,
        }
    }
}

impl DatabaseConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn max_idle(&self) -> Duration {
        Duration::from_secs(self.max_idle_secs)
    }
}

impl Config {
    /// Defaults, then `credentials.toml`, then `CREDENTIALS_*` env vars
    /// (`CREDENTIALS_DATABASE__URL` sets `database.url`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let cfg: Config = figment.extract().map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                self.database.max_connections,
            ));
        }
        if self.database.query_timeout_secs == 0 {
            return Err(ConfigError::InvalidQueryTimeout(
                self.database.query_timeout_secs,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_three_second_query_timeout() {
        let cfg = Config::default();
        assert_eq!(cfg.database.query_timeout(), Duration::from_secs(3));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn toml_overrides_defaults() {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                environment = "staging"

                [database]
                url = "sqlite::memory:"
                query_timeout_secs = 7
                "#,
            ));
        let cfg = Config::from_figment(figment).expect("config should load");
        assert_eq!(cfg.basic.environment, "staging");
        assert_eq!(cfg.basic.loglevel, "info");
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.database.query_timeout_secs, 7);
        assert_eq!(cfg.database.max_connections, 25);
    }

    #[test]
    fn invalid_env_value_fails_load() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CREDENTIALS_DATABASE__QUERY_TIMEOUT_SECS", "0");
            let err = Config::load().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidQueryTimeout(0)));
            Ok(())
        });
    }

    #[test]
    fn malformed_config_file_fails_load() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[database\nurl = ")?;
            assert!(matches!(Config::load(), Err(ConfigError::Extract(_))));
            Ok(())
        });
    }

    #[test]
    fn config_file_and_env_are_layered() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[database]\nurl = \"sqlite:from-file.db\"")?;
            jail.set_env("CREDENTIALS_BASIC__ENVIRONMENT", "production");
            let cfg = Config::load().expect("config should load");
            assert_eq!(cfg.database.url, "sqlite:from-file.db");
            assert_eq!(cfg.basic.environment, "production");
            Ok(())
        });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string("[database]\nquery_timeout_secs = 0"));
        let err = Config::from_figment(figment).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQueryTimeout(0)));
    }
}
