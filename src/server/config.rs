//! Server configuration, loaded from an optional YAML file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;
use crate::ident::is_valid_identifier;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Database schema holding the tables served as layers.
    #[serde(default = "default_db_schema")]
    pub db_schema: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_db_schema() -> String {
    "public".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_schema: default_db_schema(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parses a YAML config document. Missing keys take their defaults.
    pub fn from_yaml(data: &str) -> Result<ServerConfig, Error> {
        let config: ServerConfig = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<ServerConfig, Error> {
        let data = std::fs::read_to_string(path)?;
        ServerConfig::from_yaml(&data)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !is_valid_identifier(&self.db_schema) {
            return Err(Error::InvalidConfig(format!(
                "db_schema {:?} is not a plain identifier",
                self.db_schema
            )));
        }
        if self.max_connections == 0 {
            return Err(Error::InvalidConfig(String::from(
                "max_connections must be at least 1",
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}
