use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingSecret,
    #[error("PORT must be a port number, got {0:?}")]
    BadPort(String),
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub movies_seed: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::MissingSecret)?;
        let port = match lookup("PORT") {
            Some(port) => port.parse().map_err(|_| ConfigError::BadPort(port))?,
            None => 8080,
        };
        Ok(Config {
            jwt_secret,
            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| "cinevault.db".to_owned())
                .into(),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
            movies_seed: lookup("MOVIES_SEED").map(PathBuf::from),
        })
    }
}
