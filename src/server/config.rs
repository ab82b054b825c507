use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub secure_cookies: bool,
    pub bcrypt_cost: u32,
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    listen_addr: Option<String>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    token_ttl_hours: Option<i64>,
    secure_cookies: Option<bool>,
    bcrypt_cost: Option<u32>,
    log_dir: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

fn parse_env<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { key, value: raw })
        })
        .transpose()
}

impl PartialServerConfig {
    fn from_file(path_str: &str) -> Result<Self, ConfigError> {
        let path = Path::new(path_str);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path_str.to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_str.to_string(),
            source,
        })
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            listen_addr: lookup("LISTEN_ADDR"),
            database_url: lookup("DATABASE_URL"),
            jwt_secret: lookup("JWT_SECRET"),
            token_ttl_hours: parse_env("TOKEN_TTL_HOURS", lookup("TOKEN_TTL_HOURS"))?,
            secure_cookies: parse_env("SECURE_COOKIES", lookup("SECURE_COOKIES"))?,
            bcrypt_cost: parse_env("BCRYPT_COST", lookup("BCRYPT_COST"))?,
            log_dir: lookup("LOG_DIR"),
        })
    }
}

impl ServerConfig {
    /// Loads `.env`, then the optional TOML file, then the process environment.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Environment values (from `lookup`) override file values.
    pub fn load_with(
        config_path: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path) => PartialServerConfig::from_file(path)?,
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config = PartialServerConfig::from_lookup(lookup)?;

        // 3. Merge: environment overrides file
        let config = ServerConfig {
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            jwt_secret: env_config
                .jwt_secret
                .or(file_config.jwt_secret)
                .ok_or(ConfigError::Missing("JWT_SECRET"))?,
            token_ttl_hours: env_config
                .token_ttl_hours
                .or(file_config.token_ttl_hours)
                .unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
            secure_cookies: env_config
                .secure_cookies
                .or(file_config.secure_cookies)
                .unwrap_or(true),
            bcrypt_cost: env_config
                .bcrypt_cost
                .or(file_config.bcrypt_cost)
                .unwrap_or(bcrypt::DEFAULT_COST),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
        };

        if config.token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "TOKEN_TTL_HOURS",
                value: config.token_ttl_hours.to_string(),
            });
        }
        if !(4..=31).contains(&config.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                key: "BCRYPT_COST",
                value: config.bcrypt_cost.to_string(),
            });
        }

        Ok(config)
    }
}
