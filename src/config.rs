use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Warehouse SQL API
    pub account_url: String,
    pub token: String,
    pub token_type: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub statement_timeout_seconds: u64,
    pub poll_interval_ms: u64,
    pub max_polls: u32,

    /// Render and record statements without reaching the warehouse
    pub dry_run: bool,

    // Server
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        let dry_run = parse_bool("DRY_RUN", false)?;

        // Credentials are only mandatory when statements actually leave the process
        let required = |key: &'static str| -> Result<String, ConfigError> {
            match env::var(key) {
                Ok(value) if !value.trim().is_empty() => Ok(value),
                _ if dry_run => Ok(String::new()),
                _ => Err(ConfigError::Missing(key)),
            }
        };

        Ok(Self {
            // Warehouse SQL API
            account_url: required("SNOWFLAKE_ACCOUNT_URL")?
                .trim_end_matches('/')
                .to_string(),
            token: required("SNOWFLAKE_TOKEN")?,
            token_type: env::var("SNOWFLAKE_TOKEN_TYPE").unwrap_or_else(|_| "OAUTH".to_string()),
            database: optional("SNOWFLAKE_DATABASE"),
            schema: optional("SNOWFLAKE_SCHEMA"),
            warehouse: optional("SNOWFLAKE_WAREHOUSE"),
            role: optional("SNOWFLAKE_ROLE"),
            statement_timeout_seconds: env::var("SNOWFLAKE_STATEMENT_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("SNOWFLAKE_STATEMENT_TIMEOUT_SECONDS"))?,
            poll_interval_ms: env::var("SNOWFLAKE_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("SNOWFLAKE_POLL_INTERVAL_MS"))?,
            max_polls: env::var("SNOWFLAKE_MAX_POLLS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("SNOWFLAKE_MAX_POLLS"))?,

            dry_run,

            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
        })
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// HTTP client timeout: the statement timeout plus some slack for the round-trip
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_seconds + 10)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}
