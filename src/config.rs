use std::env;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_page_size: u64,
    pub rate_limit_replenish_seconds: u64,
    pub rate_limit_burst: u32,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parse_var("SERVER_PORT", 3000)?,
            max_page_size: parse_var("MAX_PAGE_SIZE", 10_000)?,
            rate_limit_replenish_seconds: parse_var("RATE_LIMIT_REPLENISH_SECONDS", 2)?,
            rate_limit_burst: parse_var("RATE_LIMIT_BURST", 100)?,
            seed_demo_data: parse_var("SEED_DEMO_DATA", false)?,
        })
    }

    /// Configuration pointing at the given database with every other value defaulted.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            max_page_size: 10_000,
            rate_limit_replenish_seconds: 2,
            rate_limit_burst: 100,
            seed_demo_data: false,
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr() {
        let mut config = Config::with_database_url("sqlite::memory:");
        config.server_host = "0.0.0.0".to_string();
        config.server_port = 8080;
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_parse_var_defaults_when_unset() {
        let value: u64 = parse_var("WORLD_CITIES_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
