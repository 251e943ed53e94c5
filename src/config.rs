use std::env;
use std::time::Duration;

use crate::idempotency::{DEFAULT_LOCK_TTL, DEFAULT_PROCESSED_TTL};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Separate file so lock/marker churn never contends with payment writes
    pub coordination_database_path: String,
    pub webhook_secret: String,
    pub lock_ttl: Duration,
    pub processed_ttl: Duration,
    pub coordination_purge_interval: Duration,
    pub dev_mode: bool,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    ///
    /// Fails when `WEBHOOK_SECRET` is missing or empty; every other setting has a default.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dev_mode = lookup("PAYGUARD_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let webhook_secret = lookup("WEBHOOK_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "WEBHOOK_SECRET must be set to a non-empty value".to_string())?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let lock_ttl = lookup("LOCK_TTL_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LOCK_TTL);

        let processed_ttl = lookup("PROCESSED_TTL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PROCESSED_TTL);

        let coordination_purge_interval = lookup("COORDINATION_PURGE_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5 * 60));

        Ok(Self {
            host,
            port,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "payguard.db".to_string()),
            coordination_database_path: lookup("COORDINATION_DATABASE_PATH")
                .unwrap_or_else(|| "payguard_coordination.db".to_string()),
            webhook_secret,
            lock_ttl,
            processed_ttl,
            coordination_purge_interval,
            dev_mode,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
