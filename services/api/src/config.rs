use anyhow::{anyhow, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub storage: StorageBackend,
    pub conf_api_url: String,
    pub conf_rates_path: String,
    pub conf_health_path: String,
    pub conf_timeout: Duration,
    pub reconcile_grace: Duration,
    pub reconcile_interval: Duration,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let storage = match env_or("STORAGE_BACKEND", "postgres").as_str() {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => return Err(anyhow!("Unknown STORAGE_BACKEND: {}", other)),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set for the postgres backend"));
        }

        let conf_api_url = std::env::var("CONF_API_URL").context("CONF_API_URL must be set")?;
        url::Url::parse(&conf_api_url).context("CONF_API_URL must be an absolute URL")?;

        let config = Self {
            port: env_or("PORT", "3000").parse().context("PORT")?,
            database_url,
            storage,
            conf_api_url,
            conf_rates_path: env_or("CONF_RATES_PATH", conf_client::DEFAULT_RATES_PATH),
            conf_health_path: env_or("CONF_HEALTH_PATH", conf_client::DEFAULT_HEALTH_PATH),
            conf_timeout: secs("CONF_TIMEOUT_SECS", 30)?,
            reconcile_grace: secs("RECONCILE_GRACE_SECS", 60)?,
            reconcile_interval: secs("RECONCILE_INTERVAL_SECS", 300)?,
            environment: env_or("ENVIRONMENT", "development"),
        };
        config.validate()?;
        Ok(config)
    }

    /// A request may still be waiting on conf for up to `conf_timeout`, so
    /// reconciliation must not treat its intent as abandoned before then.
    pub fn validate(&self) -> Result<()> {
        if self.reconcile_grace <= self.conf_timeout {
            return Err(anyhow!(
                "RECONCILE_GRACE_SECS ({}) must exceed CONF_TIMEOUT_SECS ({})",
                self.reconcile_grace.as_secs(),
                self.conf_timeout.as_secs()
            ));
        }
        Ok(())
    }

    pub fn conf_settings(&self) -> conf_client::ConfSettings {
        conf_client::ConfSettings {
            base_url: self.conf_api_url.clone(),
            rates_path: self.conf_rates_path.clone(),
            health_path: self.conf_health_path.clone(),
            timeout: self.conf_timeout,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secs(key: &str, default: u64) -> Result<Duration> {
    let value = env_or(key, &default.to_string())
        .parse()
        .with_context(|| format!("{} must be a number of seconds", key))?;
    Ok(Duration::from_secs(value))
}
