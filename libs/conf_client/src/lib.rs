//! HTTP client for the telephony configuration service ("conf API").
//!
//! The conf service regenerates switch configuration for a rate when told its
//! name and the kind of change. It answers `{state, log}`; only
//! `state == "OK" && log == "Complete"` counts as confirmation.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_RATES_PATH: &str = "/rates.php";
pub const DEFAULT_HEALTH_PATH: &str = "/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ConfError {
    #[error("Conf request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Conf URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Conf service answered with status {0}")]
    Status(StatusCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Serialize)]
struct ConfRequest<'a> {
    action: ConfAction,
    name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfResponse {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub log: String,
}

impl ConfResponse {
    pub fn is_complete(&self) -> bool {
        self.state == "OK" && self.log == "Complete"
    }
}

/// Where the conf service lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ConfSettings {
    pub base_url: String,
    pub rates_path: String,
    pub health_path: String,
    pub timeout: Duration,
}

impl ConfSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            rates_path: DEFAULT_RATES_PATH.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub fn create_client(settings: &ConfSettings) -> Result<ConfClient, ConfError> {
    let base = Url::parse(&settings.base_url)?;
    let client = Client::builder().timeout(settings.timeout).build()?;

    Ok(ConfClient {
        client,
        rates_url: endpoint(&base, &settings.rates_path)?,
        health_url: endpoint(&base, &settings.health_path)?,
    })
}

/// Join `path` under `base` without discarding a path prefix already on `base`.
fn endpoint(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
}

#[derive(Clone)]
pub struct ConfClient {
    client: Client,
    rates_url: Url,
    health_url: Url,
}

impl ConfClient {
    /// Connectivity pre-check gating every mutating operation.
    pub async fn check_connection(&self) -> bool {
        match self.client.get(self.health_url.clone()).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = %response.status(), "conf service health check failed");
                false
            }
            Err(err) => {
                warn!(error = %err, "conf service unreachable");
                false
            }
        }
    }

    pub async fn call_rates(
        &self,
        action: ConfAction,
        name: &str,
    ) -> Result<ConfResponse, ConfError> {
        debug!(?action, name, "calling conf rates endpoint");

        let response = self
            .client
            .post(self.rates_url.clone())
            .json(&ConfRequest { action, name })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfError::Status(status));
        }

        Ok(response.json::<ConfResponse>().await?)
    }
}
