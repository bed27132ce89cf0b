use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::evaluation::{CombinedFlagInfo, FlagConfig, TargetingRule};

// Per-request timeout towards the flag/rule sources
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("'{0}' not found")]
    NotFound(String),

    #[error("source returned status {0}")]
    Status(StatusCode),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The two upstream configuration sources, behind a trait so the engine
/// can be exercised without a network.
#[async_trait]
pub trait FlagSources: Send + Sync {
    async fn fetch_flag(&self, name: &str) -> Result<FlagConfig, FetchError>;
    async fn fetch_rule(&self, name: &str) -> Result<TargetingRule, FetchError>;
}

/// HTTP client for the flag source and the targeting (rule) source.
/// Authenticates with a static pre-shared service key — the services are
/// admin APIs and this engine holds a service credential of its own.
#[derive(Clone)]
pub struct HttpSources {
    client: reqwest::Client,
    flag_base_url: String,
    rule_base_url: String,
    service_api_key: String,
}

impl HttpSources {
    pub fn new(flag_base_url: String, rule_base_url: String, service_api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            flag_base_url,
            rule_base_url,
            service_api_key,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        name: &str,
    ) -> Result<T, FetchError> {
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.service_api_key)
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(name.to_string()));
        }
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }

        // A body that doesn't parse is a transport error, same as a timeout
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl FlagSources for HttpSources {
    async fn fetch_flag(&self, name: &str) -> Result<FlagConfig, FetchError> {
        let url = format!("{}/flags/{}", self.flag_base_url, name);
        self.get_json(url, name).await
    }

    async fn fetch_rule(&self, name: &str) -> Result<TargetingRule, FetchError> {
        let url = format!("{}/rules/{}", self.rule_base_url, name);
        self.get_json(url, name).await
    }
}

/// Fetch the flag and its targeting rule concurrently and join on both.
///
/// The two inputs are not equals: a missing flag is fatal (there is nothing
/// to evaluate), while a missing or unreachable rule just means "no
/// segmentation" and degrades to `rule: None`.
pub async fn fetch_combined(
    sources: &dyn FlagSources,
    flag_name: &str,
) -> Result<CombinedFlagInfo, FetchError> {
    let (flag_result, rule_result) =
        tokio::join!(sources.fetch_flag(flag_name), sources.fetch_rule(flag_name));

    let flag = flag_result?;

    let rule = match rule_result {
        Ok(rule) => Some(rule),
        Err(e) => {
            warn!(flag_name, error = %e, "no targeting rule available, using flag state only");
            None
        }
    };

    Ok(CombinedFlagInfo { flag, rule })
}
