use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::Settings;
use crate::error::MeasureError;
use crate::types::MeasurementResult;

pub const ONLY_AUDITS: [&str; 2] = ["first-contentful-paint", "interactive"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRequest<'a> {
    pub url: &'a str,
    pub config: AuditConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditConfig {
    pub extends: &'static str,
    pub settings: AuditSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSettings {
    pub only_audits: [&'static str; 2],
}

impl<'a> StatsRequest<'a> {
    pub fn new(url: &'a str) -> Self {
        Self {
            url,
            config: AuditConfig {
                extends: "lighthouse:default",
                settings: AuditSettings {
                    only_audits: ONLY_AUDITS,
                },
            },
        }
    }
}

/// Anything able to measure a page.
#[allow(async_fn_in_trait)]
pub trait Measurer {
    async fn measure(&self, url: &str) -> Result<MeasurementResult, MeasureError>;
}

/// Client of the stats service, which loads the page and extracts the audits.
#[derive(Debug, Clone)]
pub struct MeasurementClient {
    client: reqwest::Client,
    stats_url: String,
    max_attempts: u32,
    timeout: Duration,
}

impl MeasurementClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: reqwest::Client::new(),
            stats_url: settings.stats_url.clone(),
            max_attempts: settings.max_attempts.max(1),
            timeout: settings.request_timeout,
        }
    }

    async fn measure_once(&self, url: &str) -> Result<MeasurementResult, MeasureError> {
        let network_error = |reason: String| MeasureError::Network {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .post(&self.stats_url)
            .header(CACHE_CONTROL, "no-cache")
            .header(CONTENT_TYPE, "application/json")
            .json(&StatsRequest::new(url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| network_error(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(network_error(format!("unexpected status {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| network_error(err.to_string()))?;

        debug!(url, bytes = bytes.len(), "measurement received");

        parse_measurement(url, &bytes)
    }
}

impl Measurer for MeasurementClient {
    async fn measure(&self, url: &str) -> Result<MeasurementResult, MeasureError> {
        let mut attempt = 1;
        loop {
            match self.measure_once(url).await {
                Err(err) if should_retry(&err, attempt, self.max_attempts) => {
                    warn!(url, attempt, "measurement failed, retrying: {err}");
                    attempt += 1;
                }
                Err(err) => {
                    error!(url, attempt, "measurement failed: {err}");
                    return Err(err);
                }
                Ok(result) => return Ok(result),
            }
        }
    }
}

fn should_retry(err: &MeasureError, attempt: u32, max_attempts: u32) -> bool {
    err.is_retryable() && attempt < max_attempts
}

pub fn parse_measurement(url: &str, bytes: &[u8]) -> Result<MeasurementResult, MeasureError> {
    serde_json::from_slice(bytes).map_err(|err| MeasureError::MalformedResponse {
        url: url.to_string(),
        reason: err.to_string(),
    })
}
