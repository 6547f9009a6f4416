//! HTTP exam-mode oracle client

use async_trait::async_trait;
use clustermap_util::Hostname;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{ExamModeOracle, OracleError, OracleResult};

/// Path of the exam-mode endpoint, relative to the oracle's base URL
pub const EXAM_MODE_HOSTS_PATH: &str = "/api/exam_mode_hosts";

/// Configuration for the HTTP oracle client
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Base URL, e.g. `https://clusterdata.codam.nl`
    pub base_url: String,
    /// Deadline for the whole request, body included
    pub timeout: Duration,
    /// Bearer token, if the oracle requires one
    pub token: Option<String>,
    /// Domain appended to short hostnames
    pub domain: Option<String>,
}

/// Body returned by the oracle: either a host list or an error
#[derive(Debug, Deserialize)]
struct ExamModePayload {
    exam_mode_hosts: Option<Vec<String>>,
    error: Option<String>,
}

impl From<reqwest::Error> for OracleError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            OracleError::Status(status.as_u16())
        } else {
            OracleError::Transport(e.to_string())
        }
    }
}

/// Oracle client talking to the remote exam-mode service
pub struct HttpOracle {
    client: Client,
    endpoint: String,
    timeout: Duration,
    token: Option<String>,
    domain: Option<String>,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> OracleResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::Setup(e.to_string()))?;

        let endpoint = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            EXAM_MODE_HOSTS_PATH
        );

        Ok(Self {
            client,
            endpoint,
            timeout: config.timeout,
            token: config.token,
            domain: config.domain,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query the oracle, surfacing every failure
    pub async fn try_fetch(&self) -> OracleResult<Vec<String>> {
        debug!(url = %self.endpoint, "Fetching hosts in exam mode");

        let mut request = self.client.get(&self.endpoint);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let body = tokio::time::timeout(self.timeout, async {
            let response = request.send().await.map_err(|e| self.classify(e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(OracleError::Status(status.as_u16()));
            }
            response.bytes().await.map_err(|e| self.classify(e))
        })
        .await
        .map_err(|_| OracleError::Timeout(self.timeout))??;

        parse_payload(&body)
    }

    fn classify(&self, e: reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.timeout)
        } else {
            e.into()
        }
    }
}

#[async_trait]
impl ExamModeOracle for HttpOracle {
    async fn fetch_exam_mode_hostnames(&self) -> Vec<Hostname> {
        match self.try_fetch().await {
            Ok(raw) => {
                let total = raw.len();
                let hosts: Vec<Hostname> = raw
                    .iter()
                    .filter_map(|h| Hostname::normalize(h, self.domain.as_deref()))
                    .collect();
                debug!(reported = total, usable = hosts.len(), "Fetched hosts in exam mode");
                hosts
            }
            Err(e) => {
                warn!(url = %self.endpoint, error = %e, "Failed to fetch hosts in exam mode");
                Vec::new()
            }
        }
    }
}

/// Decode an oracle response body
pub fn parse_payload(body: &[u8]) -> OracleResult<Vec<String>> {
    let payload: ExamModePayload =
        serde_json::from_slice(body).map_err(|e| OracleError::Malformed(e.to_string()))?;

    if let Some(error) = payload.error {
        return Err(OracleError::Reported(error));
    }

    payload
        .exam_mode_hosts
        .ok_or_else(|| OracleError::Malformed("missing exam_mode_hosts".into()))
}
