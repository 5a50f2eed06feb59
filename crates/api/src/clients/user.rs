//! HTTP client for the user service.

use std::time::Duration;

use async_trait::async_trait;
use domain::{CustomerId, UserEnrichmentClient, UserSummary};
use reqwest::StatusCode;
use serde::Deserialize;

/// Response envelope used by the user service.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
}

/// Looks users up over HTTP at `GET {base_url}/users/{id}`.
///
/// Every failure mode (timeout, refused connection, non-2xx, malformed body)
/// yields `None`; there is no retry.
#[derive(Debug, Clone)]
pub struct HttpUserClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserClient {
    /// Builds a client whose requests are bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl UserEnrichmentClient for HttpUserClient {
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, customer_id: CustomerId) -> Option<UserSummary> {
        let url = format!("{}/users/{}", self.base_url, customer_id);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, timeout = err.is_timeout(), "user service unreachable");
                return None;
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("user not found");
            return None;
        }
        if !status.is_success() {
            tracing::warn!(%status, "user service returned an error");
            return None;
        }

        match response.json::<ApiEnvelope<UserSummary>>().await {
            Ok(envelope) => {
                if envelope.data.is_none() {
                    tracing::debug!("user service response carried no data");
                }
                envelope.data
            }
            Err(err) => {
                tracing::warn!(error = %err, "undecodable user service response");
                None
            }
        }
    }
}
