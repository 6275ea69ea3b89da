//! nationalize.io HTTP provider.

use async_trait::async_trait;
use nationalize_core::{
    CountryProbability, NationalityProvider, NationalizeResult, PersonRecord, UpstreamError,
};
use serde::Deserialize;

use crate::config::UpstreamConfig;
use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics::with_metrics;

/// Payload returned by `GET /?name=...`.
#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    count: Option<i64>,
    #[serde(default)]
    country: Vec<CountryProbability>,
}

/// [`NationalityProvider`] backed by the nationalize.io REST API.
///
/// One GET per call, no retries. Non-success statuses surface as
/// `UpstreamError::Status` so the handler can pass them through.
#[derive(Debug, Clone)]
pub struct NationalizeIoProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NationalizeIoProvider {
    pub fn new(config: &UpstreamConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("nationalize-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_outcome(outcome: &str) {
        with_metrics(|m| m.record_upstream_request(outcome));
    }
}

#[async_trait]
impl NationalityProvider for NationalizeIoProvider {
    fn provider_id(&self) -> &str {
        "nationalize.io"
    }

    async fn predict(&self, name: &str) -> NationalizeResult<PersonRecord> {
        let mut request = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("name", name)]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Self::record_outcome("timeout");
                UpstreamError::Timeout
            } else {
                Self::record_outcome("transport_error");
                UpstreamError::Transport {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        Self::record_outcome(status.as_str());
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Transport {
                    reason: e.to_string(),
                }
            }
        })?;
        let prediction: Prediction =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::InvalidResponse {
                reason: e.to_string(),
            })?;

        tracing::debug!(
            name,
            countries = prediction.country.len(),
            "Received upstream prediction"
        );

        Ok(PersonRecord::new(
            prediction.name.unwrap_or_else(|| name.to_string()),
            prediction.count.unwrap_or(0),
            prediction.country,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_parses_upstream_shape() -> Result<(), serde_json::Error> {
        let body = r#"{"count":22,"name":"vadim","country":[{"country_id":"RU","probability":0.54}]}"#;
        let prediction: Prediction = serde_json::from_str(body)?;
        assert_eq!(prediction.count, Some(22));
        assert_eq!(prediction.name.as_deref(), Some("vadim"));
        assert_eq!(prediction.country, vec![CountryProbability::new("RU", 0.54)]);
        Ok(())
    }

    #[test]
    fn test_prediction_tolerates_missing_fields() -> Result<(), serde_json::Error> {
        let prediction: Prediction = serde_json::from_str("{}")?;
        assert!(prediction.name.is_none());
        assert!(prediction.country.is_empty());
        Ok(())
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() -> ApiResult<()> {
        let provider = NationalizeIoProvider::new(&UpstreamConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..UpstreamConfig::default()
        })?;
        assert_eq!(provider.base_url(), "http://localhost:9000");
        assert_eq!(provider.provider_id(), "nationalize.io");
        Ok(())
    }
}
