//! Reads substance concentrations from a Prometheus-compatible HTTP API.
//!
//! Each substance is fetched with an instant query built from the configured
//! template. An empty result vector means the backend has no sample for the
//! substance right now; any other shape we don't recognise is a hard failure.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::json;

use super::traits::{MetricsSourceError, ReadingSource};
use crate::{
    config::MetricsConfig,
    models::{Reading, SubstanceId},
    template::TemplateService,
};

/// Response envelope of `GET /api/v1/query`.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    result: Vec<InstantSample>,
}

/// One series of an instant vector: `[<unix time>, "<value>"]`.
#[derive(Debug, Deserialize)]
struct InstantSample {
    value: (f64, String),
}

/// A [`ReadingSource`] backed by the Prometheus instant-query endpoint.
pub struct PrometheusReadingSource {
    client: Arc<ClientWithMiddleware>,
    query_url: String,
    query_template: String,
    templates: TemplateService,
}

impl PrometheusReadingSource {
    /// Creates a reading source for the configured backend.
    pub fn new(
        config: &MetricsConfig,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, MetricsSourceError> {
        let templates = TemplateService::new();
        templates
            .validate(&config.query_template)
            .map_err(|e| MetricsSourceError::Query(e.to_string()))?;

        let query_url = format!("{}/api/v1/query", config.url.as_str().trim_end_matches('/'));
        Ok(Self { client, query_url, query_template: config.query_template.clone(), templates })
    }

    fn build_query(&self, substance_id: SubstanceId) -> Result<String, MetricsSourceError> {
        self.templates
            .render(&self.query_template, json!({ "id": substance_id }))
            .map_err(|e| MetricsSourceError::Query(e.to_string()))
    }

    fn parse_response(
        substance_id: SubstanceId,
        body: &[u8],
    ) -> Result<Reading, MetricsSourceError> {
        let malformed =
            |reason: String| MetricsSourceError::MalformedResponse { substance_id, reason };

        let response: QueryResponse =
            serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))?;

        if response.status != "success" {
            return Err(MetricsSourceError::QueryFailed {
                substance_id,
                message: response.error.unwrap_or(response.status),
            });
        }

        let data = response.data.ok_or_else(|| malformed("missing 'data'".to_string()))?;
        let Some(sample) = data.result.first() else {
            return Ok(Reading::NoData);
        };

        let raw = &sample.value.1;
        let value: f64 =
            raw.parse().map_err(|_| malformed(format!("value '{raw}' is not a number")))?;
        Reading::from_raw(value).ok_or_else(|| malformed(format!("value '{raw}' is not finite")))
    }
}

#[async_trait]
impl ReadingSource for PrometheusReadingSource {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch(&self, substance_id: SubstanceId) -> Result<Reading, MetricsSourceError> {
        let query = self.build_query(substance_id)?;

        let response =
            self.client.get(&self.query_url).query(&[("query", query.as_str())]).send().await?;
        let status = response.status();
        let body = response.bytes().await.map_err(reqwest_middleware::Error::from)?;

        let reading = Self::parse_response(substance_id, &body);
        match &reading {
            Ok(reading) => tracing::debug!(substance_id, %status, ?reading, "Fetched reading."),
            Err(e) => {
                tracing::warn!(substance_id, %status, error = %e, "Unusable metrics response.")
            }
        }
        reading
    }
}
