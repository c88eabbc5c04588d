use crate::error::{AppError, Result};
use crate::models::Coordinates;
use crate::services::providers::PopularityScorer;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scores a path against an external heatmap-style popularity service.
#[derive(Clone)]
pub struct HttpPopularityScorer {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpPopularityScorer {
    pub fn new(endpoint: String) -> Self {
        HttpPopularityScorer {
            client: Client::new(),
            endpoint,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct PopularityRequest<'a> {
    coordinates: &'a [Coordinates],
}

#[derive(Debug, Deserialize)]
struct PopularityResponse {
    score: f64,
}

#[async_trait]
impl PopularityScorer for HttpPopularityScorer {
    async fn score(&self, coordinates: &[Coordinates]) -> Result<f64> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&PopularityRequest { coordinates })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!("popularity scoring after {:?}", self.timeout))
                } else {
                    AppError::PopularityApi(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::PopularityApi(format!("HTTP {}", status)));
        }

        let body: PopularityResponse = response
            .json()
            .await
            .map_err(|e| AppError::PopularityApi(format!("Failed to parse response: {}", e)))?;

        Ok(clamp_score(body.score))
    }
}

/// Used when no popularity service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPopularityScorer;

#[async_trait]
impl PopularityScorer for NoPopularityScorer {
    async fn score(&self, _coordinates: &[Coordinates]) -> Result<f64> {
        Ok(0.0)
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
