//! Remote model scoring over HTTP.
//!
//! Posts the feedback to an external model server as `{"text": ...}` and
//! expects `{"rating": <int>, "confidence": <float>}` back.

use crate::{ScoringError, ScoringInterface};
use async_trait::async_trait;
use oracle_types::{ConfigSchema, Field, FieldType, Schema, Score};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
	text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
	rating: i64,
	confidence: f64,
}

/// Strategy that delegates scoring to a model server.
pub struct HttpStrategy {
	client: reqwest::Client,
	endpoint: String,
}

impl HttpStrategy {
	pub fn new(endpoint: String, timeout: Option<Duration>) -> Result<Self, ScoringError> {
		let mut builder = reqwest::Client::builder();
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		let client = builder
			.build()
			.map_err(|e| ScoringError::Config(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self { client, endpoint })
	}
}

pub struct HttpStrategySchema;

impl ConfigSchema for HttpStrategySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), oracle_types::ValidationError> {
		Schema::new()
			.field(Field::required("endpoint", FieldType::Url))
			.field(Field::optional(
				"timeout_ms",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			))
			.validate(config)
	}
}

#[async_trait]
impl ScoringInterface for HttpStrategy {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpStrategySchema)
	}

	async fn score(&self, text: &str) -> Result<Score, ScoringError> {
		if text.trim().is_empty() {
			return Err(ScoringError::InvalidInput("empty feedback".to_string()));
		}

		let response = self
			.client
			.post(&self.endpoint)
			.json(&ScoreRequest { text })
			.send()
			.await
			.map_err(|e| ScoringError::Remote(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(ScoringError::Remote(format!(
				"model server returned {}",
				status
			)));
		}

		let body: ScoreResponse = response
			.json()
			.await
			.map_err(|e| ScoringError::MalformedOutput(e.to_string()))?;

		Ok(Score {
			rating: body.rating,
			confidence: body.confidence,
		})
	}
}

/// Configuration parameters:
/// - `endpoint`: URL of the model's scoring route (required)
/// - `timeout_ms`: per-request timeout of the HTTP client
pub fn create_strategy(config: &toml::Value) -> Result<Box<dyn ScoringInterface>, ScoringError> {
	let endpoint = config
		.get("endpoint")
		.and_then(|v| v.as_str())
		.ok_or_else(|| ScoringError::Config("endpoint is required".to_string()))?;

	let timeout = config
		.get("timeout_ms")
		.and_then(|v| v.as_integer())
		.filter(|ms| *ms > 0)
		.map(|ms| Duration::from_millis(ms as u64));

	Ok(Box::new(HttpStrategy::new(endpoint.to_string(), timeout)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{body_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn strategy(server: &MockServer) -> HttpStrategy {
		HttpStrategy::new(format!("{}/score", server.uri()), None).unwrap()
	}

	#[tokio::test]
	async fn test_scores_through_model_server() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/score"))
			.and(body_json(serde_json::json!({ "text": "lovely ride" })))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(serde_json::json!({ "rating": 5, "confidence": 0.93 })),
			)
			.expect(1)
			.mount(&server)
			.await;

		let score = strategy(&server).score("lovely ride").await.unwrap();
		assert_eq!(score.rating, 5);
		assert_eq!(score.confidence, 0.93);
	}

	#[tokio::test]
	async fn test_server_error_is_remote_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500))
			.mount(&server)
			.await;

		assert!(matches!(
			strategy(&server).score("anything").await,
			Err(ScoringError::Remote(_))
		));
	}

	#[tokio::test]
	async fn test_unexpected_body_is_malformed() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(serde_json::json!({ "label": "pos" })),
			)
			.mount(&server)
			.await;

		assert!(matches!(
			strategy(&server).score("anything").await,
			Err(ScoringError::MalformedOutput(_))
		));
	}

	#[test]
	fn test_config_requires_endpoint() {
		let empty = toml::Value::Table(toml::map::Map::new());
		assert!(matches!(
			create_strategy(&empty),
			Err(ScoringError::Config(_))
		));

		let config: toml::Value =
			toml::from_str("endpoint = \"http://localhost:8000/score\"\ntimeout_ms = 500").unwrap();
		assert!(crate::create_strategy("http", &config).is_ok());

		let bad: toml::Value = toml::from_str("endpoint = \"localhost:8000\"").unwrap();
		assert!(crate::create_strategy("http", &bad).is_err());
	}
}
