//! Feedback scoring for the rating oracle.
//!
//! A scoring strategy turns rider feedback into a driver rating. Strategies
//! are pluggable and allowed to fail: [`ScoringService`] bounds every call
//! with a timeout and substitutes the neutral rating whenever the strategy
//! errors, stalls or answers with something unusable.

use async_trait::async_trait;
use oracle_types::{clamp_rating, ConfigSchema, Score, ScoreResult};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Re-export implementations
pub mod implementations {
	pub mod http;
	pub mod lexicon;
}

/// Errors that can occur while scoring feedback.
#[derive(Debug, Error)]
pub enum ScoringError {
	/// The feedback cannot be scored (empty, whitespace only).
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	/// A remote model could not be reached or answered with an error.
	#[error("Remote error: {0}")]
	Remote(String),
	/// The strategy answered with an unusable result.
	#[error("Malformed output: {0}")]
	MalformedOutput(String),
	/// The strategy configuration is invalid.
	#[error("Configuration error: {0}")]
	Config(String),
	/// The strategy did not answer in time.
	#[error("Timed out after {0:?}")]
	Timeout(Duration),
}

/// Trait implemented by every scoring strategy.
#[async_trait]
pub trait ScoringInterface: Send + Sync {
	/// Describes the strategy's `[scoring.config]` table.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Scores a piece of feedback.
	async fn score(&self, text: &str) -> Result<Score, ScoringError>;
}

/// Scoring front end used by the request processor.
///
/// Never fails: every error path collapses into [`ScoreResult::neutral`].
pub struct ScoringService {
	strategy: Box<dyn ScoringInterface>,
	timeout: Duration,
}

impl ScoringService {
	pub fn new(strategy: Box<dyn ScoringInterface>, timeout: Duration) -> Self {
		Self { strategy, timeout }
	}

	pub async fn score(&self, text: &str) -> ScoreResult {
		match self.try_score(text).await {
			Ok(result) => result,
			Err(e) => {
				warn!(error = %e, "Scoring failed, falling back to neutral rating");
				ScoreResult::neutral()
			}
		}
	}

	async fn try_score(&self, text: &str) -> Result<ScoreResult, ScoringError> {
		let score = tokio::time::timeout(self.timeout, self.strategy.score(text))
			.await
			.map_err(|_| ScoringError::Timeout(self.timeout))??;

		if !score.confidence.is_finite() {
			return Err(ScoringError::MalformedOutput(format!(
				"non-finite confidence {}",
				score.confidence
			)));
		}

		let rating = clamp_rating(score.rating);
		if i64::from(rating) != score.rating {
			debug!(raw = score.rating, rating, "Clamped strategy rating into range");
		}

		Ok(ScoreResult {
			rating,
			raw_signal: score.confidence,
			used_fallback: false,
		})
	}
}

/// Creates a scoring strategy by name from its configuration table.
///
/// The table is validated against the strategy's schema first.
pub fn create_strategy(
	name: &str,
	config: &toml::Value,
) -> Result<Box<dyn ScoringInterface>, ScoringError> {
	let strategy: Box<dyn ScoringInterface> = match name {
		"lexicon" => implementations::lexicon::create_strategy(config)?,
		"http" => implementations::http::create_strategy(config)?,
		other => {
			return Err(ScoringError::Config(format!(
				"Unknown scoring strategy: {}",
				other
			)))
		}
	};

	strategy
		.config_schema()
		.validate(config)
		.map_err(|e| ScoringError::Config(e.to_string()))?;

	Ok(strategy)
}

#[cfg(test)]
mod tests {
	use super::*;
	use oracle_types::{Schema, NEUTRAL_RATING};

	struct FixedStrategy(Result<Score, &'static str>);

	#[async_trait]
	impl ScoringInterface for FixedStrategy {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EmptySchema)
		}

		async fn score(&self, _text: &str) -> Result<Score, ScoringError> {
			self.0
				.map_err(|e| ScoringError::Remote(e.to_string()))
		}
	}

	struct SlowStrategy;

	#[async_trait]
	impl ScoringInterface for SlowStrategy {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EmptySchema)
		}

		async fn score(&self, _text: &str) -> Result<Score, ScoringError> {
			tokio::time::sleep(Duration::from_secs(3600)).await;
			Ok(Score {
				rating: 5,
				confidence: 1.0,
			})
		}
	}

	struct EmptySchema;

	impl ConfigSchema for EmptySchema {
		fn validate(&self, config: &toml::Value) -> Result<(), oracle_types::ValidationError> {
			Schema::new().validate(config)
		}
	}

	fn service(strategy: impl ScoringInterface + 'static) -> ScoringService {
		ScoringService::new(Box::new(strategy), Duration::from_secs(5))
	}

	#[tokio::test]
	async fn test_failure_falls_back_to_neutral() {
		let result = service(FixedStrategy(Err("model crashed")))
			.score("whatever")
			.await;
		assert_eq!(result.rating, NEUTRAL_RATING);
		assert!(result.used_fallback);
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_falls_back_to_neutral() {
		let result = service(SlowStrategy).score("whatever").await;
		assert_eq!(result, ScoreResult::neutral());
	}

	#[tokio::test]
	async fn test_non_finite_confidence_falls_back() {
		let result = service(FixedStrategy(Ok(Score {
			rating: 5,
			confidence: f64::NAN,
		})))
		.score("whatever")
		.await;
		assert!(result.used_fallback);
	}

	#[tokio::test]
	async fn test_out_of_range_rating_is_clamped() {
		let result = service(FixedStrategy(Ok(Score {
			rating: -9,
			confidence: -0.9,
		})))
		.score("whatever")
		.await;
		assert_eq!(result.rating, 5);
		assert!(!result.used_fallback);
		assert_eq!(result.raw_signal, -0.9);
	}

	#[test]
	fn test_unknown_strategy_is_rejected() {
		let config = toml::Value::Table(toml::map::Map::new());
		assert!(matches!(
			create_strategy("astrology", &config),
			Err(ScoringError::Config(_))
		));
	}
}
