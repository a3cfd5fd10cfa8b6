//! Rating domain and score results.

use serde::{Deserialize, Serialize};

/// Lowest rating the contract accepts.
pub const RATING_MIN: u8 = 1;
/// Highest rating the contract accepts.
pub const RATING_MAX: u8 = 5;
/// Midpoint used whenever scoring fails.
pub const NEUTRAL_RATING: u8 = 3;

/// Coerces any integer into the contract's rating domain.
///
/// Negative values are mirrored first, then the magnitude is clamped into
/// `[RATING_MIN, RATING_MAX]`, so an out-of-range rating can never reach a
/// transaction.
pub fn clamp_rating(rating: i64) -> u8 {
	let magnitude = rating.unsigned_abs();
	magnitude.clamp(RATING_MIN as u64, RATING_MAX as u64) as u8
}

/// Raw answer from a scoring strategy.
///
/// Strategies are not trusted to stay in range; the scoring service turns
/// this into a [`ScoreResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
	pub rating: i64,
	/// Sentiment or model confidence backing the rating.
	pub confidence: f64,
}

/// Final score for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
	/// Always within `[RATING_MIN, RATING_MAX]`.
	pub rating: u8,
	pub raw_signal: f64,
	/// True when the strategy failed and the neutral rating was substituted.
	pub used_fallback: bool,
}

impl ScoreResult {
	/// The neutral result used when scoring fails.
	pub fn neutral() -> Self {
		Self {
			rating: NEUTRAL_RATING,
			raw_signal: 0.0,
			used_fallback: true,
		}
	}
}
