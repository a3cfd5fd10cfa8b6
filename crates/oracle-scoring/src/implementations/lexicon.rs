//! Lexicon-based sentiment scoring.
//!
//! Scores feedback with a small valence lexicon in the style of VADER:
//! word valences are adjusted by preceding intensifiers and negations,
//! summed, and normalized into a compound score in `[-1, 1]`. The compound
//! is mapped onto the rating scale with a neutral band around zero; strong
//! sentiment outside the band pushes the rating to the ends of the scale.

use crate::{ScoringError, ScoringInterface};
use async_trait::async_trait;
use oracle_types::{ConfigSchema, Field, FieldType, Schema, Score, NEUTRAL_RATING};

/// Normalization constant for the compound score.
const ALPHA: f64 = 15.0;
/// Valence shift applied by intensifiers like "very".
const BOOSTER_INCREMENT: f64 = 0.293;
/// Scale applied to a valence that follows a negation.
const NEGATION_SCALAR: f64 = -0.74;
/// Compound magnitude above which sentiment counts as strong.
const STRONG_SENTIMENT: f64 = 0.7;

const DEFAULT_NEUTRAL_LOWER: f64 = -0.3;
const DEFAULT_NEUTRAL_UPPER: f64 = 0.3;

fn valence(word: &str) -> Option<f64> {
	let v = match word {
		// positive
		"excellent" => 2.7,
		"amazing" => 2.8,
		"awesome" => 3.1,
		"fantastic" => 2.6,
		"outstanding" => 3.0,
		"perfect" => 2.7,
		"wonderful" => 2.7,
		"superb" => 3.1,
		"brilliant" => 2.8,
		"great" => 3.1,
		"best" => 3.2,
		"love" | "loved" => 3.2,
		"good" => 1.9,
		"nice" => 1.8,
		"friendly" => 2.2,
		"polite" => 1.8,
		"kind" => 2.4,
		"helpful" => 1.8,
		"courteous" => 2.1,
		"professional" => 1.9,
		"clean" => 1.7,
		"safe" => 1.9,
		"safely" => 2.2,
		"comfortable" => 1.5,
		"smooth" => 1.4,
		"pleasant" => 2.3,
		"happy" => 2.7,
		"glad" => 2.0,
		"enjoyed" => 2.3,
		"recommend" | "recommended" => 1.5,
		"quick" | "fast" => 1.2,
		"punctual" | "prompt" => 1.3,
		"thanks" | "thank" => 1.5,
		"fine" => 0.8,
		"okay" | "ok" => 0.9,
		"decent" => 1.0,
		"satisfied" => 1.8,
		// negative
		"terrible" => -2.5,
		"horrible" => -2.5,
		"awful" => -2.0,
		"worst" => -3.1,
		"bad" => -2.5,
		"poor" => -2.1,
		"rude" => -2.0,
		"dirty" => -1.9,
		"unsafe" => -2.4,
		"dangerous" => -2.1,
		"reckless" => -2.2,
		"late" => -1.0,
		"slow" => -0.9,
		"smelly" | "smelled" => -1.5,
		"angry" => -2.3,
		"annoyed" | "annoying" => -1.7,
		"disappointed" | "disappointing" => -2.0,
		"unprofessional" => -2.1,
		"hate" | "hated" => -2.7,
		"scary" => -2.2,
		"uncomfortable" => -1.6,
		"waited" | "waiting" => -0.5,
		"lost" => -1.3,
		"cancelled" | "canceled" => -1.0,
		"overcharged" => -2.0,
		"mediocre" => -1.0,
		"useless" => -1.8,
		"never" => -0.2,
		_ => return None,
	};
	Some(v)
}

fn booster(word: &str) -> Option<f64> {
	match word {
		"very" | "really" | "extremely" | "so" | "super" | "incredibly" | "absolutely"
		| "totally" | "truly" | "highly" => Some(BOOSTER_INCREMENT),
		"slightly" | "somewhat" | "kinda" | "barely" | "marginally" | "mostly" => {
			Some(-BOOSTER_INCREMENT)
		}
		_ => None,
	}
}

fn is_negation(word: &str) -> bool {
	matches!(
		word,
		"not"
			| "no" | "never"
			| "none" | "nobody"
			| "nothing" | "neither"
			| "nor" | "cannot"
			| "cant" | "dont"
			| "doesnt" | "didnt"
			| "wasnt" | "isnt"
			| "arent" | "werent"
			| "wont" | "wouldnt"
			| "couldnt" | "shouldnt"
			| "without" | "hardly"
	)
}

/// Lowercases, drops apostrophes, replaces anything that is not an ASCII
/// letter or digit with a space and collapses runs of whitespace.
pub fn preprocess(text: &str) -> String {
	let cleaned: String = text
		.to_lowercase()
		.chars()
		.filter(|c| *c != '\'' && *c != '\u{2019}')
		.map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
		.collect();
	cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compound sentiment of `text` in `[-1, 1]`; zero when nothing is known.
pub fn compound(text: &str) -> f64 {
	let processed = preprocess(text);
	let tokens: Vec<&str> = processed.split(' ').filter(|t| !t.is_empty()).collect();

	// Sentiment before "but" is damped and sentiment after it amplified
	let but_at = tokens.iter().position(|t| *t == "but");

	let mut sum = 0.0;
	for (i, token) in tokens.iter().enumerate() {
		// "never" only counts as sentiment when it stands alone
		if booster(token).is_some() || (is_negation(token) && *token != "never") {
			continue;
		}
		let Some(mut v) = valence(token) else {
			continue;
		};

		for (distance, scale) in [(1, 1.0), (2, 0.95), (3, 0.9)] {
			let Some(prev) = i.checked_sub(distance).map(|j| tokens[j]) else {
				break;
			};
			if let Some(boost) = booster(prev) {
				let signed = if v < 0.0 { -boost } else { boost };
				v += signed * scale;
			}
		}

		let negated = (1..=3)
			.filter_map(|distance| i.checked_sub(distance))
			.any(|j| is_negation(tokens[j]));
		if negated {
			v *= NEGATION_SCALAR;
		}

		match but_at {
			Some(b) if i < b => v *= 0.5,
			Some(b) if i > b => v *= 1.5,
			_ => {}
		}

		sum += v;
	}

	if sum == 0.0 {
		return 0.0;
	}
	(sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

/// Maps a compound score onto the 1 to 5 rating scale.
pub fn rating_for(compound: f64, neutral_lower: f64, neutral_upper: f64) -> i64 {
	if (neutral_lower..=neutral_upper).contains(&compound) {
		i64::from(NEUTRAL_RATING)
	} else if compound > neutral_upper {
		if compound > STRONG_SENTIMENT {
			5
		} else {
			4
		}
	} else if compound < -STRONG_SENTIMENT {
		1
	} else {
		2
	}
}

/// Sentiment strategy backed by the built-in lexicon.
pub struct LexiconStrategy {
	neutral_lower: f64,
	neutral_upper: f64,
}

impl LexiconStrategy {
	pub fn new(neutral_lower: f64, neutral_upper: f64) -> Result<Self, ScoringError> {
		if !(-1.0..=1.0).contains(&neutral_lower)
			|| !(-1.0..=1.0).contains(&neutral_upper)
			|| neutral_lower >= neutral_upper
		{
			return Err(ScoringError::Config(format!(
				"neutral band [{}, {}] must be an increasing range within [-1, 1]",
				neutral_lower, neutral_upper
			)));
		}
		Ok(Self {
			neutral_lower,
			neutral_upper,
		})
	}
}

impl Default for LexiconStrategy {
	fn default() -> Self {
		Self {
			neutral_lower: DEFAULT_NEUTRAL_LOWER,
			neutral_upper: DEFAULT_NEUTRAL_UPPER,
		}
	}
}

pub struct LexiconStrategySchema;

impl ConfigSchema for LexiconStrategySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), oracle_types::ValidationError> {
		let bound = || FieldType::Float {
			min: Some(-1.0),
			max: Some(1.0),
		};
		Schema::new()
			.field(Field::optional("neutral_lower", bound()))
			.field(Field::optional("neutral_upper", bound()))
			.validate(config)
	}
}

#[async_trait]
impl ScoringInterface for LexiconStrategy {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LexiconStrategySchema)
	}

	async fn score(&self, text: &str) -> Result<Score, ScoringError> {
		if text.trim().is_empty() {
			return Err(ScoringError::InvalidInput("empty feedback".to_string()));
		}

		let compound = compound(text);
		Ok(Score {
			rating: rating_for(compound, self.neutral_lower, self.neutral_upper),
			confidence: compound,
		})
	}
}

fn float_or(config: &toml::Value, key: &str, default: f64) -> f64 {
	match config.get(key) {
		Some(toml::Value::Float(f)) => *f,
		Some(toml::Value::Integer(i)) => *i as f64,
		_ => default,
	}
}

/// Configuration parameters:
/// - `neutral_lower`: lower edge of the neutral band (default: -0.3)
/// - `neutral_upper`: upper edge of the neutral band (default: 0.3)
pub fn create_strategy(config: &toml::Value) -> Result<Box<dyn ScoringInterface>, ScoringError> {
	Ok(Box::new(LexiconStrategy::new(
		float_or(config, "neutral_lower", DEFAULT_NEUTRAL_LOWER),
		float_or(config, "neutral_upper", DEFAULT_NEUTRAL_UPPER),
	)?))
}
