//! Config value types with hand-written serde representations.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Block the poll loop starts from when no durable cursor exists.
///
/// Written as `"latest"` or a block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartBlock {
	#[default]
	Latest,
	Number(u64),
}

impl fmt::Display for StartBlock {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Latest => f.write_str("latest"),
			Self::Number(n) => write!(f, "{}", n),
		}
	}
}

impl Serialize for StartBlock {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Self::Latest => serializer.serialize_str("latest"),
			Self::Number(n) => serializer.serialize_u64(*n),
		}
	}
}

struct StartBlockVisitor;

impl<'de> Visitor<'de> for StartBlockVisitor {
	type Value = StartBlock;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str("\"latest\" or a non-negative block number")
	}

	fn visit_str<E: de::Error>(self, value: &str) -> Result<StartBlock, E> {
		if value.eq_ignore_ascii_case("latest") {
			return Ok(StartBlock::Latest);
		}
		value
			.parse()
			.map(StartBlock::Number)
			.map_err(|_| E::custom(format!("invalid start block: {}", value)))
	}

	fn visit_u64<E: de::Error>(self, value: u64) -> Result<StartBlock, E> {
		Ok(StartBlock::Number(value))
	}

	fn visit_i64<E: de::Error>(self, value: i64) -> Result<StartBlock, E> {
		u64::try_from(value)
			.map(StartBlock::Number)
			.map_err(|_| E::custom(format!("start block must not be negative: {}", value)))
	}
}

impl<'de> Deserialize<'de> for StartBlock {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_any(StartBlockVisitor)
	}
}

/// How nonces for the oracle account are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonceStrategy {
	/// In-process counter seeded from the chain.
	#[default]
	Local,
	/// Fresh pending transaction count for every transaction.
	Chain,
}

impl NonceStrategy {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Local => "local",
			Self::Chain => "chain",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Deserialize, Serialize)]
	struct Wrapper {
		start: StartBlock,
		#[serde(default)]
		nonce: NonceStrategy,
	}

	#[test]
	fn test_start_block_forms() {
		let latest: Wrapper = toml::from_str("start = \"latest\"").unwrap();
		assert_eq!(latest.start, StartBlock::Latest);
		assert_eq!(latest.nonce, NonceStrategy::Local);

		let number: Wrapper = toml::from_str("start = 1200\nnonce = \"chain\"").unwrap();
		assert_eq!(number.start, StartBlock::Number(1200));
		assert_eq!(number.nonce, NonceStrategy::Chain);

		let quoted: Wrapper = toml::from_str("start = \"77\"").unwrap();
		assert_eq!(quoted.start, StartBlock::Number(77));

		assert!(toml::from_str::<Wrapper>("start = -1").is_err());
		assert!(toml::from_str::<Wrapper>("start = \"earliest\"").is_err());
		assert!(toml::from_str::<Wrapper>("start = 1\nnonce = \"random\"").is_err());
	}

	#[test]
	fn test_start_block_serializes_back() {
		let toml = toml::to_string(&Wrapper {
			start: StartBlock::Number(5),
			nonce: NonceStrategy::Chain,
		})
		.unwrap();
		assert!(toml.contains("start = 5"));
		assert!(toml.contains("nonce = \"chain\""));
	}
}
