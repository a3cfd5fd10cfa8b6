//! Configuration loading from files and environment.

use crate::{Config, ConfigError};
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads, resolves and validates the oracle configuration.
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "ORACLE_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	/// Prefix of the override variables (`{prefix}RPC_URL`, `{prefix}PRIVATE_KEY`).
	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<Config, ConfigError> {
		let Some(path) = &self.file_path else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		let content = match tokio::fs::read_to_string(path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(path.display().to_string()))
			}
			Err(e) => return Err(e.into()),
		};

		self.load_str(&content)
	}

	/// Resolves and validates configuration held in memory.
	pub fn load_str(&self, content: &str) -> Result<Config, ConfigError> {
		let substituted = substitute_env_vars(content)?;

		let mut config: Config =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config);
		validate_config(&config)?;

		Ok(config)
	}

	fn apply_env_overrides(&self, config: &mut Config) {
		if let Ok(url) = env::var(format!("{}RPC_URL", self.env_prefix)) {
			debug!("Overriding RPC URL from environment");
			config.chain.rpc_url = url;
		}

		if let Ok(key) = env::var(format!("{}PRIVATE_KEY", self.env_prefix)) {
			debug!("Overriding private key from environment");
			config.account.private_key = key;
		}
	}
}

/// Replaces every `${VAR}` with the value of the environment variable.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
		.map_err(|e| ConfigError::ParseError(e.to_string()))?;

	let mut missing = None;
	let result = re.replace_all(content, |caps: &regex::Captures| {
		let name = &caps[1];
		env::var(name).unwrap_or_else(|_| {
			missing.get_or_insert_with(|| name.to_string());
			String::new()
		})
	});

	match missing {
		Some(name) => Err(ConfigError::EnvVarNotFound(name)),
		None => Ok(result.into_owned()),
	}
}

fn invalid(message: impl Into<String>) -> ConfigError {
	ConfigError::ValidationError(message.into())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
	let oracle = &config.oracle;
	if oracle.poll_interval_secs == 0 {
		return Err(invalid("oracle.poll_interval_secs must be greater than 0"));
	}
	if oracle.receipt_timeout_secs == 0 {
		return Err(invalid("oracle.receipt_timeout_secs must be greater than 0"));
	}
	if oracle.scoring_timeout_ms == 0 {
		return Err(invalid("oracle.scoring_timeout_ms must be greater than 0"));
	}
	if oracle.max_backoff_secs == 0 {
		return Err(invalid("oracle.max_backoff_secs must be greater than 0"));
	}
	if oracle.max_block_range == 0 {
		return Err(invalid("oracle.max_block_range must be greater than 0"));
	}

	let chain = &config.chain;
	if !(chain.rpc_url.starts_with("http://") || chain.rpc_url.starts_with("https://")) {
		return Err(invalid("chain.rpc_url must start with http:// or https://"));
	}
	if chain.contract_address.is_zero() {
		return Err(invalid("chain.contract_address must not be the zero address"));
	}
	if chain.request_timeout_secs == 0 {
		return Err(invalid("chain.request_timeout_secs must be greater than 0"));
	}

	let key = config.account.private_key.trim();
	let key = key.strip_prefix("0x").unwrap_or(key);
	if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(invalid("account.private_key must be 32 bytes of hex"));
	}

	if config.delivery.gas_limit == 0 {
		return Err(invalid("delivery.gas_limit must be greater than 0"));
	}

	if !matches!(config.scoring.strategy.as_str(), "lexicon" | "http") {
		return Err(invalid(format!(
			"Unknown scoring strategy: {}",
			config.scoring.strategy
		)));
	}
	if !config.scoring.config.is_table() {
		return Err(invalid("scoring.config must be a table"));
	}

	if let Some(storage) = &config.storage {
		if !matches!(storage.backend.as_str(), "file" | "memory") {
			return Err(invalid(format!(
				"Unknown storage backend: {}",
				storage.backend
			)));
		}
	}

	Ok(())
}
