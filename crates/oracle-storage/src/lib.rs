//! Key/value persistence for oracle state.
//!
//! The oracle keeps very little state across restarts (the poll cursor), so
//! the backends are plain byte stores and [`StorageService`] adds JSON
//! encoding and namespacing on top.

use async_trait::async_trait;
use oracle_types::ConfigSchema;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Byte-level operations every backend provides.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Bytes stored under `key`, [`StorageError::NotFound`] when absent.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Replaces any previous value under `key`.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
}

/// Typed, namespaced access to a storage backend.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

fn key(namespace: &str, id: &str) -> String {
	format!("{}:{}", namespace, id)
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&key(namespace, id), bytes).await
	}

	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Like [`StorageService::retrieve`], with a missing key mapped to `None`.
	pub async fn load<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}
}

/// Creates a storage backend by name (`file` or `memory`).
///
/// The table is validated against the backend's schema first.
pub fn create_storage(
	backend: &str,
	config: &toml::Value,
) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage: Box<dyn StorageInterface> = match backend {
		"file" => implementations::file::create_storage(config),
		"memory" => implementations::memory::create_storage(config),
		other => {
			return Err(StorageError::Config(format!(
				"Unknown storage backend: {}",
				other
			)))
		}
	};

	storage
		.config_schema()
		.validate(config)
		.map_err(|e| StorageError::Config(e.to_string()))?;

	Ok(storage)
}
