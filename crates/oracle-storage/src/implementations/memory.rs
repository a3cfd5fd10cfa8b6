//! In-memory storage, lost on restart. Useful for tests and dry runs.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use oracle_types::{ConfigSchema, Schema, ValidationError};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStorage {
	entries: RwLock<HashMap<String, Vec<u8>>>,
}

pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new().validate(config)
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}

	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.entries
			.read()
			.await
			.get(key)
			.cloned()
			.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.entries.write().await.insert(key.to_string(), value);
		Ok(())
	}
}

/// Takes no configuration parameters.
pub fn create_storage(_config: &toml::Value) -> Box<dyn StorageInterface> {
	Box::new(MemoryStorage::default())
}
