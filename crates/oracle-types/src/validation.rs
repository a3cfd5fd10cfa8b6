//! Schema validation for the free-form TOML tables handed to pluggable
//! backends (scoring strategies, storage backends).

use thiserror::Error;

/// Errors raised while validating a configuration table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: &'static str,
		actual: String,
	},
	#[error("Unknown field: {0}")]
	UnknownField(String),
}

/// Expected type of a configuration field.
#[derive(Debug, Clone)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	/// Accepts TOML floats and integers.
	Float { min: Option<f64>, max: Option<f64> },
	Boolean,
	/// A `0x`-prefixed 20-byte hex address.
	Address,
	/// An `http://` or `https://` URL.
	Url,
}

pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

pub struct Field {
	name: String,
	field_type: FieldType,
	required: bool,
	validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("required", &self.required)
			.finish()
	}
}

impl Field {
	pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			required: true,
			validator: None,
		}
	}

	pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			required: false,
			..Self::required(name, field_type)
		}
	}

	/// Adds a check that runs after the type check passed.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// Set of fields a table may contain. Fields not listed are rejected so a
/// typo in a config key surfaces at startup instead of being ignored.
#[derive(Debug, Default)]
pub struct Schema {
	fields: Vec<Field>,
}

impl Schema {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn field(mut self, field: Field) -> Self {
		self.fields.push(field);
		self
	}

	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table",
				actual: config.type_str().to_string(),
			})?;

		for key in table.keys() {
			if !self.fields.iter().any(|f| &f.name == key) {
				return Err(ValidationError::UnknownField(key.clone()));
			}
		}

		for field in &self.fields {
			let Some(value) = table.get(&field.name) else {
				if field.required {
					return Err(ValidationError::MissingField(field.name.clone()));
				}
				continue;
			};

			check_type(&field.name, value, &field.field_type)?;

			if let Some(validator) = &field.validator {
				validator(value).map_err(|message| ValidationError::InvalidValue {
					field: field.name.clone(),
					message,
				})?;
			}
		}

		Ok(())
	}
}

fn mismatch(field: &str, expected: &'static str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field.to_string(),
		expected,
		actual: value.type_str().to_string(),
	}
}

fn out_of_range(field: &str, message: String) -> ValidationError {
	ValidationError::InvalidValue {
		field: field.to_string(),
		message,
	}
}

fn check_type(
	field: &str,
	value: &toml::Value,
	expected: &FieldType,
) -> Result<(), ValidationError> {
	match expected {
		FieldType::String => {
			value.as_str().ok_or_else(|| mismatch(field, "string", value))?;
		}
		FieldType::Boolean => {
			value.as_bool().ok_or_else(|| mismatch(field, "boolean", value))?;
		}
		FieldType::Integer { min, max } => {
			let int = value
				.as_integer()
				.ok_or_else(|| mismatch(field, "integer", value))?;
			if let Some(min) = min.filter(|min| int < *min) {
				return Err(out_of_range(field, format!("{} is less than minimum {}", int, min)));
			}
			if let Some(max) = max.filter(|max| int > *max) {
				return Err(out_of_range(
					field,
					format!("{} is greater than maximum {}", int, max),
				));
			}
		}
		FieldType::Float { min, max } => {
			let float = match value {
				toml::Value::Float(f) => *f,
				toml::Value::Integer(i) => *i as f64,
				other => return Err(mismatch(field, "float", other)),
			};
			if let Some(min) = min.filter(|min| float < *min) {
				return Err(out_of_range(
					field,
					format!("{} is less than minimum {}", float, min),
				));
			}
			if let Some(max) = max.filter(|max| float > *max) {
				return Err(out_of_range(
					field,
					format!("{} is greater than maximum {}", float, max),
				));
			}
		}
		FieldType::Address => {
			let s = value.as_str().ok_or_else(|| mismatch(field, "address", value))?;
			let hex_part = s.strip_prefix("0x").unwrap_or_default();
			if hex_part.len() != 40 || hex::decode(hex_part).is_err() {
				return Err(out_of_range(
					field,
					"must be a 0x-prefixed 20-byte hex address".to_string(),
				));
			}
		}
		FieldType::Url => {
			let s = value.as_str().ok_or_else(|| mismatch(field, "url", value))?;
			if !(s.starts_with("http://") || s.starts_with("https://")) {
				return Err(out_of_range(
					field,
					"must start with http:// or https://".to_string(),
				));
			}
		}
	}

	Ok(())
}

/// Implemented by every pluggable backend to describe its own config table.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
