//! Field-level validation errors

use indexmap::IndexMap;
use std::fmt;

/// A single validation failure for one value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
	#[error("{0}")]
	Required(String),
	#[error("{0}")]
	Invalid(String),
	#[error("{0}")]
	OutOfRange(String),
}

impl FieldError {
	pub fn message(&self) -> &str {
		match self {
			FieldError::Required(msg) | FieldError::Invalid(msg) | FieldError::OutOfRange(msg) => {
				msg
			}
		}
	}
}

pub type FieldResult<T> = Result<T, FieldError>;

/// Validation errors keyed by field id, in schema order
///
/// # Examples
///
/// ```
/// use formgate_forms::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.add("email", "Email is required");
/// assert_eq!(errors.get("email"), Some(&["Email is required".to_string()][..]));
/// assert_eq!(errors.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
	errors: IndexMap<String, Vec<String>>,
}

impl ValidationErrors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, field_id: impl Into<String>, message: impl Into<String>) {
		self.errors
			.entry(field_id.into())
			.or_default()
			.push(message.into());
	}

	pub fn get(&self, field_id: &str) -> Option<&[String]> {
		self.errors.get(field_id).map(Vec::as_slice)
	}

	/// First message for a field, if any.
	pub fn first(&self, field_id: &str) -> Option<&str> {
		self.get(field_id)
			.and_then(|messages| messages.first())
			.map(String::as_str)
	}

	pub fn contains(&self, field_id: &str) -> bool {
		self.errors.contains_key(field_id)
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	/// Number of fields with at least one error.
	pub fn len(&self) -> usize {
		self.errors.len()
	}

	pub fn clear(&mut self) {
		self.errors.clear();
	}

	pub fn remove(&mut self, field_id: &str) {
		self.errors.shift_remove(field_id);
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.errors
			.iter()
			.map(|(id, messages)| (id.as_str(), messages.as_slice()))
	}

	/// Merge another set of errors into this one.
	pub fn extend(&mut self, other: ValidationErrors) {
		for (id, messages) in other.errors {
			self.errors.entry(id).or_default().extend(messages);
		}
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for messages in self.errors.values() {
			for message in messages {
				if !first {
					f.write_str("; ")?;
				}
				f.write_str(message)?;
				first = false;
			}
		}
		Ok(())
	}
}

impl std::error::Error for ValidationErrors {}
