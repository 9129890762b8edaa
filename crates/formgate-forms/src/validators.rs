//! Format validators used by the derived field rules
//!
//! Each validator checks a single, already non-empty string (or number) and
//! reports a [`FieldError`]. Requiredness is decided by the caller.

use crate::error::{FieldError, FieldResult};
use regex::Regex;
use std::sync::LazyLock;

// Pragmatic email pattern: one `@`, no whitespace, a dotted domain whose
// labels do not start or end with a hyphen and a TLD of at least two letters.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
	)
	.expect("EMAIL_REGEX: invalid regex pattern")
});

/// Validates that a string is a syntactically valid email address.
///
/// # Examples
///
/// ```
/// use formgate_forms::validators::EmailValidator;
///
/// let validator = EmailValidator::new();
/// assert!(validator.validate("reporter@example.com").is_ok());
/// assert!(validator.validate("reporter@").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmailValidator {
	message: Option<String>,
}

impl EmailValidator {
	pub fn new() -> Self {
		Self { message: None }
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}

	pub fn validate(&self, value: &str) -> FieldResult<()> {
		// Consecutive dots are legal in the character class but not in addresses
		if EMAIL_REGEX.is_match(value) && !value.contains("..") {
			Ok(())
		} else {
			let msg = self
				.message
				.as_deref()
				.unwrap_or("Enter a valid email address");
			Err(FieldError::Invalid(msg.to_string()))
		}
	}
}

/// Validates that a string is an absolute URL.
///
/// Any scheme is accepted as long as the value parses as an absolute URL;
/// relative references such as `/issues/1` or `example.com` are rejected.
///
/// # Examples
///
/// ```
/// use formgate_forms::validators::UrlValidator;
///
/// let validator = UrlValidator::new();
/// assert!(validator.validate("https://example.com/issues?id=3").is_ok());
/// assert!(validator.validate("example.com").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct UrlValidator {
	message: Option<String>,
}

impl UrlValidator {
	pub fn new() -> Self {
		Self { message: None }
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}

	pub fn validate(&self, value: &str) -> FieldResult<()> {
		match url::Url::parse(value) {
			Ok(_) if !value.chars().any(char::is_whitespace) => Ok(()),
			_ => {
				let msg = self.message.as_deref().unwrap_or("Enter a valid URL");
				Err(FieldError::Invalid(msg.to_string()))
			}
		}
	}
}

/// Coerces numbers and numeric strings to `f64` and checks an inclusive range.
///
/// # Examples
///
/// ```
/// use formgate_forms::validators::NumberValidator;
/// use serde_json::json;
///
/// let validator = NumberValidator::new().with_range(Some(1.0), Some(5.0));
/// assert_eq!(validator.coerce(&json!("3")).unwrap(), 3.0);
/// assert!(validator.coerce(&json!(7)).is_err());
/// assert!(validator.coerce(&json!("three")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NumberValidator {
	min: Option<f64>,
	max: Option<f64>,
	message: Option<String>,
}

impl NumberValidator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
		self.min = min;
		self.max = max;
		self
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}

	/// Parse the value and check it against the range.
	pub fn coerce(&self, value: &serde_json::Value) -> FieldResult<f64> {
		let num = if let Some(n) = value.as_f64() {
			n
		} else if let Some(s) = value.as_str() {
			s.trim().parse::<f64>().map_err(|_| self.invalid())?
		} else {
			return Err(self.invalid());
		};

		if !num.is_finite() {
			return Err(self.invalid());
		}

		if let Some(min) = self.min
			&& num < min
		{
			return Err(FieldError::OutOfRange(self.message.clone().unwrap_or_else(|| {
				format!("Ensure this value is greater than or equal to {}", min)
			})));
		}
		if let Some(max) = self.max
			&& num > max
		{
			return Err(FieldError::OutOfRange(self.message.clone().unwrap_or_else(|| {
				format!("Ensure this value is less than or equal to {}", max)
			})));
		}
		Ok(num)
	}

	fn invalid(&self) -> FieldError {
		FieldError::Invalid(
			self.message
				.clone()
				.unwrap_or_else(|| "Enter a number".to_string()),
		)
	}
}
