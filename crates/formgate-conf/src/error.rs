//! Settings errors

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("Invalid value for '{key}': {message}")]
	InvalidValue { key: String, message: String },
}

impl SettingsError {
	pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			key: key.to_string(),
			message: message.into(),
		}
	}
}

pub type SettingsResult<T> = Result<T, SettingsError>;
