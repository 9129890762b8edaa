//! Subscriber installation for binaries and tests
//!
//! Library crates only emit `tracing` events. Hosts call [`init`] (or
//! [`init_from_settings`]) once to print them.

use formgate_conf::LoggingSettings;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
	#[error("Invalid log filter '{directive}': {message}")]
	InvalidFilter { directive: String, message: String },
	#[error("A global tracing subscriber is already installed")]
	AlreadyInstalled,
}

/// Install a `fmt` subscriber filtered by `directive`.
pub fn init(directive: &str) -> Result<(), LoggingError> {
	let filter = EnvFilter::try_new(directive).map_err(|e| LoggingError::InvalidFilter {
		directive: directive.to_string(),
		message: e.to_string(),
	})?;
	install(filter)
}

/// Like [`init`], but `RUST_LOG` wins over the configured level when set.
pub fn init_from_settings(settings: &LoggingSettings) -> Result<(), LoggingError> {
	match EnvFilter::try_from_default_env() {
		Ok(filter) => install(filter),
		Err(_) => init(&settings.level),
	}
}

fn install(filter: EnvFilter) -> Result<(), LoggingError> {
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.try_init()
		.map_err(|_| LoggingError::AlreadyInstalled)?;
	tracing::debug!("logging initialised");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_invalid_directive_is_rejected() {
		// Act
		let result = init("formgate=loud");

		// Assert
		assert!(matches!(result, Err(LoggingError::InvalidFilter { .. })));
	}

	#[rstest]
	fn test_second_install_reports_existing_subscriber() {
		// Arrange
		let _ = init("info");

		// Act
		let result = init("debug");

		// Assert
		assert!(matches!(result, Err(LoggingError::AlreadyInstalled)));
	}
}
