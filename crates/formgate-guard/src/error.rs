//! Guard error types

use crate::events::EventKind;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GuardError {
	#[error("Failed to install '{kind}' listener: {reason}")]
	ListenerInstall { kind: EventKind, reason: String },
	#[error("Invalid guard configuration: {0}")]
	InvalidConfig(String),
}

pub type GuardResult<T> = Result<T, GuardError>;
