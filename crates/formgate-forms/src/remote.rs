//! Seams to the remote API: form submission and schema loading

use crate::rules::FormValues;
use crate::schema::FormSchema;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
	/// The server answered with an error, possibly carrying a message meant
	/// for the respondent.
	#[error("Request rejected{}", message_suffix(.message))]
	Rejected { message: Option<String> },
	#[error("Item '{0}' not found")]
	NotFound(String),
	#[error("Transport error: {0}")]
	Transport(String),
}

impl SubmitError {
	pub fn rejected(message: impl Into<String>) -> Self {
		Self::Rejected {
			message: Some(message.into()),
		}
	}

	/// Message suitable for showing to the respondent, if the server sent one.
	pub fn server_message(&self) -> Option<&str> {
		match self {
			SubmitError::Rejected { message } => message.as_deref(),
			_ => None,
		}
	}
}

fn message_suffix(message: &Option<String>) -> String {
	message
		.as_deref()
		.map(|m| format!(": {m}"))
		.unwrap_or_default()
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// Server acknowledgement of a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
	pub id: String,
	pub submitted_at: DateTime<Utc>,
}

/// A form (or assessment item) as loaded for a guarded session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedItem {
	pub schema: FormSchema,
	pub title: String,
	#[serde(default)]
	pub time_limit_secs: Option<u32>,
	#[serde(default)]
	pub expires_at: Option<DateTime<Utc>>,
}

/// Delivers completed forms to the server
#[async_trait]
pub trait Submitter: Send + Sync {
	async fn submit_form(
		&self,
		form_id: &str,
		values: &FormValues,
	) -> SubmitResult<SubmissionReceipt>;
}

/// Supplies schemas and item metadata by id
#[async_trait]
pub trait SchemaSource: Send + Sync {
	async fn load(&self, item_id: &str) -> SubmitResult<LoadedItem>;
}

/// Submitter keeping every payload in memory
///
/// Answers with [`SubmitError::Rejected`] while a failure is queued.
#[derive(Debug, Default)]
pub struct MemorySubmitter {
	submissions: Mutex<Vec<(String, FormValues)>>,
	failure: Mutex<Option<SubmitError>>,
}

impl MemorySubmitter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fail every following submission with `error` until cleared.
	pub fn fail_with(&self, error: Option<SubmitError>) {
		*self.failure.lock() = error;
	}

	pub fn submissions(&self) -> Vec<(String, FormValues)> {
		self.submissions.lock().clone()
	}
}

#[async_trait]
impl Submitter for MemorySubmitter {
	async fn submit_form(
		&self,
		form_id: &str,
		values: &FormValues,
	) -> SubmitResult<SubmissionReceipt> {
		if let Some(error) = self.failure.lock().clone() {
			return Err(error);
		}
		let mut submissions = self.submissions.lock();
		submissions.push((form_id.to_string(), values.clone()));
		Ok(SubmissionReceipt {
			id: format!("submission-{}", submissions.len()),
			submitted_at: Utc::now(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(SubmitError::rejected("Form closed"), Some("Form closed"))]
	#[case(SubmitError::Rejected { message: None }, None)]
	#[case(SubmitError::Transport("reset".to_string()), None)]
	fn test_server_message(#[case] error: SubmitError, #[case] expected: Option<&str>) {
		// Act + Assert
		assert_eq!(error.server_message(), expected);
	}

	#[rstest]
	fn test_rejected_display() {
		// Assert
		assert_eq!(
			SubmitError::rejected("Form closed").to_string(),
			"Request rejected: Form closed"
		);
		assert_eq!(
			SubmitError::Rejected { message: None }.to_string(),
			"Request rejected"
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_memory_submitter_records_payloads() {
		// Arrange
		let submitter = MemorySubmitter::new();
		let mut values = FormValues::new();
		values.insert("name".to_string(), serde_json::json!("Ada"));

		// Act
		let receipt = submitter.submit_form("form-1", &values).await.unwrap();

		// Assert
		assert_eq!(receipt.id, "submission-1");
		assert_eq!(submitter.submissions(), vec![("form-1".to_string(), values)]);
	}

	#[rstest]
	fn test_loaded_item_camel_case() {
		// Arrange
		let json = serde_json::json!({
			"schema": { "title": "Quiz", "sections": [] },
			"title": "Quiz",
			"timeLimitSecs": 600
		});

		// Act
		let item: LoadedItem = serde_json::from_value(json).unwrap();

		// Assert
		assert_eq!(item.time_limit_secs, Some(600));
		assert!(item.expires_at.is_none());
	}
}
