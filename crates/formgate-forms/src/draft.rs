//! Persisted builder drafts
//!
//! The builder saves `{formTitle, formDescription, formSections}` under a fixed
//! key and restores it verbatim on reload. There is no versioning.

use crate::schema::Section;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key the builder stores its draft under by default.
pub const DEFAULT_DRAFT_KEY: &str = "form-builder-storage";

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Invalid draft key '{0}'")]
	InvalidKey(String),
	#[error("Draft has no sections")]
	NoSections,
}

pub type DraftResult<T> = Result<T, DraftError>;

/// Serialized builder state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPayload {
	pub form_title: String,
	#[serde(default)]
	pub form_description: String,
	pub form_sections: Vec<Section>,
}

/// Key/value storage for drafts (browser local storage or an equivalent)
pub trait DraftStorage: Send + Sync {
	fn load(&self, key: &str) -> DraftResult<Option<String>>;
	fn save(&self, key: &str, contents: &str) -> DraftResult<()>;
	fn remove(&self, key: &str) -> DraftResult<()>;
}

/// In-memory storage, used by tests and headless hosts
#[derive(Debug, Default)]
pub struct MemoryDraftStorage {
	entries: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

impl DraftStorage for MemoryDraftStorage {
	fn load(&self, key: &str) -> DraftResult<Option<String>> {
		Ok(self.entries.lock().get(key).cloned())
	}

	fn save(&self, key: &str, contents: &str) -> DraftResult<()> {
		self.entries
			.lock()
			.insert(key.to_string(), contents.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) -> DraftResult<()> {
		self.entries.lock().remove(key);
		Ok(())
	}
}

/// Storage writing one `<key>.json` file per draft in a directory
///
/// # Examples
///
/// ```
/// use formgate_forms::draft::{DraftStorage, FileDraftStorage};
///
/// let dir = tempfile::tempdir().unwrap();
/// let storage = FileDraftStorage::new(dir.path());
/// storage.save("draft", "{}").unwrap();
/// assert_eq!(storage.load("draft").unwrap().as_deref(), Some("{}"));
/// ```
#[derive(Debug, Clone)]
pub struct FileDraftStorage {
	root: PathBuf,
}

impl FileDraftStorage {
	pub fn new(root: impl AsRef<Path>) -> Self {
		Self {
			root: root.as_ref().to_path_buf(),
		}
	}

	fn path_for(&self, key: &str) -> DraftResult<PathBuf> {
		let valid = !key.is_empty()
			&& key
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
		if !valid {
			return Err(DraftError::InvalidKey(key.to_string()));
		}
		Ok(self.root.join(format!("{key}.json")))
	}
}

impl DraftStorage for FileDraftStorage {
	fn load(&self, key: &str) -> DraftResult<Option<String>> {
		let path = self.path_for(key)?;
		match fs::read_to_string(&path) {
			Ok(contents) => Ok(Some(contents)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	fn save(&self, key: &str, contents: &str) -> DraftResult<()> {
		let path = self.path_for(key)?;
		fs::create_dir_all(&self.root)?;
		fs::write(path, contents)?;
		Ok(())
	}

	fn remove(&self, key: &str) -> DraftResult<()> {
		let path = self.path_for(key)?;
		match fs::remove_file(path) {
			Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
			_ => Ok(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_file_storage_missing_key_loads_none() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let storage = FileDraftStorage::new(dir.path());

		// Act
		let loaded = storage.load("absent").unwrap();

		// Assert
		assert!(loaded.is_none());
	}

	#[rstest]
	#[case("")]
	#[case("../escape")]
	#[case("a/b")]
	fn test_file_storage_rejects_path_like_keys(#[case] key: &str) {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let storage = FileDraftStorage::new(dir.path());

		// Act
		let result = storage.save(key, "{}");

		// Assert
		assert!(matches!(result, Err(DraftError::InvalidKey(_))));
	}

	#[rstest]
	fn test_file_storage_remove_is_idempotent() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let storage = FileDraftStorage::new(dir.path());
		storage.save("k", "{}").unwrap();

		// Act
		storage.remove("k").unwrap();
		let second = storage.remove("k");

		// Assert
		assert!(second.is_ok());
		assert!(storage.load("k").unwrap().is_none());
	}

	#[rstest]
	fn test_payload_uses_camel_case_keys() {
		// Arrange
		let payload = DraftPayload {
			form_title: "T".to_string(),
			form_description: String::new(),
			form_sections: vec![],
		};

		// Act
		let json = serde_json::to_value(&payload).unwrap();

		// Assert
		assert!(json.get("formTitle").is_some());
		assert!(json.get("formSections").is_some());
	}
}
