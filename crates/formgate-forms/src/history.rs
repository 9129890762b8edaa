//! Bounded undo/redo history of builder snapshots

use crate::schema::Section;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Default number of snapshots kept by the builder.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Immutable deep copy of the editable builder state
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderSnapshot {
	pub title: String,
	pub description: String,
	pub sections: Vec<Section>,
	pub taken_at: DateTime<Utc>,
}

impl BuilderSnapshot {
	pub fn new(title: &str, description: &str, sections: &[Section]) -> Self {
		Self {
			title: title.to_string(),
			description: description.to_string(),
			sections: sections.to_vec(),
			taken_at: Utc::now(),
		}
	}

	/// Equality of content, ignoring when the snapshot was taken.
	pub fn same_content(&self, other: &BuilderSnapshot) -> bool {
		self.title == other.title
			&& self.description == other.description
			&& self.sections == other.sections
	}
}

/// Linear snapshot history with a cursor
///
/// Pushing after an undo discards the redo tail. When the history is full the
/// oldest snapshot is evicted and the cursor shifts with it.
///
/// # Examples
///
/// ```
/// use formgate_forms::history::{BuilderSnapshot, SnapshotHistory};
///
/// let mut history = SnapshotHistory::new(2);
/// history.push(BuilderSnapshot::new("a", "", &[]));
/// history.push(BuilderSnapshot::new("b", "", &[]));
/// history.push(BuilderSnapshot::new("c", "", &[]));
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.undo().map(|s| s.title.clone()), Some("b".to_string()));
/// assert!(history.undo().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
	snapshots: VecDeque<BuilderSnapshot>,
	cursor: usize,
	limit: usize,
}

impl SnapshotHistory {
	pub fn new(limit: usize) -> Self {
		Self {
			snapshots: VecDeque::new(),
			cursor: 0,
			limit: limit.max(1),
		}
	}

	pub fn limit(&self) -> usize {
		self.limit
	}

	pub fn len(&self) -> usize {
		self.snapshots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.snapshots.is_empty()
	}

	/// Cursor position, `None` while empty.
	pub fn index(&self) -> Option<usize> {
		(!self.snapshots.is_empty()).then_some(self.cursor)
	}

	pub fn current(&self) -> Option<&BuilderSnapshot> {
		self.snapshots.get(self.cursor)
	}

	/// Append a snapshot after the cursor. Returns `false` when it matches the
	/// current snapshot and nothing was recorded.
	pub fn push(&mut self, snapshot: BuilderSnapshot) -> bool {
		if let Some(current) = self.current()
			&& current.same_content(&snapshot)
		{
			return false;
		}

		if !self.snapshots.is_empty() {
			self.snapshots.truncate(self.cursor + 1);
		}
		self.snapshots.push_back(snapshot);
		while self.snapshots.len() > self.limit {
			self.snapshots.pop_front();
		}
		self.cursor = self.snapshots.len() - 1;
		true
	}

	pub fn can_undo(&self) -> bool {
		!self.snapshots.is_empty() && self.cursor > 0
	}

	pub fn can_redo(&self) -> bool {
		self.cursor + 1 < self.snapshots.len()
	}

	pub fn undo(&mut self) -> Option<&BuilderSnapshot> {
		if !self.can_undo() {
			return None;
		}
		self.cursor -= 1;
		self.snapshots.get(self.cursor)
	}

	pub fn redo(&mut self) -> Option<&BuilderSnapshot> {
		if !self.can_redo() {
			return None;
		}
		self.cursor += 1;
		self.snapshots.get(self.cursor)
	}

	/// Drop everything and start over from a single snapshot.
	pub fn reset(&mut self, snapshot: BuilderSnapshot) {
		self.snapshots.clear();
		self.snapshots.push_back(snapshot);
		self.cursor = 0;
	}
}

impl Default for SnapshotHistory {
	fn default() -> Self {
		Self::new(DEFAULT_HISTORY_LIMIT)
	}
}
