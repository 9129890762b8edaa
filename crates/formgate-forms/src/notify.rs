//! User-visible notifications (toasts)

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
	Success,
	Info,
	Warning,
	Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
	pub level: NotificationLevel,
	pub message: String,
}

impl Notification {
	pub fn success(message: impl Into<String>) -> Self {
		Self {
			level: NotificationLevel::Success,
			message: message.into(),
		}
	}

	pub fn warning(message: impl Into<String>) -> Self {
		Self {
			level: NotificationLevel::Warning,
			message: message.into(),
		}
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self {
			level: NotificationLevel::Error,
			message: message.into(),
		}
	}
}

/// Sink for non-fatal, user-visible messages
pub trait Notifier: Send + Sync {
	fn notify(&self, notification: Notification);
}

/// Notifier that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
	fn notify(&self, _notification: Notification) {}
}

/// Notifier that keeps every notification in memory
///
/// # Examples
///
/// ```
/// use formgate_forms::{Notification, Notifier, RecordingNotifier};
///
/// let notifier = RecordingNotifier::new();
/// notifier.notify(Notification::success("Saved"));
/// assert_eq!(notifier.messages(), vec!["Saved".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingNotifier {
	records: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn notifications(&self) -> Vec<Notification> {
		self.records.lock().clone()
	}

	pub fn messages(&self) -> Vec<String> {
		self.records
			.lock()
			.iter()
			.map(|n| n.message.clone())
			.collect()
	}

	pub fn last(&self) -> Option<Notification> {
		self.records.lock().last().cloned()
	}

	pub fn clear(&self) {
		self.records.lock().clear();
	}
}

impl Notifier for RecordingNotifier {
	fn notify(&self, notification: Notification) {
		self.records.lock().push(notification);
	}
}
