//! Copy, cut and paste interception
//!
//! This is advisory, in-page protection only. It cancels the document's
//! clipboard events and reports the attempt; anyone with developer tools, a
//! different browser or a screenshot gets around it. It is not a security
//! boundary and protects no secret.

use crate::error::GuardResult;
use crate::events::{DocumentEvents, DomEvent, EventKind, ListenerGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardAction {
	Copy,
	Cut,
	Paste,
}

impl ClipboardAction {
	pub const ALL: [ClipboardAction; 3] = [
		ClipboardAction::Copy,
		ClipboardAction::Cut,
		ClipboardAction::Paste,
	];

	pub fn event_kind(self) -> EventKind {
		match self {
			ClipboardAction::Copy => EventKind::Copy,
			ClipboardAction::Cut => EventKind::Cut,
			ClipboardAction::Paste => EventKind::Paste,
		}
	}

	pub fn as_str(self) -> &'static str {
		self.event_kind().as_str()
	}
}

impl fmt::Display for ClipboardAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

pub type ClipboardCallback = Arc<dyn Fn(ClipboardAction) + Send + Sync>;

/// Install listeners cancelling every clipboard action
///
/// `on_attempt` runs after the event has been cancelled. The returned guard
/// removes the listeners when dropped.
///
/// # Examples
///
/// ```
/// use formgate_guard::{ClipboardAction, DomEvent, EventHub, EventKind, block_clipboard};
/// use std::sync::{Arc, Mutex};
///
/// let hub = Arc::new(EventHub::new());
/// let attempts = Arc::new(Mutex::new(Vec::new()));
/// let seen = attempts.clone();
/// let guard = block_clipboard(hub.clone(), Arc::new(move |a: ClipboardAction| seen.lock().unwrap().push(a)))
///     .unwrap();
///
/// assert!(hub.dispatch(&DomEvent::new(EventKind::Paste)));
/// assert_eq!(*attempts.lock().unwrap(), vec![ClipboardAction::Paste]);
///
/// drop(guard);
/// assert!(!hub.dispatch(&DomEvent::new(EventKind::Paste)));
/// ```
pub fn block_clipboard(
	events: Arc<dyn DocumentEvents>,
	on_attempt: ClipboardCallback,
) -> GuardResult<ListenerGuard> {
	let mut guard = ListenerGuard::new(events);
	for action in ClipboardAction::ALL {
		let callback = on_attempt.clone();
		guard.listen(
			action.event_kind(),
			Arc::new(move |event: &DomEvent| {
				event.prevent_default();
				tracing::warn!(action = %action, "clipboard action blocked");
				callback(action);
			}),
		)?;
	}
	Ok(guard)
}
