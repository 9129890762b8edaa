//! Document-level event plumbing
//!
//! [`DocumentEvents`] is the seam between the guard and whatever owns the
//! document: [`EventHub`] in-process, or the browser adapter on `wasm32`.
//! Listeners are installed through a [`ListenerGuard`], which removes every
//! listener it holds when dropped, including when installation fails halfway.

use crate::error::GuardResult;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Document events the guard cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
	PointerDown,
	PointerMove,
	PointerUp,
	KeyDown,
	Input,
	Change,
	Copy,
	Cut,
	Paste,
	Scroll,
}

impl EventKind {
	/// DOM event type name.
	pub fn as_str(self) -> &'static str {
		match self {
			EventKind::PointerDown => "pointerdown",
			EventKind::PointerMove => "pointermove",
			EventKind::PointerUp => "pointerup",
			EventKind::KeyDown => "keydown",
			EventKind::Input => "input",
			EventKind::Change => "change",
			EventKind::Copy => "copy",
			EventKind::Cut => "cut",
			EventKind::Paste => "paste",
			EventKind::Scroll => "scroll",
		}
	}

	/// Scroll listeners never cancel the event.
	pub fn is_passive(self) -> bool {
		self == EventKind::Scroll
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A point in viewport coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// A dispatched document event
///
/// Handlers receive a shared reference and may call
/// [`prevent_default`](DomEvent::prevent_default).
#[derive(Debug, Clone)]
pub struct DomEvent {
	pub kind: EventKind,
	/// Lowercase tag name of the event target, when it is an element.
	pub target_tag: Option<String>,
	pub point: Option<Point>,
	/// Vertical scroll position of the document after a scroll event.
	pub scroll_y: Option<f64>,
	default_prevented: Cell<bool>,
}

impl DomEvent {
	pub fn new(kind: EventKind) -> Self {
		Self {
			kind,
			target_tag: None,
			point: None,
			scroll_y: None,
			default_prevented: Cell::new(false),
		}
	}

	pub fn with_target(mut self, tag: impl Into<String>) -> Self {
		self.target_tag = Some(tag.into().to_ascii_lowercase());
		self
	}

	pub fn at(mut self, x: f64, y: f64) -> Self {
		self.point = Some(Point::new(x, y));
		self
	}

	pub fn scrolled_to(mut self, scroll_y: f64) -> Self {
		self.scroll_y = Some(scroll_y);
		self
	}

	pub fn prevent_default(&self) {
		if !self.kind.is_passive() {
			self.default_prevented.set(true);
		}
	}

	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	/// Whether the target is a form control (`input`, `textarea`, `select`).
	pub fn targets_form_control(&self) -> bool {
		matches!(
			self.target_tag.as_deref(),
			Some("input" | "textarea" | "select")
		)
	}
}

pub type EventHandler = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// Opaque id of an installed listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
	pub(crate) fn next(counter: &AtomicU64) -> Self {
		Self(counter.fetch_add(1, Ordering::Relaxed))
	}
}

/// Document-level listener registration
pub trait DocumentEvents {
	fn listen(&self, kind: EventKind, handler: EventHandler) -> GuardResult<ListenerId>;

	/// Remove a listener. Returns `false` if it was not installed.
	fn unlisten(&self, id: ListenerId) -> bool;
}

/// In-process document used by headless hosts and tests
///
/// # Examples
///
/// ```
/// use formgate_guard::{DocumentEvents, DomEvent, EventHub, EventKind};
/// use std::sync::Arc;
///
/// let hub = EventHub::new();
/// hub.listen(EventKind::Copy, Arc::new(|event: &DomEvent| event.prevent_default()))
///     .unwrap();
///
/// assert!(hub.dispatch(&DomEvent::new(EventKind::Copy)));
/// assert!(!hub.dispatch(&DomEvent::new(EventKind::Paste)));
/// ```
#[derive(Default)]
pub struct EventHub {
	listeners: Mutex<Vec<(ListenerId, EventKind, EventHandler)>>,
	next_id: AtomicU64,
}

impl EventHub {
	pub fn new() -> Self {
		Self::default()
	}

	/// Run every listener for the event's kind in installation order.
	///
	/// Returns whether any listener prevented the default action.
	pub fn dispatch(&self, event: &DomEvent) -> bool {
		// Handlers may install or remove listeners, so run them unlocked
		let handlers: Vec<EventHandler> = self
			.listeners
			.lock()
			.iter()
			.filter(|(_, kind, _)| *kind == event.kind)
			.map(|(_, _, handler)| handler.clone())
			.collect();
		for handler in handlers {
			handler(event);
		}
		event.default_prevented()
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}

	pub fn listener_count_for(&self, kind: EventKind) -> usize {
		self.listeners
			.lock()
			.iter()
			.filter(|(_, k, _)| *k == kind)
			.count()
	}
}

impl DocumentEvents for EventHub {
	fn listen(&self, kind: EventKind, handler: EventHandler) -> GuardResult<ListenerId> {
		let id = ListenerId::next(&self.next_id);
		self.listeners.lock().push((id, kind, handler));
		Ok(id)
	}

	fn unlisten(&self, id: ListenerId) -> bool {
		let mut listeners = self.listeners.lock();
		let before = listeners.len();
		listeners.retain(|(listener, _, _)| *listener != id);
		listeners.len() != before
	}
}

impl fmt::Debug for EventHub {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventHub")
			.field("listeners", &self.listener_count())
			.finish()
	}
}

/// Scoped set of installed listeners, removed on drop
pub struct ListenerGuard {
	events: Arc<dyn DocumentEvents>,
	ids: Vec<ListenerId>,
}

impl ListenerGuard {
	pub fn new(events: Arc<dyn DocumentEvents>) -> Self {
		Self {
			events,
			ids: Vec::new(),
		}
	}

	/// Install a listener owned by this guard.
	pub fn listen(&mut self, kind: EventKind, handler: EventHandler) -> GuardResult<ListenerId> {
		let id = self.events.listen(kind, handler)?;
		self.ids.push(id);
		Ok(id)
	}

	/// Move every listener of `other` into this guard.
	pub fn absorb(&mut self, mut other: ListenerGuard) {
		self.ids.append(&mut other.ids);
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	/// Remove all listeners now.
	pub fn release(&mut self) {
		for id in self.ids.drain(..) {
			self.events.unlisten(id);
		}
	}
}

impl Drop for ListenerGuard {
	fn drop(&mut self) {
		if !self.ids.is_empty() {
			tracing::debug!(listeners = self.ids.len(), "removing document listeners");
			self.release();
		}
	}
}

impl fmt::Debug for ListenerGuard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListenerGuard")
			.field("ids", &self.ids)
			.finish_non_exhaustive()
	}
}
