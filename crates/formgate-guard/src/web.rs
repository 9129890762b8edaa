//! Browser document adapter
//!
//! Binds [`DocumentEvents`] to `web_sys::Document`. Each listener keeps its JS
//! closure alive until it is removed, so nothing is leaked with `forget()`.

use crate::error::{GuardError, GuardResult};
use crate::events::{DocumentEvents, DomEvent, EventHandler, EventKind, ListenerId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

type JsListener = Closure<dyn FnMut(web_sys::Event)>;

pub struct WebDocument {
	document: web_sys::Document,
	listeners: RefCell<HashMap<ListenerId, (EventKind, JsListener)>>,
	next_id: AtomicU64,
}

impl WebDocument {
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			listeners: RefCell::new(HashMap::new()),
			next_id: AtomicU64::new(0),
		}
	}

	/// Adapter over `window.document`.
	pub fn current() -> GuardResult<Self> {
		web_sys::window()
			.and_then(|window| window.document())
			.map(Self::new)
			.ok_or_else(|| GuardError::InvalidConfig("no document available".to_string()))
	}
}

fn to_dom_event(kind: EventKind, event: &web_sys::Event) -> DomEvent {
	let mut dom_event = DomEvent::new(kind);
	if let Some(element) = event
		.target()
		.and_then(|target| target.dyn_into::<web_sys::Element>().ok())
	{
		dom_event = dom_event.with_target(element.tag_name());
	}
	if let Some(mouse) = event.dyn_ref::<web_sys::MouseEvent>() {
		dom_event = dom_event.at(f64::from(mouse.client_x()), f64::from(mouse.client_y()));
	}
	if kind == EventKind::Scroll
		&& let Some(scroll_y) = web_sys::window().and_then(|window| window.scroll_y().ok())
	{
		dom_event = dom_event.scrolled_to(scroll_y);
	}
	dom_event
}

impl DocumentEvents for WebDocument {
	fn listen(&self, kind: EventKind, handler: EventHandler) -> GuardResult<ListenerId> {
		let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
			let dom_event = to_dom_event(kind, &event);
			handler(&dom_event);
			if dom_event.default_prevented() {
				event.prevent_default();
			}
		}) as Box<dyn FnMut(_)>);

		let options = web_sys::AddEventListenerOptions::new();
		options.set_passive(kind.is_passive());
		self.document
			.add_event_listener_with_callback_and_add_event_listener_options(
				kind.as_str(),
				closure.as_ref().unchecked_ref(),
				&options,
			)
			.map_err(|e| GuardError::ListenerInstall {
				kind,
				reason: format!("{e:?}"),
			})?;

		let id = ListenerId::next(&self.next_id);
		self.listeners.borrow_mut().insert(id, (kind, closure));
		Ok(id)
	}

	fn unlisten(&self, id: ListenerId) -> bool {
		let Some((kind, closure)) = self.listeners.borrow_mut().remove(&id) else {
			return false;
		};
		if let Err(e) = self
			.document
			.remove_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
		{
			tracing::warn!(event = %kind, error = ?e, "failed to remove document listener");
		}
		true
	}
}

impl Drop for WebDocument {
	fn drop(&mut self) {
		let ids: Vec<ListenerId> = self.listeners.borrow().keys().copied().collect();
		for id in ids {
			self.unlisten(id);
		}
	}
}
