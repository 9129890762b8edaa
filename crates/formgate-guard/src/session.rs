//! A guard mounted over a live form
//!
//! [`GuardedSession::mount`] wires a [`GuardEngine`] to the document: the
//! start trigger, clipboard blocking and the floating overlay all become
//! document listeners owned by one [`ListenerGuard`]. Dropping the session
//! removes every listener, stops the tick driver and revokes any object URLs
//! it registered.

use crate::clipboard::{ClipboardAction, ClipboardCallback, block_clipboard};
use crate::clock::Clock;
use crate::engine::{GuardConfig, GuardEngine, GuardPhase, GuardSnapshot, Tick};
use crate::driver::TickDriver;
use crate::error::GuardResult;
use crate::events::{DocumentEvents, DomEvent, EventKind, ListenerGuard, Point};
use crate::object_url::{ObjectUrlRegistry, Revoker};
use crate::overlay::{FloatingOverlay, OverlayConfig, Size};
use crate::trigger::{StartGate, StartTrigger};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type ExpiryCallback = Arc<dyn Fn(&GuardSnapshot) + Send + Sync>;

/// Engine shared between listeners, the tick driver and the host
///
/// Expiry callbacks run after the engine lock is released, so they may call
/// back into the guard.
#[derive(Clone)]
pub struct SharedGuard {
	engine: Arc<Mutex<GuardEngine>>,
	on_expire: Arc<Mutex<Vec<ExpiryCallback>>>,
}

impl SharedGuard {
	/// Share `engine`. No expiry callbacks are registered yet.
	pub fn new(engine: GuardEngine) -> Self {
		Self {
			engine: Arc::new(Mutex::new(engine)),
			on_expire: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Register a callback run once per countdown when it expires.
	pub fn on_expire(&self, callback: ExpiryCallback) {
		self.on_expire.lock().push(callback);
	}

	/// Recompute from the clock and run expiry callbacks if this tick expired.
	pub fn tick(&self) -> Tick {
		let (tick, snapshot) = {
			let mut engine = self.engine.lock();
			let tick = engine.tick();
			(tick, tick.expired_now.then(|| engine.snapshot()))
		};
		if let Some(snapshot) = snapshot {
			self.notify_expired(&snapshot);
		}
		tick
	}

	fn notify_expired(&self, snapshot: &GuardSnapshot) {
		let callbacks = self.on_expire.lock().clone();
		for callback in callbacks {
			callback(snapshot);
		}
	}

	/// Anchor the countdown now. Returns `false` if it was already started.
	pub fn start(&self) -> bool {
		self.engine.lock().start()
	}

	/// Pause the clock. An expiry observed on the way is still reported.
	pub fn pause(&self) -> bool {
		let (paused, snapshot) = {
			let mut engine = self.engine.lock();
			let tick = engine.tick();
			let paused = engine.pause();
			(paused, tick.expired_now.then(|| engine.snapshot()))
		};
		if let Some(snapshot) = snapshot {
			self.notify_expired(&snapshot);
		}
		paused
	}

	/// Re-anchor so the paused remaining time carries on.
	pub fn resume(&self) -> bool {
		self.engine.lock().resume()
	}

	pub(crate) fn reset(&self) {
		self.engine.lock().reset();
	}

	pub(crate) fn set_max_time(&self, max_time_secs: u32) {
		self.engine.lock().set_max_time(max_time_secs);
	}

	/// Whole seconds left as of the last tick.
	pub fn remaining_secs(&self) -> u32 {
		self.engine.lock().remaining_secs()
	}

	pub fn is_started(&self) -> bool {
		self.engine.lock().is_started()
	}

	/// Whether the countdown has reached zero.
	pub fn has_expired(&self) -> bool {
		self.engine.lock().has_expired()
	}

	pub fn phase(&self) -> GuardPhase {
		self.engine.lock().phase()
	}

	pub fn start_trigger(&self) -> StartTrigger {
		self.engine.lock().start_trigger()
	}

	/// Serializable status for the hosting page.
	pub fn snapshot(&self) -> GuardSnapshot {
		self.engine.lock().snapshot()
	}

	/// Current configuration, including any changed time limit.
	pub fn config(&self) -> GuardConfig {
		self.engine.lock().config().clone()
	}
}

impl fmt::Debug for SharedGuard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SharedGuard")
			.field("engine", &*self.engine.lock())
			.field("on_expire", &self.on_expire.lock().len())
			.finish()
	}
}

/// Initial placement of the floating timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
	pub config: OverlayConfig,
	pub viewport: Size,
	pub size: Size,
	pub offset: Point,
}

/// Everything [`GuardedSession::mount`] installs
#[derive(Clone, Default)]
pub struct SessionOptions {
	pub guard: GuardConfig,
	pub block_clipboard: bool,
	/// Render the timer as a draggable overlay instead of inline.
	pub overlay: Option<OverlayLayout>,
	pub on_expire: Option<ExpiryCallback>,
	pub on_clipboard: Option<ClipboardCallback>,
}

impl SessionOptions {
	/// Inline timer, clipboard left alone, no callbacks.
	pub fn new(guard: GuardConfig) -> Self {
		Self {
			guard,
			..Self::default()
		}
	}

	/// Intercept copy, cut and paste while mounted.
	pub fn blocking_clipboard(mut self) -> Self {
		self.block_clipboard = true;
		self
	}

	pub fn floating(mut self, layout: OverlayLayout) -> Self {
		self.overlay = Some(layout);
		self
	}

	/// Run `callback` once when the countdown expires.
	pub fn on_expire(mut self, callback: ExpiryCallback) -> Self {
		self.on_expire = Some(callback);
		self
	}

	/// Report each blocked clipboard attempt to `callback`.
	pub fn on_clipboard(mut self, callback: ClipboardCallback) -> Self {
		self.on_clipboard = Some(callback);
		self
	}
}

impl fmt::Debug for SessionOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionOptions")
			.field("guard", &self.guard)
			.field("block_clipboard", &self.block_clipboard)
			.field("overlay", &self.overlay)
			.finish_non_exhaustive()
	}
}

/// A running guard and the listeners it owns
///
/// # Examples
///
/// ```
/// use formgate_guard::{
///     DomEvent, EventHub, EventKind, GuardConfig, GuardPhase, GuardedSession, ManualClock,
///     SessionOptions, StartTrigger,
/// };
/// use std::sync::Arc;
///
/// let hub = Arc::new(EventHub::new());
/// let clock = Arc::new(ManualClock::default());
/// let options = SessionOptions::new(
///     GuardConfig::new(60).with_start_trigger(StartTrigger::FieldChange),
/// )
/// .blocking_clipboard();
/// let session = GuardedSession::mount(options, clock.clone(), hub.clone()).unwrap();
/// assert_eq!(session.phase(), GuardPhase::Idle);
///
/// hub.dispatch(&DomEvent::new(EventKind::Input).with_target("input"));
/// clock.advance_secs(10);
/// assert_eq!(session.tick().remaining_secs, 50);
///
/// assert!(hub.dispatch(&DomEvent::new(EventKind::Copy)));
/// drop(session);
/// assert_eq!(hub.listener_count(), 0);
/// ```
pub struct GuardedSession {
	guard: SharedGuard,
	gate: Arc<StartGate>,
	overlay: Option<Arc<Mutex<FloatingOverlay>>>,
	clock: Arc<dyn Clock>,
	listeners: ListenerGuard,
	object_urls: ObjectUrlRegistry,
	driver: Option<TickDriver>,
	settler: Option<TickDriver>,
}

impl GuardedSession {
	/// Validate `options` and install the guard's listeners on `events`.
	///
	/// Object URLs registered with the session are only forgotten on drop;
	/// use [`GuardedSession::with_revoker`] to release them for real.
	pub fn mount(
		options: SessionOptions,
		clock: Arc<dyn Clock>,
		events: Arc<dyn DocumentEvents>,
	) -> GuardResult<Self> {
		options.guard.validate()?;
		let trigger = options.guard.start_trigger;
		let guard = SharedGuard::new(GuardEngine::new(options.guard, clock.clone()));
		if let Some(callback) = options.on_expire {
			guard.on_expire(callback);
		}

		let gate = Arc::new(StartGate::new());
		if guard.is_started() {
			gate.fire();
		}

		let mut listeners = ListenerGuard::new(events.clone());
		if options.block_clipboard {
			let callback = options
				.on_clipboard
				.unwrap_or_else(|| Arc::new(|_: ClipboardAction| {}));
			listeners.absorb(block_clipboard(events.clone(), callback)?);
		}

		for &kind in trigger.listens_to() {
			let guard = guard.clone();
			let gate = gate.clone();
			listeners.listen(
				kind,
				Arc::new(move |event: &DomEvent| {
					if trigger.matches(event) && gate.fire() {
						tracing::debug!(event = %event.kind, "start trigger fired");
						guard.start();
					}
				}),
			)?;
		}

		let overlay = match options.overlay {
			Some(layout) => {
				let overlay = Arc::new(Mutex::new(FloatingOverlay::new(
					layout.config,
					layout.viewport,
					layout.size,
					layout.offset,
				)));
				Self::follow_pointer_and_scroll(&mut listeners, &overlay, &clock)?;
				Some(overlay)
			}
			None => None,
		};

		tracing::info!(
			trigger = %trigger,
			listeners = listeners.len(),
			floating = overlay.is_some(),
			"guard session mounted"
		);

		Ok(Self {
			guard,
			gate,
			overlay,
			clock,
			listeners,
			object_urls: ObjectUrlRegistry::new(Arc::new(|_: &str| {})),
			driver: None,
			settler: None,
		})
	}

	fn follow_pointer_and_scroll(
		listeners: &mut ListenerGuard,
		overlay: &Arc<Mutex<FloatingOverlay>>,
		clock: &Arc<dyn Clock>,
	) -> GuardResult<()> {
		let moving = overlay.clone();
		listeners.listen(
			EventKind::PointerMove,
			Arc::new(move |event: &DomEvent| {
				if let Some(point) = event.point {
					moving.lock().drag_to(point);
				}
			}),
		)?;

		let releasing = overlay.clone();
		listeners.listen(
			EventKind::PointerUp,
			Arc::new(move |_: &DomEvent| releasing.lock().end_drag()),
		)?;

		let scrolling = overlay.clone();
		let clock = clock.clone();
		listeners.listen(
			EventKind::Scroll,
			Arc::new(move |event: &DomEvent| {
				if let Some(scroll_y) = event.scroll_y {
					scrolling.lock().on_scroll(scroll_y, clock.now());
				}
			}),
		)?;
		Ok(())
	}

	/// Release object URLs through `revoker` instead of forgetting them.
	pub fn with_revoker(mut self, revoker: Revoker) -> Self {
		self.object_urls = ObjectUrlRegistry::new(revoker);
		self
	}

	/// Tick the guard every `period` until it expires.
	///
	/// A floating overlay also gets its scroll nudge settled once per quiet
	/// period for as long as the session lives. Natively both timers run on
	/// the Tokio runtime; in the browser they use `setInterval`.
	pub fn spawn_driver(&mut self, period: Duration) {
		self.driver = Some(TickDriver::spawn(self.guard.clone(), period));
		if let Some(overlay) = &self.overlay {
			let overlay = overlay.clone();
			let clock = self.clock.clone();
			let quiet = overlay.lock().quiet_period();
			self.settler = Some(TickDriver::every(quiet, move || {
				overlay.lock().settle(clock.now());
				true
			}));
		}
	}

	/// Whether a tick driver is currently running.
	pub fn is_driven(&self) -> bool {
		self.driver
			.as_ref()
			.is_some_and(|driver| !driver.is_finished())
	}

	/// The shared engine, for reading status or registering callbacks.
	///
	/// Changing the time limit goes through [`GuardedSession::set_max_time`]
	/// so the start trigger and driver follow.
	pub fn guard(&self) -> &SharedGuard {
		&self.guard
	}

	/// Recompute from the clock, reporting an expiry at most once.
	pub fn tick(&self) -> Tick {
		self.guard.tick()
	}

	/// Start explicitly. Later trigger events are then ignored.
	pub fn start(&self) -> bool {
		self.gate.fire();
		self.guard.start()
	}

	/// Freeze the countdown. See [`SharedGuard::pause`].
	pub fn pause(&self) -> bool {
		self.guard.pause()
	}

	pub fn resume(&self) -> bool {
		self.guard.resume()
	}

	/// Full countdown again; event triggers are re-armed.
	pub fn reset(&mut self) {
		self.guard.reset();
		self.rearm();
	}

	/// Change the time limit. Like [`GuardedSession::reset`], this clears any
	/// expiry and waits for the start trigger again.
	///
	/// # Examples
	///
	/// ```
	/// use formgate_guard::{
	///     DomEvent, EventHub, EventKind, GuardConfig, GuardPhase, GuardedSession, ManualClock,
	///     SessionOptions, StartTrigger,
	/// };
	/// use std::sync::Arc;
	///
	/// let hub = Arc::new(EventHub::new());
	/// let clock = Arc::new(ManualClock::default());
	/// let config = GuardConfig::new(30).with_start_trigger(StartTrigger::Interaction);
	/// let mut session =
	///     GuardedSession::mount(SessionOptions::new(config), clock.clone(), hub.clone()).unwrap();
	/// session.start();
	/// clock.advance_secs(30);
	/// assert!(session.tick().expired_now);
	///
	/// session.set_max_time(90).unwrap();
	/// assert_eq!(session.phase(), GuardPhase::Idle);
	/// hub.dispatch(&DomEvent::new(EventKind::PointerDown));
	/// assert_eq!(session.phase(), GuardPhase::Active);
	/// ```
	pub fn set_max_time(&mut self, max_time_secs: u32) -> GuardResult<()> {
		GuardConfig {
			max_time_secs,
			..self.guard.config()
		}
		.validate()?;
		self.guard.set_max_time(max_time_secs);
		self.rearm();
		Ok(())
	}

	fn rearm(&mut self) {
		if self.guard.is_started() {
			self.gate.fire();
		} else {
			self.gate.rearm();
		}
		if let Some(driver) = &self.driver
			&& driver.is_finished()
		{
			let period = driver.period();
			self.driver = Some(TickDriver::spawn(self.guard.clone(), period));
		}
	}

	pub fn snapshot(&self) -> GuardSnapshot {
		self.guard.snapshot()
	}

	/// Phase as of the last tick.
	pub fn phase(&self) -> GuardPhase {
		self.guard.phase()
	}

	/// Whether the form should be locked against further input.
	pub fn is_locked(&self) -> bool {
		self.guard.has_expired()
	}

	/// Document listeners owned by the session.
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	/// Object URLs revoked when the session drops.
	pub fn object_urls(&self) -> &ObjectUrlRegistry {
		&self.object_urls
	}

	/// Overlay position to draw, when floating.
	pub fn overlay_position(&self) -> Option<Point> {
		self.overlay.as_ref().map(|overlay| overlay.lock().position())
	}

	/// Pointer went down on the overlay's handle.
	pub fn begin_drag(&self, pointer: Point) {
		if let Some(overlay) = &self.overlay {
			overlay.lock().begin_drag(pointer);
		}
	}

	/// Window resized; the overlay is clamped into the new viewport.
	pub fn set_viewport(&self, viewport: Size) {
		if let Some(overlay) = &self.overlay {
			overlay.lock().set_viewport(viewport);
		}
	}

	/// Let the scroll nudge decay. Returns whether the position changed.
	pub fn settle_overlay(&self) -> bool {
		match &self.overlay {
			Some(overlay) => overlay.lock().settle(self.clock.now()),
			None => false,
		}
	}
}

impl Drop for GuardedSession {
	fn drop(&mut self) {
		tracing::debug!(
			remaining = self.guard.remaining_secs(),
			"guard session unmounted"
		);
	}
}

impl fmt::Debug for GuardedSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GuardedSession")
			.field("guard", &self.guard)
			.field("listeners", &self.listeners)
			.field("object_urls", &self.object_urls)
			.field("driver", &self.driver)
			.field("settler", &self.settler)
			.finish_non_exhaustive()
	}
}
