//! Repeating ticks
//!
//! Natively the ticks run as a Tokio task; in the browser they run on a
//! `setInterval` through `gloo-timers`. Both stop when the callback returns
//! `false` or the driver is dropped.

use crate::engine::GuardPhase;
use crate::session::SharedGuard;
use std::fmt;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use tokio::task::JoinHandle;
#[cfg(not(target_arch = "wasm32"))]
use tokio::time::MissedTickBehavior;

#[cfg(target_arch = "wasm32")]
use gloo_timers::callback::Interval;
#[cfg(target_arch = "wasm32")]
use std::cell::Cell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Repeating callback, cancelled on drop
///
/// [`TickDriver::spawn`] ticks a guard until it expires. The ticks only
/// trigger recomputation; remaining time always comes from the guard's
/// wall-clock anchor.
pub struct TickDriver {
	#[cfg(not(target_arch = "wasm32"))]
	handle: JoinHandle<()>,
	#[cfg(target_arch = "wasm32")]
	interval: Option<Interval>,
	#[cfg(target_arch = "wasm32")]
	finished: Rc<Cell<bool>>,
	period: Duration,
}

impl TickDriver {
	/// Tick `guard` every `period` until it expires.
	///
	/// Natively this must run inside a Tokio runtime.
	///
	/// # Examples
	///
	/// ```
	/// use formgate_guard::{
	///     DEFAULT_TICK_INTERVAL, GuardConfig, GuardEngine, ManualClock, SharedGuard, TickDriver,
	/// };
	/// use std::sync::Arc;
	///
	/// # #[tokio::main(flavor = "current_thread")]
	/// # async fn main() {
	/// let guard = SharedGuard::new(GuardEngine::new(
	///     GuardConfig::new(30),
	///     Arc::new(ManualClock::default()),
	/// ));
	/// let driver = TickDriver::spawn(guard, DEFAULT_TICK_INTERVAL);
	/// assert_eq!(driver.period(), DEFAULT_TICK_INTERVAL);
	/// # }
	/// ```
	pub fn spawn(guard: SharedGuard, period: Duration) -> Self {
		Self::every(period, move || {
			if guard.tick().phase == GuardPhase::Expired {
				tracing::debug!("tick driver finished");
				return false;
			}
			true
		})
	}

	/// Call `tick` every `period` while it returns `true`.
	#[cfg(not(target_arch = "wasm32"))]
	pub fn every<F>(period: Duration, mut tick: F) -> Self
	where
		F: FnMut() -> bool + Send + 'static,
	{
		let handle = tokio::spawn(async move {
			let mut interval = tokio::time::interval(period);
			interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
			loop {
				interval.tick().await;
				if !tick() {
					break;
				}
			}
		});
		Self { handle, period }
	}

	/// Call `tick` every `period` while it returns `true`.
	#[cfg(target_arch = "wasm32")]
	pub fn every<F>(period: Duration, mut tick: F) -> Self
	where
		F: FnMut() -> bool + 'static,
	{
		let finished = Rc::new(Cell::new(false));
		let done = finished.clone();
		let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX).max(1);
		let interval = Interval::new(millis, move || {
			if !done.get() && !tick() {
				done.set(true);
			}
		});
		Self {
			interval: Some(interval),
			finished,
			period,
		}
	}

	pub fn period(&self) -> Duration {
		self.period
	}

	/// Whether ticking has ended, normally because the guard expired.
	#[cfg(not(target_arch = "wasm32"))]
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}

	/// Whether ticking has ended, normally because the guard expired.
	#[cfg(target_arch = "wasm32")]
	pub fn is_finished(&self) -> bool {
		self.finished.get()
	}

	pub fn stop(self) {
		// Drop cancels
	}
}

impl fmt::Debug for TickDriver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TickDriver")
			.field("period", &self.period)
			.field("finished", &self.is_finished())
			.finish()
	}
}

impl Drop for TickDriver {
	#[cfg(not(target_arch = "wasm32"))]
	fn drop(&mut self) {
		self.handle.abort();
	}

	#[cfg(target_arch = "wasm32")]
	fn drop(&mut self) {
		if let Some(interval) = self.interval.take() {
			interval.cancel();
		}
	}
}
