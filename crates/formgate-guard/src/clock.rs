//! Time sources
//!
//! The guard never trusts tick counts; it always recomputes from a wall-clock
//! anchor read through a [`Clock`]. Tests drive time with [`ManualClock`].

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// Clock that only moves when told to
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use formgate_guard::{Clock, ManualClock};
///
/// let clock = ManualClock::default();
/// let start = clock.now();
/// clock.advance_secs(3);
/// assert_eq!(clock.now() - start, Duration::seconds(3));
/// ```
#[derive(Debug)]
pub struct ManualClock {
	now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
	pub fn new(start: DateTime<Utc>) -> Self {
		Self {
			now: Mutex::new(start),
		}
	}

	pub fn set(&self, now: DateTime<Utc>) {
		*self.now.lock() = now;
	}

	pub fn advance(&self, by: Duration) {
		*self.now.lock() += by;
	}

	pub fn advance_secs(&self, secs: i64) {
		self.advance(Duration::seconds(secs));
	}

	pub fn advance_millis(&self, millis: i64) {
		self.advance(Duration::milliseconds(millis));
	}
}

impl Default for ManualClock {
	/// Starts at the Unix epoch so runs are reproducible.
	fn default() -> Self {
		Self::new(DateTime::UNIX_EPOCH)
	}
}

impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		*self.now.lock()
	}
}
