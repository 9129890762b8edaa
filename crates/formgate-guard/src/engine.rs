//! Countdown state machine
//!
//! `Idle -> Active -> {Warning, Urgent} -> Expired`. Remaining time is always
//! recomputed from a wall-clock anchor as
//! `max_time - floor((now - anchor) / 1s)`, so missed or late ticks never skew
//! it. Pausing stores nothing but the remaining seconds; resuming re-anchors at
//! `now - elapsed`.
//!
//! Expiry is latched: [`Tick::expired_now`] is `true` for exactly one tick per
//! countdown, however often [`GuardEngine::tick`] runs afterwards.

use crate::clock::Clock;
use crate::error::{GuardError, GuardResult};
use crate::trigger::StartTrigger;
use chrono::{DateTime, Duration, Utc};
use formgate_forms::LoadedItem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_TIME_LIMIT_SECS: u32 = 900;
pub const DEFAULT_WARNING_SECS: u32 = 60;
pub const DEFAULT_URGENT_FLOOR_SECS: u32 = 5;

/// When the countdown enters its warning phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum WarningThreshold {
	/// Fixed number of seconds, capped at the time limit.
	Seconds(u32),
	/// Share of the time limit, in percent, rounded up to whole seconds.
	Percentage(f64),
}

impl WarningThreshold {
	/// Threshold in seconds for a countdown of `max_time_secs`
	///
	/// # Examples
	///
	/// ```
	/// use formgate_guard::WarningThreshold;
	///
	/// assert_eq!(WarningThreshold::Seconds(120).effective(60), 60);
	/// assert_eq!(WarningThreshold::Percentage(10.0).effective(95), 10);
	/// ```
	pub fn effective(self, max_time_secs: u32) -> u32 {
		match self {
			WarningThreshold::Seconds(secs) => secs.min(max_time_secs),
			WarningThreshold::Percentage(percent) => {
				let secs = (percent / 100.0 * f64::from(max_time_secs)).ceil();
				secs.clamp(0.0, f64::from(max_time_secs)) as u32
			}
		}
	}
}

impl Default for WarningThreshold {
	fn default() -> Self {
		WarningThreshold::Seconds(DEFAULT_WARNING_SECS)
	}
}

/// Configuration handed over by the hosting page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardConfig {
	pub max_time_secs: u32,
	pub warning: WarningThreshold,
	pub urgent_floor_secs: u32,
	pub start_trigger: StartTrigger,
}

impl GuardConfig {
	pub fn new(max_time_secs: u32) -> Self {
		Self {
			max_time_secs,
			..Self::default()
		}
	}

	/// Guard a loaded item, falling back to `defaults` for an unset time limit.
	pub fn for_item(item: &LoadedItem, defaults: &GuardConfig) -> Self {
		Self {
			max_time_secs: item.time_limit_secs.unwrap_or(defaults.max_time_secs),
			..defaults.clone()
		}
	}

	pub fn with_warning(mut self, warning: WarningThreshold) -> Self {
		self.warning = warning;
		self
	}

	pub fn with_urgent_floor(mut self, secs: u32) -> Self {
		self.urgent_floor_secs = secs;
		self
	}

	pub fn with_start_trigger(mut self, trigger: StartTrigger) -> Self {
		self.start_trigger = trigger;
		self
	}

	pub fn validate(&self) -> GuardResult<()> {
		if self.max_time_secs == 0 {
			return Err(GuardError::InvalidConfig(
				"time limit must be at least one second".to_string(),
			));
		}
		if let WarningThreshold::Percentage(percent) = self.warning
			&& !(0.0..=100.0).contains(&percent)
		{
			return Err(GuardError::InvalidConfig(format!(
				"warning percentage {percent} is outside 0..=100"
			)));
		}
		Ok(())
	}
}

impl Default for GuardConfig {
	fn default() -> Self {
		Self {
			max_time_secs: DEFAULT_TIME_LIMIT_SECS,
			warning: WarningThreshold::default(),
			urgent_floor_secs: DEFAULT_URGENT_FLOOR_SECS,
			start_trigger: StartTrigger::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardPhase {
	Idle,
	Active,
	Warning,
	Urgent,
	Expired,
}

/// Result of one recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
	pub remaining_secs: u32,
	pub phase: GuardPhase,
	/// `true` only on the tick that observed expiry.
	pub expired_now: bool,
}

/// Serializable guard status for the hosting page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardSnapshot {
	pub max_time: u32,
	pub time_remaining: u32,
	pub is_active: bool,
	pub has_expired: bool,
	pub is_warning: bool,
	pub is_urgent: bool,
	pub warning_threshold: u32,
	pub start_trigger: StartTrigger,
	pub phase: GuardPhase,
	pub formatted: String,
}

/// Wall-clock anchored countdown
///
/// # Examples
///
/// ```
/// use formgate_guard::{GuardConfig, GuardEngine, GuardPhase, ManualClock, StartTrigger};
/// use std::sync::Arc;
///
/// let clock = Arc::new(ManualClock::default());
/// let mut engine = GuardEngine::new(
///     GuardConfig::new(60).with_start_trigger(StartTrigger::Manual),
///     clock.clone(),
/// );
/// assert_eq!(engine.phase(), GuardPhase::Idle);
///
/// engine.start();
/// clock.advance_secs(15);
/// assert_eq!(engine.tick().remaining_secs, 45);
/// assert_eq!(engine.formatted_remaining(), "00:45");
/// ```
pub struct GuardEngine {
	config: GuardConfig,
	clock: Arc<dyn Clock>,
	anchor: Option<DateTime<Utc>>,
	remaining: u32,
	started: bool,
	has_expired: bool,
}

impl GuardEngine {
	/// Create an idle engine. A `load` trigger starts it immediately.
	pub fn new(config: GuardConfig, clock: Arc<dyn Clock>) -> Self {
		let mut engine = Self {
			remaining: config.max_time_secs,
			config,
			clock,
			anchor: None,
			started: false,
			has_expired: false,
		};
		if engine.config.start_trigger == StartTrigger::Load {
			engine.start();
		}
		engine
	}

	pub fn config(&self) -> &GuardConfig {
		&self.config
	}

	pub fn max_time_secs(&self) -> u32 {
		self.config.max_time_secs
	}

	pub fn start_trigger(&self) -> StartTrigger {
		self.config.start_trigger
	}

	/// Begin (or resume) counting down. Returns `false` when already running
	/// or expired.
	pub fn start(&mut self) -> bool {
		if self.has_expired || self.anchor.is_some() {
			return false;
		}
		let elapsed = self.config.max_time_secs - self.remaining;
		self.anchor = Some(self.clock.now() - Duration::seconds(i64::from(elapsed)));
		if !self.started {
			tracing::info!(
				max_time = self.config.max_time_secs,
				trigger = %self.config.start_trigger,
				"guard started"
			);
		}
		self.started = true;
		true
	}

	/// Stop the clock, keeping the remaining time. Returns `false` when not
	/// running.
	pub fn pause(&mut self) -> bool {
		if self.anchor.is_none() {
			return false;
		}
		self.tick();
		self.anchor = None;
		tracing::debug!(remaining = self.remaining, "guard paused");
		true
	}

	pub fn resume(&mut self) -> bool {
		self.start()
	}

	/// Recompute remaining time from the anchor
	///
	/// Reaching zero clamps the remaining time, stops the clock and latches
	/// expiry.
	pub fn tick(&mut self) -> Tick {
		if self.has_expired {
			return self.tick_result(false);
		}
		let Some(anchor) = self.anchor else {
			return self.tick_result(false);
		};

		let elapsed_ms = (self.clock.now() - anchor).num_milliseconds().max(0);
		let remaining = i64::from(self.config.max_time_secs) - elapsed_ms / 1000;
		if remaining > 0 {
			self.remaining = remaining as u32;
			tracing::trace!(remaining = self.remaining, "guard tick");
			return self.tick_result(false);
		}

		self.remaining = 0;
		self.anchor = None;
		self.has_expired = true;
		tracing::info!(max_time = self.config.max_time_secs, "guard expired");
		self.tick_result(true)
	}

	fn tick_result(&self, expired_now: bool) -> Tick {
		Tick {
			remaining_secs: self.remaining,
			phase: self.phase(),
			expired_now,
		}
	}

	/// Back to a full, idle countdown with expiry cleared.
	///
	/// A `load` trigger restarts right away.
	pub fn reset(&mut self) {
		self.remaining = self.config.max_time_secs;
		self.anchor = None;
		self.started = false;
		self.has_expired = false;
		tracing::debug!(max_time = self.config.max_time_secs, "guard reset");
		if self.config.start_trigger == StartTrigger::Load {
			self.start();
		}
	}

	/// Change the time limit, which resets the countdown.
	pub fn set_max_time(&mut self, max_time_secs: u32) {
		self.config.max_time_secs = max_time_secs;
		self.reset();
	}

	pub fn remaining_secs(&self) -> u32 {
		self.remaining
	}

	/// Whether the clock is running.
	pub fn is_active(&self) -> bool {
		self.anchor.is_some()
	}

	pub fn is_started(&self) -> bool {
		self.started
	}

	pub fn is_paused(&self) -> bool {
		self.started && !self.has_expired && self.anchor.is_none()
	}

	pub fn has_expired(&self) -> bool {
		self.has_expired
	}

	pub fn effective_threshold(&self) -> u32 {
		self.config.warning.effective(self.config.max_time_secs)
	}

	pub fn is_warning(&self) -> bool {
		self.started && !self.has_expired && self.remaining <= self.effective_threshold()
	}

	pub fn is_urgent(&self) -> bool {
		let threshold = f64::from(self.effective_threshold());
		let floor = f64::from(self.config.urgent_floor_secs).min(threshold / 2.0);
		self.is_warning() && f64::from(self.remaining) <= floor
	}

	pub fn phase(&self) -> GuardPhase {
		if self.has_expired {
			GuardPhase::Expired
		} else if !self.started {
			GuardPhase::Idle
		} else if self.is_urgent() {
			GuardPhase::Urgent
		} else if self.is_warning() {
			GuardPhase::Warning
		} else {
			GuardPhase::Active
		}
	}

	/// Remaining time as `MM:SS`.
	pub fn formatted_remaining(&self) -> String {
		format_clock(self.remaining)
	}

	pub fn snapshot(&self) -> GuardSnapshot {
		GuardSnapshot {
			max_time: self.config.max_time_secs,
			time_remaining: self.remaining,
			is_active: self.is_active(),
			has_expired: self.has_expired,
			is_warning: self.is_warning(),
			is_urgent: self.is_urgent(),
			warning_threshold: self.effective_threshold(),
			start_trigger: self.config.start_trigger,
			phase: self.phase(),
			formatted: self.formatted_remaining(),
		}
	}
}

impl fmt::Debug for GuardEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GuardEngine")
			.field("config", &self.config)
			.field("anchor", &self.anchor)
			.field("remaining", &self.remaining)
			.field("started", &self.started)
			.field("has_expired", &self.has_expired)
			.finish_non_exhaustive()
	}
}

/// Format seconds as `MM:SS`; minutes grow past two digits when needed.
pub fn format_clock(secs: u32) -> String {
	format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;
	use rstest::{fixture, rstest};

	#[fixture]
	fn clock() -> Arc<ManualClock> {
		Arc::new(ManualClock::default())
	}

	fn engine(clock: &Arc<ManualClock>, config: GuardConfig) -> GuardEngine {
		GuardEngine::new(config, clock.clone())
	}

	fn sixty_ten() -> GuardConfig {
		GuardConfig::new(60).with_warning(WarningThreshold::Seconds(10))
	}

	#[rstest]
	fn test_warning_urgent_expiry_sequence(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(&clock, sixty_ten());

		// Act + Assert
		clock.advance_secs(51);
		engine.tick();
		assert!(engine.is_warning());
		assert!(!engine.is_urgent());
		assert_eq!(engine.phase(), GuardPhase::Warning);

		clock.advance_secs(5);
		engine.tick();
		assert!(engine.is_urgent());
		assert_eq!(engine.phase(), GuardPhase::Urgent);

		clock.advance_secs(4);
		let tick = engine.tick();
		assert!(tick.expired_now);
		assert!(engine.has_expired());
		assert_eq!(engine.remaining_secs(), 0);
	}

	#[rstest]
	fn test_expiry_reported_exactly_once(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(&clock, sixty_ten());
		clock.advance_secs(60);

		// Act
		let fired = (0..4).filter(|_| {
			clock.advance_secs(1);
			engine.tick().expired_now
		});

		// Assert
		assert_eq!(fired.count(), 1);
		assert!(!engine.is_active());
	}

	#[rstest]
	fn test_missed_ticks_follow_wall_clock(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(&clock, sixty_ten());
		clock.advance_secs(1);
		engine.tick();
		clock.advance_secs(1);
		engine.tick();

		// Act
		clock.advance_secs(3);
		let tick = engine.tick();

		// Assert
		assert_eq!(tick.remaining_secs, 55);
	}

	#[rstest]
	fn test_sub_second_elapsed_is_floored(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(&clock, sixty_ten());

		// Act
		clock.advance_millis(1999);
		let tick = engine.tick();

		// Assert
		assert_eq!(tick.remaining_secs, 59);
	}

	#[rstest]
	fn test_manual_trigger_stays_idle(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(
			&clock,
			sixty_ten().with_start_trigger(StartTrigger::Manual),
		);

		// Act
		clock.advance_secs(30);
		let tick = engine.tick();

		// Assert
		assert_eq!(tick.remaining_secs, 60);
		assert_eq!(tick.phase, GuardPhase::Idle);
		assert!(!engine.is_warning());
	}

	#[rstest]
	fn test_pause_and_resume_preserve_elapsed(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(&clock, sixty_ten());
		clock.advance_secs(20);
		engine.pause();

		// Act
		clock.advance_secs(100);
		let paused = engine.tick();
		engine.resume();
		clock.advance_secs(5);
		let resumed = engine.tick();

		// Assert
		assert_eq!(paused.remaining_secs, 40);
		assert!(engine.is_active());
		assert_eq!(resumed.remaining_secs, 35);
	}

	#[rstest]
	fn test_start_is_rejected_after_expiry(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(&clock, sixty_ten());
		clock.advance_secs(61);
		engine.tick();

		// Act
		let started = engine.start();

		// Assert
		assert!(!started);
		assert!(engine.has_expired());
	}

	#[rstest]
	fn test_reset_clears_expiry_and_reanchors(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(&clock, sixty_ten());
		clock.advance_secs(61);
		engine.tick();

		// Act
		engine.reset();
		clock.advance_secs(10);
		let tick = engine.tick();

		// Assert
		assert!(!engine.has_expired());
		assert_eq!(tick.remaining_secs, 50);
		assert_eq!(tick.phase, GuardPhase::Active);
	}

	#[rstest]
	fn test_set_max_time_resets(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(&clock, sixty_ten());
		clock.advance_secs(30);
		engine.tick();

		// Act
		engine.set_max_time(120);

		// Assert
		assert_eq!(engine.remaining_secs(), 120);
		assert_eq!(engine.max_time_secs(), 120);
	}

	#[rstest]
	#[case(WarningThreshold::Seconds(10), 60, 10)]
	#[case(WarningThreshold::Seconds(90), 60, 60)]
	#[case(WarningThreshold::Percentage(25.0), 60, 15)]
	#[case(WarningThreshold::Percentage(10.0), 61, 7)]
	#[case(WarningThreshold::Percentage(150.0), 60, 60)]
	fn test_effective_threshold(
		#[case] warning: WarningThreshold,
		#[case] max: u32,
		#[case] expected: u32,
	) {
		// Act + Assert
		assert_eq!(warning.effective(max), expected);
	}

	#[rstest]
	fn test_small_threshold_halves_urgent_floor(clock: Arc<ManualClock>) {
		// Arrange
		let mut engine = engine(
			&clock,
			GuardConfig::new(30).with_warning(WarningThreshold::Seconds(6)),
		);

		// Act
		clock.advance_secs(26);
		engine.tick();

		// Assert
		assert!(engine.is_warning());
		assert!(!engine.is_urgent());
		clock.advance_secs(1);
		engine.tick();
		assert!(engine.is_urgent());
	}

	#[rstest]
	#[case(0, "00:00")]
	#[case(59, "00:59")]
	#[case(900, "15:00")]
	#[case(6000, "100:00")]
	fn test_format_clock(#[case] secs: u32, #[case] expected: &str) {
		// Act + Assert
		assert_eq!(format_clock(secs), expected);
	}

	#[rstest]
	fn test_snapshot_serializes_camel_case(clock: Arc<ManualClock>) {
		// Arrange
		let engine = engine(&clock, sixty_ten());

		// Act
		let json = serde_json::to_value(engine.snapshot()).unwrap();

		// Assert
		assert_eq!(json["timeRemaining"], 60);
		assert_eq!(json["phase"], "active");
		assert_eq!(json["startTrigger"], "load");
	}

	#[rstest]
	#[case(GuardConfig::new(0))]
	#[case(GuardConfig::new(60).with_warning(WarningThreshold::Percentage(-1.0)))]
	fn test_invalid_config(#[case] config: GuardConfig) {
		// Act + Assert
		assert!(matches!(config.validate(), Err(GuardError::InvalidConfig(_))));
	}

	#[rstest]
	fn test_config_for_item_uses_item_time_limit() {
		// Arrange
		let item = LoadedItem {
			schema: formgate_forms::FormSchema::new("Quiz"),
			title: "Quiz".to_string(),
			time_limit_secs: Some(300),
			expires_at: None,
		};
		let defaults = GuardConfig::default().with_start_trigger(StartTrigger::FieldChange);

		// Act
		let config = GuardConfig::for_item(&item, &defaults);

		// Assert
		assert_eq!(config.max_time_secs, 300);
		assert_eq!(config.start_trigger, StartTrigger::FieldChange);
	}
}
