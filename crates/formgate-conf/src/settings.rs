//! Typed settings
//!
//! Every section deserializes with `#[serde(default)]`, so a source only has
//! to name the keys it changes.

use crate::error::{SettingsError, SettingsResult};
use crate::sources::{ConfigSource, DefaultSource, EnvSource, TomlFileSource, merge_sources};
use formgate_forms::{DEFAULT_DRAFT_KEY, DEFAULT_HISTORY_LIMIT, DraftResult, DraftStorage, FormBuilder};
use formgate_guard::{
	Clock, DEFAULT_TIME_LIMIT_SECS, DEFAULT_URGENT_FLOOR_SECS, GuardConfig, LinkGenerator,
	LinkIssuer, LinkResult, MemoryLinkIssuer, OverlayConfig, SessionOptions, StartTrigger, TIME_LIMIT_PRESETS_SECS,
	WarningThreshold,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardSettings {
	pub default_time_limit_secs: u32,
	pub warning_threshold: WarningThreshold,
	pub urgent_floor_secs: u32,
	pub tick_interval_ms: u64,
	pub drag_boundary: f64,
	pub scroll_follow_factor: f64,
	pub scroll_decay_factor: f64,
	pub scroll_quiet_ms: i64,
	pub block_clipboard: bool,
	pub start_trigger: StartTrigger,
}

impl Default for GuardSettings {
	fn default() -> Self {
		let overlay = OverlayConfig::default();
		Self {
			default_time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
			warning_threshold: WarningThreshold::default(),
			urgent_floor_secs: DEFAULT_URGENT_FLOOR_SECS,
			tick_interval_ms: 1000,
			drag_boundary: overlay.drag_boundary,
			scroll_follow_factor: overlay.scroll_follow_factor,
			scroll_decay_factor: overlay.scroll_decay_factor,
			scroll_quiet_ms: overlay.scroll_quiet_ms,
			block_clipboard: true,
			start_trigger: StartTrigger::default(),
		}
	}
}

impl GuardSettings {
	/// Guard configuration for items without their own time limit.
	pub fn guard_config(&self) -> GuardConfig {
		GuardConfig::new(self.default_time_limit_secs)
			.with_warning(self.warning_threshold)
			.with_urgent_floor(self.urgent_floor_secs)
			.with_start_trigger(self.start_trigger)
	}

	pub fn overlay_config(&self) -> OverlayConfig {
		OverlayConfig {
			drag_boundary: self.drag_boundary,
			scroll_follow_factor: self.scroll_follow_factor,
			scroll_decay_factor: self.scroll_decay_factor,
			scroll_quiet_ms: self.scroll_quiet_ms,
		}
	}

	pub fn tick_interval(&self) -> Duration {
		Duration::from_millis(self.tick_interval_ms)
	}

	/// Mount options for an item: its own time limit when it has one, the
	/// default otherwise, and clipboard blocking as configured.
	pub fn session_options(&self, time_limit_secs: Option<u32>) -> SessionOptions {
		let mut config = self.guard_config();
		if let Some(secs) = time_limit_secs {
			config.max_time_secs = secs;
		}
		SessionOptions {
			block_clipboard: self.block_clipboard,
			..SessionOptions::new(config)
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
	pub history_limit: usize,
	pub draft_key: String,
}

impl Default for BuilderSettings {
	fn default() -> Self {
		Self {
			history_limit: DEFAULT_HISTORY_LIMIT,
			draft_key: DEFAULT_DRAFT_KEY.to_string(),
		}
	}
}

impl BuilderSettings {
	/// Empty editing session keeping `history_limit` snapshots.
	pub fn form_builder(&self) -> FormBuilder {
		FormBuilder::with_history_limit(self.history_limit)
	}

	/// Save `builder` under the configured draft key.
	pub fn save_draft(&self, builder: &FormBuilder, storage: &dyn DraftStorage) -> DraftResult<()> {
		builder.save_draft(storage, &self.draft_key)
	}

	/// Restore the draft stored under the configured key, if any.
	pub fn restore_draft(
		&self,
		builder: &mut FormBuilder,
		storage: &dyn DraftStorage,
	) -> DraftResult<bool> {
		builder.restore_draft(storage, &self.draft_key)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
	pub base_url: String,
	pub time_limit_presets_secs: Vec<u32>,
}

impl Default for LinkSettings {
	fn default() -> Self {
		Self {
			base_url: "http://localhost:8000/".to_string(),
			time_limit_presets_secs: TIME_LIMIT_PRESETS_SECS.to_vec(),
		}
	}
}

impl LinkSettings {
	/// In-memory issuer minting links under `base_url`.
	pub fn memory_issuer(&self) -> LinkResult<MemoryLinkIssuer> {
		MemoryLinkIssuer::parse(&self.base_url)
	}

	/// Generator offering the configured time-limit presets.
	pub fn link_generator(&self, issuer: Arc<dyn LinkIssuer>, clock: Arc<dyn Clock>) -> LinkGenerator {
		LinkGenerator::new(issuer, clock).with_presets(self.time_limit_presets_secs.clone())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// `tracing` filter directive, e.g. `info` or `formgate_guard=debug`.
	pub level: String,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

/// All Formgate settings
///
/// # Examples
///
/// ```
/// use formgate_conf::{EnvSource, Settings};
///
/// let settings = Settings::builder()
///     .add_source(EnvSource::new().with_vars([("FORMGATE_GUARD__TICK_INTERVAL_MS", "500")]))
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.guard.tick_interval_ms, 500);
/// assert_eq!(settings.builder.history_limit, 50);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub guard: GuardSettings,
	pub builder: BuilderSettings,
	pub links: LinkSettings,
	pub logging: LoggingSettings,
}

impl Settings {
	pub fn builder() -> SettingsBuilder {
		SettingsBuilder::new()
	}

	/// Defaults, then `path` if it exists, then `FORMGATE_` variables.
	pub fn load(path: impl Into<PathBuf>) -> SettingsResult<Self> {
		Self::builder()
			.add_source(TomlFileSource::new(path))
			.add_source(EnvSource::new())
			.build()
	}

	pub fn validate(&self) -> SettingsResult<()> {
		self.guard
			.guard_config()
			.validate()
			.map_err(|e| SettingsError::invalid("guard", e.to_string()))?;
		if self.guard.tick_interval_ms == 0 {
			return Err(SettingsError::invalid(
				"guard.tick_interval_ms",
				"must be greater than zero",
			));
		}
		for (key, factor) in [
			("guard.scroll_follow_factor", self.guard.scroll_follow_factor),
			("guard.scroll_decay_factor", self.guard.scroll_decay_factor),
		] {
			if !(factor > 0.0 && factor <= 1.0) {
				return Err(SettingsError::invalid(key, "must be in (0, 1]"));
			}
		}
		if self.guard.drag_boundary < 0.0 {
			return Err(SettingsError::invalid(
				"guard.drag_boundary",
				"must not be negative",
			));
		}
		if self.builder.history_limit == 0 {
			return Err(SettingsError::invalid(
				"builder.history_limit",
				"must be at least 1",
			));
		}
		if self.builder.draft_key.trim().is_empty() {
			return Err(SettingsError::invalid(
				"builder.draft_key",
				"must not be empty",
			));
		}
		self.links
			.memory_issuer()
			.map_err(|e| SettingsError::invalid("links.base_url", e.to_string()))?;
		if self.links.time_limit_presets_secs.is_empty() {
			return Err(SettingsError::invalid(
				"links.time_limit_presets_secs",
				"must not be empty",
			));
		}
		if self.links.time_limit_presets_secs.contains(&0) {
			return Err(SettingsError::invalid(
				"links.time_limit_presets_secs",
				"presets must be non-zero",
			));
		}
		Ok(())
	}
}

/// Collects sources on top of the built-in defaults
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self {
			sources: Vec::new(),
		}
	}

	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merge, deserialize and validate.
	pub fn build(mut self) -> SettingsResult<Settings> {
		self.sources
			.push(Box::new(DefaultSource::from_serialize(&Settings::default())?));
		let merged = merge_sources(&self.sources)?;
		let settings: Settings = serde_json::from_value(merged)?;
		settings.validate()?;
		tracing::debug!(sources = self.sources.len(), "settings loaded");
		Ok(settings)
	}
}

impl Default for SettingsBuilder {
	fn default() -> Self {
		Self::new()
	}
}
