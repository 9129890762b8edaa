//! Layered settings for Formgate
//!
//! Settings are assembled from sources merged in priority order:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `FORMGATE_`, using `__` to reach
//!    nested keys (`FORMGATE_GUARD__TICK_INTERVAL_MS=500`)
//!
//! ```no_run
//! use formgate_conf::Settings;
//!
//! let settings = Settings::load("formgate.toml").unwrap();
//! let config = settings.guard.guard_config();
//! ```

pub mod error;
pub mod settings;
pub mod sources;

pub use error::{SettingsError, SettingsResult};
pub use settings::{
	BuilderSettings, GuardSettings, LinkSettings, LoggingSettings, Settings, SettingsBuilder,
};
pub use sources::{
	ConfigSource, DefaultSource, ENV_PREFIX, ENV_SEPARATOR, EnvSource, TomlFileSource,
	deep_merge, merge_sources, parse_env_value,
};
