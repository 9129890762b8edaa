//! # Formgate
//!
//! Dynamic forms with time-guarded response sessions.
//!
//! Formgate builds an arbitrary form schema, renders it one section at a time
//! with per-field validation, and wraps the response window in a countdown
//! guard that never trusts tick counts.
//!
//! ## Feature Flags
//!
//! - `forms` - Schema model, validation derivation, builder store, step
//!   navigator and section-paged runtime
//! - `guard` - Countdown engine, start triggers, document listeners,
//!   clipboard interception, floating overlay and link history
//! - `conf` - Layered settings (defaults, TOML file, environment)
//! - `logging` - Installs a `tracing-subscriber` formatter from settings
//! - `full` (default) - All of the above
//!
//! ## Quick Example
//!
//! ```
//! use formgate::forms::{FieldType, FormBuilder, FormRuntime, RuntimeMode};
//!
//! let mut builder = FormBuilder::new();
//! let section = builder.sections()[0].id.clone();
//! builder.add_field(&section, FieldType::Email).unwrap();
//!
//! let runtime = FormRuntime::new(builder.schema(), RuntimeMode::Preview);
//! assert_eq!(runtime.progress(), 100);
//! ```

#[cfg(feature = "conf")]
pub use formgate_conf as conf;
#[cfg(feature = "forms")]
pub use formgate_forms as forms;
#[cfg(feature = "guard")]
pub use formgate_guard as guard;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "conf")]
pub use formgate_conf::{Settings, SettingsError};
#[cfg(feature = "forms")]
pub use formgate_forms::{FormBuilder, FormRuntime, FormSchema, StepNavigator};
#[cfg(feature = "guard")]
pub use formgate_guard::{GuardConfig, GuardEngine, GuardedSession, LinkGenerator};

/// Commonly used types
pub mod prelude {
	#[cfg(feature = "conf")]
	pub use formgate_conf::Settings;
	#[cfg(feature = "forms")]
	pub use formgate_forms::{
		Field, FieldPatch, FieldType, FormBuilder, FormRuntime, FormSchema, RuntimeMode, Section,
		StepNavigator,
	};
	#[cfg(feature = "guard")]
	pub use formgate_guard::{
		Clock, GuardConfig, GuardEngine, GuardPhase, GuardedSession, LinkGenerator, LinkRequest,
		SessionOptions, StartTrigger, SystemClock, WarningThreshold,
	};
}
