//! Timed guard for Formgate sessions
//!
//! The guard wraps a live form with a countdown that never trusts tick counts:
//! remaining time is always recomputed from a wall-clock anchor, so late or
//! missed ticks cannot skew it. Around the countdown sit the pieces a hosting
//! page mounts together:
//!
//! - Start triggers (`load`, `interaction`, `fieldChange`, `manual`)
//! - Document listeners owned by scoped [`ListenerGuard`]s
//! - Advisory clipboard interception
//! - A draggable, scroll-following overlay position
//! - Object URL cleanup on unmount
//! - Guarded link generation with a status-aware history
//!
//! ## Quick Start
//!
//! ```
//! use formgate_guard::{GuardConfig, GuardEngine, GuardPhase, ManualClock, WarningThreshold};
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::default());
//! let mut engine = GuardEngine::new(
//!     GuardConfig::new(60).with_warning(WarningThreshold::Seconds(10)),
//!     clock.clone(),
//! );
//!
//! clock.advance_secs(51);
//! assert_eq!(engine.tick().phase, GuardPhase::Warning);
//!
//! clock.advance_secs(9);
//! assert!(engine.tick().expired_now);
//! assert!(!engine.tick().expired_now);
//! ```

pub mod clipboard;
pub mod clock;
pub mod driver;
pub mod engine;
pub mod error;
pub mod events;
pub mod links;
pub mod object_url;
pub mod overlay;
pub mod session;
pub mod trigger;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use clipboard::{ClipboardAction, ClipboardCallback, block_clipboard};
pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{DEFAULT_TICK_INTERVAL, TickDriver};
pub use engine::{
	DEFAULT_TIME_LIMIT_SECS, DEFAULT_URGENT_FLOOR_SECS, DEFAULT_WARNING_SECS, GuardConfig,
	GuardEngine, GuardPhase, GuardSnapshot, Tick, WarningThreshold, format_clock,
};
pub use error::{GuardError, GuardResult};
pub use events::{
	DocumentEvents, DomEvent, EventHandler, EventHub, EventKind, ListenerGuard, ListenerId, Point,
};
pub use links::{
	GeneratedLink, IssuedLink, LinkError, LinkGenerator, LinkIssuer, LinkRequest, LinkResult,
	LinkStatus, MemoryLinkIssuer, TIME_LIMIT_PRESETS_SECS,
};
pub use object_url::{ObjectUrlRegistry, Revoker};
pub use overlay::{FloatingOverlay, OverlayConfig, Size};
pub use session::{ExpiryCallback, GuardedSession, OverlayLayout, SessionOptions, SharedGuard};
pub use trigger::{StartGate, StartTrigger};
#[cfg(target_arch = "wasm32")]
pub use web::WebDocument;
