//! What starts the countdown

use crate::events::{DomEvent, EventKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Condition that moves an idle guard to active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StartTrigger {
	/// As soon as the guarded form mounts.
	#[default]
	Load,
	/// First pointer-down or key-down anywhere in the document.
	Interaction,
	/// First `input` or `change` event from a form control.
	FieldChange,
	/// Only an explicit start call.
	Manual,
}

impl StartTrigger {
	pub fn as_str(self) -> &'static str {
		match self {
			StartTrigger::Load => "load",
			StartTrigger::Interaction => "interaction",
			StartTrigger::FieldChange => "fieldChange",
			StartTrigger::Manual => "manual",
		}
	}

	/// Event kinds that need a document listener for this trigger.
	pub fn listens_to(self) -> &'static [EventKind] {
		match self {
			StartTrigger::Interaction => &[EventKind::PointerDown, EventKind::KeyDown],
			StartTrigger::FieldChange => &[EventKind::Input, EventKind::Change],
			StartTrigger::Load | StartTrigger::Manual => &[],
		}
	}

	/// Whether `event` satisfies this trigger.
	///
	/// # Examples
	///
	/// ```
	/// use formgate_guard::{DomEvent, EventKind, StartTrigger};
	///
	/// let typed = DomEvent::new(EventKind::Input).with_target("textarea");
	/// assert!(StartTrigger::FieldChange.matches(&typed));
	/// assert!(!StartTrigger::Interaction.matches(&typed));
	/// ```
	pub fn matches(self, event: &DomEvent) -> bool {
		match self {
			StartTrigger::Interaction => self.listens_to().contains(&event.kind),
			StartTrigger::FieldChange => {
				self.listens_to().contains(&event.kind) && event.targets_form_control()
			}
			StartTrigger::Load | StartTrigger::Manual => false,
		}
	}
}

impl fmt::Display for StartTrigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for StartTrigger {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"load" => Ok(StartTrigger::Load),
			"interaction" => Ok(StartTrigger::Interaction),
			"fieldChange" | "field_change" => Ok(StartTrigger::FieldChange),
			"manual" => Ok(StartTrigger::Manual),
			other => Err(format!("unknown start trigger '{other}'")),
		}
	}
}

/// Latch letting a trigger fire at most once
#[derive(Debug, Default)]
pub struct StartGate {
	fired: AtomicBool,
}

impl StartGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `true` for the first caller only.
	pub fn fire(&self) -> bool {
		!self.fired.swap(true, Ordering::AcqRel)
	}

	pub fn has_fired(&self) -> bool {
		self.fired.load(Ordering::Acquire)
	}

	/// Re-arm after a guard reset.
	pub fn rearm(&self) {
		self.fired.store(false, Ordering::Release);
	}
}
