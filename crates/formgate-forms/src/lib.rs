//! Dynamic forms for Formgate
//!
//! This crate provides the form side of a guarded form session:
//! - A typed schema model of sections and fields
//! - Validation rules derived from a schema, with field-scoped errors
//! - An undo/redo capable builder store with draft persistence
//! - A generic multi-step navigator with async step validation
//! - A section-paged runtime that tracks progress and submits responses

pub mod builder;
pub mod draft;
pub mod error;
pub mod history;
pub mod notify;
pub mod remote;
pub mod rules;
pub mod runtime;
pub mod schema;
pub mod validators;
pub mod wizard;

pub use builder::{
	BuilderCommand, BuilderError, BuilderResult, CommandOutcome, FormBuilder, Selection,
};
pub use draft::{
	DEFAULT_DRAFT_KEY, DraftError, DraftPayload, DraftResult, DraftStorage, FileDraftStorage,
	MemoryDraftStorage,
};
pub use error::{FieldError, FieldResult, ValidationErrors};
pub use history::{BuilderSnapshot, DEFAULT_HISTORY_LIMIT, SnapshotHistory};
pub use notify::{Notification, NotificationLevel, Notifier, NullNotifier, RecordingNotifier};
pub use remote::{
	LoadedItem, MemorySubmitter, SchemaSource, SubmissionReceipt, SubmitError, SubmitResult,
	Submitter,
};
pub use rules::{FieldRule, FormValues, RuleKind, RuleSet, derive_rules};
pub use runtime::{
	FormRuntime, RuntimeError, RuntimeMode, RuntimeResult, RuntimeView, SectionValidator,
	SubmitOutcome, is_completed,
};
pub use schema::{
	Field, FieldPatch, FieldType, FormSchema, SchemaError, SchemaResult, Section, SectionPatch,
};
pub use validators::{EmailValidator, NumberValidator, UrlValidator};
pub use wizard::{
	AcceptAll, NavigationError, NavigationResult, Step, StepNavigator, StepValidator,
	VALIDATION_FAILED_MESSAGE,
};
