//! A respondent answers a guarded form through the facade

use formgate::forms::{MemorySubmitter, RuntimeError, SubmitError, SubmitOutcome};
use formgate::guard::{DomEvent, EventHub, EventKind, GuardPhase, ManualClock};
use formgate::prelude::*;
use rstest::*;
use serde_json::json;
use std::sync::Arc;

fn survey() -> (FormSchema, String) {
	let mut builder = FormBuilder::new();
	builder.set_title("Survey");
	let section = builder.sections()[0].id.clone();
	let email = builder.add_field(&section, FieldType::Email).unwrap();
	builder
		.update_field(&email, FieldPatch::required(true))
		.unwrap();
	(builder.schema(), email)
}

#[rstest]
#[tokio::test]
async fn test_rejected_submission_keeps_values_for_retry() {
	// Arrange
	let settings = Settings::default();
	let (schema, email) = survey();
	let submitter = Arc::new(MemorySubmitter::new());
	submitter.fail_with(Some(SubmitError::rejected("Form closed")));
	let mut runtime = FormRuntime::new(
		schema,
		RuntimeMode::Live {
			form_id: "survey".to_string(),
		},
	)
	.with_submitter(submitter.clone());
	let hub = Arc::new(EventHub::new());
	let clock = Arc::new(ManualClock::default());
	let session = GuardedSession::mount(
		SessionOptions::new(
			settings
				.guard
				.guard_config()
				.with_start_trigger(StartTrigger::FieldChange),
		),
		clock.clone(),
		hub.clone(),
	)
	.unwrap();

	// Act
	hub.dispatch(&DomEvent::new(EventKind::Input).with_target("input"));
	runtime.set_value(&email, json!("ada@example.com")).unwrap();
	let first = runtime.submit().await;
	submitter.fail_with(None);
	let second = runtime.submit().await;

	// Assert
	assert!(matches!(first, Err(RuntimeError::Submit(_))));
	assert_eq!(runtime.value(&email), Some(&json!("ada@example.com")));
	assert!(matches!(second, Ok(SubmitOutcome::Submitted(_))));
	assert_eq!(submitter.submissions().len(), 1);
	assert_eq!(session.phase(), GuardPhase::Active);
}

#[rstest]
fn test_settings_feed_guard_defaults() {
	// Arrange
	let settings = Settings::default();
	let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());

	// Act
	let engine = GuardEngine::new(settings.guard.guard_config(), clock);

	// Assert
	assert_eq!(engine.remaining_secs(), 900);
	assert_eq!(engine.formatted_remaining(), "15:00");
	assert_eq!(engine.phase(), GuardPhase::Active);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_settings_configure_builder_links_and_driver() {
	// Arrange
	let settings = Settings::builder()
		.add_source(formgate::conf::EnvSource::new().with_vars([
			("FORMGATE_BUILDER__HISTORY_LIMIT", "5"),
			("FORMGATE_BUILDER__DRAFT_KEY", "quiz-draft"),
			("FORMGATE_LINKS__BASE_URL", "https://quiz.example.com/"),
			("FORMGATE_LINKS__TIME_LIMIT_PRESETS_SECS", "60,120"),
			("FORMGATE_GUARD__TICK_INTERVAL_MS", "500"),
		]))
		.build()
		.unwrap();
	let storage = formgate::forms::MemoryDraftStorage::new();
	let clock = Arc::new(ManualClock::default());

	// Act
	let mut builder = settings.builder.form_builder();
	builder.set_title("Quiz");
	settings.builder.save_draft(&builder, &storage).unwrap();
	let mut generator = settings.links.link_generator(
		Arc::new(settings.links.memory_issuer().unwrap()),
		clock.clone(),
	);
	let url = generator
		.generate(LinkRequest::new("quiz-1").with_time_limit(generator.presets()[1]))
		.await
		.unwrap()
		.url
		.clone();
	let mut session = GuardedSession::mount(
		settings.guard.session_options(Some(120)),
		clock.clone(),
		Arc::new(EventHub::new()),
	)
	.unwrap();
	session.spawn_driver(settings.guard.tick_interval());
	clock.advance_secs(7);
	tokio::time::sleep(std::time::Duration::from_millis(600)).await;

	// Assert
	assert_eq!(builder.history().limit(), 5);
	assert!(formgate::forms::DraftStorage::load(&storage, "quiz-draft").unwrap().is_some());
	assert!(url.starts_with("https://quiz.example.com/guard/quiz-1?token="));
	assert_eq!(generator.latest().map(|link| link.time_limit_secs), Some(120));
	assert_eq!(session.guard().remaining_secs(), 113);
}
