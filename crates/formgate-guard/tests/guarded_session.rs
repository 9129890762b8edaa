//! A guarded form session end to end: link, guard, runtime

use chrono::Duration;
use formgate_forms::{Field, FieldType, FormRuntime, FormSchema, LoadedItem, RuntimeMode, Section};
use formgate_guard::{
	Clock, DomEvent, EventHub, EventKind, GuardConfig, GuardPhase, GuardSnapshot, GuardedSession,
	LinkGenerator, LinkRequest, LinkStatus, ManualClock, MemoryLinkIssuer, SessionOptions,
	StartTrigger,
};
use parking_lot::Mutex;
use rstest::*;
use serde_json::json;
use std::sync::Arc;

fn quiz_item() -> LoadedItem {
	let field = Field::new("answer", FieldType::Text)
		.with_label("Answer")
		.required();
	LoadedItem {
		schema: FormSchema::with_sections(
			"Quiz",
			vec![Section::new("intro", "Question 1").with_field(field)],
		),
		title: "Quiz".to_string(),
		time_limit_secs: Some(120),
		expires_at: None,
	}
}

#[fixture]
fn clock() -> Arc<ManualClock> {
	Arc::new(ManualClock::default())
}

#[rstest]
#[tokio::test]
async fn test_link_expiring_in_the_past_is_disabled(clock: Arc<ManualClock>) {
	// Arrange
	clock.advance_secs(86_400);
	let generator = LinkGenerator::new(
		Arc::new(MemoryLinkIssuer::parse("https://forms.example.com/").unwrap()),
		clock.clone(),
	);

	// Act
	let request =
		LinkRequest::new("quiz-1").with_expiry(Some(clock.now() - Duration::hours(1)));

	// Assert
	assert!(request.is_expired(clock.now()));
	assert!(!generator.can_generate(&request));
}

#[rstest]
#[tokio::test]
async fn test_guard_locks_runtime_after_expiry(clock: Arc<ManualClock>) {
	// Arrange
	let mut generator = LinkGenerator::new(
		Arc::new(MemoryLinkIssuer::parse("https://forms.example.com/").unwrap()),
		clock.clone(),
	);
	let link_id = generator
		.generate(
			LinkRequest::new("quiz-1")
				.with_time_limit(120)
				.with_expiry(Some(clock.now() + Duration::days(1))),
		)
		.await
		.unwrap()
		.id
		.clone();

	let item = quiz_item();
	let config = GuardConfig::for_item(
		&item,
		&GuardConfig::default().with_start_trigger(StartTrigger::FieldChange),
	);
	let expired: Arc<Mutex<Option<GuardSnapshot>>> = Arc::new(Mutex::new(None));
	let sink = expired.clone();
	let hub = Arc::new(EventHub::new());
	let session = GuardedSession::mount(
		SessionOptions::new(config)
			.blocking_clipboard()
			.on_expire(Arc::new(move |snapshot: &GuardSnapshot| {
				*sink.lock() = Some(snapshot.clone());
			})),
		clock.clone(),
		hub.clone(),
	)
	.unwrap();
	let mut runtime = FormRuntime::new(item.schema.clone(), RuntimeMode::Preview);

	// Act
	clock.advance_secs(30);
	assert_eq!(session.tick().phase, GuardPhase::Idle);
	runtime.set_value("answer", json!("4")).unwrap();
	hub.dispatch(&DomEvent::new(EventKind::Input).with_target("input"));
	generator.mark_used(&link_id).unwrap();
	clock.advance_secs(119);
	let warning = session.tick();
	clock.advance_secs(1);
	session.tick();

	// Assert
	assert_eq!(warning.remaining_secs, 1);
	assert_eq!(warning.phase, GuardPhase::Urgent);
	assert!(session.is_locked());
	let snapshot = expired.lock().clone().unwrap();
	assert_eq!(snapshot.max_time, 120);
	assert!(snapshot.has_expired);
	assert_eq!(generator.status(&link_id).unwrap(), LinkStatus::Used);
	assert!(hub.dispatch(&DomEvent::new(EventKind::Paste)));
	assert_eq!(runtime.progress(), 100);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_driver_runs_session_to_expiry(clock: Arc<ManualClock>) {
	// Arrange
	let fired = Arc::new(Mutex::new(0));
	let counter = fired.clone();
	let hub = Arc::new(EventHub::new());
	let mut session = GuardedSession::mount(
		SessionOptions::new(GuardConfig::new(3)).on_expire(Arc::new(move |_: &GuardSnapshot| {
			*counter.lock() += 1;
		})),
		clock.clone(),
		hub,
	)
	.unwrap();
	session.spawn_driver(std::time::Duration::from_secs(1));

	// Act
	for _ in 0..5 {
		clock.advance_secs(1);
		tokio::time::sleep(std::time::Duration::from_secs(1)).await;
	}

	// Assert
	assert!(session.is_locked());
	assert_eq!(*fired.lock(), 1);
	assert_eq!(session.snapshot().formatted, "00:00");
}
