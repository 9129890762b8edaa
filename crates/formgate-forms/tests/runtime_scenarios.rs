//! End-to-end scenarios from builder to submitted response

use formgate_forms::{
	FieldPatch, FieldType, FormBuilder, FormRuntime, MemorySubmitter, Notification,
	RecordingNotifier, RuntimeError, RuntimeMode, RuntimeView, SubmitOutcome, VALIDATION_FAILED_MESSAGE,
};
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

#[rstest]
#[tokio::test]
async fn test_required_checkbox_without_selection_blocks_submit() {
	// Arrange
	let mut builder = FormBuilder::new();
	let section = builder.sections()[0].id.clone();
	let field = builder.add_field(&section, FieldType::Checkbox).unwrap();
	builder
		.update_field(&field, FieldPatch::label("Favourite languages"))
		.unwrap();
	builder.update_field(&field, FieldPatch::required(true)).unwrap();
	let submitter = Arc::new(MemorySubmitter::new());
	let notifier = Arc::new(RecordingNotifier::new());
	let mut runtime = FormRuntime::new(
		builder.schema(),
		RuntimeMode::Live {
			form_id: "langs".to_string(),
		},
	)
	.with_submitter(submitter.clone())
	.with_notifier(notifier.clone());

	// Act
	let result = runtime.submit().await;

	// Assert
	let Err(RuntimeError::Validation(errors)) = result else {
		panic!("expected validation failure, got {result:?}");
	};
	let message = errors.first(&field).unwrap();
	assert!(message.contains("Favourite languages"));
	assert!(submitter.submissions().is_empty());
	assert_eq!(
		notifier.last(),
		Some(Notification::warning(VALIDATION_FAILED_MESSAGE))
	);
}

#[rstest]
#[tokio::test]
async fn test_builder_schema_runs_section_by_section() {
	// Arrange
	let mut builder = FormBuilder::new();
	builder.set_title("Onboarding");
	let first = builder.sections()[0].id.clone();
	let name = builder.add_field(&first, FieldType::Text).unwrap();
	builder.update_field(&name, FieldPatch::required(true)).unwrap();
	let second = builder.add_section().unwrap();
	let age = builder.add_field(&second, FieldType::Number).unwrap();
	builder.update_field(&age, FieldPatch::required(true)).unwrap();
	let submitter = Arc::new(MemorySubmitter::new());
	let mut runtime = FormRuntime::new(
		builder.schema(),
		RuntimeMode::Live {
			form_id: "onboarding".to_string(),
		},
	)
	.with_submitter(submitter.clone());

	// Act
	runtime.set_value(&name, json!("Ada")).unwrap();
	let moved = runtime.next().await.unwrap();
	let on_last = runtime.is_last_section();
	runtime.set_value(&age, json!("36")).unwrap();
	let outcome = runtime.submit().await.unwrap();

	// Assert
	assert!(moved);
	assert!(on_last);
	assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
	let (_, values) = submitter.submissions().remove(0);
	assert_eq!(values.get(&age), Some(&json!(36.0)));
	assert!(matches!(runtime.view(), RuntimeView::Submitted { .. }));
}

#[rstest]
fn test_view_reports_current_section_and_progress() {
	// Arrange
	let mut builder = FormBuilder::new();
	let first = builder.sections()[0].id.clone();
	let a = builder.add_field(&first, FieldType::Text).unwrap();
	builder.update_field(&a, FieldPatch::required(true)).unwrap();
	let b = builder.add_field(&first, FieldType::Email).unwrap();
	builder.update_field(&b, FieldPatch::required(true)).unwrap();
	let mut runtime = FormRuntime::new(builder.schema(), RuntimeMode::Preview);

	// Act
	runtime.set_value(&a, json!("done")).unwrap();

	// Assert
	match runtime.view() {
		RuntimeView::Section {
			index,
			total,
			progress,
			is_last,
			..
		} => {
			assert_eq!((index, total), (0, 1));
			assert_eq!(progress, 50);
			assert!(is_last);
		}
		other => panic!("unexpected view {other:?}"),
	}
}
