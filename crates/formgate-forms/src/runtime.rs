//! Section-paged form runtime
//!
//! [`FormRuntime`] renders one section of a [`FormSchema`] at a time, tracks the
//! respondent's values, validates the current section before moving forward
//! and hands the cleaned payload to a [`Submitter`].

use crate::error::ValidationErrors;
use crate::notify::{Notification, Notifier, NullNotifier};
use crate::remote::{SubmissionReceipt, SubmitError, Submitter};
use crate::rules::{FormValues, RuleSet, derive_rules};
use crate::schema::{FormSchema, Section};
use crate::wizard::{
	NavigationError, Step, StepNavigator, StepValidator, VALIDATION_FAILED_MESSAGE,
};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shown instead of a form when the schema has no fields.
pub const EMPTY_FORM_MESSAGE: &str = "This form has no fields yet";

/// Toast used when a submission fails without a server message.
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit form. Please try again.";

pub const SUBMIT_SUCCESS_MESSAGE: &str = "Form submitted successfully";

pub const PREVIEW_SUCCESS_MESSAGE: &str = "Preview submitted. No data was sent.";

type SubmittedCallback = Box<dyn Fn(&SubmitOutcome) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
	#[error("Form has no fields")]
	EmptySchema,
	#[error("Validation failed: {0}")]
	Validation(ValidationErrors),
	#[error("Section {index} is out of range ({total} sections)")]
	SectionOutOfRange { index: usize, total: usize },
	#[error("Unknown field '{0}'")]
	UnknownField(String),
	#[error("Live submission requires a submitter")]
	MissingSubmitter,
	#[error("Submission failed: {0}")]
	Submit(#[from] SubmitError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl From<NavigationError> for RuntimeError {
	fn from(error: NavigationError) -> Self {
		match error {
			NavigationError::Validation(errors) => RuntimeError::Validation(errors),
			NavigationError::OutOfRange { index, visible } => RuntimeError::SectionOutOfRange {
				index,
				total: visible,
			},
			NavigationError::NoVisibleSteps => RuntimeError::EmptySchema,
		}
	}
}

/// Where submissions go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeMode {
	/// Builder preview; submitting never leaves the process.
	Preview,
	Live { form_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
	Preview,
	Submitted(SubmissionReceipt),
}

/// What the hosting page should render
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeView<'a> {
	Empty {
		message: &'static str,
	},
	Section {
		index: usize,
		total: usize,
		section: &'a Section,
		progress: u8,
		is_last: bool,
	},
	Submitted {
		outcome: &'a SubmitOutcome,
	},
}

/// Whether a value counts towards progress.
///
/// Missing, `null`, empty strings and empty arrays are not completed.
pub fn is_completed(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) => false,
		Some(Value::String(s)) => !s.is_empty(),
		Some(Value::Array(items)) => !items.is_empty(),
		Some(_) => true,
	}
}

/// Validates the section behind a navigator step
#[derive(Debug, Clone)]
pub struct SectionValidator {
	rules: RuleSet,
	sections: Vec<Section>,
}

impl SectionValidator {
	pub fn new(schema: &FormSchema) -> Self {
		Self {
			rules: derive_rules(schema),
			sections: schema.sections.clone(),
		}
	}
}

#[async_trait]
impl StepValidator<FormValues> for SectionValidator {
	async fn validate_step(
		&self,
		index: usize,
		visible: &[&Step<FormValues>],
		context: &FormValues,
	) -> Result<(), ValidationErrors> {
		let Some(step) = visible.get(index) else {
			return Ok(());
		};
		match self.sections.iter().find(|s| s.id == step.id) {
			Some(section) => self.rules.validate_section(section, context),
			None => Ok(()),
		}
	}
}

/// Respondent-facing runtime over one schema
pub struct FormRuntime {
	schema: FormSchema,
	rules: RuleSet,
	mode: RuntimeMode,
	values: FormValues,
	errors: ValidationErrors,
	navigator: StepNavigator<FormValues>,
	submitter: Option<Arc<dyn Submitter>>,
	notifier: Arc<dyn Notifier>,
	on_submitted: Option<SubmittedCallback>,
	outcome: Option<SubmitOutcome>,
}

impl FormRuntime {
	/// Create a runtime, seeding values from field defaults
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::{Field, FieldType, FormRuntime, FormSchema, RuntimeMode, Section};
	///
	/// let schema = FormSchema::with_sections(
	///     "Feedback",
	///     vec![Section::new("s1", "About").with_field(Field::new("name", FieldType::Text).required())],
	/// );
	/// let mut runtime = FormRuntime::new(schema, RuntimeMode::Preview);
	/// assert_eq!(runtime.progress(), 0);
	///
	/// runtime.set_value("name", "Ada".into()).unwrap();
	/// assert_eq!(runtime.progress(), 100);
	/// ```
	pub fn new(schema: FormSchema, mode: RuntimeMode) -> Self {
		let rules = derive_rules(&schema);
		let steps = schema
			.sections
			.iter()
			.map(|s| Step::new(s.id.clone(), s.title.clone()))
			.collect();
		let navigator = StepNavigator::new(steps, Arc::new(SectionValidator::new(&schema)));
		let values = schema
			.fields()
			.filter_map(|f| f.default_value.clone().map(|v| (f.id.clone(), v)))
			.collect();

		Self {
			schema,
			rules,
			mode,
			values,
			errors: ValidationErrors::new(),
			navigator,
			submitter: None,
			notifier: Arc::new(NullNotifier),
			on_submitted: None,
			outcome: None,
		}
	}

	pub fn with_submitter(mut self, submitter: Arc<dyn Submitter>) -> Self {
		self.submitter = Some(submitter);
		self
	}

	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.navigator = self.navigator.with_notifier(notifier.clone());
		self.notifier = notifier;
		self
	}

	/// Called after every successful submission.
	pub fn on_submitted<F>(mut self, callback: F) -> Self
	where
		F: Fn(&SubmitOutcome) + Send + Sync + 'static,
	{
		self.on_submitted = Some(Box::new(callback));
		self
	}

	pub fn schema(&self) -> &FormSchema {
		&self.schema
	}

	pub fn mode(&self) -> &RuntimeMode {
		&self.mode
	}

	pub fn rules(&self) -> &RuleSet {
		&self.rules
	}

	pub fn is_empty(&self) -> bool {
		self.schema.is_empty()
	}

	pub fn values(&self) -> &FormValues {
		&self.values
	}

	pub fn value(&self, field_id: &str) -> Option<&Value> {
		self.values.get(field_id)
	}

	/// Field errors from the last blocked transition.
	pub fn errors(&self) -> &ValidationErrors {
		&self.errors
	}

	pub fn field_error(&self, field_id: &str) -> Option<&str> {
		self.errors.first(field_id)
	}

	pub fn outcome(&self) -> Option<&SubmitOutcome> {
		self.outcome.as_ref()
	}

	pub fn current_section_index(&self) -> usize {
		self.navigator.current_index(&self.values).unwrap_or(0)
	}

	pub fn current_section(&self) -> Option<&Section> {
		self.schema.sections.get(self.current_section_index())
	}

	pub fn is_last_section(&self) -> bool {
		self.navigator.is_last(&self.values)
	}

	/// Share of completed required fields, rounded; 100 without any.
	pub fn progress(&self) -> u8 {
		let required: Vec<&str> = self
			.schema
			.fields()
			.filter(|f| f.required)
			.map(|f| f.id.as_str())
			.collect();
		if required.is_empty() {
			return 100;
		}
		let completed = required
			.iter()
			.filter(|id| is_completed(self.values.get(**id)))
			.count();
		(completed as f64 / required.len() as f64 * 100.0).round() as u8
	}

	pub fn view(&self) -> RuntimeView<'_> {
		if let Some(outcome) = &self.outcome {
			return RuntimeView::Submitted { outcome };
		}
		if self.is_empty() {
			return RuntimeView::Empty {
				message: EMPTY_FORM_MESSAGE,
			};
		}
		match self.current_section() {
			Some(section) => RuntimeView::Section {
				index: self.current_section_index(),
				total: self.schema.sections.len(),
				section,
				progress: self.progress(),
				is_last: self.is_last_section(),
			},
			None => RuntimeView::Empty {
				message: EMPTY_FORM_MESSAGE,
			},
		}
	}

	/// Set a field value and clear its pending error.
	pub fn set_value(&mut self, field_id: &str, value: Value) -> RuntimeResult<()> {
		if self.schema.field(field_id).is_none() {
			return Err(RuntimeError::UnknownField(field_id.to_string()));
		}
		self.values.insert(field_id.to_string(), value);
		self.errors.remove(field_id);
		Ok(())
	}

	/// Toggle one option of a checkbox field; other types take the option as
	/// their value.
	pub fn toggle_option(&mut self, field_id: &str, option: &str) -> RuntimeResult<()> {
		let field = self
			.schema
			.field(field_id)
			.ok_or_else(|| RuntimeError::UnknownField(field_id.to_string()))?;
		if !field.field_type.is_multi_valued() {
			return self.set_value(field_id, Value::String(option.to_string()));
		}

		let mut selected = match self.values.get(field_id) {
			Some(Value::Array(items)) => items.clone(),
			_ => Vec::new(),
		};
		match selected.iter().position(|v| v.as_str() == Some(option)) {
			Some(index) => {
				selected.remove(index);
			}
			None => selected.push(Value::String(option.to_string())),
		}
		self.set_value(field_id, Value::Array(selected))
	}

	/// Validate the current section and move to the next one
	///
	/// Returns `Ok(false)` on the last section.
	pub async fn next(&mut self) -> RuntimeResult<bool> {
		if self.is_empty() {
			return Err(RuntimeError::EmptySchema);
		}
		match self.navigator.next(&self.values).await {
			Ok(moved) => {
				self.errors.clear();
				Ok(moved)
			}
			Err(e) => Err(self.record_failure(e.into())),
		}
	}

	pub fn prev(&mut self) -> RuntimeResult<bool> {
		Ok(self.navigator.prev(&self.values)?)
	}

	/// Jump to a section without validation.
	pub fn go_to_section(&mut self, index: usize) -> RuntimeResult<()> {
		Ok(self.navigator.go_to_step(index, &self.values)?)
	}

	/// Validate and submit
	///
	/// Preview mode succeeds without a network call. In live mode a failure is
	/// surfaced as a toast and all values are kept for another attempt.
	pub async fn submit(&mut self) -> RuntimeResult<SubmitOutcome> {
		if self.is_empty() {
			return Err(RuntimeError::EmptySchema);
		}

		let rules = &self.rules;
		let values = &self.values;
		let cleaned = match self
			.navigator
			.submit(values, || async { rules.clean(values) })
			.await
		{
			Ok(Ok(cleaned)) => cleaned,
			Ok(Err(errors)) => {
				self.notifier
					.notify(Notification::warning(VALIDATION_FAILED_MESSAGE));
				return Err(self.record_failure(RuntimeError::Validation(errors)));
			}
			Err(e) => return Err(self.record_failure(e.into())),
		};
		self.errors.clear();

		let outcome = match &self.mode {
			RuntimeMode::Preview => {
				self.notifier
					.notify(Notification::success(PREVIEW_SUCCESS_MESSAGE));
				SubmitOutcome::Preview
			}
			RuntimeMode::Live { form_id } => {
				let submitter = self
					.submitter
					.clone()
					.ok_or(RuntimeError::MissingSubmitter)?;
				match submitter.submit_form(form_id, &cleaned).await {
					Ok(receipt) => {
						tracing::info!(form_id = %form_id, submission_id = %receipt.id, "form submitted");
						self.notifier
							.notify(Notification::success(SUBMIT_SUCCESS_MESSAGE));
						SubmitOutcome::Submitted(receipt)
					}
					Err(e) => {
						tracing::warn!(form_id = %form_id, error = %e, "form submission failed");
						let message = e.server_message().unwrap_or(SUBMIT_FAILED_MESSAGE);
						self.notifier.notify(Notification::error(message));
						return Err(RuntimeError::Submit(e));
					}
				}
			}
		};

		if let Some(callback) = &self.on_submitted {
			callback(&outcome);
		}
		self.outcome = Some(outcome.clone());
		Ok(outcome)
	}

	fn record_failure(&mut self, error: RuntimeError) -> RuntimeError {
		if let RuntimeError::Validation(errors) = &error {
			self.errors = errors.clone();
		}
		error
	}
}

impl fmt::Debug for FormRuntime {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FormRuntime")
			.field("title", &self.schema.title)
			.field("mode", &self.mode)
			.field("values", &self.values)
			.field("errors", &self.errors)
			.field("outcome", &self.outcome)
			.finish_non_exhaustive()
	}
}
