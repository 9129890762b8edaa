//! Multi-step navigation with async per-step validation
//!
//! A [`StepNavigator`] sequences an ordered list of [`Step`]s. Steps may carry a
//! visibility condition evaluated against a caller-supplied context `C`; the
//! visible step list is always derived from the raw list on demand and never
//! stored, so indices cannot drift from the conditions.
//!
//! The navigator remembers the *raw* position of the current step. When that
//! step becomes invisible, navigation falls back to the nearest preceding
//! visible step, or the nearest following one when none precedes it.

use crate::error::ValidationErrors;
use crate::notify::{Notification, Notifier, NullNotifier};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Toast shown when a step fails validation.
pub const VALIDATION_FAILED_MESSAGE: &str = "Please fix the highlighted fields before continuing";

type StepConditionFn<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavigationError {
	#[error("Step validation failed: {0}")]
	Validation(ValidationErrors),
	#[error("Step {index} is out of range ({visible} visible steps)")]
	OutOfRange { index: usize, visible: usize },
	#[error("No visible steps")]
	NoVisibleSteps,
}

pub type NavigationResult<T> = Result<T, NavigationError>;

/// A single step of a navigator
pub struct Step<C> {
	pub id: String,
	pub title: String,
	pub optional: bool,
	condition: Option<StepConditionFn<C>>,
}

impl<C> Step<C> {
	/// Create a step that is always visible
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::wizard::Step;
	///
	/// let step: Step<()> = Step::new("contact", "Contact details");
	/// assert_eq!(step.id, "contact");
	/// assert!(step.is_visible(&()));
	/// ```
	pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			optional: false,
			condition: None,
		}
	}

	/// Mark the step as optional; `next()` will not validate it.
	pub fn optional(mut self) -> Self {
		self.optional = true;
		self
	}

	/// Only show this step while `condition` holds for the context.
	pub fn with_condition<F>(mut self, condition: F) -> Self
	where
		F: Fn(&C) -> bool + Send + Sync + 'static,
	{
		self.condition = Some(Box::new(condition));
		self
	}

	pub fn is_visible(&self, context: &C) -> bool {
		self.condition.as_ref().is_none_or(|condition| condition(context))
	}
}

impl<C> fmt::Debug for Step<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Step")
			.field("id", &self.id)
			.field("title", &self.title)
			.field("optional", &self.optional)
			.field("conditional", &self.condition.is_some())
			.finish()
	}
}

/// Validates the current step before the navigator leaves it
#[async_trait]
pub trait StepValidator<C>: Send + Sync {
	/// `index` is the position of the step within `visible`.
	async fn validate_step(
		&self,
		index: usize,
		visible: &[&Step<C>],
		context: &C,
	) -> Result<(), ValidationErrors>;
}

/// Validator accepting every step.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

#[async_trait]
impl<C: Sync> StepValidator<C> for AcceptAll {
	async fn validate_step(
		&self,
		_index: usize,
		_visible: &[&Step<C>],
		_context: &C,
	) -> Result<(), ValidationErrors> {
		Ok(())
	}
}

/// Step sequencer gated by a [`StepValidator`]
pub struct StepNavigator<C> {
	steps: Vec<Step<C>>,
	current: usize,
	validator: Arc<dyn StepValidator<C>>,
	notifier: Arc<dyn Notifier>,
}

impl<C: Sync> StepNavigator<C> {
	pub fn new(steps: Vec<Step<C>>, validator: Arc<dyn StepValidator<C>>) -> Self {
		Self {
			steps,
			current: 0,
			validator,
			notifier: Arc::new(NullNotifier),
		}
	}

	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;
		self
	}

	/// All steps, visible or not.
	pub fn steps(&self) -> &[Step<C>] {
		&self.steps
	}

	/// Steps whose condition currently holds, in order.
	pub fn visible_steps(&self, context: &C) -> Vec<&Step<C>> {
		self.steps.iter().filter(|s| s.is_visible(context)).collect()
	}

	fn visible_raw_indices(&self, context: &C) -> Vec<usize> {
		self.steps
			.iter()
			.enumerate()
			.filter(|(_, s)| s.is_visible(context))
			.map(|(i, _)| i)
			.collect()
	}

	/// Position of the current step within `visible`, applying the fallback
	/// when the remembered step is hidden.
	fn resolve(&self, visible: &[usize]) -> Option<usize> {
		if visible.is_empty() {
			return None;
		}
		if let Some(position) = visible.iter().position(|&raw| raw == self.current) {
			return Some(position);
		}
		match visible.iter().rposition(|&raw| raw < self.current) {
			Some(position) => Some(position),
			None => Some(0),
		}
	}

	/// Pin the remembered raw index to the resolved visible step.
	fn sync(&mut self, context: &C) -> NavigationResult<(Vec<usize>, usize)> {
		let visible = self.visible_raw_indices(context);
		let position = self
			.resolve(&visible)
			.ok_or(NavigationError::NoVisibleSteps)?;
		if visible[position] != self.current {
			tracing::debug!(
				from = self.current,
				to = visible[position],
				"current step hidden, falling back"
			);
			self.current = visible[position];
		}
		Ok((visible, position))
	}

	/// Index of the current step among the visible steps.
	pub fn current_index(&self, context: &C) -> Option<usize> {
		self.resolve(&self.visible_raw_indices(context))
	}

	pub fn current_step(&self, context: &C) -> Option<&Step<C>> {
		let visible = self.visible_raw_indices(context);
		self.resolve(&visible).map(|p| &self.steps[visible[p]])
	}

	pub fn is_first(&self, context: &C) -> bool {
		self.current_index(context) == Some(0)
	}

	pub fn is_last(&self, context: &C) -> bool {
		let visible = self.visible_raw_indices(context);
		self.resolve(&visible) == Some(visible.len().saturating_sub(1))
	}

	/// Percentage of visible steps reached, counting the current one.
	pub fn progress(&self, context: &C) -> u8 {
		let visible = self.visible_raw_indices(context);
		match self.resolve(&visible) {
			Some(position) => (((position + 1) * 100) as f64 / visible.len() as f64).round() as u8,
			None => 0,
		}
	}

	/// Validate the current step and advance
	///
	/// Returns `Ok(false)` at the last visible step. Optional steps are not
	/// validated. On failure a warning is notified and the position is kept.
	pub async fn next(&mut self, context: &C) -> NavigationResult<bool> {
		let (visible, position) = self.sync(context)?;
		if position + 1 >= visible.len() {
			return Ok(false);
		}

		let step = &self.steps[visible[position]];
		if !step.optional {
			self.run_validation(position, &visible, context).await?;
		}

		self.current = visible[position + 1];
		tracing::debug!(step = %self.steps[self.current].id, index = position + 1, "navigated to next step");
		Ok(true)
	}

	/// Step back without validating. Returns `false` at the first step.
	pub fn prev(&mut self, context: &C) -> NavigationResult<bool> {
		let (visible, position) = self.sync(context)?;
		if position == 0 {
			return Ok(false);
		}
		self.current = visible[position - 1];
		tracing::debug!(step = %self.steps[self.current].id, index = position - 1, "navigated to previous step");
		Ok(true)
	}

	/// Jump to a visible step without validation.
	pub fn go_to_step(&mut self, index: usize, context: &C) -> NavigationResult<()> {
		let (visible, _) = self.sync(context)?;
		let raw = visible
			.get(index)
			.copied()
			.ok_or(NavigationError::OutOfRange {
				index,
				visible: visible.len(),
			})?;
		self.current = raw;
		tracing::debug!(step = %self.steps[raw].id, index, "jumped to step");
		Ok(())
	}

	/// Validate the current step, then run the terminal submit callback
	///
	/// The callback is not invoked when validation fails.
	pub async fn submit<F, Fut, T>(&mut self, context: &C, on_submit: F) -> NavigationResult<T>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = T>,
	{
		let (visible, position) = self.sync(context)?;
		self.run_validation(position, &visible, context).await?;
		Ok(on_submit().await)
	}

	async fn run_validation(
		&self,
		position: usize,
		visible: &[usize],
		context: &C,
	) -> NavigationResult<()> {
		let steps: Vec<&Step<C>> = visible.iter().map(|&raw| &self.steps[raw]).collect();
		if let Err(errors) = self
			.validator
			.validate_step(position, &steps, context)
			.await
		{
			tracing::warn!(
				step = %steps[position].id,
				fields = errors.len(),
				"step validation failed"
			);
			self.notifier
				.notify(Notification::warning(VALIDATION_FAILED_MESSAGE));
			return Err(NavigationError::Validation(errors));
		}
		Ok(())
	}
}

impl<C> fmt::Debug for StepNavigator<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StepNavigator")
			.field("steps", &self.steps)
			.field("current", &self.current)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::notify::RecordingNotifier;
	use parking_lot::Mutex;
	use rstest::{fixture, rstest};

	#[derive(Debug, Default)]
	struct Answers {
		premium: bool,
		name: String,
	}

	/// Rejects the "account" step while `name` is empty and records calls.
	#[derive(Default)]
	struct NameRequired {
		calls: Mutex<Vec<usize>>,
	}

	#[async_trait]
	impl StepValidator<Answers> for NameRequired {
		async fn validate_step(
			&self,
			index: usize,
			visible: &[&Step<Answers>],
			context: &Answers,
		) -> Result<(), ValidationErrors> {
			self.calls.lock().push(index);
			if visible[index].id == "account" && context.name.is_empty() {
				let mut errors = ValidationErrors::new();
				errors.add("name", "Name is required");
				return Err(errors);
			}
			Ok(())
		}
	}

	fn steps() -> Vec<Step<Answers>> {
		vec![
			Step::new("account", "Account"),
			Step::new("premium", "Premium").with_condition(|a: &Answers| a.premium),
			Step::new("extras", "Extras").optional(),
			Step::new("confirm", "Confirm"),
		]
	}

	#[fixture]
	fn validator() -> Arc<NameRequired> {
		Arc::new(NameRequired::default())
	}

	#[rstest]
	#[tokio::test]
	async fn test_next_blocked_by_validation(validator: Arc<NameRequired>) {
		// Arrange
		let notifier = Arc::new(RecordingNotifier::new());
		let mut nav =
			StepNavigator::new(steps(), validator.clone()).with_notifier(notifier.clone());
		let answers = Answers::default();

		// Act
		let result = nav.next(&answers).await;

		// Assert
		assert!(matches!(result, Err(NavigationError::Validation(_))));
		assert_eq!(nav.current_index(&answers), Some(0));
		assert_eq!(notifier.messages(), vec![VALIDATION_FAILED_MESSAGE.to_string()]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_next_skips_hidden_steps(validator: Arc<NameRequired>) {
		// Arrange
		let mut nav = StepNavigator::new(steps(), validator);
		let answers = Answers {
			name: "Ada".to_string(),
			..Default::default()
		};

		// Act
		let moved = nav.next(&answers).await.unwrap();

		// Assert
		assert!(moved);
		assert_eq!(nav.current_step(&answers).unwrap().id, "extras");
		assert_eq!(nav.visible_steps(&answers).len(), 3);
	}

	#[rstest]
	#[tokio::test]
	async fn test_optional_step_is_not_validated(validator: Arc<NameRequired>) {
		// Arrange
		let mut nav = StepNavigator::new(steps(), validator.clone());
		let answers = Answers::default();
		nav.go_to_step(1, &answers).unwrap();

		// Act
		nav.next(&answers).await.unwrap();

		// Assert
		assert!(validator.calls.lock().is_empty());
		assert!(nav.is_last(&answers));
	}

	#[rstest]
	#[tokio::test]
	async fn test_next_at_last_step_is_noop(validator: Arc<NameRequired>) {
		// Arrange
		let mut nav = StepNavigator::new(steps(), validator);
		let answers = Answers::default();
		nav.go_to_step(2, &answers).unwrap();

		// Act
		let moved = nav.next(&answers).await.unwrap();

		// Assert
		assert!(!moved);
		assert_eq!(nav.current_step(&answers).unwrap().id, "confirm");
	}

	#[rstest]
	fn test_prev_does_not_validate(validator: Arc<NameRequired>) {
		// Arrange
		let mut nav = StepNavigator::new(steps(), validator.clone());
		let answers = Answers::default();
		nav.go_to_step(2, &answers).unwrap();

		// Act
		let moved = nav.prev(&answers).unwrap();

		// Assert
		assert!(moved);
		assert_eq!(nav.current_index(&answers), Some(1));
		assert!(validator.calls.lock().is_empty());
	}

	#[rstest]
	fn test_prev_at_first_step_returns_false(validator: Arc<NameRequired>) {
		// Arrange
		let mut nav = StepNavigator::new(steps(), validator);

		// Act
		let moved = nav.prev(&Answers::default()).unwrap();

		// Assert
		assert!(!moved);
	}

	#[rstest]
	#[case(3)]
	#[case(10)]
	fn test_go_to_step_out_of_range(validator: Arc<NameRequired>, #[case] index: usize) {
		// Arrange
		let mut nav = StepNavigator::new(steps(), validator);

		// Act
		let result = nav.go_to_step(index, &Answers::default());

		// Assert
		assert_eq!(
			result,
			Err(NavigationError::OutOfRange { index, visible: 3 })
		);
	}

	#[rstest]
	fn test_hidden_current_step_falls_back_to_previous(validator: Arc<NameRequired>) {
		// Arrange
		let mut nav = StepNavigator::new(steps(), validator);
		let mut answers = Answers {
			premium: true,
			..Default::default()
		};
		nav.go_to_step(1, &answers).unwrap();
		assert_eq!(nav.current_step(&answers).unwrap().id, "premium");

		// Act
		answers.premium = false;

		// Assert
		assert_eq!(nav.current_step(&answers).unwrap().id, "account");
		assert_eq!(nav.current_index(&answers), Some(0));
	}

	#[rstest]
	fn test_hidden_first_step_falls_forward() {
		// Arrange
		let steps = vec![
			Step::new("intro", "Intro").with_condition(|a: &Answers| a.premium),
			Step::new("details", "Details"),
		];
		let mut nav = StepNavigator::new(steps, Arc::new(AcceptAll));
		let mut answers = Answers {
			premium: true,
			..Default::default()
		};
		nav.go_to_step(0, &answers).unwrap();

		// Act
		answers.premium = false;

		// Assert
		assert_eq!(nav.current_step(&answers).unwrap().id, "details");
	}

	#[rstest]
	#[tokio::test]
	async fn test_no_visible_steps() {
		// Arrange
		let steps = vec![Step::new("only", "Only").with_condition(|_: &Answers| false)];
		let mut nav = StepNavigator::new(steps, Arc::new(AcceptAll));

		// Act
		let result = nav.next(&Answers::default()).await;

		// Assert
		assert_eq!(result, Err(NavigationError::NoVisibleSteps));
		assert_eq!(nav.progress(&Answers::default()), 0);
	}

	#[rstest]
	fn test_progress_over_visible_steps(validator: Arc<NameRequired>) {
		// Arrange
		let mut nav = StepNavigator::new(steps(), validator);
		let answers = Answers::default();

		// Act
		nav.go_to_step(1, &answers).unwrap();

		// Assert
		assert_eq!(nav.progress(&answers), 67);
	}

	#[rstest]
	#[tokio::test]
	async fn test_submit_suppressed_on_failure(validator: Arc<NameRequired>) {
		// Arrange
		let steps = vec![Step::new("account", "Account")];
		let mut nav = StepNavigator::new(steps, validator);
		let submitted = Mutex::new(false);

		// Act
		let result = nav
			.submit(&Answers::default(), || async {
				*submitted.lock() = true;
			})
			.await;

		// Assert
		assert!(result.is_err());
		assert!(!*submitted.lock());
	}

	#[rstest]
	#[tokio::test]
	async fn test_submit_runs_callback_after_validation(validator: Arc<NameRequired>) {
		// Arrange
		let steps = vec![Step::new("account", "Account")];
		let mut nav = StepNavigator::new(steps, validator.clone());
		let answers = Answers {
			name: "Ada".to_string(),
			..Default::default()
		};

		// Act
		let result = nav.submit(&answers, || async { 42 }).await;

		// Assert
		assert_eq!(result, Ok(42));
		assert_eq!(*validator.calls.lock(), vec![0]);
	}
}
