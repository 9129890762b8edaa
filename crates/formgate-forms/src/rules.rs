//! Validation rules derived from a [`FormSchema`]
//!
//! [`derive_rules`] compiles a schema into a [`RuleSet`]: one [`FieldRule`] per
//! field id. Derivation is a pure function of the schema, so deriving twice from
//! an unchanged schema yields equal rule sets. The builder relies on this to
//! recompute rules whenever the schema shape changes.
//!
//! | Field type | Accepted value | Required means |
//! |---|---|---|
//! | `email` | valid email string | non-empty |
//! | `number` | number or numeric string within `[min, max]` | present |
//! | `url` | absolute URL string | non-empty |
//! | `date` | string | non-empty |
//! | `checkbox` | array of selected options | at least one selected |
//! | anything else | string | non-empty after trim |

use crate::error::{FieldError, FieldResult, ValidationErrors};
use crate::schema::{Field, FieldType, FormSchema, Section};
use crate::validators::{EmailValidator, NumberValidator, UrlValidator};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Submitted values keyed by field id.
pub type FormValues = HashMap<String, Value>;

/// Value shape a rule expects
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
	Text,
	Email,
	Number { min: Option<f64>, max: Option<f64> },
	Url,
	Date,
	Checkbox,
}

impl RuleKind {
	fn for_field(field: &Field) -> Self {
		match field.field_type {
			FieldType::Email => RuleKind::Email,
			FieldType::Number => RuleKind::Number {
				min: field.min,
				max: field.max,
			},
			FieldType::Url => RuleKind::Url,
			FieldType::Date => RuleKind::Date,
			FieldType::Checkbox => RuleKind::Checkbox,
			FieldType::Text
			| FieldType::Tel
			| FieldType::Textarea
			| FieldType::Select
			| FieldType::Radio => RuleKind::Text,
		}
	}
}

/// Validation rule for a single field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRule {
	pub field_id: String,
	pub label: String,
	pub required: bool,
	pub kind: RuleKind,
}

impl FieldRule {
	pub fn for_field(field: &Field) -> Self {
		Self {
			field_id: field.id.clone(),
			label: field.label.clone(),
			required: field.required,
			kind: RuleKind::for_field(field),
		}
	}

	/// Validate a value and return its cleaned form
	///
	/// Absent, `null` and empty values pass for optional fields and are
	/// cleaned to `null` (or `[]` for checkboxes).
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::{Field, FieldRule, FieldType};
	/// use serde_json::json;
	///
	/// let rule = FieldRule::for_field(
	///     &Field::new("qty", FieldType::Number).with_label("Quantity").required(),
	/// );
	/// assert_eq!(rule.clean(Some(&json!("12"))).unwrap(), json!(12.0));
	/// assert_eq!(
	///     rule.clean(None).unwrap_err().to_string(),
	///     "Quantity is required"
	/// );
	/// ```
	pub fn clean(&self, value: Option<&Value>) -> FieldResult<Value> {
		let value = value.filter(|v| !v.is_null());

		if self.kind == RuleKind::Checkbox {
			return self.clean_selection(value);
		}

		let Some(value) = value else {
			return self.empty();
		};

		match &self.kind {
			RuleKind::Number { min, max } => {
				if value.as_str().is_some_and(|s| s.trim().is_empty()) {
					return self.empty();
				}
				let num = NumberValidator::new()
					.with_range(*min, *max)
					.coerce(value)
					.map_err(|e| self.relabel(e))?;
				Ok(serde_json::json!(num))
			}
			kind => {
				let text = value
					.as_str()
					.ok_or_else(|| FieldError::Invalid(format!("{} must be text", self.label)))?;
				let trimmed = text.trim();
				if trimmed.is_empty() {
					return self.empty();
				}
				match kind {
					RuleKind::Email => EmailValidator::new()
						.with_message(format!("{} must be a valid email address", self.label))
						.validate(trimmed)?,
					RuleKind::Url => UrlValidator::new()
						.with_message(format!("{} must be a valid URL", self.label))
						.validate(trimmed)?,
					_ => {}
				}
				// Free text keeps its original spacing; formatted values are trimmed
				if *kind == RuleKind::Text || *kind == RuleKind::Date {
					Ok(Value::String(text.to_string()))
				} else {
					Ok(Value::String(trimmed.to_string()))
				}
			}
		}
	}

	fn clean_selection(&self, value: Option<&Value>) -> FieldResult<Value> {
		let selected = match value {
			None => Vec::new(),
			Some(Value::Array(items)) => items
				.iter()
				.map(|item| {
					item.as_str().map(str::to_string).ok_or_else(|| {
						FieldError::Invalid(format!("{} has an invalid selection", self.label))
					})
				})
				.collect::<FieldResult<Vec<_>>>()?,
			Some(_) => {
				return Err(FieldError::Invalid(format!(
					"{} must be a list of selected options",
					self.label
				)));
			}
		};

		if self.required && selected.is_empty() {
			return Err(FieldError::Required(format!(
				"Please select at least one option for {}",
				self.label
			)));
		}
		Ok(Value::Array(selected.into_iter().map(Value::String).collect()))
	}

	fn empty(&self) -> FieldResult<Value> {
		if self.required {
			Err(FieldError::Required(format!("{} is required", self.label)))
		} else {
			Ok(Value::Null)
		}
	}

	fn relabel(&self, error: FieldError) -> FieldError {
		match error {
			FieldError::Invalid(_) => FieldError::Invalid(format!("{} must be a number", self.label)),
			FieldError::OutOfRange(msg) => FieldError::OutOfRange(format!("{}: {}", self.label, msg)),
			other => other,
		}
	}
}

/// Field rules keyed by field id, in schema order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleSet {
	rules: IndexMap<String, FieldRule>,
}

impl RuleSet {
	pub fn get(&self, field_id: &str) -> Option<&FieldRule> {
		self.rules.get(field_id)
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &FieldRule> {
		self.rules.values()
	}

	/// Validate every rule, returning cleaned values on success.
	pub fn clean(&self, values: &FormValues) -> Result<FormValues, ValidationErrors> {
		self.clean_fields(self.rules.keys().map(String::as_str), values)
	}

	/// Validate only the given field ids. Unknown ids are ignored.
	pub fn clean_fields<'a, I>(
		&self,
		field_ids: I,
		values: &FormValues,
	) -> Result<FormValues, ValidationErrors>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut cleaned = FormValues::new();
		let mut errors = ValidationErrors::new();

		for id in field_ids {
			let Some(rule) = self.rules.get(id) else {
				continue;
			};
			match rule.clean(values.get(id)) {
				Ok(value) => {
					cleaned.insert(id.to_string(), value);
				}
				Err(e) => errors.add(id, e.to_string()),
			}
		}

		if errors.is_empty() {
			Ok(cleaned)
		} else {
			Err(errors)
		}
	}

	/// Validate the fields of one section.
	pub fn validate_section(
		&self,
		section: &Section,
		values: &FormValues,
	) -> Result<(), ValidationErrors> {
		self.clean_fields(section.fields.iter().map(|f| f.id.as_str()), values)
			.map(|_| ())
	}
}

/// Compile a schema into its validation rules
///
/// # Examples
///
/// ```
/// use formgate_forms::{derive_rules, Field, FieldType, FormSchema, Section};
///
/// let schema = FormSchema::with_sections(
///     "Contact",
///     vec![Section::new("s1", "Details").with_field(Field::new("email", FieldType::Email))],
/// );
/// let rules = derive_rules(&schema);
/// assert_eq!(rules.len(), 1);
/// assert_eq!(rules, derive_rules(&schema));
/// ```
pub fn derive_rules(schema: &FormSchema) -> RuleSet {
	let rules = schema
		.fields()
		.map(|field| (field.id.clone(), FieldRule::for_field(field)))
		.collect();
	RuleSet { rules }
}
