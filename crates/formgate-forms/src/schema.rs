//! Form schema model
//!
//! A [`FormSchema`] is an ordered list of [`Section`]s, each holding an ordered
//! list of [`Field`]s. Field ids are unique across the whole schema because they
//! double as the keys of submitted values and of the derived validation rules.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Options seeded into newly created choice fields.
pub const DEFAULT_CHOICE_OPTIONS: [&str; 2] = ["Option 1", "Option 2"];

/// Rows given to a newly created textarea.
pub const DEFAULT_TEXTAREA_ROWS: u32 = 4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
	#[error("A form must contain at least one section")]
	NoSections,
	#[error("Duplicate field id '{0}'")]
	DuplicateFieldId(String),
	#[error("Duplicate section id '{0}'")]
	DuplicateSectionId(String),
	#[error("Field '{0}' needs at least one option")]
	MissingOptions(String),
	#[error("Field '{0}' only supports min/max when its type is number")]
	RangeOnNonNumber(String),
	#[error("Field '{field}' has min {min} greater than max {max}")]
	InvertedRange { field: String, min: f64, max: f64 },
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Input type of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
	Text,
	Email,
	Tel,
	Number,
	Date,
	Url,
	Textarea,
	Select,
	Radio,
	Checkbox,
}

impl FieldType {
	/// Every supported field type, in palette order.
	pub const ALL: [FieldType; 10] = [
		FieldType::Text,
		FieldType::Email,
		FieldType::Tel,
		FieldType::Number,
		FieldType::Date,
		FieldType::Url,
		FieldType::Textarea,
		FieldType::Select,
		FieldType::Radio,
		FieldType::Checkbox,
	];

	/// Whether the type is backed by a list of options.
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::FieldType;
	///
	/// assert!(FieldType::Radio.requires_options());
	/// assert!(!FieldType::Email.requires_options());
	/// ```
	pub fn requires_options(self) -> bool {
		matches!(self, FieldType::Select | FieldType::Radio | FieldType::Checkbox)
	}

	/// Whether submitted values are arrays of selected options.
	pub fn is_multi_valued(self) -> bool {
		self == FieldType::Checkbox
	}

	pub fn as_str(self) -> &'static str {
		match self {
			FieldType::Text => "text",
			FieldType::Email => "email",
			FieldType::Tel => "tel",
			FieldType::Number => "number",
			FieldType::Date => "date",
			FieldType::Url => "url",
			FieldType::Textarea => "textarea",
			FieldType::Select => "select",
			FieldType::Radio => "radio",
			FieldType::Checkbox => "checkbox",
		}
	}

	/// Human readable name used for default labels.
	pub fn display_name(self) -> &'static str {
		match self {
			FieldType::Text => "Text",
			FieldType::Email => "Email",
			FieldType::Tel => "Phone",
			FieldType::Number => "Number",
			FieldType::Date => "Date",
			FieldType::Url => "URL",
			FieldType::Textarea => "Paragraph",
			FieldType::Select => "Dropdown",
			FieldType::Radio => "Multiple Choice",
			FieldType::Checkbox => "Checkboxes",
		}
	}
}

impl fmt::Display for FieldType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A single input in a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
	pub id: String,
	#[serde(rename = "type")]
	pub field_type: FieldType,
	pub label: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub placeholder: Option<String>,
	#[serde(default)]
	pub required: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub options: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rows: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_value: Option<serde_json::Value>,
}

impl Field {
	/// Create a field with the defaults the builder palette uses
	///
	/// Choice types are seeded with two placeholder options and textareas get
	/// four rows, so a freshly created field always satisfies the schema
	/// invariants.
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::{Field, FieldType};
	///
	/// let field = Field::new("favourite", FieldType::Select);
	/// assert_eq!(field.label, "Untitled Dropdown Field");
	/// assert_eq!(field.options.as_ref().map(Vec::len), Some(2));
	/// assert!(!field.required);
	/// ```
	pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			id: id.into(),
			field_type,
			label: format!("Untitled {} Field", field_type.display_name()),
			placeholder: None,
			required: false,
			options: field_type
				.requires_options()
				.then(|| DEFAULT_CHOICE_OPTIONS.iter().map(|o| o.to_string()).collect()),
			min: None,
			max: None,
			rows: (field_type == FieldType::Textarea).then_some(DEFAULT_TEXTAREA_ROWS),
			image: None,
			default_value: None,
		}
	}

	/// Create a field with a freshly generated id.
	pub fn generate(field_type: FieldType) -> Self {
		Self::new(generate_id("field"), field_type)
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
		self.placeholder = Some(placeholder.into());
		self
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn with_options<I, S>(mut self, options: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.options = Some(options.into_iter().map(Into::into).collect());
		self
	}

	/// Set an inclusive numeric range
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::{Field, FieldType};
	///
	/// let field = Field::new("age", FieldType::Number).with_range(Some(18.0), Some(99.0));
	/// assert_eq!(field.min, Some(18.0));
	/// assert_eq!(field.max, Some(99.0));
	/// ```
	pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
		self.min = min;
		self.max = max;
		self
	}

	pub fn with_rows(mut self, rows: u32) -> Self {
		self.rows = Some(rows);
		self
	}

	pub fn with_image(mut self, image: impl Into<String>) -> Self {
		self.image = Some(image.into());
		self
	}

	pub fn with_default(mut self, value: serde_json::Value) -> Self {
		self.default_value = Some(value);
		self
	}

	/// Options as a slice, empty when the field has none.
	pub fn options(&self) -> &[String] {
		self.options.as_deref().unwrap_or_default()
	}

	/// Check the per-field invariants.
	pub fn validate(&self) -> SchemaResult<()> {
		if self.field_type.requires_options() && self.options().is_empty() {
			return Err(SchemaError::MissingOptions(self.id.clone()));
		}
		if self.field_type != FieldType::Number && (self.min.is_some() || self.max.is_some()) {
			return Err(SchemaError::RangeOnNonNumber(self.id.clone()));
		}
		if let (Some(min), Some(max)) = (self.min, self.max)
			&& min > max
		{
			return Err(SchemaError::InvertedRange {
				field: self.id.clone(),
				min,
				max,
			});
		}
		Ok(())
	}
}

/// Partial update applied to a [`Field`] by the builder
///
/// Outer `None` leaves the attribute untouched; for optional attributes an
/// inner `None` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
	pub field_type: Option<FieldType>,
	pub label: Option<String>,
	pub placeholder: Option<Option<String>>,
	pub required: Option<bool>,
	pub options: Option<Option<Vec<String>>>,
	pub min: Option<Option<f64>>,
	pub max: Option<Option<f64>>,
	pub rows: Option<Option<u32>>,
	pub image: Option<Option<String>>,
	pub default_value: Option<Option<serde_json::Value>>,
}

impl FieldPatch {
	pub fn label(label: impl Into<String>) -> Self {
		Self {
			label: Some(label.into()),
			..Self::default()
		}
	}

	pub fn required(required: bool) -> Self {
		Self {
			required: Some(required),
			..Self::default()
		}
	}

	pub fn field_type(field_type: FieldType) -> Self {
		Self {
			field_type: Some(field_type),
			..Self::default()
		}
	}

	pub fn options<I, S>(options: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			options: Some(Some(options.into_iter().map(Into::into).collect())),
			..Self::default()
		}
	}

	/// Apply the patch, keeping the field consistent with its (new) type.
	///
	/// Switching to a choice type without options seeds the default options,
	/// and switching away from `number` drops any range.
	pub fn apply_to(self, field: &mut Field) {
		if let Some(field_type) = self.field_type {
			field.field_type = field_type;
		}
		if let Some(label) = self.label {
			field.label = label;
		}
		if let Some(placeholder) = self.placeholder {
			field.placeholder = placeholder;
		}
		if let Some(required) = self.required {
			field.required = required;
		}
		if let Some(options) = self.options {
			field.options = options;
		}
		if let Some(min) = self.min {
			field.min = min;
		}
		if let Some(max) = self.max {
			field.max = max;
		}
		if let Some(rows) = self.rows {
			field.rows = rows;
		}
		if let Some(image) = self.image {
			field.image = image;
		}
		if let Some(default_value) = self.default_value {
			field.default_value = default_value;
		}

		if field.field_type.requires_options() && field.options().is_empty() {
			field.options = Some(DEFAULT_CHOICE_OPTIONS.iter().map(|o| o.to_string()).collect());
		}
		if field.field_type != FieldType::Number {
			field.min = None;
			field.max = None;
		}
	}
}

/// A page of the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
	pub id: String,
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,
	#[serde(default)]
	pub fields: Vec<Field>,
}

impl Section {
	pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			description: None,
			image: None,
			fields: Vec::new(),
		}
	}

	/// Create an empty section with a generated id.
	pub fn generate(title: impl Into<String>) -> Self {
		Self::new(generate_id("section"), title)
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_field(mut self, field: Field) -> Self {
		self.fields.push(field);
		self
	}

	pub fn field(&self, id: &str) -> Option<&Field> {
		self.fields.iter().find(|f| f.id == id)
	}

	pub fn field_position(&self, id: &str) -> Option<usize> {
		self.fields.iter().position(|f| f.id == id)
	}

	pub fn required_fields(&self) -> impl Iterator<Item = &Field> {
		self.fields.iter().filter(|f| f.required)
	}
}

/// Partial update applied to a [`Section`] by the builder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionPatch {
	pub title: Option<String>,
	pub description: Option<Option<String>>,
	pub image: Option<Option<String>>,
}

impl SectionPatch {
	pub fn title(title: impl Into<String>) -> Self {
		Self {
			title: Some(title.into()),
			..Self::default()
		}
	}

	pub fn apply_to(self, section: &mut Section) {
		if let Some(title) = self.title {
			section.title = title;
		}
		if let Some(description) = self.description {
			section.description = description;
		}
		if let Some(image) = self.image {
			section.image = image;
		}
	}
}

/// A complete user-defined form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
	pub title: String,
	#[serde(default)]
	pub description: String,
	pub sections: Vec<Section>,
}

impl FormSchema {
	/// Create a schema with a single empty section
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::FormSchema;
	///
	/// let schema = FormSchema::new("Bug report");
	/// assert_eq!(schema.sections.len(), 1);
	/// assert!(schema.validate().is_ok());
	/// ```
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			description: String::new(),
			sections: vec![Section::generate("Section 1")],
		}
	}

	/// Create a schema from explicit sections.
	pub fn with_sections(title: impl Into<String>, sections: Vec<Section>) -> Self {
		Self {
			title: title.into(),
			description: String::new(),
			sections,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	/// All fields in section order.
	pub fn fields(&self) -> impl Iterator<Item = &Field> {
		self.sections.iter().flat_map(|s| s.fields.iter())
	}

	pub fn field(&self, id: &str) -> Option<&Field> {
		self.fields().find(|f| f.id == id)
	}

	pub fn section(&self, id: &str) -> Option<&Section> {
		self.sections.iter().find(|s| s.id == id)
	}

	pub fn section_position(&self, id: &str) -> Option<usize> {
		self.sections.iter().position(|s| s.id == id)
	}

	/// Index of the section owning the given field.
	pub fn section_of_field(&self, field_id: &str) -> Option<usize> {
		self.sections
			.iter()
			.position(|s| s.fields.iter().any(|f| f.id == field_id))
	}

	pub fn field_count(&self) -> usize {
		self.sections.iter().map(|s| s.fields.len()).sum()
	}

	pub fn required_field_count(&self) -> usize {
		self.fields().filter(|f| f.required).count()
	}

	/// A schema without any field cannot be rendered as a form.
	pub fn is_empty(&self) -> bool {
		self.field_count() == 0
	}

	/// Check every schema invariant, reporting the first violation
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::{Field, FieldType, FormSchema, SchemaError, Section};
	///
	/// let schema = FormSchema::with_sections(
	///     "Survey",
	///     vec![
	///         Section::new("s1", "One").with_field(Field::new("name", FieldType::Text)),
	///         Section::new("s2", "Two").with_field(Field::new("name", FieldType::Email)),
	///     ],
	/// );
	/// assert_eq!(
	///     schema.validate(),
	///     Err(SchemaError::DuplicateFieldId("name".to_string()))
	/// );
	/// ```
	pub fn validate(&self) -> SchemaResult<()> {
		if self.sections.is_empty() {
			return Err(SchemaError::NoSections);
		}

		let mut section_ids = HashSet::new();
		let mut field_ids = HashSet::new();
		for section in &self.sections {
			if !section_ids.insert(section.id.as_str()) {
				return Err(SchemaError::DuplicateSectionId(section.id.clone()));
			}
			for field in &section.fields {
				if !field_ids.insert(field.id.as_str()) {
					return Err(SchemaError::DuplicateFieldId(field.id.clone()));
				}
				field.validate()?;
			}
		}
		Ok(())
	}
}

impl Default for FormSchema {
	fn default() -> Self {
		Self::new("Untitled Form")
	}
}

/// Generate an opaque id with the given prefix.
pub(crate) fn generate_id(prefix: &str) -> String {
	format!("{}_{}", prefix, Uuid::new_v4().simple())
}
