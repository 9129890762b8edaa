//! Form builder editing session
//!
//! [`FormBuilder`] is the single mutable store shared by every editor panel.
//! All mutations go through [`BuilderCommand`]s applied by [`FormBuilder::apply`]
//! (the named methods are thin wrappers), which keeps the dirty flag and the
//! snapshot history consistent with the edited state.
//!
//! ## Invariants
//!
//! - There is always at least one section; deleting the last one is a no-op.
//! - Field ids stay unique across the whole form.
//! - At most one of a field or a section is selected.
//! - Every committed edit marks the session dirty and records a snapshot.

use crate::draft::{DraftError, DraftPayload, DraftResult, DraftStorage};
use crate::history::{BuilderSnapshot, DEFAULT_HISTORY_LIMIT, SnapshotHistory};
use crate::rules::{RuleSet, derive_rules};
use crate::schema::{
	Field, FieldPatch, FieldType, FormSchema, SchemaError, Section, SectionPatch, generate_id,
};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuilderError {
	#[error("Section '{0}' not found")]
	SectionNotFound(String),
	#[error("Field '{0}' not found")]
	FieldNotFound(String),
	#[error("Field '{field}' is not in section '{section}'")]
	FieldNotInSection { field: String, section: String },
	#[error("Index {index} is out of range for {len} items")]
	IndexOutOfRange { index: usize, len: usize },
	#[error("Invalid schema: {0}")]
	Schema(#[from] SchemaError),
}

pub type BuilderResult<T> = Result<T, BuilderError>;

/// What the editor currently has selected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
	#[default]
	None,
	Field(String),
	Section(String),
}

/// Every operation the builder store accepts
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderCommand {
	SetFormData(FormSchema),
	SetTitle(String),
	SetDescription(String),
	AddSection,
	UpdateSection { id: String, patch: SectionPatch },
	DeleteSection(String),
	DuplicateSection(String),
	ReorderSections { from: usize, to: usize },
	AddField { section_id: String, field_type: FieldType },
	UpdateField { id: String, patch: FieldPatch },
	DeleteField(String),
	DuplicateField(String),
	MoveField {
		id: String,
		from_section: String,
		to_section: String,
		to_index: usize,
	},
	SelectField(Option<String>),
	SelectSection(Option<String>),
	SaveSnapshot,
	Undo,
	Redo,
	ResetForm,
	MarkClean,
}

impl BuilderCommand {
	/// Commands that edit the form content (and so dirty the session).
	fn is_edit(&self) -> bool {
		!matches!(
			self,
			BuilderCommand::SetFormData(_)
				| BuilderCommand::SelectField(_)
				| BuilderCommand::SelectSection(_)
				| BuilderCommand::SaveSnapshot
				| BuilderCommand::Undo
				| BuilderCommand::Redo
				| BuilderCommand::ResetForm
				| BuilderCommand::MarkClean
		)
	}

	fn name(&self) -> &'static str {
		match self {
			BuilderCommand::SetFormData(_) => "set_form_data",
			BuilderCommand::SetTitle(_) => "set_title",
			BuilderCommand::SetDescription(_) => "set_description",
			BuilderCommand::AddSection => "add_section",
			BuilderCommand::UpdateSection { .. } => "update_section",
			BuilderCommand::DeleteSection(_) => "delete_section",
			BuilderCommand::DuplicateSection(_) => "duplicate_section",
			BuilderCommand::ReorderSections { .. } => "reorder_sections",
			BuilderCommand::AddField { .. } => "add_field",
			BuilderCommand::UpdateField { .. } => "update_field",
			BuilderCommand::DeleteField(_) => "delete_field",
			BuilderCommand::DuplicateField(_) => "duplicate_field",
			BuilderCommand::MoveField { .. } => "move_field",
			BuilderCommand::SelectField(_) => "select_field",
			BuilderCommand::SelectSection(_) => "select_section",
			BuilderCommand::SaveSnapshot => "save_snapshot",
			BuilderCommand::Undo => "undo",
			BuilderCommand::Redo => "redo",
			BuilderCommand::ResetForm => "reset_form",
			BuilderCommand::MarkClean => "mark_clean",
		}
	}
}

/// Result of a successfully applied command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
	/// State changed.
	Applied,
	/// Id of an entity the command created.
	Created(String),
	/// The command was accepted but left the state untouched.
	Unchanged,
}

/// Undo/redo capable editing session over a [`FormSchema`]
///
/// # Examples
///
/// ```
/// use formgate_forms::{FieldType, FormBuilder};
///
/// let mut builder = FormBuilder::new();
/// let section_id = builder.sections()[0].id.clone();
/// let field_id = builder.add_field(&section_id, FieldType::Email).unwrap();
///
/// assert!(builder.is_dirty());
/// assert_eq!(builder.selected_field(), Some(field_id.as_str()));
///
/// builder.undo();
/// assert!(builder.sections()[0].fields.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct FormBuilder {
	title: String,
	description: String,
	sections: Vec<Section>,
	selection: Selection,
	is_dirty: bool,
	last_saved: Option<DateTime<Utc>>,
	history: SnapshotHistory,
}

impl FormBuilder {
	/// Fresh session holding one empty section.
	pub fn new() -> Self {
		Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
	}

	/// Fresh session keeping at most `limit` snapshots.
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::FormBuilder;
	///
	/// let mut builder = FormBuilder::with_history_limit(2);
	/// builder.set_title("First");
	/// builder.set_title("Second");
	/// builder.set_title("Third");
	///
	/// assert_eq!(builder.history().len(), 2);
	/// assert!(builder.undo());
	/// assert!(!builder.undo());
	/// assert_eq!(builder.title(), "Second");
	/// ```
	pub fn with_history_limit(limit: usize) -> Self {
		let schema = FormSchema::default();
		let mut history = SnapshotHistory::new(limit);
		history.reset(BuilderSnapshot::new(
			&schema.title,
			&schema.description,
			&schema.sections,
		));
		Self {
			title: schema.title,
			description: schema.description,
			sections: schema.sections,
			selection: Selection::None,
			is_dirty: false,
			last_saved: None,
			history,
		}
	}

	/// Start a session from an existing schema.
	pub fn from_schema(schema: FormSchema) -> BuilderResult<Self> {
		let mut builder = Self::new();
		builder.set_form_data(schema)?;
		Ok(builder)
	}

	/// Form title as shown to respondents.
	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	/// Sections in display order. Never empty.
	pub fn sections(&self) -> &[Section] {
		&self.sections
	}

	/// What the editor has selected, if anything.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Id of the selected field, if a field is selected.
	pub fn selected_field(&self) -> Option<&str> {
		match &self.selection {
			Selection::Field(id) => Some(id),
			_ => None,
		}
	}

	/// Id of the selected section, if a section is selected.
	pub fn selected_section(&self) -> Option<&str> {
		match &self.selection {
			Selection::Section(id) => Some(id),
			_ => None,
		}
	}

	/// Whether there are edits since the last load or [`FormBuilder::mark_clean`].
	pub fn is_dirty(&self) -> bool {
		self.is_dirty
	}

	/// When [`FormBuilder::mark_clean`] last ran.
	pub fn last_saved(&self) -> Option<DateTime<Utc>> {
		self.last_saved
	}

	/// Snapshot ring backing undo and redo.
	pub fn history(&self) -> &SnapshotHistory {
		&self.history
	}

	/// Whether an older snapshot exists.
	pub fn can_undo(&self) -> bool {
		self.history.can_undo()
	}

	/// Whether an undone snapshot can be reapplied.
	pub fn can_redo(&self) -> bool {
		self.history.can_redo()
	}

	/// Current state as an owned schema.
	pub fn schema(&self) -> FormSchema {
		FormSchema {
			title: self.title.clone(),
			description: self.description.clone(),
			sections: self.sections.clone(),
		}
	}

	/// Validation rules for the current schema shape.
	pub fn rules(&self) -> RuleSet {
		derive_rules(&self.schema())
	}

	/// Look a field up by id in any section.
	pub fn field(&self, id: &str) -> Option<&Field> {
		self.sections
			.iter()
			.flat_map(|s| s.fields.iter())
			.find(|f| f.id == id)
	}

	/// Apply one command
	///
	/// Edits mark the session dirty and record a snapshot. A failing command
	/// leaves the state untouched.
	pub fn apply(&mut self, command: BuilderCommand) -> BuilderResult<CommandOutcome> {
		let name = command.name();
		let is_edit = command.is_edit();
		let outcome = self.dispatch(command)?;

		if is_edit && outcome != CommandOutcome::Unchanged {
			self.is_dirty = true;
			self.record_snapshot();
		}
		tracing::debug!(command = name, outcome = ?outcome, dirty = self.is_dirty, "builder command applied");
		Ok(outcome)
	}

	fn dispatch(&mut self, command: BuilderCommand) -> BuilderResult<CommandOutcome> {
		match command {
			BuilderCommand::SetFormData(schema) => self.do_set_form_data(schema),
			BuilderCommand::SetTitle(title) => {
				if self.title == title {
					return Ok(CommandOutcome::Unchanged);
				}
				self.title = title;
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::SetDescription(description) => {
				if self.description == description {
					return Ok(CommandOutcome::Unchanged);
				}
				self.description = description;
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::AddSection => {
				let section = Section::generate(format!("Section {}", self.sections.len() + 1));
				let id = section.id.clone();
				self.sections.push(section);
				self.selection = Selection::Section(id.clone());
				Ok(CommandOutcome::Created(id))
			}
			BuilderCommand::UpdateSection { id, patch } => {
				let section = self.section_mut(&id)?;
				patch.apply_to(section);
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::DeleteSection(id) => self.do_delete_section(&id),
			BuilderCommand::DuplicateSection(id) => self.do_duplicate_section(&id),
			BuilderCommand::ReorderSections { from, to } => {
				let len = self.sections.len();
				for index in [from, to] {
					if index >= len {
						return Err(BuilderError::IndexOutOfRange { index, len });
					}
				}
				if from == to {
					return Ok(CommandOutcome::Unchanged);
				}
				let section = self.sections.remove(from);
				self.sections.insert(to, section);
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::AddField {
				section_id,
				field_type,
			} => {
				let field = Field::generate(field_type);
				let id = field.id.clone();
				self.section_mut(&section_id)?.fields.push(field);
				self.selection = Selection::Field(id.clone());
				Ok(CommandOutcome::Created(id))
			}
			BuilderCommand::UpdateField { id, patch } => {
				let field = self.field_mut(&id)?;
				let mut patched = field.clone();
				patch.apply_to(&mut patched);
				patched.validate()?;
				if *field == patched {
					return Ok(CommandOutcome::Unchanged);
				}
				*field = patched;
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::DeleteField(id) => {
				let (section_index, field_index) = self.locate_field(&id)?;
				self.sections[section_index].fields.remove(field_index);
				if self.selected_field() == Some(id.as_str()) {
					self.selection = Selection::None;
				}
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::DuplicateField(id) => {
				let (section_index, field_index) = self.locate_field(&id)?;
				let mut copy = self.sections[section_index].fields[field_index].clone();
				copy.id = generate_id("field");
				copy.label = format!("{} (copy)", copy.label);
				let new_id = copy.id.clone();
				self.sections[section_index]
					.fields
					.insert(field_index + 1, copy);
				self.selection = Selection::Field(new_id.clone());
				Ok(CommandOutcome::Created(new_id))
			}
			BuilderCommand::MoveField {
				id,
				from_section,
				to_section,
				to_index,
			} => self.do_move_field(&id, &from_section, &to_section, to_index),
			BuilderCommand::SelectField(id) => {
				if let Some(id) = &id {
					self.locate_field(id)?;
				}
				self.selection = id.map_or(Selection::None, Selection::Field);
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::SelectSection(id) => {
				if let Some(id) = &id {
					self.section_index(id)?;
				}
				self.selection = id.map_or(Selection::None, Selection::Section);
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::SaveSnapshot => {
				if self.record_snapshot() {
					Ok(CommandOutcome::Applied)
				} else {
					Ok(CommandOutcome::Unchanged)
				}
			}
			BuilderCommand::Undo => {
				let Some(snapshot) = self.history.undo().cloned() else {
					return Ok(CommandOutcome::Unchanged);
				};
				self.restore(snapshot);
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::Redo => {
				let Some(snapshot) = self.history.redo().cloned() else {
					return Ok(CommandOutcome::Unchanged);
				};
				self.restore(snapshot);
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::ResetForm => {
				let limit = self.history.limit();
				*self = Self::with_history_limit(limit);
				Ok(CommandOutcome::Applied)
			}
			BuilderCommand::MarkClean => {
				self.is_dirty = false;
				self.last_saved = Some(Utc::now());
				Ok(CommandOutcome::Applied)
			}
		}
	}

	fn do_set_form_data(&mut self, schema: FormSchema) -> BuilderResult<CommandOutcome> {
		schema.validate()?;
		if schema.title == self.title
			&& schema.description == self.description
			&& schema.sections == self.sections
		{
			return Ok(CommandOutcome::Unchanged);
		}

		self.title = schema.title;
		self.description = schema.description;
		self.sections = schema.sections;
		self.selection = Selection::None;
		self.is_dirty = false;
		self.history.reset(BuilderSnapshot::new(
			&self.title,
			&self.description,
			&self.sections,
		));
		Ok(CommandOutcome::Applied)
	}

	fn do_delete_section(&mut self, id: &str) -> BuilderResult<CommandOutcome> {
		let index = self.section_index(id)?;
		if self.sections.len() <= 1 {
			tracing::warn!(section_id = %id, "refusing to delete the last section");
			return Ok(CommandOutcome::Unchanged);
		}

		let removed = self.sections.remove(index);
		let selection_removed = match &self.selection {
			Selection::Section(selected) => *selected == removed.id,
			Selection::Field(selected) => removed.fields.iter().any(|f| f.id == *selected),
			Selection::None => false,
		};
		if selection_removed {
			self.selection = Selection::None;
		}
		Ok(CommandOutcome::Applied)
	}

	fn do_duplicate_section(&mut self, id: &str) -> BuilderResult<CommandOutcome> {
		let index = self.section_index(id)?;
		let mut copy = self.sections[index].clone();
		copy.id = generate_id("section");
		copy.title = format!("{} (copy)", copy.title);
		for field in &mut copy.fields {
			field.id = generate_id("field");
		}
		let new_id = copy.id.clone();
		self.sections.insert(index + 1, copy);
		self.selection = Selection::Section(new_id.clone());
		Ok(CommandOutcome::Created(new_id))
	}

	fn do_move_field(
		&mut self,
		id: &str,
		from_section: &str,
		to_section: &str,
		to_index: usize,
	) -> BuilderResult<CommandOutcome> {
		let from = self.section_index(from_section)?;
		let to = self.section_index(to_section)?;
		let field_index = self.sections[from].field_position(id).ok_or_else(|| {
			BuilderError::FieldNotInSection {
				field: id.to_string(),
				section: from_section.to_string(),
			}
		})?;

		if from == to && field_index == to_index {
			return Ok(CommandOutcome::Unchanged);
		}

		let field = self.sections[from].fields.remove(field_index);
		let destination = &mut self.sections[to].fields;
		let index = to_index.min(destination.len());
		destination.insert(index, field);
		Ok(CommandOutcome::Applied)
	}

	fn record_snapshot(&mut self) -> bool {
		self.history.push(BuilderSnapshot::new(
			&self.title,
			&self.description,
			&self.sections,
		))
	}

	fn restore(&mut self, snapshot: BuilderSnapshot) {
		self.title = snapshot.title;
		self.description = snapshot.description;
		self.sections = snapshot.sections;
		self.is_dirty = true;

		let still_exists = match &self.selection {
			Selection::Field(id) => self.field(id).is_some(),
			Selection::Section(id) => self.sections.iter().any(|s| s.id == *id),
			Selection::None => true,
		};
		if !still_exists {
			self.selection = Selection::None;
		}
	}

	fn section_index(&self, id: &str) -> BuilderResult<usize> {
		self.sections
			.iter()
			.position(|s| s.id == id)
			.ok_or_else(|| BuilderError::SectionNotFound(id.to_string()))
	}

	fn section_mut(&mut self, id: &str) -> BuilderResult<&mut Section> {
		let index = self.section_index(id)?;
		Ok(&mut self.sections[index])
	}

	fn locate_field(&self, id: &str) -> BuilderResult<(usize, usize)> {
		self.sections
			.iter()
			.enumerate()
			.find_map(|(si, s)| s.field_position(id).map(|fi| (si, fi)))
			.ok_or_else(|| BuilderError::FieldNotFound(id.to_string()))
	}

	fn field_mut(&mut self, id: &str) -> BuilderResult<&mut Field> {
		let (si, fi) = self.locate_field(id)?;
		Ok(&mut self.sections[si].fields[fi])
	}

	// Named operations

	/// Replace the whole form. Returns `false` when the payload equals the
	/// current state, in which case dirty flag and history are left alone.
	pub fn set_form_data(&mut self, schema: FormSchema) -> BuilderResult<bool> {
		Ok(self.apply(BuilderCommand::SetFormData(schema))? == CommandOutcome::Applied)
	}

	/// Rename the form. Setting the same title records nothing.
	pub fn set_title(&mut self, title: impl Into<String>) {
		let _ = self.apply(BuilderCommand::SetTitle(title.into()));
	}

	pub fn set_description(&mut self, description: impl Into<String>) {
		let _ = self.apply(BuilderCommand::SetDescription(description.into()));
	}

	/// Append an empty section, select it and return its id.
	pub fn add_section(&mut self) -> BuilderResult<String> {
		self.created(BuilderCommand::AddSection)
	}

	/// Patch a section's title or description.
	pub fn update_section(&mut self, id: &str, patch: SectionPatch) -> BuilderResult<()> {
		self.apply(BuilderCommand::UpdateSection {
			id: id.to_string(),
			patch,
		})
		.map(|_| ())
	}

	/// Delete a section. Returns `false` when it was the last one.
	pub fn delete_section(&mut self, id: &str) -> BuilderResult<bool> {
		Ok(self.apply(BuilderCommand::DeleteSection(id.to_string()))? == CommandOutcome::Applied)
	}

	/// Insert a deep copy after the section, with fresh ids for the section and
	/// every field, and select it.
	pub fn duplicate_section(&mut self, id: &str) -> BuilderResult<String> {
		self.created(BuilderCommand::DuplicateSection(id.to_string()))
	}

	/// Move the section at `from` to `to`. Both must be in range.
	pub fn reorder_sections(&mut self, from: usize, to: usize) -> BuilderResult<()> {
		self.apply(BuilderCommand::ReorderSections { from, to })
			.map(|_| ())
	}

	/// Append a field of the given type to a section and select it.
	pub fn add_field(&mut self, section_id: &str, field_type: FieldType) -> BuilderResult<String> {
		self.created(BuilderCommand::AddField {
			section_id: section_id.to_string(),
			field_type,
		})
	}

	/// Patch a field.
	///
	/// The patched field must still be valid; otherwise the field is left as it
	/// was and nothing is recorded.
	///
	/// # Examples
	///
	/// ```
	/// use formgate_forms::{BuilderError, FieldPatch, FieldType, FormBuilder};
	///
	/// let mut builder = FormBuilder::new();
	/// let section = builder.sections()[0].id.clone();
	/// let age = builder.add_field(&section, FieldType::Number).unwrap();
	///
	/// let inverted = FieldPatch {
	///     min: Some(Some(18.0)),
	///     max: Some(Some(1.0)),
	///     ..FieldPatch::default()
	/// };
	/// assert!(matches!(builder.update_field(&age, inverted), Err(BuilderError::Schema(_))));
	/// assert_eq!(builder.field(&age).unwrap().min, None);
	/// ```
	pub fn update_field(&mut self, id: &str, patch: FieldPatch) -> BuilderResult<()> {
		self.apply(BuilderCommand::UpdateField {
			id: id.to_string(),
			patch,
		})
		.map(|_| ())
	}

	/// Remove a field, clearing the selection if it pointed at it.
	pub fn delete_field(&mut self, id: &str) -> BuilderResult<()> {
		self.apply(BuilderCommand::DeleteField(id.to_string()))
			.map(|_| ())
	}

	/// Insert a copy right after the field and select it.
	pub fn duplicate_field(&mut self, id: &str) -> BuilderResult<String> {
		self.created(BuilderCommand::DuplicateField(id.to_string()))
	}

	/// Move a field within or across sections. `to_index` is clamped to the
	/// destination length.
	pub fn move_field(
		&mut self,
		id: &str,
		from_section: &str,
		to_section: &str,
		to_index: usize,
	) -> BuilderResult<()> {
		self.apply(BuilderCommand::MoveField {
			id: id.to_string(),
			from_section: from_section.to_string(),
			to_section: to_section.to_string(),
			to_index,
		})
		.map(|_| ())
	}

	/// Select a field (or clear the selection). Clears any section selection.
	pub fn select_field(&mut self, id: Option<&str>) -> BuilderResult<()> {
		self.apply(BuilderCommand::SelectField(id.map(str::to_string)))
			.map(|_| ())
	}

	/// Select a section (or clear the selection). Clears any field selection.
	pub fn select_section(&mut self, id: Option<&str>) -> BuilderResult<()> {
		self.apply(BuilderCommand::SelectSection(id.map(str::to_string)))
			.map(|_| ())
	}

	/// Record the current state unless it equals the latest snapshot.
	pub fn save_snapshot(&mut self) -> bool {
		matches!(
			self.apply(BuilderCommand::SaveSnapshot),
			Ok(CommandOutcome::Applied)
		)
	}

	/// Step back one snapshot. Returns `false` at the oldest one.
	pub fn undo(&mut self) -> bool {
		matches!(self.apply(BuilderCommand::Undo), Ok(CommandOutcome::Applied))
	}

	/// Reapply an undone snapshot. Returns `false` when there is none.
	pub fn redo(&mut self) -> bool {
		matches!(self.apply(BuilderCommand::Redo), Ok(CommandOutcome::Applied))
	}

	/// Back to a fresh form with an empty history and the same limit.
	pub fn reset_form(&mut self) {
		let _ = self.apply(BuilderCommand::ResetForm);
	}

	/// Clear the dirty flag after the form has been persisted.
	pub fn mark_clean(&mut self) {
		let _ = self.apply(BuilderCommand::MarkClean);
	}

	fn created(&mut self, command: BuilderCommand) -> BuilderResult<String> {
		let name = command.name();
		match self.apply(command)? {
			CommandOutcome::Created(id) => Ok(id),
			outcome => unreachable!("{name} always creates an entity, got {outcome:?}"),
		}
	}

	// Drafts

	/// Current state in the draft payload shape.
	pub fn to_draft(&self) -> DraftPayload {
		DraftPayload {
			form_title: self.title.clone(),
			form_description: self.description.clone(),
			form_sections: self.sections.clone(),
		}
	}

	/// Persist the current state under `key`.
	pub fn save_draft(&self, storage: &dyn DraftStorage, key: &str) -> DraftResult<()> {
		let contents = serde_json::to_string(&self.to_draft())?;
		storage.save(key, &contents)?;
		tracing::info!(key, sections = self.sections.len(), "builder draft saved");
		Ok(())
	}

	/// Restore a draft verbatim. Returns `false` when no draft exists.
	///
	/// The restored state starts a fresh history and is not dirty.
	pub fn restore_draft(&mut self, storage: &dyn DraftStorage, key: &str) -> DraftResult<bool> {
		let Some(contents) = storage.load(key)? else {
			return Ok(false);
		};
		let draft: DraftPayload = serde_json::from_str(&contents)?;
		if draft.form_sections.is_empty() {
			return Err(DraftError::NoSections);
		}

		self.title = draft.form_title;
		self.description = draft.form_description;
		self.sections = draft.form_sections;
		self.selection = Selection::None;
		self.is_dirty = false;
		self.history.reset(BuilderSnapshot::new(
			&self.title,
			&self.description,
			&self.sections,
		));
		tracing::info!(key, sections = self.sections.len(), "builder draft restored");
		Ok(true)
	}
}

impl Default for FormBuilder {
	fn default() -> Self {
		Self::new()
	}
}
