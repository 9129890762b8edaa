//! Property-based tests for the builder store
//!
//! Uses proptest to verify:
//! 1. The section floor holds for any sequence of operations
//! 2. Any sequence of operations leaves a valid schema
//! 3. Undoing N edits then redoing N edits restores the pre-undo state
//! 4. Rule derivation is idempotent on builder output

use formgate_forms::{FieldPatch, FieldType, FormBuilder, derive_rules};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
	AddSection,
	DeleteSection(usize),
	DuplicateSection(usize),
	ReorderSections(usize, usize),
	AddField(usize, usize),
	DeleteField(usize),
	DuplicateField(usize),
	MoveField(usize, usize, usize),
	ChangeType(usize, usize),
	SetTitle(String),
	Undo,
	Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
	prop_oneof![
		Just(Op::AddSection),
		(0usize..8).prop_map(Op::DeleteSection),
		(0usize..8).prop_map(Op::DuplicateSection),
		(0usize..8, 0usize..8).prop_map(|(a, b)| Op::ReorderSections(a, b)),
		(0usize..8, 0usize..FieldType::ALL.len()).prop_map(|(s, t)| Op::AddField(s, t)),
		(0usize..16).prop_map(Op::DeleteField),
		(0usize..16).prop_map(Op::DuplicateField),
		(0usize..16, 0usize..8, 0usize..8).prop_map(|(f, s, i)| Op::MoveField(f, s, i)),
		(0usize..16, 0usize..FieldType::ALL.len()).prop_map(|(f, t)| Op::ChangeType(f, t)),
		"[a-z ]{0,12}".prop_map(Op::SetTitle),
		Just(Op::Undo),
		Just(Op::Redo),
	]
}

fn section_id(builder: &FormBuilder, index: usize) -> String {
	let sections = builder.sections();
	sections[index % sections.len()].id.clone()
}

fn field_location(builder: &FormBuilder, index: usize) -> Option<(String, String)> {
	let fields: Vec<(String, String)> = builder
		.sections()
		.iter()
		.flat_map(|s| s.fields.iter().map(move |f| (s.id.clone(), f.id.clone())))
		.collect();
	if fields.is_empty() {
		None
	} else {
		Some(fields[index % fields.len()].clone())
	}
}

fn apply(builder: &mut FormBuilder, op: Op) {
	match op {
		Op::AddSection => {
			builder.add_section().unwrap();
		}
		Op::DeleteSection(i) => {
			let id = section_id(builder, i);
			let _ = builder.delete_section(&id);
		}
		Op::DuplicateSection(i) => {
			let id = section_id(builder, i);
			let _ = builder.duplicate_section(&id);
		}
		Op::ReorderSections(a, b) => {
			let len = builder.sections().len();
			let _ = builder.reorder_sections(a % len, b % len);
		}
		Op::AddField(s, t) => {
			let id = section_id(builder, s);
			let _ = builder.add_field(&id, FieldType::ALL[t]);
		}
		Op::DeleteField(f) => {
			if let Some((_, id)) = field_location(builder, f) {
				let _ = builder.delete_field(&id);
			}
		}
		Op::DuplicateField(f) => {
			if let Some((_, id)) = field_location(builder, f) {
				let _ = builder.duplicate_field(&id);
			}
		}
		Op::MoveField(f, s, i) => {
			if let Some((from, id)) = field_location(builder, f) {
				let to = section_id(builder, s);
				let _ = builder.move_field(&id, &from, &to, i);
			}
		}
		Op::ChangeType(f, t) => {
			if let Some((_, id)) = field_location(builder, f) {
				let _ = builder.update_field(&id, FieldPatch::field_type(FieldType::ALL[t]));
			}
		}
		Op::SetTitle(title) => builder.set_title(title),
		Op::Undo => {
			builder.undo();
		}
		Op::Redo => {
			builder.redo();
		}
	}
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	/// Property: there is always at least one section and the schema stays valid
	#[test]
	fn test_section_floor_and_validity(ops in prop::collection::vec(op_strategy(), 0..60)) {
		let mut builder = FormBuilder::new();

		for op in ops {
			apply(&mut builder, op);
			prop_assert!(!builder.sections().is_empty());
		}

		prop_assert!(builder.schema().validate().is_ok());
	}

	/// Property: undo N then redo N returns to the exact pre-undo state
	#[test]
	fn test_undo_redo_round_trip(
		edits in prop::collection::vec((0usize..4, 0usize..FieldType::ALL.len()), 1..30)
	) {
		let mut builder = FormBuilder::new();
		for (n, (kind, t)) in edits.iter().enumerate() {
			match *kind {
				0 => builder.set_title(format!("Title {n}")),
				1 => {
					builder.add_section().unwrap();
				}
				_ => {
					let id = section_id(&builder, n);
					builder.add_field(&id, FieldType::ALL[*t]).unwrap();
				}
			}
		}
		let before = builder.schema();

		for _ in 0..edits.len() {
			prop_assert!(builder.undo());
		}
		prop_assert!(!builder.can_undo());
		for _ in 0..edits.len() {
			prop_assert!(builder.redo());
		}

		prop_assert_eq!(builder.schema(), before);
		prop_assert!(!builder.can_redo());
	}

	/// Property: deriving rules twice from an unchanged schema is identical
	#[test]
	fn test_rule_derivation_idempotent(ops in prop::collection::vec(op_strategy(), 0..40)) {
		let mut builder = FormBuilder::new();
		for op in ops {
			apply(&mut builder, op);
		}
		let schema = builder.schema();

		prop_assert_eq!(derive_rules(&schema), derive_rules(&schema));
		prop_assert_eq!(builder.rules(), derive_rules(&schema));
	}
}
