//! Configuration sources
//!
//! Each source yields a JSON object. Sources are merged in priority order
//! (environment > TOML file > defaults), nested objects key by key.

use crate::error::{SettingsError, SettingsResult};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "FORMGATE_";
pub const ENV_SEPARATOR: &str = "__";

pub trait ConfigSource: Send + Sync {
	fn load(&self) -> SettingsResult<IndexMap<String, Value>>;

	/// Higher wins.
	fn priority(&self) -> u8;

	fn description(&self) -> String;
}

/// Fixed values, normally the serialized built-in defaults
#[derive(Debug, Clone, Default)]
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}

	/// Every top-level key of a serialized value.
	pub fn from_serialize<T: serde::Serialize>(value: &T) -> SettingsResult<Self> {
		match serde_json::to_value(value)? {
			Value::Object(map) => Ok(Self {
				values: map.into_iter().collect(),
			}),
			_ => Err(SettingsError::Parse(
				"defaults must serialize to an object".to_string(),
			)),
		}
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> SettingsResult<IndexMap<String, Value>> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

/// TOML file; a missing file contributes nothing
#[derive(Debug, Clone)]
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> SettingsResult<IndexMap<String, Value>> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(toml_value)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SettingsError::Parse("Expected table at root".to_string()))?;
		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Environment variables under a prefix, `__` separating nested keys
///
/// `FORMGATE_GUARD__TICK_INTERVAL_MS=500` becomes
/// `{"guard": {"tick_interval_ms": 500}}`.
#[derive(Debug, Clone)]
pub struct EnvSource {
	prefix: String,
	vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
	pub fn new() -> Self {
		Self {
			prefix: ENV_PREFIX.to_string(),
			vars: None,
		}
	}

	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	/// Read from `vars` instead of the process environment.
	pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.vars = Some(
			vars.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		);
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> SettingsResult<IndexMap<String, Value>> {
		let vars = match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars().collect(),
		};

		let mut root = Map::new();
		for (key, value) in vars {
			let Some(path) = key.strip_prefix(&self.prefix) else {
				continue;
			};
			let segments: Vec<String> = path
				.split(ENV_SEPARATOR)
				.map(|s| s.to_lowercase())
				.collect();
			if segments.iter().any(String::is_empty) {
				return Err(SettingsError::invalid(&key, "empty key segment"));
			}
			insert_path(&mut root, &segments, parse_env_value(&value));
		}
		Ok(root.into_iter().collect())
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

fn insert_path(root: &mut Map<String, Value>, segments: &[String], value: Value) {
	let Some((last, parents)) = segments.split_last() else {
		return;
	};
	let mut current = root;
	for segment in parents {
		let entry = current
			.entry(segment.clone())
			.or_insert_with(|| Value::Object(Map::new()));
		if !entry.is_object() {
			*entry = Value::Object(Map::new());
		}
		let Value::Object(next) = entry else {
			return;
		};
		current = next;
	}
	current.insert(last.clone(), value);
}

/// Typed reading of an environment string
///
/// JSON literals (`[..]`, `{..}`) are taken as-is, comma-separated values
/// become arrays, then integers, floats and booleans are tried before
/// falling back to a string.
pub fn parse_env_value(raw: &str) -> Value {
	let trimmed = raw.trim();
	if (trimmed.starts_with('[') || trimmed.starts_with('{'))
		&& let Ok(value) = serde_json::from_str(trimmed)
	{
		return value;
	}
	if trimmed.contains(',') {
		return Value::Array(trimmed.split(',').map(parse_scalar).collect());
	}
	parse_scalar(trimmed)
}

fn parse_scalar(raw: &str) -> Value {
	let raw = raw.trim();
	if let Ok(n) = raw.parse::<i64>() {
		return Value::Number(n.into());
	}
	if let Ok(f) = raw.parse::<f64>()
		&& let Some(n) = serde_json::Number::from_f64(f)
	{
		return Value::Number(n);
	}
	match raw.to_lowercase().as_str() {
		"true" | "yes" | "on" => Value::Bool(true),
		"false" | "no" | "off" => Value::Bool(false),
		_ => Value::String(raw.to_string()),
	}
}

/// Merge `overlay` into `base`; objects merge per key, anything else replaces.
pub fn deep_merge(base: &mut Value, overlay: Value) {
	match (base, overlay) {
		(Value::Object(base), Value::Object(overlay)) => {
			for (key, value) in overlay {
				match base.get_mut(&key) {
					Some(existing) => deep_merge(existing, value),
					None => {
						base.insert(key, value);
					}
				}
			}
		}
		(base, overlay) => *base = overlay,
	}
}

/// Merge every source in ascending priority into one object.
pub fn merge_sources(sources: &[Box<dyn ConfigSource>]) -> SettingsResult<Value> {
	let mut ordered: Vec<&dyn ConfigSource> = sources.iter().map(|s| s.as_ref()).collect();
	ordered.sort_by_key(|source| source.priority());

	let mut merged = Value::Object(Map::new());
	for source in ordered {
		let values = source.load()?;
		tracing::debug!(
			source = %source.description(),
			keys = values.len(),
			"loaded settings source"
		);
		deep_merge(&mut merged, Value::Object(values.into_iter().collect()));
	}
	Ok(merged)
}
