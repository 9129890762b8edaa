//! Settings loaded from files on disk

use formgate_conf::{EnvSource, Settings, SettingsError, TomlFileSource};
use formgate_guard::{EventHub, GuardedSession, ManualClock, StartTrigger};
use rstest::*;
use std::fs;
use std::sync::Arc;

#[fixture]
fn config_dir() -> tempfile::TempDir {
	tempfile::tempdir().unwrap()
}

#[rstest]
fn test_missing_file_falls_back_to_defaults(config_dir: tempfile::TempDir) {
	// Arrange
	let path = config_dir.path().join("absent.toml");

	// Act
	let settings = Settings::builder()
		.add_source(TomlFileSource::new(path))
		.build()
		.unwrap();

	// Assert
	assert_eq!(settings, Settings::default());
}

#[rstest]
fn test_malformed_file_is_reported(config_dir: tempfile::TempDir) {
	// Arrange
	let path = config_dir.path().join("formgate.toml");
	fs::write(&path, "[guard\ntick_interval_ms = ").unwrap();

	// Act
	let result = Settings::builder().add_source(TomlFileSource::new(path)).build();

	// Assert
	assert!(matches!(result, Err(SettingsError::Toml(_))));
}

#[rstest]
fn test_file_settings_drive_a_guarded_session(config_dir: tempfile::TempDir) {
	// Arrange
	let path = config_dir.path().join("formgate.toml");
	fs::write(
		&path,
		"[guard]\ndefault_time_limit_secs = 90\nstart_trigger = \"manual\"\nblock_clipboard = false\n",
	)
	.unwrap();
	let settings = Settings::builder()
		.add_source(TomlFileSource::new(&path))
		.add_source(EnvSource::new().with_vars([("FORMGATE_GUARD__URGENT_FLOOR_SECS", "3")]))
		.build()
		.unwrap();
	let hub = Arc::new(EventHub::new());

	// Act
	let options = settings.guard.session_options(None);
	let session =
		GuardedSession::mount(options, Arc::new(ManualClock::default()), hub.clone()).unwrap();

	// Assert
	let snapshot = session.snapshot();
	assert_eq!(snapshot.max_time, 90);
	assert_eq!(snapshot.start_trigger, StartTrigger::Manual);
	assert_eq!(hub.listener_count(), 0);
	assert_eq!(settings.guard.urgent_floor_secs, 3);
}
