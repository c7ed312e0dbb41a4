use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conflict::ConflictPolicy;
use crate::domain::EventDefaults;
use crate::error::ConfigError;
use crate::index::Calendar;
use crate::sample::default_calendars;

pub const CONFIG_ENV: &str = "GRIDCAL_CONFIG";
pub const EVENTS_ENV: &str = "GRIDCAL_EVENTS";
pub const STATE_DIR_ENV: &str = "GRIDCAL_STATE_DIR";
const APP_DIR: &str = "gridcal";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub events_path: Option<PathBuf>,
	pub log_level: Option<String>,
	pub conflicts: ConflictPolicy,
	pub defaults: EventDefaults,
	pub calendars: Vec<Calendar>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			events_path: None,
			log_level: None,
			conflicts: ConflictPolicy::default(),
			defaults: EventDefaults::default(),
			calendars: default_calendars(),
		}
	}
}

impl Config {
	/// Reads the TOML file at `path`. A missing file yields the defaults.
	///
	/// A relative `events_path` is resolved against the config file's directory.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let raw = match fs::read_to_string(path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => {
				debug!(path = %path.display(), "config file not found, using defaults");
				return Ok(Self::default());
			}
			Err(err) => return Err(ConfigError::Io(err)),
		};

		let mut config = Self::from_toml(&raw)?;
		if let (Some(events_path), Some(parent)) = (&config.events_path, path.parent()) {
			if events_path.is_relative() {
				config.events_path = Some(parent.join(events_path));
			}
		}
		Ok(config)
	}

	pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.defaults.category.trim().is_empty() {
			return Err(ConfigError::Invalid("defaults.category must not be empty".to_string()));
		}

		let mut seen = HashSet::new();
		for calendar in &self.calendars {
			if calendar.id.trim().is_empty() {
				return Err(ConfigError::Invalid("calendar id must not be empty".to_string()));
			}
			if !seen.insert(calendar.id.as_str()) {
				return Err(ConfigError::Invalid(format!(
					"duplicate calendar id: {}",
					calendar.id
				)));
			}
		}

		Ok(())
	}
}

/// `--config`, then `GRIDCAL_CONFIG`, then the XDG or home config directory.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
	resolve_config_path_with(cli_path, |key| env::var_os(key))
}

pub fn resolve_config_path_with(
	cli_path: Option<PathBuf>,
	var: impl Fn(&str) -> Option<OsString>,
) -> Option<PathBuf> {
	if let Some(path) = cli_path {
		return Some(absolutize(path));
	}

	if let Some(path) = non_empty_var(&var, CONFIG_ENV) {
		return Some(absolutize(path));
	}

	if let Some(path) = non_empty_var(&var, "XDG_CONFIG_HOME") {
		return Some(path.join(APP_DIR).join(CONFIG_FILE));
	}

	non_empty_var(&var, "HOME").map(|home| home.join(".config").join(APP_DIR).join(CONFIG_FILE))
}

/// `--events`, then `GRIDCAL_EVENTS`, then `events_path` from the config.
/// `None` means the built-in samples.
pub fn resolve_events_path(cli_path: Option<PathBuf>, config: &Config) -> Option<PathBuf> {
	resolve_events_path_with(cli_path, config, |key| env::var_os(key))
}

pub fn resolve_events_path_with(
	cli_path: Option<PathBuf>,
	config: &Config,
	var: impl Fn(&str) -> Option<OsString>,
) -> Option<PathBuf> {
	if let Some(path) = cli_path {
		return Some(absolutize(path));
	}

	if let Some(path) = non_empty_var(&var, EVENTS_ENV) {
		return Some(absolutize(path));
	}

	config.events_path.clone()
}

pub fn state_dir() -> PathBuf {
	state_dir_with(|key| env::var_os(key))
}

pub fn state_dir_with(var: impl Fn(&str) -> Option<OsString>) -> PathBuf {
	if let Some(path) = non_empty_var(&var, STATE_DIR_ENV) {
		return path;
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = non_empty_var(&var, "LOCALAPPDATA") {
			return path.join(APP_DIR);
		}
	}

	if let Some(path) = non_empty_var(&var, "XDG_STATE_HOME") {
		return path.join(APP_DIR);
	}

	if let Some(path) = non_empty_var(&var, "HOME") {
		return path.join(".local").join("state").join(APP_DIR);
	}

	PathBuf::from(".gridcal")
}

fn non_empty_var(var: &impl Fn(&str) -> Option<OsString>, key: &str) -> Option<PathBuf> {
	var(key)
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::ffi::OsString;
	use std::fs;
	use std::path::PathBuf;

	use tempfile::tempdir;

	use super::{
		Config, resolve_config_path_with, resolve_events_path_with, state_dir_with,
	};
	use crate::domain::{EventColor, Priority};
	use crate::error::ConfigError;

	fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
		let map = pairs
			.iter()
			.map(|(key, value)| (key.to_string(), OsString::from(value)))
			.collect::<HashMap<_, _>>();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn parses_full_config() {
		let config = Config::from_toml(
			r#"
log_level = "debug"
events_path = "/srv/events.json"

[conflicts]
default_duration_minutes = 45

[defaults]
color = "green"
category = "work"
priority = "high"

[[calendars]]
id = "work"
name = "Work"
color = "red"

[[calendars]]
id = "holidays"
name = "Holidays"
color = "orange"
enabled = false
"#,
		)
		.expect("config should parse");

		assert_eq!(config.log_level.as_deref(), Some("debug"));
		assert_eq!(config.events_path, Some(PathBuf::from("/srv/events.json")));
		assert_eq!(config.conflicts.default_duration_minutes, 45);
		assert_eq!(config.defaults.color, EventColor::Green);
		assert_eq!(config.defaults.priority, Priority::High);
		assert_eq!(config.calendars.len(), 2);
		assert!(config.calendars[0].enabled);
		assert!(!config.calendars[1].enabled);
	}

	#[test]
	fn empty_config_uses_defaults() {
		let config = Config::from_toml("").unwrap();
		assert_eq!(config, Config::default());
		assert_eq!(config.conflicts.default_duration_minutes, 60);
		assert_eq!(config.calendars.len(), 5);
	}

	#[test]
	fn rejects_duplicate_calendars() {
		let err = Config::from_toml(
			r#"
[[calendars]]
id = "work"
name = "Work"
color = "red"

[[calendars]]
id = "work"
name = "Also work"
color = "blue"
"#,
		)
		.unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)));
	}

	#[test]
	fn load_resolves_relative_events_path() {
		let dir = tempdir().expect("temp dir");
		let path = dir.path().join("config.toml");
		fs::write(&path, "events_path = \"events.json\"\n").unwrap();

		let config = Config::load(&path).unwrap();
		assert_eq!(config.events_path, Some(dir.path().join("events.json")));

		let missing = Config::load(&dir.path().join("missing.toml")).unwrap();
		assert_eq!(missing, Config::default());
	}

	#[test]
	fn config_path_precedence() {
		let cli = resolve_config_path_with(
			Some(PathBuf::from("/etc/gridcal.toml")),
			vars(&[("GRIDCAL_CONFIG", "/tmp/env.toml")]),
		);
		assert_eq!(cli, Some(PathBuf::from("/etc/gridcal.toml")));

		let env = resolve_config_path_with(None, vars(&[("GRIDCAL_CONFIG", "/tmp/env.toml"), ("HOME", "/home/a")]));
		assert_eq!(env, Some(PathBuf::from("/tmp/env.toml")));

		let xdg = resolve_config_path_with(None, vars(&[("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/a")]));
		assert_eq!(xdg, Some(PathBuf::from("/xdg/gridcal/config.toml")));

		let home = resolve_config_path_with(None, vars(&[("GRIDCAL_CONFIG", ""), ("HOME", "/home/a")]));
		assert_eq!(home, Some(PathBuf::from("/home/a/.config/gridcal/config.toml")));

		assert_eq!(resolve_config_path_with(None, vars(&[])), None);
	}

	#[test]
	fn events_path_precedence() {
		let config = Config {
			events_path: Some(PathBuf::from("/data/events.json")),
			..Config::default()
		};
		assert_eq!(
			resolve_events_path_with(None, &config, vars(&[("GRIDCAL_EVENTS", "/env/events.json")])),
			Some(PathBuf::from("/env/events.json"))
		);
		assert_eq!(
			resolve_events_path_with(None, &config, vars(&[])),
			Some(PathBuf::from("/data/events.json"))
		);
		assert_eq!(resolve_events_path_with(None, &Config::default(), vars(&[])), None);
	}

	#[test]
	fn state_dir_precedence() {
		assert_eq!(
			state_dir_with(vars(&[("GRIDCAL_STATE_DIR", "/state"), ("HOME", "/home/a")])),
			PathBuf::from("/state")
		);
		assert_eq!(
			state_dir_with(vars(&[("XDG_STATE_HOME", "/xdg-state")])),
			PathBuf::from("/xdg-state/gridcal")
		);
		assert_eq!(
			state_dir_with(vars(&[("HOME", "/home/a")])),
			PathBuf::from("/home/a/.local/state/gridcal")
		);
	}
}
