//! Configuration loading and validation.
//!
//! The per-repository configuration lives at `<vcdir>/snag/config.json` and
//! is written once by `snag init`. It is read-only input for every other
//! command.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnagError};

/// Default annotation marker token
pub const DEFAULT_MARKER: &str = "TODO";

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn is_default_marker(marker: &str) -> bool {
    marker == DEFAULT_MARKER
}

/// Per-repository configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Author identity attached to discovered tasks
    pub author: String,

    /// Plugin to hand tasks to at push time
    #[serde(rename = "plugin_name")]
    pub plugin: String,

    /// Command line that runs the plugin scripts, e.g. "python3" or
    /// "osascript -l JavaScript"
    #[serde(rename = "plugin_interpreter")]
    pub interpreter: String,

    /// Annotation marker token the scanner looks for (case-sensitive)
    #[serde(default = "default_marker", skip_serializing_if = "is_default_marker")]
    pub marker: String,
}

impl Config {
    /// Load the configuration from `path`.
    ///
    /// A missing file is reported as `ConfigIncomplete` since it means
    /// `snag init` has not been run for this repository.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnagError::config_incomplete(format!(
                    "no configuration at {}",
                    path.display()
                )));
            }
            Err(err) => {
                return Err(SnagError::store_with_path(
                    format!("could not read configuration: {err}"),
                    path.to_path_buf(),
                ));
            }
        };

        let config: Config = serde_json::from_str(&raw).map_err(|err| {
            SnagError::store_with_path(
                format!("could not parse configuration: {err}"),
                path.to_path_buf(),
            )
        })?;

        Ok(config)
    }

    /// Write the configuration to `path` as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|err| {
            SnagError::store_with_path(
                format!("could not write configuration: {err}"),
                path.to_path_buf(),
            )
        })
    }

    /// Check that every required field is present and non-blank
    pub fn is_set(&self) -> bool {
        self.missing_field().is_none()
    }

    /// Name of the first required field that is blank, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.author.trim().is_empty() {
            Some("author")
        } else if self.plugin.trim().is_empty() {
            Some("plugin_name")
        } else if self.interpreter.trim().is_empty() {
            Some("plugin_interpreter")
        } else {
            None
        }
    }

    /// Fail with `ConfigIncomplete` if a required field is blank
    pub fn ensure_set(&self) -> Result<()> {
        match self.missing_field() {
            Some(field) => Err(SnagError::config_incomplete(field)),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Author: {}", self.author)?;
        writeln!(f, "Plugin: {}", self.plugin)?;
        writeln!(f, "Interpreter: {}", self.interpreter)?;
        write!(f, "Marker: {}", self.marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Config {
        Config {
            author: "dev@example.com".to_string(),
            plugin: "trello".to_string(),
            interpreter: "python3".to_string(),
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");

        let config = sample();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_is_config_incomplete() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(&temp.path().join("config.json")).unwrap_err();
        assert!(matches!(err, SnagError::ConfigIncomplete { .. }));
    }

    #[test]
    fn test_load_garbage_is_store_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "not json {{{").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, SnagError::Store { .. }));
    }

    #[test]
    fn test_marker_defaults_when_absent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"author": "a@b.c", "plugin_name": "todoist", "plugin_interpreter": "node"}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.marker, "TODO");
    }

    #[test]
    fn test_custom_marker_survives_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");

        let mut config = sample();
        config.marker = "FIXME".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.marker, "FIXME");
    }

    #[test]
    fn test_missing_field_order() {
        let mut config = sample();
        assert!(config.is_set());

        config.interpreter = "  ".to_string();
        assert_eq!(config.missing_field(), Some("plugin_interpreter"));

        config.plugin = String::new();
        assert_eq!(config.missing_field(), Some("plugin_name"));

        config.author = String::new();
        assert_eq!(config.missing_field(), Some("author"));
    }

    #[test]
    fn test_ensure_set_names_field() {
        let mut config = sample();
        config.plugin = String::new();

        let err = config.ensure_set().unwrap_err();
        assert!(err.to_string().contains("plugin_name"));
    }

    #[test]
    fn test_display_lists_fields() {
        let text = sample().to_string();
        assert!(text.contains("Author: dev@example.com"));
        assert!(text.contains("Plugin: trello"));
        assert!(text.contains("Interpreter: python3"));
    }
}
