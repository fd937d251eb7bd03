//! Wrapper configuration: JSON file, environment overrides, rule loading.
//!
//! Configuration errors are never fatal. A missing or unreadable config
//! file means running with zero rules; a malformed or no-effect rule is
//! skipped with a diagnostic naming the reason while the remaining rules
//! load. The calling application must start either way.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diag::TraceLog;
use crate::engine::RuleSet;
use crate::error::{ConfigError, RuleError};
use crate::rule::{Rule, RuleSpec};

/// Environment variable naming the config file to load.
pub const CONFIG_FILE_ENV: &str = "MIDI_REPLACE_CONFIGFILE";

/// Environment variable overriding the configured log-file path.
pub const LOG_FILE_ENV: &str = "MIDI_REPLACE_LOGFILE";

/// Config file name tried when the environment names none.
pub const DEFAULT_CONFIG_FILE: &str = "midi_rename_config.json";

/// On-disk shape of the config file.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    log: Option<PathBuf>,
    popup: Option<bool>,
    popup_verbose: Option<bool>,
    #[serde(default)]
    rules: Vec<serde_json::Value>,
}

/// Loaded wrapper configuration.
#[derive(Debug)]
pub struct Config {
    /// Trace-file destination, if configured.
    pub log_file: Option<PathBuf>,
    /// Whether the host should present the startup notification.
    pub popup: bool,
    /// Whether the notification should include detailed startup logging.
    pub popup_verbose: bool,
    /// Where the configuration was loaded from, when a file was found.
    pub source: Option<PathBuf>,
    /// Validated, ordered rule list.
    pub rules: RuleSet,
    /// Number of configured rules rejected during loading.
    pub rejected_rules: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: None,
            popup: true,
            popup_verbose: false,
            source: None,
            rules: RuleSet::default(),
            rejected_rules: 0,
        }
    }
}

impl Config {
    /// Loads and validates the config file at `path`.
    ///
    /// Rules are decoded independently: each invalid rule is skipped with
    /// a diagnostic and counted in `rejected_rules`, and loading
    /// continues. After loading N configured rules of which K are
    /// invalid, the active rule count is N−K.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`] when the file
    /// itself cannot be used; callers treat this as "no rules", not as a
    /// startup failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            path = %path.display(),
            configured = file.rules.len(),
            "loaded config"
        );

        let mut rules = Vec::new();
        let mut rejected = 0;
        for (index, value) in file.rules.into_iter().enumerate() {
            match decode_rule(value) {
                Ok(rule) => rules.push(rule),
                Err(error) => {
                    rejected += 1;
                    tracing::warn!(index, %error, "skipping rule");
                }
            }
        }

        Ok(Self {
            log_file: file.log,
            popup: file.popup.unwrap_or(true),
            popup_verbose: file.popup_verbose.unwrap_or(false),
            source: Some(path.to_path_buf()),
            rules: RuleSet::new(rules),
            rejected_rules: rejected,
        })
    }

    /// Resolves the configuration from the process environment.
    ///
    /// The config path comes from [`CONFIG_FILE_ENV`], falling back to
    /// [`DEFAULT_CONFIG_FILE`] in the working directory. A file that
    /// cannot be loaded is logged and replaced by an empty configuration.
    /// [`LOG_FILE_ENV`], when set, overrides the configured log path.
    pub fn from_env() -> Self {
        let path = env::var_os(CONFIG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = match Self::load(&path) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(%error, "continuing without replace rules");
                Self::default()
            }
        };
        if let Some(value) = env::var_os(LOG_FILE_ENV) {
            let override_path = PathBuf::from(value);
            tracing::info!(
                before = ?config.log_file,
                after = %override_path.display(),
                "log file overridden by environment"
            );
            config.log_file = Some(override_path);
        }
        config
    }

    /// Opens the configured trace sink, or a disabled sink when no log
    /// file is set.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the log file cannot be created.
    pub fn open_trace(&self) -> io::Result<TraceLog> {
        match &self.log_file {
            Some(path) => TraceLog::to_file(path),
            None => Ok(TraceLog::disabled()),
        }
    }

    /// Human-readable startup report for the host's notification dialog.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        match &self.source {
            Some(path) => lines.push(format!("Config loaded from: {}", path.display())),
            None => lines.push("Config not found, running without replace rules.".to_string()),
        }
        match &self.log_file {
            Some(path) => lines.push(format!("Logging to: {}", path.display())),
            None => lines.push("No log file specified.".to_string()),
        }
        lines.push(format!(
            "Rules loaded: {} ({} rejected)",
            self.rules.len(),
            self.rejected_rules
        ));
        lines.join("\n")
    }
}

fn decode_rule(value: serde_json::Value) -> Result<Rule, RuleError> {
    let spec: RuleSpec = serde_json::from_value(value)?;
    spec.compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_full_config() {
        let (_dir, path) = write_config(
            r#"{
                "log": "wrapper.log",
                "popup": false,
                "rules": [
                    {"match_name": "USB.*", "replace_name": "Virtual"},
                    {"replace_interface_name": "\\\\?\\virtual#midi"}
                ]
            }"#,
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.log_file.as_deref(), Some(Path::new("wrapper.log")));
        assert!(!config.popup);
        assert!(!config.popup_verbose);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rejected_rules, 0);
    }

    #[test]
    fn test_invalid_rules_are_skipped_not_fatal() {
        let (_dir, path) = write_config(
            r#"{
                "rules": [
                    {"replace_name": "Kept"},
                    {"match_name": "no replace keys at all"},
                    {"match_name": "[unclosed", "replace_name": "x"},
                    {"match_direction": "sideways", "replace_name": "x"}
                ]
            }"#,
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rejected_rules, 3);
    }

    #[test]
    fn test_missing_file_is_an_error_for_load() {
        let err = Config::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let (_dir, path) = write_config("{not json");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_defaults() {
        let (_dir, path) = write_config("{}");
        let config = Config::load(&path).unwrap();
        assert!(config.popup);
        assert!(!config.popup_verbose);
        assert!(config.log_file.is_none());
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_summary_names_the_essentials() {
        let (_dir, path) = write_config(r#"{"rules": [{"replace_name": "x"}, {}]}"#);
        let config = Config::load(&path).unwrap();
        let summary = config.summary();
        assert!(summary.contains("config.json"));
        assert!(summary.contains("Rules loaded: 1 (1 rejected)"));
        assert!(summary.contains("No log file specified."));
    }

    #[test]
    fn test_from_env_reads_path_and_log_override() {
        // No other test touches these variables, so the process-global
        // mutation is safe under the parallel test runner.
        let (_dir, path) = write_config(r#"{"log": "from_file.log", "rules": [{"replace_name": "x"}]}"#);
        env::set_var(CONFIG_FILE_ENV, &path);
        env::set_var(LOG_FILE_ENV, "overridden.log");

        let config = Config::from_env();
        assert_eq!(config.rules.len(), 1);
        assert_eq!(
            config.log_file.as_deref(),
            Some(Path::new("overridden.log"))
        );

        env::remove_var(LOG_FILE_ENV);
        let config = Config::from_env();
        assert_eq!(config.log_file.as_deref(), Some(Path::new("from_file.log")));

        env::remove_var(CONFIG_FILE_ENV);
    }

    #[test]
    fn test_open_trace_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("out.log");
        let config = Config {
            log_file: Some(log_path.clone()),
            ..Config::default()
        };
        let trace = config.open_trace().unwrap();
        assert!(trace.has_file());
        assert!(log_path.exists());

        let disabled = Config::default().open_trace().unwrap();
        assert!(!disabled.has_file());
    }
}
