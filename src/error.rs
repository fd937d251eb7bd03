//! Error types for midi-rename.
//!
//! Configuration-time errors ([`ConfigError`], [`RuleError`]) are absorbed
//! during loading: the offending rule or file is skipped with a diagnostic
//! and the process continues. Nothing here ever reaches the calling
//! application, which only sees the native result codes it already
//! expects from the multimedia API.

use std::io;
use std::path::PathBuf;

/// Reasons a configured rule is rejected at load time.
///
/// A rejected rule is skipped with a diagnostic; loading continues with
/// the remaining rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The rule specifies no replacement value and no interface-name
    /// override, so it could never affect anything.
    #[error("rule has no replace values and no interface name override, would not affect anything")]
    NoEffect,

    /// The `match_name` pattern is not a valid regular expression.
    #[error("invalid name pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern as configured.
        pattern: String,
        /// The underlying regex compile error.
        #[source]
        source: regex::Error,
    },

    /// The rule record itself could not be decoded.
    #[error("malformed rule: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors from loading the wrapper configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("unable to read config {path}: {source}")]
    Read {
        /// Path that was tried.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The config file is not valid JSON.
    #[error("unable to parse config {path}: {source}")]
    Parse {
        /// Path that was read.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Violations of the normalizer's write-back contract.
///
/// These indicate a defect in the caller, not a runtime condition: records
/// handed to `write_back` are always normalized from a fully-populated
/// native query. On violation the native buffer is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    /// An output shape was written back from a record that carries no
    /// output capability block.
    #[error("output capability fields missing when writing back an output shape")]
    MissingOutputCaps,
}
