//! Configuration file support
//!
//! Loads settings from ~/.fortfold.toml (or %USERPROFILE%\.fortfold.toml on Windows)
//!
//! Example:
//! ```text
//! # fortfold configuration
//! format = "fixed"
//!
//! [fold]
//! comment = true
//! compact = false
//!
//! [keywords]
//! primary = ["cuda", "device"]
//! extended = "mpi_init mpi_finalize"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::{debug, warn};

use crate::error::{FortfoldError, Result};
use crate::syntax::{Accessor, KeywordSets, SourceFormat, WordList};

/// Configuration settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Fold runs of aligned comment lines
    pub fold_comment: bool,
    /// Mark blank lines white
    pub fold_compact: bool,
    /// Layout to use regardless of file extension
    pub format: Option<SourceFormat>,
    /// Extra statement keywords
    pub primary: Vec<String>,
    /// Extra intrinsic procedure names
    pub intrinsic: Vec<String>,
    /// User keywords (styled `Word3`)
    pub extended: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fold_comment: true,
            fold_compact: true,
            format: None,
            primary: Vec::new(),
            intrinsic: Vec::new(),
            extended: Vec::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".fortfold.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".fortfold.toml"))
        }
    }

    /// Load configuration from the default location. A missing file gives
    /// the defaults; a malformed one is an error.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let table: Table = contents.parse()?;
        let mut config = Config::default();
        config.apply(&table)?;
        Ok(config)
    }

    /// Apply settings from a parsed table
    fn apply(&mut self, table: &Table) -> Result<()> {
        for (key, value) in table {
            match (key.as_str(), value) {
                ("format", Value::String(name)) => self.format = Some(name.parse()?),
                ("fold", Value::Table(fold)) => {
                    for (key, value) in fold {
                        match key.as_str() {
                            "comment" => self.fold_comment = setting_bool("fold.comment", value)?,
                            "compact" => self.fold_compact = setting_bool("fold.compact", value)?,
                            _ => warn!(key = %key, "unknown fold setting"),
                        }
                    }
                }
                ("keywords", Value::Table(lists)) => {
                    for (key, value) in lists {
                        let words = setting_words(key, value)?;
                        match key.as_str() {
                            "primary" => self.primary = words,
                            "intrinsic" => self.intrinsic = words,
                            "extended" => self.extended = words,
                            _ => warn!(key = %key, "unknown keyword list"),
                        }
                    }
                }
                ("format" | "fold" | "keywords", other) => {
                    return Err(invalid(key, other));
                }
                _ => warn!(key = %key, "unknown setting"),
            }
        }
        Ok(())
    }

    /// Write the fold properties into a document
    pub fn apply_to<A: Accessor + ?Sized>(&self, doc: &mut A) {
        doc.set_property("fold.comment", i32::from(self.fold_comment));
        doc.set_property("fold.compact", i32::from(self.fold_compact));
    }

    /// Built-in keyword lists extended with the configured words
    pub fn keyword_sets(&self) -> KeywordSets {
        let mut words = KeywordSets::fortran();
        words.primary.extend(&self.primary);
        words.intrinsic.extend(&self.intrinsic);
        words.extended = WordList::from_words(&self.extended);
        words
    }
}

fn invalid(key: &str, value: &Value) -> FortfoldError {
    FortfoldError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn setting_bool(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Integer(n) => Ok(*n != 0),
        Value::String(s) => parse_bool(s).ok_or_else(|| invalid(key, value)),
        _ => Err(invalid(key, value)),
    }
}

/// A list of words, either as an array of strings or one
/// whitespace-separated string
fn setting_words(key: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(s.split_whitespace().map(str::to_string).collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(invalid(key, item)),
            })
            .collect(),
        _ => Err(invalid(key, value)),
    }
}

/// Parse a boolean value from string
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
