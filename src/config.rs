//! Log set configuration.
//!
//! The configuration is a JSON document mapping a log set name to its member targets:
//!
//! ```json
//! {
//!   "checkout": {
//!     "log_groups": [
//!       { "name": "/aws/lambda/checkout-api", "alias": "api" },
//!       { "name": "/aws/lambda/checkout-worker", "alias": "worker" }
//!     ]
//!   }
//! }
//! ```
//!
//! Implicit configuration files are optional; an explicitly named one must exist.

use crate::error::{CwtailError, Result};
use crate::event::{LogSet, LogTarget};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// File name looked up beside the executable
pub const CONFIG_FILE_NAME: &str = ".cwtail_config.json";

#[derive(Debug, Deserialize)]
struct RawLogSet {
    log_groups: Vec<LogTarget>,
}

/// All log sets known to this run. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct Config {
    log_sets: BTreeMap<String, LogSet>,
    source: Option<PathBuf>,
}

impl Config {
    /// Parse and validate a configuration document
    pub fn from_json(json: &str, path: &Path) -> Result<Self> {
        let raw: BTreeMap<String, RawLogSet> =
            serde_json::from_str(json).map_err(|source| CwtailError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut log_sets = BTreeMap::new();
        for (name, raw_set) in raw {
            let mut seen = HashSet::new();
            for target in &raw_set.log_groups {
                if !seen.insert(target.name.as_str()) {
                    return Err(CwtailError::invalid_config(format!(
                        "log set '{}' lists '{}' more than once",
                        name, target.name
                    )));
                }
            }
            let set = LogSet {
                name: name.clone(),
                targets: raw_set.log_groups,
            };
            log_sets.insert(name, set);
        }

        Ok(Self {
            log_sets,
            source: Some(path.to_path_buf()),
        })
    }

    /// Load from a path that must exist
    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading log set configuration from {}", path.display());
        let json = std::fs::read_to_string(path).map_err(|source| CwtailError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json, path)
    }

    /// Load the first existing file among `candidates`; none existing means no log sets.
    pub fn load_first_existing(candidates: &[PathBuf]) -> Result<Self> {
        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Self::load(path),
            None => {
                log::debug!("No configuration file found, no log sets defined");
                Ok(Self::default())
            }
        }
    }

    /// Load `explicit` when given, otherwise search the default locations
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::load_first_existing(&default_locations()),
        }
    }

    /// Look up a log set by name
    pub fn log_set(&self, name: &str) -> Option<&LogSet> {
        self.log_sets.get(name)
    }

    /// Names of all configured log sets, sorted
    pub fn log_set_names(&self) -> impl Iterator<Item = &str> {
        self.log_sets.keys().map(String::as_str)
    }

    /// File this configuration was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Implicit configuration locations, in lookup order.
pub fn default_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.canonicalize().ok())
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        locations.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("cwtail").join("config.json"));
    }
    locations
}
