//! Configuration error taxonomy.

use cf_core::CfError;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading user-editable configuration.
///
/// Every variant names the offending block path and key or tag so the user
/// can find it in the case file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required key '{key}' in {dict}")]
    MissingKey { dict: String, key: String },

    #[error("Invalid value for '{key}' in {dict}: {reason}")]
    BadValue {
        dict: String,
        key: String,
        reason: String,
    },

    #[error("Entry '{key}' in {dict} is not a dictionary")]
    NotADict { dict: String, key: String },

    #[error("Unknown {family} type '{tag}'; known types: [{}]", known.join(", "))]
    UnknownType {
        family: String,
        tag: String,
        known: Vec<String>,
    },

    #[error("Phase '{phase}' is not part of interface {interface}")]
    PhaseNotInInterface { phase: String, interface: String },

    #[error("YAML error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl From<ConfigError> for CfError {
    fn from(e: ConfigError) -> Self {
        CfError::Invariant {
            what: e.to_string(),
        }
    }
}
