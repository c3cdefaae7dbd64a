use std::path::PathBuf;

use thiserror::Error;

use crate::template::TemplateError;

/// Fatal, load-time configuration errors.
///
/// Any of these aborts construction of a snapshot; nothing is ever
/// published from a configuration that produced one.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Two items of the same kind share a key within one collection.
    #[error("duplicate {kind} id '{key}'")]
    DuplicateKey { kind: &'static str, key: String },

    /// A device references a directive id that is not in the catalog.
    #[error("directive '{id}' is not defined")]
    UnknownDirective { id: String },

    /// A required string field was empty.
    #[error("{kind} field '{field}' must not be empty")]
    EmptyField { kind: &'static str, field: &'static str },

    /// An IP rule condition that is not a valid network.
    #[error("directive '{directive}': invalid network condition '{condition}': {reason}")]
    InvalidCondition {
        directive: String,
        condition: String,
        reason: String,
    },

    /// `ge`/`le` outside the family range or `ge > le`.
    #[error(
        "directive '{directive}': invalid prefix-length bounds ge={ge} le={le} for \
         '{condition}' (must satisfy 0 <= ge <= le <= {max})"
    )]
    InvalidPrefixBounds {
        directive: String,
        condition: String,
        ge: u8,
        le: u8,
        max: u8,
    },

    /// A pattern condition or field validation that is not a valid regex.
    #[error("directive '{directive}': invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        directive: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A command template that cannot be parsed.
    #[error("directive '{directive}': {source}")]
    InvalidTemplate {
        directive: String,
        #[source]
        source: TemplateError,
    },

    /// The help file configured in `info` does not exist.
    #[error("directive '{directive}': help file '{}' does not exist", path.display())]
    MissingHelpFile { directive: String, path: PathBuf },
}
