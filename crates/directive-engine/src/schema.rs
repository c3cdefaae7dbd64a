use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level layout of a directives YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectiveFile {
    #[serde(default)]
    pub directives: Vec<RawDirective>,
}

/// A directive record as written by the operator, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDirective {
    /// Unique identifier within the catalog.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Ordered rules; the first decisive rule wins.
    #[serde(default)]
    pub rules: Vec<RawRule>,
    /// UI input field descriptor.
    #[serde(default)]
    pub field: Option<Field>,
    /// Path to a markdown help file, relative to the directives file.
    #[serde(default)]
    pub info: Option<PathBuf>,
    /// Plugin file names (extension optional).
    #[serde(default)]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Whether the directive produces structured (table) output.
    #[serde(default)]
    pub table_output: bool,
    /// Shipped by the system rather than authored per device.
    #[serde(default)]
    pub builtin: bool,
    /// Platforms a builtin directive applies to.
    #[serde(default)]
    pub platforms: Vec<String>,
}

/// A single rule record.
///
/// The rule variant is chosen from `condition`: absent means no validation,
/// an IPv4 or IPv6 network selects an IP rule, anything else is a pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub action: Action,
    #[serde(default, alias = "commands")]
    pub command: Commands,
    /// Minimum accepted prefix length (IP rules only).
    #[serde(default)]
    pub ge: Option<u8>,
    /// Maximum accepted prefix length (IP rules only).
    #[serde(default)]
    pub le: Option<u8>,
}

/// One command template or a list of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Commands {
    One(String),
    Many(Vec<String>),
}

impl Default for Commands {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl Commands {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(command) => vec![command],
            Self::Many(commands) => commands,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Permit,
    Deny,
}

/// The input field a UI renders for a directive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Field {
    /// Free-form text, optionally constrained client-side by a regex.
    Text {
        description: String,
        #[serde(default)]
        validation: Option<String>,
    },
    /// A fixed list of choices.
    Select {
        description: String,
        #[serde(default)]
        options: Vec<SelectOption>,
    },
}

impl Field {
    pub fn field_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Select { .. } => "select",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Text { description, .. } | Self::Select { description, .. } => description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: String,
}
