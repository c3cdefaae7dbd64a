use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::collection::Keyed;
use crate::error::ConfigError;
use crate::rule::Rule;
use crate::schema::{Field, RawDirective, SelectOption};
use crate::template;

/// A named, rule-guarded bundle of command templates.
///
/// Immutable once compiled; evaluation never mutates a directive, so one
/// instance can be shared by every device and every request.
#[derive(Debug)]
pub struct Directive {
    id: String,
    name: String,
    rules: Vec<Rule>,
    field: Option<Field>,
    info: Option<HelpFile>,
    plugins: Vec<PathBuf>,
    groups: Vec<String>,
    table_output: bool,
    builtin: bool,
    platforms: Vec<String>,
}

/// Help content, read from disk on first use and cached.
#[derive(Debug)]
struct HelpFile {
    path: PathBuf,
    content: OnceLock<Option<String>>,
}

impl HelpFile {
    fn content(&self) -> Option<&str> {
        self.content
            .get_or_init(|| match std::fs::read_to_string(&self.path) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "failed to read help file");
                    None
                }
            })
            .as_deref()
    }
}

impl Keyed for Directive {
    const KIND: &'static str = "directive";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Directive {
    /// Validate a raw directive record.
    ///
    /// `base_dir` anchors a relative `info` path; `plugin_dir` is where
    /// plugin names are looked up.
    pub fn compile(
        raw: RawDirective,
        base_dir: Option<&Path>,
        plugin_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        if raw.id.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                kind: "directive",
                field: "id",
            });
        }
        if raw.name.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                kind: "directive",
                field: "name",
            });
        }

        let id = raw.id;
        let rules = raw
            .rules
            .into_iter()
            .map(|r| Rule::compile(&id, r))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(Field::Text {
            validation: Some(pattern),
            ..
        }) = &raw.field
        {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                directive: id.clone(),
                pattern: pattern.clone(),
                source,
            })?;
        }

        let info = match raw.info {
            Some(path) => {
                let path = match base_dir {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path,
                };
                if !path.is_file() {
                    return Err(ConfigError::MissingHelpFile {
                        directive: id,
                        path,
                    });
                }
                Some(HelpFile {
                    path,
                    content: OnceLock::new(),
                })
            }
            None => None,
        };

        let plugins = resolve_plugins(&id, &raw.plugins, plugin_dir);

        if raw.builtin && raw.platforms.is_empty() {
            warn!(directive = %id, "builtin directive lists no platforms and applies nowhere");
        }

        Ok(Self {
            id,
            name: raw.name,
            rules,
            field: raw.field,
            info,
            plugins,
            groups: raw.groups,
            table_output: raw.table_output,
            builtin: raw.builtin,
            platforms: raw.platforms,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn field(&self) -> Option<&Field> {
        self.field.as_ref()
    }

    /// `"text"`, `"select"`, or `None` when the directive takes no input.
    pub fn field_type(&self) -> Option<&'static str> {
        self.field.as_ref().map(Field::field_type)
    }

    pub fn plugins(&self) -> &[PathBuf] {
        &self.plugins
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn table_output(&self) -> bool {
        self.table_output
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// Whether this builtin applies to `platform`.
    pub fn supports_platform(&self, platform: &str) -> bool {
        self.platforms.iter().any(|p| p == platform)
    }

    /// Help text, loaded lazily.
    pub fn help(&self) -> Option<&str> {
        self.info.as_ref().and_then(HelpFile::content)
    }

    /// Every command template across all rules.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .flat_map(|r| r.commands().iter().map(String::as_str))
    }

    /// Distinct placeholder names used by this directive's commands,
    /// excluding the reserved `target`.
    pub fn attribute_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for command in self.commands() {
            // Templates were validated by `Rule::compile`.
            for key in template::placeholders(command).unwrap_or_default() {
                if key != template::TARGET && !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// UI-facing description; no rule internals or command templates.
    pub fn export(&self) -> DirectiveExport {
        let options = match &self.field {
            Some(Field::Select { options, .. }) => Some(options.clone()),
            _ => None,
        };
        DirectiveExport {
            id: self.id.clone(),
            name: self.name.clone(),
            field_type: self.field_type(),
            groups: self.groups.clone(),
            description: self.field.as_ref().map(|f| f.description().to_string()),
            info: self.help().map(|content| HelpExport {
                enable: true,
                content: content.to_string(),
            }),
            options,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DirectiveExport {
    pub id: String,
    pub name: String,
    pub field_type: Option<&'static str>,
    pub groups: Vec<String>,
    pub description: Option<String>,
    pub info: Option<HelpExport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HelpExport {
    pub enable: bool,
    pub content: String,
}

/// Match configured plugin names against files in `plugin_dir` by file
/// stem, so `community.py` and `community` both find `community.py`.
///
/// A missing directory or file simply attaches nothing.
fn resolve_plugins(directive: &str, names: &[String], plugin_dir: Option<&Path>) -> Vec<PathBuf> {
    if names.is_empty() {
        return Vec::new();
    }
    let Some(dir) = plugin_dir else {
        debug!(directive, "no plugin directory configured; ignoring plugins");
        return Vec::new();
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(directive, dir = %dir.display(), error = %e, "plugin directory unreadable");
            return Vec::new();
        }
    };

    let wanted: Vec<&str> = names.iter().map(|n| stem(n)).collect();
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| wanted.contains(&stem(n)))
        })
        .collect();
    found.sort();

    if found.len() < names.len() {
        debug!(directive, configured = names.len(), found = found.len(), "some plugins not found");
    }
    found
}

fn stem(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}
