use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::builtins;
use crate::collection::Collection;
use crate::directive::Directive;
use crate::error::ConfigError;
use crate::schema::{DirectiveFile, RawDirective};

/// Settings that influence how raw directive records are validated.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Directory relative `info` paths are resolved against. Defaults to
    /// the directives file's directory when loading from disk.
    pub base_dir: Option<PathBuf>,
    /// Where plugin names are looked up.
    pub plugin_dir: Option<PathBuf>,
    /// Append the shipped builtin directives to the catalog.
    pub include_builtins: bool,
}

/// Load the directive catalog from a YAML file on disk.
pub fn load_directives(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Collection<Directive>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read directives file: {}", path.display()))?;

    let mut options = options.clone();
    if options.base_dir.is_none() {
        options.base_dir = path.parent().map(Path::to_path_buf);
    }

    load_directives_from_str(&contents, &options)
        .with_context(|| format!("failed to load directives file: {}", path.display()))
}

/// Parse and validate a directive catalog from a YAML string.
pub fn load_directives_from_str(yaml: &str, options: &LoadOptions) -> Result<Collection<Directive>> {
    let file: DirectiveFile = if yaml.trim().is_empty() {
        DirectiveFile::default()
    } else {
        serde_yml::from_str(yaml).context("YAML deserialization failed")?
    };
    Ok(build_catalog(file.directives, options)?)
}

/// Validate raw records (plus the builtins, when enabled) into a catalog.
///
/// Directive ids must be unique across user and builtin directives alike.
pub fn build_catalog(
    records: Vec<RawDirective>,
    options: &LoadOptions,
) -> Result<Collection<Directive>, ConfigError> {
    let authored = records.len();
    let mut records = records;
    if options.include_builtins {
        records.extend(builtins::records());
    }

    let directives = records
        .into_iter()
        .map(|raw| {
            Directive::compile(raw, options.base_dir.as_deref(), options.plugin_dir.as_deref())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let catalog = Collection::new(directives)?;

    info!(
        directives = catalog.len(),
        authored,
        builtins = catalog.len() - authored,
        "directive catalog built"
    );

    Ok(catalog)
}
