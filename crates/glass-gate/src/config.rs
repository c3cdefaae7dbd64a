use device_inventory::{PlatformEntry, SnapshotFiles};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_devices_file")]
    pub devices_file: PathBuf,
    #[serde(default = "default_directives_file")]
    pub directives_file: PathBuf,
    #[serde(default)]
    pub plugin_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub include_builtins: bool,
    /// Extra platform registrations on top of the shipped table.
    #[serde(default)]
    pub platforms: Vec<PlatformEntry>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            devices_file: default_devices_file(),
            directives_file: default_directives_file(),
            plugin_dir: None,
            include_builtins: default_true(),
            platforms: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn snapshot_files(&self) -> SnapshotFiles {
        SnapshotFiles {
            devices_file: self.devices_file.clone(),
            directives_file: self.directives_file.clone(),
            plugin_dir: self.plugin_dir.clone(),
            include_builtins: self.include_builtins,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

// ---------------------------------------------------------------------------
// Default-value functions used by serde
// ---------------------------------------------------------------------------

fn default_devices_file() -> PathBuf {
    PathBuf::from("devices.yaml")
}

fn default_directives_file() -> PathBuf {
    PathBuf::from("directives.yaml")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Load configuration from a YAML file.
///
/// If the file does not exist a default configuration is returned and a
/// warning is emitted. Relative file paths in the configuration are taken
/// relative to the configuration file's directory.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "configuration file not found; using defaults"
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

    let mut config: Config = if contents.trim().is_empty() {
        Config::default()
    } else {
        serde_yml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?
    };

    if let Some(base) = path.parent() {
        config.devices_file = anchor(base, &config.devices_file);
        config.directives_file = anchor(base, &config.directives_file);
        config.plugin_dir = config.plugin_dir.as_deref().map(|dir| anchor(base, dir));
    }

    Ok(config)
}

fn anchor(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_inventory::Driver;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load(Path::new("/does/not/exist/glass-gate.yaml")).unwrap();
        assert_eq!(config.devices_file, PathBuf::from("devices.yaml"));
        assert_eq!(config.directives_file, PathBuf::from("directives.yaml"));
        assert!(config.include_builtins);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glass-gate.yaml");
        std::fs::write(
            &path,
            r#"
devices_file: inventory/devices.yaml
directives_file: /etc/glass-gate/directives.yaml
plugin_dir: plugins
include_builtins: false
logging:
  level: debug
  format: pretty
platforms:
  - name: acme_os
    driver: http_client
    aliases: [acme]
"#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.devices_file, dir.path().join("inventory/devices.yaml"));
        assert_eq!(
            config.directives_file,
            PathBuf::from("/etc/glass-gate/directives.yaml")
        );
        assert_eq!(config.plugin_dir, Some(dir.path().join("plugins")));
        assert!(!config.include_builtins);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.platforms[0].driver, Driver::HttpClient);

        let files = config.snapshot_files();
        assert!(!files.include_builtins);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glass-gate.yaml");
        std::fs::write(&path, "logging: [").unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
