use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sqlmorph_core::NameMatching;
use sqlmorph_introspect::IntrospectOptions;
use sqlmorph_script::ScriptOptions;

use super::atomic::write_bytes_atomic;
use super::{ConfigError, ConfigResult};

pub const DEFAULT_CONFIG_FILE: &str = "sqlmorph.toml";

/// Contents of `sqlmorph.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory that receives one subdirectory per run.
    pub run_dir: PathBuf,
    pub name_matching: NameMatching,
    pub introspect: IntrospectOptions,
    pub script: ScriptOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_dir: PathBuf::from("runs"),
            name_matching: NameMatching::default(),
            introspect: IntrospectOptions::default(),
            script: ScriptOptions::default(),
        }
    }
}

/// Read `path`, or fall back to defaults when it does not exist.
pub fn load_settings(path: &Path) -> ConfigResult<Settings> {
    if !path.exists() {
        tracing::debug!(event = "config_defaults", path = %path.display());
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    tracing::debug!(event = "config_loaded", path = %path.display());
    Ok(settings)
}

/// Write a default configuration to `path`.
pub fn create_settings(path: &Path, force: bool) -> ConfigResult<Settings> {
    if path.exists() && !force {
        return Err(ConfigError::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    let settings = Settings::default();
    save_settings(path, &settings)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> ConfigResult<()> {
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(path, encoded.as_bytes()).map_err(ConfigError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    use sqlmorph_script::ColumnOrder;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sqlmorph-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = scratch_dir();
        let settings = load_settings(&dir.join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.run_dir, PathBuf::from("runs"));
    }

    #[test]
    fn init_writes_a_file_that_loads_back() {
        let dir = scratch_dir();
        let path = dir.join(DEFAULT_CONFIG_FILE);

        let created = create_settings(&path, false).unwrap();
        assert_eq!(load_settings(&path).unwrap(), created);

        let err = create_settings(&path, false).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(create_settings(&path, true).is_ok());
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let settings: Settings = toml::from_str(
            r#"
run_dir = "out/runs"
name_matching = "case_insensitive"

[introspect]
schemas = ["sales"]

[script]
column_order = "alphabetical"
"#,
        )
        .unwrap();

        assert_eq!(settings.run_dir, PathBuf::from("out/runs"));
        assert_eq!(settings.name_matching, NameMatching::CaseInsensitive);
        assert_eq!(settings.introspect.schemas, Some(vec!["sales".to_string()]));
        assert!(!settings.introspect.skip_routines);
        assert_eq!(settings.script.column_order, ColumnOrder::Alphabetical);
        assert!(settings.script.include_comments);
    }
}
