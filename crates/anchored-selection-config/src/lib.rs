use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid log level '{level}'")]
    InvalidLogLevel {
        level: String,
        source: log::ParseLevelError,
    },
}

/// Anchor indicator shown in the status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Show the glyph instead of the letters when the terminal can draw it
    pub use_glyph: bool,
    pub glyph: String,
    pub anchored_label: String,
    pub unanchored_label: String,
    pub tooltip: String,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            use_glyph: true,
            glyph: "\u{2693}".to_string(),
            anchored_label: "A".to_string(),
            unanchored_label: "a".to_string(),
            tooltip: "Anchored selection (Ctrl-Space to toggle)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    /// Log output goes here; logging is off without it since the terminal
    /// belongs to the UI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub indicator: IndicatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            indicator: IndicatorConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the log file path
        config.log_file = config
            .log_file
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load the config file, falling back to defaults when there is none
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path_or_default(&config_path)
    }

    pub fn load_from_path_or_default<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path(config_path)?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/anchored-selection");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn log_level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|source| ConfigError::InvalidLogLevel {
                level: self.log_level.clone(),
                source,
            })
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/anchored-selection/config.toml"));
    }

    #[test]
    fn test_default_indicator_uses_anchor_glyph() {
        let config = Config::default();

        assert!(config.indicator.use_glyph);
        assert_eq!(config.indicator.glyph, "\u{2693}");
        assert_eq!(config.indicator.anchored_label, "A");
        assert_eq!(config.indicator.unanchored_label, "a");
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
log_level = "debug"

[indicator]
use_glyph = false
"#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert!(!config.indicator.use_glyph);
        assert_eq!(config.indicator.anchored_label, "A");
        assert_eq!(config.indicator.tooltip, IndicatorConfig::default().tooltip);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_absolute_path() {
        let path = PathBuf::from("/absolute/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_log_file_with_env_var_is_expanded() {
        unsafe {
            env::set_var("ANCHORED_SELECTION_TEST_LOGS", "/custom/logs");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "log_file = \"$ANCHORED_SELECTION_TEST_LOGS/anchored.log\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(
            config.log_file,
            Some(PathBuf::from("/custom/logs/anchored.log"))
        );
        unsafe {
            env::remove_var("ANCHORED_SELECTION_TEST_LOGS");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        assert_eq!(
            Config::load_from_path_or_default(&config_file).unwrap(),
            Config::default()
        );

        std::fs::write(&config_file, "log_level = \"warn\"\n").unwrap();
        let config = Config::load_from_path_or_default(&config_file).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.indicator, IndicatorConfig::default());
    }

    #[test]
    fn test_load_invalid_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "log_level = [").unwrap();

        let error = Config::load_from_path(&config_file).unwrap_err();

        match error {
            ConfigError::ConfigParseError { config_path, .. } => {
                assert_eq!(config_path, config_file)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            log_level: "trace".to_string(),
            log_file: Some(PathBuf::from("/tmp/anchored.log")),
            indicator: IndicatorConfig {
                use_glyph: false,
                ..IndicatorConfig::default()
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_log_level_filter() {
        let mut config = Config::default();
        assert_eq!(config.log_level_filter().unwrap(), log::LevelFilter::Info);

        config.log_level = "off".to_string();
        assert_eq!(config.log_level_filter().unwrap(), log::LevelFilter::Off);

        config.log_level = "loud".to_string();
        assert!(matches!(
            config.log_level_filter(),
            Err(ConfigError::InvalidLogLevel { .. })
        ));
    }
}
