use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::recommender::Tuning;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub recommender: Tuning,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://curbreport.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            recommender: Tuning::default(),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    logging: Option<LoggingPatch>,
    recommender: Option<RecommenderPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommenderPatch {
    common_multiplier: Option<f64>,
    location_multiplier: Option<f64>,
    user_multiplier: Option<f64>,
    location_shape: Option<f64>,
    user_shape: Option<f64>,
    near_radius_m: Option<f64>,
    wide_radius_m: Option<f64>,
    reports_around: Option<u64>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("curbreport.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(recommender) = patch.recommender {
            let tuning = &mut self.recommender;
            if let Some(value) = recommender.common_multiplier {
                tuning.common_multiplier = value;
            }
            if let Some(value) = recommender.location_multiplier {
                tuning.location_multiplier = value;
            }
            if let Some(value) = recommender.user_multiplier {
                tuning.user_multiplier = value;
            }
            if let Some(value) = recommender.location_shape {
                tuning.location_shape = value;
            }
            if let Some(value) = recommender.user_shape {
                tuning.user_shape = value;
            }
            if let Some(value) = recommender.near_radius_m {
                tuning.near_radius_m = value;
            }
            if let Some(value) = recommender.wide_radius_m {
                tuning.wide_radius_m = value;
            }
            if let Some(value) = recommender.reports_around {
                tuning.reports_around = value;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("CURBREPORT_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(value) = env::var("CURBREPORT_DB_MAX_CONNECTIONS") {
            self.database.max_connections =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "CURBREPORT_DB_MAX_CONNECTIONS".to_string(),
                    value,
                })?;
        }
        if let Ok(value) = env::var("CURBREPORT_DB_TIMEOUT_SECS") {
            self.database.timeout_secs =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "CURBREPORT_DB_TIMEOUT_SECS".to_string(),
                    value,
                })?;
        }
        if let Ok(level) = env::var("CURBREPORT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(value) = env::var("CURBREPORT_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database url must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database max_connections must be at least 1".to_string(),
            ));
        }

        let tuning = &self.recommender;
        let multipliers = [
            ("common_multiplier", tuning.common_multiplier),
            ("location_multiplier", tuning.location_multiplier),
            ("user_multiplier", tuning.user_multiplier),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "recommender {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !(tuning.near_radius_m > 0.0) || !(tuning.wide_radius_m > 0.0) {
            return Err(ConfigError::Validation(
                "recommender radii must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let default = PathBuf::from("curbreport.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_carry_reference_tuning() {
        let config = AppConfig::default();
        assert_eq!(config.recommender.location_multiplier, 1.56);
        assert_eq!(config.recommender.common_multiplier, 0.01);
        assert_eq!(config.recommender.user_multiplier, 0.44);
        assert_eq!(config.recommender.reports_around, 200);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn file_patch_overrides_selected_fields_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[database]\nurl = \"sqlite://patched.db\"\n\n[recommender]\nnear_radius_m = 75.0\n"
        )
        .unwrap();

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .unwrap();

        assert_eq!(config.database.url, "sqlite://patched.db");
        assert_eq!(config.recommender.near_radius_m, 75.0);
        // Untouched values keep their defaults.
        assert_eq!(config.recommender.wide_radius_m, 2000.0);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/curbreport.toml")),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn negative_multiplier_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[recommender]\nuser_multiplier = -0.5\n").unwrap();

        let result = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn programmatic_overrides_win() {
        let config = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/curbreport.toml")),
            require_file: false,
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                log_level: Some("debug".to_string()),
            },
        })
        .unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.logging.level, "debug");
    }
}
