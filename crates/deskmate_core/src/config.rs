//! Process configuration resolved from the environment.
//!
//! User preferences (greeting name, theme, digests) live in the shell
//! settings instead; this only covers where files go and how much is logged.

use crate::logging::{default_log_level, normalize_level, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DATA_FILE_ENV: &str = "DESKMATE_DATA_FILE";
pub const LOG_DIR_ENV: &str = "DESKMATE_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "DESKMATE_LOG_LEVEL";

const APP_DIR_NAME: &str = "deskmate";
const DATA_FILE_NAME: &str = "deskmate.db";
const LOG_DIR_NAME: &str = "logs";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    /// No override given and the platform has no data directory.
    NoDataDir,
    RelativePath { var: &'static str, path: PathBuf },
    Level(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDataDir => write!(
                f,
                "cannot determine a data directory; set {DATA_FILE_ENV} and {LOG_DIR_ENV}"
            ),
            Self::RelativePath { var, path } => {
                write!(f, "{var} must be an absolute path, got `{}`", path.display())
            }
            Self::Level(err) => write!(f, "{LOG_LEVEL_ENV}: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Level(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::Level(value)
    }
}

/// Resolved file locations and log level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: &'static str,
}

impl AppConfig {
    /// Reads the `DESKMATE_*` variables of the current process.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok(), dirs::data_dir())
    }

    /// Resolves the configuration from `lookup`, falling back to files under
    /// `data_dir/deskmate`.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        data_dir: Option<PathBuf>,
    ) -> ConfigResult<Self> {
        let value = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let app_dir = data_dir.map(|dir| dir.join(APP_DIR_NAME));

        let data_file = match value(DATA_FILE_ENV) {
            Some(path) => absolute(DATA_FILE_ENV, PathBuf::from(path))?,
            None => app_dir
                .as_ref()
                .map(|dir| dir.join(DATA_FILE_NAME))
                .ok_or(ConfigError::NoDataDir)?,
        };
        let log_dir = match value(LOG_DIR_ENV) {
            Some(path) => absolute(LOG_DIR_ENV, PathBuf::from(path))?,
            None => app_dir
                .as_ref()
                .map(|dir| dir.join(LOG_DIR_NAME))
                .ok_or(ConfigError::NoDataDir)?,
        };
        let log_level = match value(LOG_LEVEL_ENV) {
            Some(level) => normalize_level(&level)?,
            None => default_log_level(),
        };

        Ok(Self {
            data_file,
            log_dir,
            log_level,
        })
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }
}

fn absolute(var: &'static str, path: PathBuf) -> ConfigResult<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Err(ConfigError::RelativePath { var, path })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DATA_FILE_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_live_under_the_data_dir() {
        let config = AppConfig::from_lookup(lookup(&[]), Some(PathBuf::from("/data"))).unwrap();
        assert_eq!(config.data_file, PathBuf::from("/data/deskmate/deskmate.db"));
        assert_eq!(config.log_dir, PathBuf::from("/data/deskmate/logs"));
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn environment_overrides_win() {
        let config = AppConfig::from_lookup(
            lookup(&[
                (DATA_FILE_ENV, "/tmp/book.db"),
                (LOG_DIR_ENV, " /tmp/logs "),
                (LOG_LEVEL_ENV, "Warning"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(config.data_file(), Path::new("/tmp/book.db"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/logs"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let relative = AppConfig::from_lookup(
            lookup(&[(DATA_FILE_ENV, "book.db")]),
            Some(PathBuf::from("/data")),
        );
        assert!(matches!(
            relative,
            Err(ConfigError::RelativePath { var, .. }) if var == DATA_FILE_ENV
        ));

        let level = AppConfig::from_lookup(
            lookup(&[(LOG_LEVEL_ENV, "chatty")]),
            Some(PathBuf::from("/data")),
        );
        assert!(matches!(level, Err(ConfigError::Level(_))));

        let no_dir = AppConfig::from_lookup(lookup(&[(LOG_DIR_ENV, "/tmp/logs")]), None);
        assert!(matches!(no_dir, Err(ConfigError::NoDataDir)));
    }
}
