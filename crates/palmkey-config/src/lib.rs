use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const PRIMARY_CONFIG_PATH: &str = "/etc/palmkey/config.toml";
pub const SECONDARY_CONFIG_PATH: &str = "/usr/local/etc/palmkey/config.toml";
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;
pub const DEFAULT_SETTLE_DELAY_MILLIS: u64 = 3000;
pub const DEFAULT_STORE_DIR: &str = "/var/lib/palmkey/captures";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    pub similarity_threshold: Option<f64>,
    pub settle_delay_millis: Option<u64>,
    pub capture_store_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub similarity_threshold: f64,
    pub settle_delay: Duration,
    pub capture_store_dir: PathBuf,
}

impl ResolvedConfig {
    pub fn from_raw(raw: ConfigFile) -> Self {
        Self {
            similarity_threshold: raw
                .similarity_threshold
                .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
            settle_delay: Duration::from_millis(
                raw.settle_delay_millis.unwrap_or(DEFAULT_SETTLE_DELAY_MILLIS),
            ),
            capture_store_dir: raw
                .capture_store_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
        }
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::from_raw(ConfigFile::default())
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfigWithSource {
    pub resolved: ResolvedConfig,
    pub source: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

pub fn load_resolved_config() -> Result<ResolvedConfigWithSource, ConfigError> {
    let sources = [
        PathBuf::from(PRIMARY_CONFIG_PATH),
        PathBuf::from(SECONDARY_CONFIG_PATH),
    ];
    load_resolved_from_paths(&sources)
}

pub fn load_resolved_from_paths(
    paths: &[PathBuf],
) -> Result<ResolvedConfigWithSource, ConfigError> {
    for path in paths {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let parsed =
                    toml::from_str::<ConfigFile>(&contents).map_err(|err| ConfigError::Parse {
                        path: path.clone(),
                        message: err.to_string(),
                    })?;
                return Ok(ResolvedConfigWithSource {
                    resolved: ResolvedConfig::from_raw(parsed),
                    source: Some(path.clone()),
                });
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(ConfigError::Read {
                    path: path.clone(),
                    source: err,
                })
            }
        }
    }

    Ok(ResolvedConfigWithSource {
        resolved: ResolvedConfig::default(),
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_when_no_config_exists() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let loaded = load_resolved_from_paths(&[missing]).unwrap();
        assert!(loaded.source.is_none());
        assert_eq!(
            loaded.resolved.similarity_threshold,
            DEFAULT_SIMILARITY_THRESHOLD
        );
        assert_eq!(loaded.resolved.settle_delay, Duration::from_millis(3000));
        assert_eq!(
            loaded.resolved.capture_store_dir,
            PathBuf::from(DEFAULT_STORE_DIR)
        );
    }

    #[test]
    fn primary_path_wins_over_secondary() {
        let dir = tempdir().unwrap();
        let primary = dir.path().join("primary.toml");
        let secondary = dir.path().join("secondary.toml");
        fs::write(&primary, "similarity_threshold = 0.9").unwrap();
        fs::write(&secondary, "similarity_threshold = 0.5").unwrap();

        let loaded = load_resolved_from_paths(&[primary.clone(), secondary]).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(primary.as_path()));
        assert_eq!(loaded.resolved.similarity_threshold, 0.9);
    }

    #[test]
    fn secondary_path_fills_in_when_primary_missing() {
        let dir = tempdir().unwrap();
        let primary = dir.path().join("primary.toml");
        let secondary = dir.path().join("secondary.toml");
        fs::write(&secondary, "settle_delay_millis = 1500").unwrap();

        let loaded = load_resolved_from_paths(&[primary, secondary]).unwrap();
        assert_eq!(loaded.resolved.settle_delay, Duration::from_millis(1500));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "similarity_threshold = [").unwrap();

        let err = load_resolved_from_paths(&[path]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
