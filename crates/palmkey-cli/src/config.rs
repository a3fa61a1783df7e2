use std::env;
use std::path::PathBuf;

use palmkey_config::{load_resolved_config, ConfigError, ResolvedConfig};
use palmkey_hand_core::errors::{AppError, AppResult};
use palmkey_hand_core::hands::store::STORE_DIR_ENV;
use palmkey_hand_core::hands::{EnvStoreDirResolver, StoreDirResolver, VerifierConfig};
use palmkey_hand_core::SessionConfig;

pub fn load() -> AppResult<ResolvedConfig> {
    load_resolved_config()
        .map(|loaded| loaded.resolved)
        .map_err(map_config_error)
}

/// Store directory precedence: flag, then environment, then config file
/// (whose default matches the resolver's built-in).
pub fn resolve_store_dir(flag: Option<PathBuf>) -> AppResult<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if env::var_os(STORE_DIR_ENV).is_some() {
        return Ok(EnvStoreDirResolver.resolve(None));
    }
    Ok(load()?.capture_store_dir)
}

pub fn resolve_threshold(flag: Option<f64>) -> AppResult<f64> {
    match flag {
        Some(threshold) => Ok(threshold),
        None => Ok(load()?.similarity_threshold),
    }
}

pub fn session_config() -> AppResult<SessionConfig> {
    let resolved = load()?;
    Ok(SessionConfig {
        verifier: VerifierConfig {
            threshold: resolved.similarity_threshold as f32,
            settle_delay: resolved.settle_delay,
        },
    })
}

fn map_config_error(err: ConfigError) -> AppError {
    match err {
        ConfigError::Read { path, source } => AppError::ConfigRead { path, source },
        ConfigError::Parse { path, message } => AppError::ConfigParse { path, message },
    }
}
