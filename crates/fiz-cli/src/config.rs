//! Configuration file loading for the CLI
//!
//! Finds and loads the TOML configuration from an explicit path, the local
//! project directory, or the platform configuration directory.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use fiz::{FizError, config::AppConfig};

/// Local configuration file, relative to the working directory.
const LOCAL_CONFIG: &str = "fiz/config.toml";

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for FizError {
    fn from(err: ConfigError) -> Self {
        FizError::Io(io::Error::other(err.to_string()))
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (`fiz/config.toml`)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or fails validation
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, FizError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new(LOCAL_CONFIG);
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "fiz", "fiz") {
        let system_config = proj_dirs.config_dir().join("config.toml");
        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }
        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load and validate configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, FizError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    debug!(config:?; "Configuration loaded");
    Ok(config)
}

/// Parse configuration text, checking that a configured import root exists.
fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if let Some(root) = config.imports().root().filter(|root| !root.is_dir()) {
        return Err(ConfigError::Validation(format!(
            "import root `{}` is not a directory",
            root.display()
        )));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.imports().max_depth(), 16);
        assert!(config.imports().cache());
        assert!(config.imports().root().is_none());
    }

    #[test]
    fn test_import_section() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            "[imports]\nroot = {:?}\nmax_depth = 3\ncache = false\n",
            dir.path().display().to_string()
        );
        let config = parse_config(&content).unwrap();
        assert_eq!(config.imports().root(), Some(dir.path()));
        assert_eq!(config.imports().max_depth(), 3);
        assert!(!config.imports().cache());
    }

    #[test]
    fn test_missing_import_root_fails_validation() {
        let err = parse_config("[imports]\nroot = \"/definitely/not/here\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = parse_config("[imports\nmax_depth = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = load_config(Some("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Missing configuration file"));
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[imports]\nmax_depth = 1").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.imports().max_depth(), 1);
    }
}
