//! Configuration discovery
//!
//! The embedded defaults always load; a discovered file is merged on top.

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use orgscan_inventory::InventoryConfig;

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "ORGSCAN_CONFIG";

/// Load configuration from an explicit path or the default locations
///
/// # Errors
/// Returns an error if a configuration file exists but cannot be read,
/// parsed, or validated.
pub fn load(explicit: Option<&Path>) -> eyre::Result<InventoryConfig> {
    match locate(explicit) {
        Some(path) => load_file(&path),
        None => {
            tracing::debug!("no config file found, using defaults");
            Ok(InventoryConfig::embedded()?)
        }
    }
}

/// Find the configuration file to use, if any
fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }

    let paths = [
        Some(PathBuf::from("orgscan.toml")),
        dirs::config_dir().map(|p| p.join("orgscan/orgscan.toml")),
    ];

    paths.into_iter().flatten().find(|path| path.exists())
}

fn load_file(path: &Path) -> eyre::Result<InventoryConfig> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
    let config = InventoryConfig::with_overrides(&content)
        .wrap_err_with(|| format!("invalid config file {}", path.display()))?;

    tracing::debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = Path::new("/tmp/custom-orgscan.toml");
        assert_eq!(locate(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = load(Some(Path::new("/nonexistent/orgscan.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("orgscan-test-{}.toml", std::process::id()));
        std::fs::write(&path, "[performance]\nbatch_size = 2\n").unwrap();

        let config = load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.performance.batch_size, 2);
        assert_eq!(config.performance.retry_attempts, 3);
        assert!(!config.detection.object_based.is_empty());
    }
}
