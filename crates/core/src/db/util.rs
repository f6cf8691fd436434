use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{FrontendConfig, SqliteStore};

/// Load the frontend config from a JSON (`.json`) or YAML (`.yaml`/`.yml`) file.
pub fn load_config(path: &Path) -> Result<FrontendConfig> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let config: FrontendConfig = match ext {
        "yaml" | "yml" => serde_yaml::from_str(&body).context("Failed to parse config YAML")?,
        _ => serde_json::from_str(&body).context("Failed to parse config JSON")?,
    };
    Ok(config)
}

/// Resolve the store path (respecting relative/absolute config) against the config's directory.
pub fn resolve_db_path(config: &FrontendConfig, config_path: &Path) -> PathBuf {
    let config_db_path = Path::new(&config.data_storage.db_path);
    if config_db_path.is_absolute() {
        config_db_path.to_path_buf()
    } else {
        config_path.parent().unwrap_or_else(|| Path::new(".")).join(config_db_path)
    }
}

/// Load the config at `config_path` and open its store read-only.
pub fn open_store(config_path: &Path) -> Result<(FrontendConfig, PathBuf, SqliteStore)> {
    let config = load_config(config_path)?;
    let db_path = resolve_db_path(&config, config_path);
    let store = SqliteStore::open_read_only(&db_path)
        .with_context(|| format!("Failed to open store at {}", db_path.display()))?;
    Ok((config, db_path, store))
}
