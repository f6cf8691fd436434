use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{open_store, FrontendConfig, SqliteStore};
use crate::services::FrontendDb;

/// Convenience wrapper bundling config, store path, and a ready query service.
#[derive(Debug)]
pub struct FrontendContext {
    pub config: FrontendConfig,
    pub db_path: PathBuf,
    pub db: FrontendDb<SqliteStore>,
}

impl FrontendContext {
    /// Load the config file and open its store.
    pub fn from_config_path(config_path: impl AsRef<Path>) -> Result<Self> {
        let (config, db_path, store) = open_store(config_path.as_ref())?;
        let db = FrontendDb::new(store).with_structural_threshold(config.data_storage.structural_threshold);
        Ok(Self { config, db_path, db })
    }

    /// Open the store at `db_path` with an already loaded config.
    ///
    /// `db_path` wins over `config.data_storage.db_path`.
    pub fn with_config(mut config: FrontendConfig, db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let store = SqliteStore::open_read_only(&db_path)
            .with_context(|| format!("Failed to open store at {}", db_path.display()))?;
        config.data_storage.db_path = db_path.to_string_lossy().into_owned();
        let db = FrontendDb::new(store).with_structural_threshold(config.data_storage.structural_threshold);
        Ok(Self { config, db_path, db })
    }

    /// Open a store directly, with default settings.
    pub fn from_db_path(db_path: impl AsRef<Path>) -> Result<Self> {
        let config = FrontendConfig::new(db_path.as_ref().to_string_lossy());
        Self::with_config(config, db_path)
    }
}
