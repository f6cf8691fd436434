use serde::{Deserialize, Serialize};

/// Default minimum share (percent) of file objects a field must occur in to be
/// listed by the analysis structure view.
pub const DEFAULT_STRUCTURAL_THRESHOLD: f64 = 50.0;

fn default_structural_threshold() -> f64 {
    DEFAULT_STRUCTURAL_THRESHOLD
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Where the store lives and how the reporting queries are tuned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataStorageConfig {
    /// Path to the store file (relative paths are resolved against the config file).
    pub db_path: String,
    /// Minimum `percentContaining` of a field for `create_analysis_structure`.
    #[serde(default = "default_structural_threshold")]
    pub structural_threshold: f64,
}

impl DataStorageConfig {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self { db_path: db_path.into(), structural_threshold: DEFAULT_STRUCTURAL_THRESHOLD }
    }
}

/// Logging defaults; `FIRMDEX_LOG` overrides `level`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `info` or `firmdex_core=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

/// Serializable configuration of the query frontend.
///
/// Read from a JSON or YAML file (chosen by extension).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrontendConfig {
    pub data_storage: DataStorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FrontendConfig {
    /// Create a configuration pointing at the given store path.
    pub fn new(db_path: impl Into<String>) -> Self {
        Self { data_storage: DataStorageConfig::new(db_path), logging: LoggingConfig::default() }
    }
}
