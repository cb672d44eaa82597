//! Configuration for the workflow engine

use serde::{Deserialize, Serialize};
use workflow_observability::TracingConfig;

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Service name reported by the log subscriber
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pagination configuration
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LoggingConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Pagination configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when a conversion request does not name one
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

// Default value helpers
fn default_service_name() -> String {
    "workflow-engine".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_page_size() -> i64 {
    100
}

impl EngineConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `WORKFLOW__*` environment variables
    /// (e.g. `WORKFLOW__PAGINATION__DEFAULT_PAGE_SIZE=50`).
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();

        builder = builder.add_source(::config::Config::try_from(&EngineConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("WORKFLOW")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        if config.pagination.default_page_size <= 0 {
            return Err(::config::ConfigError::Message(format!(
                "pagination.default_page_size must be positive, got {}",
                config.pagination.default_page_size
            )));
        }
        Ok(config)
    }

    /// Subscriber settings derived from the logging section
    pub fn tracing_config(&self) -> TracingConfig {
        let config = TracingConfig::new(self.service_name.clone())
            .with_log_level(self.logging.level.clone());
        if self.logging.json {
            config.with_json_format()
        } else {
            config
        }
    }
}
