//! Command-line configuration
//!
//! Loaded from a YAML or TOML file, then overlaid with environment
//! variables. Command-line flags are applied last by `main`.

use anyhow::{Context, Result};
use docsweep_core::{AllowedTypes, SweepConfig};
use docsweep_egress::{HttpStoreConfig, store::DEFAULT_API_VERSION};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsweepConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub sweep: SweepConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the documents live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub project_id: String,

    #[serde(default = "default_dataset")]
    pub dataset: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Write token; usually supplied through `SANITY_AUTH_TOKEN`
    #[serde(default)]
    pub token: Option<String>,

    /// Override for the project's API host
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: default_dataset(),
            api_version: default_api_version(),
            token: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StoreSettings {
    pub fn to_http_config(&self) -> HttpStoreConfig {
        let mut config = HttpStoreConfig::new(&self.project_id, &self.dataset)
            .with_api_version(&self.api_version);
        if let Some(token) = &self.token {
            config = config.with_token(token);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        config.client_config.timeout_secs = self.timeout_secs;
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DocsweepConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        // Store location
        if let Ok(val) = std::env::var("DOCSWEEP_PROJECT_ID") {
            self.store.project_id = val;
        }

        if let Ok(val) = std::env::var("DOCSWEEP_DATASET") {
            self.store.dataset = val;
        }

        if let Ok(val) = std::env::var("DOCSWEEP_API_VERSION") {
            self.store.api_version = val;
        }

        if let Ok(val) = std::env::var("DOCSWEEP_BASE_URL") {
            self.store.base_url = Some(val);
        }

        // Token (no DOCSWEEP_ prefix, shared with the content studio tooling)
        if let Ok(val) = std::env::var("SANITY_AUTH_TOKEN") {
            self.store.token = Some(val);
        }

        // Sweep settings
        if let Ok(val) = std::env::var("DOCSWEEP_ALLOWED_TYPES") {
            let parsed = if val.trim().eq_ignore_ascii_case("all") {
                Ok(AllowedTypes::All)
            } else {
                AllowedTypes::only(val.split(','))
            };
            match parsed {
                Ok(types) => self.sweep.allowed_types = types,
                Err(e) => eprintln!("Warning: Invalid DOCSWEEP_ALLOWED_TYPES '{}': {}", val, e),
            }
        }

        if let Ok(val) = std::env::var("DOCSWEEP_BATCH_SIZE") {
            match val.parse::<NonZeroUsize>() {
                Ok(size) => self.sweep.batch_size = size,
                Err(_) => eprintln!("Warning: Invalid DOCSWEEP_BATCH_SIZE '{}', using default", val),
            }
        }

        if let Ok(val) = std::env::var("DOCSWEEP_RESULT_CAP") {
            match val.parse::<NonZeroUsize>() {
                Ok(cap) => self.sweep.result_cap = cap,
                Err(_) => eprintln!("Warning: Invalid DOCSWEEP_RESULT_CAP '{}', using default", val),
            }
        }

        if let Ok(val) = std::env::var("DOCSWEEP_PREVIEW_ONLY") {
            match val.parse::<bool>() {
                Ok(enabled) => self.sweep.preview_only = enabled,
                Err(_) => eprintln!("Warning: Invalid DOCSWEEP_PREVIEW_ONLY '{}', using default", val),
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("DOCSWEEP_LOG_LEVEL") {
            self.logging.level = val;
        }
    }
}

fn default_dataset() -> String {
    "production".to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}
