//! Configuration management for the embedded cluster harness.
//!
//! Settings are merged from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. Optional TOML file (explicit path or `CONFIG_PATH`)
//! 3. Environment variables prefixed with `EMBED__` (highest priority)

mod cluster;
mod logging;
mod network;
mod validation;
pub use cluster::*;
pub use logging::*;
pub use network::*;
pub use validation::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Cluster shape and naming
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Deadlines and framing limits
    #[serde(default)]
    pub network: NetworkConfig,
    /// Log sink selection
    #[serde(default)]
    pub logging: LoggingConfig,
    /// The single write/read used to prove consistency
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment
    ///
    /// # Arguments
    /// * `config_path` - Optional TOML file overriding the defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            info!("load settings from: {}", path);
            builder = builder.add_source(File::with_name(path).required(true));
        }
        if let Ok(path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("EMBED")
                .prefix_separator("__")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("logging.outputs"),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates every section
    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.network.validate()?;
        self.logging.validate()?;
        self.validation.validate()?;
        Ok(())
    }
}
