use std::fs;
use std::path::Path;

use librebox_signals::SignalConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Fixed-step simulation rate in Hz.
pub const DEFAULT_FIXED_RATE: f64 = 1000.0;
/// Upper bound on fixed steps run by a single frame; older backlog is dropped.
pub const DEFAULT_MAX_FIXED_STEPS: u32 = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunServiceConfig {
    pub fixed_rate: f64,
    pub max_fixed_steps: u32,
}

impl Default for RunServiceConfig {
    fn default() -> Self { Self { fixed_rate: DEFAULT_FIXED_RATE, max_fixed_steps: DEFAULT_MAX_FIXED_STEPS } }
}

/// Engine configuration, usually read from a `librebox.toml`.
///
/// Every section and field is optional; missing ones take their defaults.
///
/// ```toml
/// [signals]
/// reserve = 256
///
/// [run_service]
/// fixed_rate = 240.0
/// max_fixed_steps = 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub signals: SignalConfig,
    pub run_service: RunServiceConfig,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> { Ok(toml::to_string_pretty(self)?) }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.run_service.fixed_rate;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::Invalid(format!("run_service.fixed_rate must be a positive number, got {rate}")));
        }
        if self.run_service.max_fixed_steps == 0 {
            return Err(ConfigError::Invalid("run_service.max_fixed_steps must be at least 1".into()));
        }
        Ok(())
    }
}
