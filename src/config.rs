//! Runtime configuration.
//!
//! Sources, later ones win:
//! 1) built-in defaults
//! 2) TOML file (`/etc/atten.toml`, or the file named by `ATTEN_CONFIG`)
//! 3) `ATTEN_*` environment variables, e.g. `ATTEN_CONTROLLER=matrix:5050`

use crate::error::{AttenError, Result};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "/etc/atten.toml";
pub const CONFIG_FILE_ENV: &str = "ATTEN_CONFIG";
const ENV_PREFIX: &str = "ATTEN_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Topology source describing the RF paths of this experiment.
    pub topology: PathBuf,

    /// `host:port` of the attenuator matrix controller.
    pub controller: String,

    /// Largest attenuation the hardware accepts, in dB.
    pub max_db: f64,

    /// Allowed difference between a requested value and the acknowledged one.
    pub tolerance_db: f64,

    /// Connect/read/write timeout for controller transactions.
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topology: PathBuf::from("/var/emulab/boot/atten-paths.json"),
            controller: "localhost:5050".to_string(),
            max_db: 95.0,
            tolerance_db: 0.5,
            timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Load from all sources, reading the config file path from the environment.
    pub fn load() -> Result<Self> {
        let file = std::env::var_os(CONFIG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_figment(Self::figment(&file))
    }

    /// Layered sources; a missing TOML file contributes nothing.
    pub fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG", "LOG"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.max_db.is_finite() || self.max_db <= 0.0 {
            return Err(AttenError::Config(format!(
                "max_db must be a positive number of dB, got {}",
                self.max_db
            )));
        }
        if !self.tolerance_db.is_finite() || self.tolerance_db < 0.0 {
            return Err(AttenError::Config(format!(
                "tolerance_db must be zero or positive, got {}",
                self.tolerance_db
            )));
        }
        if self.timeout_ms == 0 {
            return Err(AttenError::Config("timeout_ms must be non-zero".to_string()));
        }
        if self.controller.trim().is_empty() {
            return Err(AttenError::Config("controller address is empty".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
