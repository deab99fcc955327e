//! Configuration loading and resolution
//!
//! Every setting resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the service logs a warning and starts
//! with defaults. A TOML file that exists but does not parse is a
//! [`Error::Config`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Environment variable overriding the artifact directory
pub const ENV_MODELS_DIR: &str = "EXO_MODELS_DIR";
/// Environment variable overriding the HTTP bind address
pub const ENV_BIND_ADDRESS: &str = "EXO_BIND_ADDRESS";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "EXO_LOG_LEVEL";
/// Environment variable overriding the fusion branch schedule
pub const ENV_FUSION_SCHEDULE: &str = "EXO_FUSION_SCHEDULE";

/// Execution order of the two independent fusion branches
///
/// All schedules produce identical results; they differ only in whether the
/// branches run on separate blocking threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchSchedule {
    /// Both branches run on the blocking thread pool at the same time
    #[default]
    Concurrent,
    /// Spectral branch, then tabular branch, on the calling thread
    SpectralFirst,
    /// Tabular branch, then spectral branch, on the calling thread
    TabularFirst,
}

impl BranchSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchSchedule::Concurrent => "concurrent",
            BranchSchedule::SpectralFirst => "spectral_first",
            BranchSchedule::TabularFirst => "tabular_first",
        }
    }
}

impl fmt::Display for BranchSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchSchedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "concurrent" => Ok(BranchSchedule::Concurrent),
            "spectral_first" => Ok(BranchSchedule::SpectralFirst),
            "tabular_first" => Ok(BranchSchedule::TabularFirst),
            other => Err(Error::Config(format!(
                "Unknown fusion schedule '{}' (expected concurrent, spectral_first or tabular_first)",
                other
            ))),
        }
    }
}

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: Option<String>,
}

/// Fusion section of the TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Branch schedule for the gas-composition pipeline
    pub schedule: Option<BranchSchedule>,
}

/// On-disk TOML configuration
///
/// All fields are optional; absent fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Directory holding the pre-fitted artifacts
    pub models_dir: Option<PathBuf>,
    /// HTTP bind address (host:port)
    pub bind_address: Option<String>,
    pub logging: LoggingConfig,
    pub fusion: FusionConfig,
}

/// Compiled fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub models_dir: PathBuf,
    pub bind_address: String,
    pub log_level: String,
    pub schedule: BranchSchedule,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("./models"),
            bind_address: "127.0.0.1:5740".to_string(),
            log_level: "info".to_string(),
            schedule: BranchSchedule::Concurrent,
        }
    }
}

/// Values given on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub models_dir: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
    pub schedule: Option<BranchSchedule>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub models_dir: PathBuf,
    pub bind_address: String,
    pub log_level: String,
    pub schedule: BranchSchedule,
}

/// Platform config file location: `<config_dir>/exo/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("exo").join("config.toml"))
}

/// Load a TOML config file
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    debug!("Loaded config file: {}", path.display());
    Ok(Some(config))
}

/// Resolves each setting across CLI, ENV, TOML and compiled defaults
pub struct ConfigResolver {
    cli: CliOverrides,
    toml: TomlConfig,
    defaults: CompiledDefaults,
}

impl ConfigResolver {
    pub fn new(cli: CliOverrides, toml: Option<TomlConfig>) -> Self {
        Self {
            cli,
            toml: toml.unwrap_or_default(),
            defaults: CompiledDefaults::default(),
        }
    }

    /// Resolve all settings
    ///
    /// Fails only when an environment variable holds an unparseable schedule.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let models_dir = self
            .cli
            .models_dir
            .clone()
            .or_else(|| env_value(ENV_MODELS_DIR).map(PathBuf::from))
            .or_else(|| self.toml.models_dir.clone())
            .unwrap_or_else(|| self.defaults.models_dir.clone());

        let bind_address = self
            .cli
            .bind_address
            .clone()
            .or_else(|| env_value(ENV_BIND_ADDRESS))
            .or_else(|| self.toml.bind_address.clone())
            .unwrap_or_else(|| self.defaults.bind_address.clone());

        let log_level = self
            .cli
            .log_level
            .clone()
            .or_else(|| env_value(ENV_LOG_LEVEL))
            .or_else(|| self.toml.logging.level.clone())
            .unwrap_or_else(|| self.defaults.log_level.clone());

        let env_schedule = env_value(ENV_FUSION_SCHEDULE)
            .map(|s| s.parse::<BranchSchedule>())
            .transpose()?;
        let schedule = self
            .cli
            .schedule
            .or(env_schedule)
            .or(self.toml.fusion.schedule)
            .unwrap_or(self.defaults.schedule);

        Ok(ResolvedConfig {
            models_dir,
            bind_address,
            log_level,
            schedule,
        })
    }
}

/// Read an environment variable, treating blank values as unset
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
