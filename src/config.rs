use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::workflows::AgentRole;

/// Main configuration structure for the conductor demo
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConductorConfig {
    /// Timing of the simulated workflow
    pub schedule: ScheduleConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

/// Offsets in milliseconds, measured from the moment `start()` is called
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// When the conductor finishes analyzing and starts dispatching
    pub dispatch_at_ms: u64,
    /// When every agent is marked complete and merging begins
    pub merge_at_ms: u64,
    /// When the final output is produced
    pub complete_at_ms: u64,
    /// Per-agent timing, one entry per role
    pub agents: Vec<AgentTimingConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentTimingConfig {
    pub role: AgentRole,
    /// Delay after dispatch before the agent shows as processing
    pub stagger_ms: u64,
    /// Absolute offset of the agent's progress log line
    pub report_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON log lines instead of the human format
    pub json_logs: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            dispatch_at_ms: 1500,
            merge_at_ms: 6000,
            complete_at_ms: 8000,
            agents: vec![
                AgentTimingConfig {
                    role: AgentRole::Infra,
                    stagger_ms: 200,
                    report_at_ms: 2500,
                },
                AgentTimingConfig {
                    role: AgentRole::Security,
                    stagger_ms: 600,
                    report_at_ms: 3000,
                },
                AgentTimingConfig {
                    role: AgentRole::Cost,
                    stagger_ms: 1000,
                    report_at_ms: 4000,
                },
            ],
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl ConductorConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. conductor.toml in the working directory
    /// 3. Environment variables (CONDUCTOR_SCHEDULE__MERGE_AT_MS and friends)
    pub fn load() -> Result<Self> {
        Self::build(Path::new("conductor.toml"), false, true)
    }

    /// Load from an explicit file, which must exist.
    /// `with_env` controls the environment override layer.
    pub fn load_from(path: &Path, with_env: bool) -> Result<Self> {
        Self::build(path, true, with_env)
    }

    fn build(path: &Path, required: bool, with_env: bool) -> Result<Self> {
        if required && !path.is_file() {
            anyhow::bail!("Configuration file {} not found", path.display());
        }

        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path).required(required));

        if with_env {
            builder = builder.add_source(
                Environment::with_prefix("CONDUCTOR")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<ConductorConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = ConductorConfig::load_env_file();
        ConductorConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static ConductorConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
