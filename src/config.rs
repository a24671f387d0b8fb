//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;
use tollgate_governor::{AvailabilityConfig, BudgetConfig, QuotaConfig};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Ledger directory used when `data_dir` is not configured
const DEFAULT_DATA_DIR: &str = ".tollgate";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Directory holding the ledger files
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Daily quota
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Monetary budget
    #[serde(default)]
    pub budget: BudgetConfig,
    /// Free model pool
    #[serde(default)]
    pub availability: AvailabilityConfig,
}

impl AppConfig {
    /// Configured data directory, or `~/.tollgate`
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(DEFAULT_DATA_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
        })
    }

    /// Quota ledger file
    pub fn quota_path(&self) -> PathBuf {
        self.data_dir().join("quota.json")
    }

    /// Budget ledger file
    pub fn budget_path(&self) -> PathBuf {
        self.data_dir().join("budget.json")
    }

    /// Availability ledger file
    pub fn availability_path(&self) -> PathBuf {
        self.data_dir().join("availability.json")
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.quota.validate().context("Invalid [quota] section")?;
        self.budget.validate().context("Invalid [budget] section")?;
        self.availability
            .validate()
            .context("Invalid [availability] section")?;
        Ok(())
    }
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        // prefix_separator("_") makes TOLLGATE_QUOTA__DAILY_LIMIT work
        .add_source(
            Environment::with_prefix("TOLLGATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let app: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    app.validate()?;
    Ok(app)
}
