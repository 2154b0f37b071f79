//! Configuration loading.
//!
//! Two distinct surfaces:
//!
//! - [`WardenConfig`] — server settings (listen port, audit path, logging),
//!   merged hierarchically: programmatic defaults, then `warden.yaml`, then
//!   `WARDEN_*` environment variables. The standalone
//!   `GOVERNANCE_AUDIT_PATH` variable overrides the audit path last.
//! - Policy files — the governor [`Profile`], parsed strictly: unknown keys
//!   are rejected and every numeric range is validated before a kernel is
//!   built from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::Profile;
use crate::infrastructure::logging::LoggingConfig;

/// Environment variable overriding the audit file location.
pub const AUDIT_PATH_ENV_VAR: &str = "GOVERNANCE_AUDIT_PATH";

/// Policy validation error types.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Invalid max_steps: must be at least 1")]
    InvalidMaxSteps,

    #[error("Invalid max_risk: {0}. Must be in (0, 1]")]
    InvalidMaxRisk(f64),

    #[error("Invalid min_effort: {0}. Must be in [0, 1)")]
    InvalidMinEffort(f64),

    #[error("Invalid max_exploration: {0}. Must be in [0, 1]")]
    InvalidMaxExploration(f64),

    #[error("Invalid stagnation window: must be at least 1")]
    InvalidStagnationWindow,

    #[error("Invalid stagnation bound {name}: {value}. Must be finite and non-negative")]
    InvalidStagnationBound { name: &'static str, value: f64 },

    #[error("Invalid rate {name}: {value}. Must be finite and non-negative")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("Invalid trust_collapse_window: must be at least 1")]
    InvalidTrustCollapseWindow,
}

/// Main configuration for the warden server binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WardenConfig {
    /// Agent identity recorded in every audit entry.
    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    /// Listen port for the enforcement proxy.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the hash-chained audit file.
    #[serde(default = "default_audit_path")]
    pub audit_path: PathBuf,

    /// Policy file producing the profile; a preset is used when unset.
    #[serde(default)]
    pub policy_path: Option<PathBuf>,

    /// Preset used when no policy file is configured.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            agent_id: default_agent_id(),
            port: default_port(),
            audit_path: default_audit_path(),
            policy_path: None,
            preset: default_preset(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_agent_id() -> String {
    "warden".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("warden-audit.log")
}

fn default_preset() -> String {
    "balanced".to_string()
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load server configuration.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `warden.yaml` in the working directory
    /// 3. `WARDEN_*` environment variables
    /// 4. `GOVERNANCE_AUDIT_PATH` (audit path only)
    pub fn load() -> Result<WardenConfig> {
        let mut config: WardenConfig = Figment::new()
            .merge(Serialized::defaults(WardenConfig::default()))
            .merge(Yaml::file("warden.yaml"))
            .merge(Env::prefixed("WARDEN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        if let Ok(path) = std::env::var(AUDIT_PATH_ENV_VAR) {
            config.audit_path = PathBuf::from(path);
        }
        Ok(config)
    }

    /// Load and validate a governance policy file.
    ///
    /// Strict parse: unknown keys anywhere in the document are rejected.
    pub fn load_policy(path: impl AsRef<Path>) -> Result<Profile> {
        let raw = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read policy file {}", path.as_ref().display())
        })?;
        let profile: Profile = serde_yaml::from_str(&raw).with_context(|| {
            format!("Failed to parse policy file {}", path.as_ref().display())
        })?;
        Self::validate_policy(&profile)?;
        Ok(profile)
    }

    /// Validate profile ranges.
    pub fn validate_policy(profile: &Profile) -> Result<(), PolicyError> {
        let limits = &profile.limits;
        if limits.max_steps == 0 {
            return Err(PolicyError::InvalidMaxSteps);
        }
        if !(limits.max_risk > 0.0 && limits.max_risk <= 1.0) {
            return Err(PolicyError::InvalidMaxRisk(limits.max_risk));
        }
        if !(limits.min_effort >= 0.0 && limits.min_effort < 1.0) {
            return Err(PolicyError::InvalidMinEffort(limits.min_effort));
        }
        if !(limits.max_exploration >= 0.0 && limits.max_exploration <= 1.0) {
            return Err(PolicyError::InvalidMaxExploration(limits.max_exploration));
        }

        let stagnation = &profile.stagnation;
        if stagnation.window == 0 {
            return Err(PolicyError::InvalidStagnationWindow);
        }
        for (name, value) in [
            ("effort_floor", stagnation.effort_floor),
            ("reward_ceiling", stagnation.reward_ceiling),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::InvalidStagnationBound { name, value });
            }
        }

        let rates = &profile.rates;
        for (name, value) in [
            ("effort_drain_base", rates.effort_drain_base),
            (
                "effort_drain_per_frustration",
                rates.effort_drain_per_frustration,
            ),
            ("frustration_gain", rates.frustration_gain),
            ("frustration_decay", rates.frustration_decay),
            ("urgency_decay", rates.urgency_decay),
            ("uncertainty_gain", rates.uncertainty_gain),
            ("uncertainty_decay", rates.uncertainty_decay),
            ("risk_gain_per_novelty", rates.risk_gain_per_novelty),
            ("risk_gain_per_urgency", rates.risk_gain_per_urgency),
            (
                "persistence_loss_per_frustration",
                rates.persistence_loss_per_frustration,
            ),
            (
                "persistence_gain_per_reward",
                rates.persistence_gain_per_reward,
            ),
            ("exploration_gain", rates.exploration_gain),
            ("exploration_decay", rates.exploration_decay),
            ("exploration_overflow", rates.exploration_overflow),
            ("trust_epsilon", rates.trust_epsilon),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::InvalidRate { name, value });
            }
        }
        if rates.trust_collapse_window == 0 {
            return Err(PolicyError::InvalidTrustCollapseWindow);
        }

        Ok(())
    }
}
