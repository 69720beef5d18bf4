//! Site Configuration
//!
//! [`SiteConfig`] is the JSON-facing description of a deployment. Every field
//! is optional; durations are given in milliseconds. The runtime structs
//! ([`LoaderConfig`], [`SequencerConfig`]) stay plain Rust and are produced
//! by the `to_*` conversions, which also validate ranges.
//!
//! ```json
//! {
//!   "asset_root": "https://cdn.example.com/site/",
//!   "connection": { "effective_type": "3g", "round_trip_ms": 420 },
//!   "loader": { "max_retries": 2, "priority_delay_ms": 150 },
//!   "animation": { "max_anchor_wait_ms": 3000 },
//!   "critical_assets": [
//!     { "url": "model/Robot.glb", "kind": "model", "priority": 1 }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use horizon_animation::{BindingCatalog, SequencerConfig};
use horizon_assets::{ConnectionProfile, LoaderConfig, PreloadRequest, TimeoutPolicy};
use horizon_core::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory or `http(s)://` base URL that asset paths resolve against.
    pub asset_root: String,
    /// Fixed connection profile; detected from the platform when absent.
    pub connection: Option<ConnectionProfile>,
    pub loader: LoaderSettings,
    pub animation: AnimationSettings,
    pub hosting: HostingSettings,
    /// Assets preloaded by [`Site::start`](crate::Site::start).
    pub critical_assets: Vec<PreloadRequest>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            asset_root: "assets".to_string(),
            connection: None,
            loader: LoaderSettings::default(),
            animation: AnimationSettings::default(),
            hosting: HostingSettings::default(),
            critical_assets: Vec::new(),
        }
    }
}

impl SiteConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.asset_root.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "asset_root",
                reason: "must not be empty".to_string(),
            });
        }
        self.loader.to_loader_config()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    pub model_timeout_ms: u64,
    pub model_timeout_cap_ms: u64,
    pub texture_timeout_ms: u64,
    pub texture_timeout_cap_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub priority_delay_ms: u64,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            model_timeout_ms: 10_000,
            model_timeout_cap_ms: 30_000,
            texture_timeout_ms: 7_000,
            texture_timeout_cap_ms: 20_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            priority_delay_ms: 100,
        }
    }
}

impl LoaderSettings {
    pub fn to_loader_config(&self) -> std::result::Result<LoaderConfig, ConfigError> {
        Ok(LoaderConfig {
            model_timeout: timeout_policy(
                "loader.model_timeout_ms",
                self.model_timeout_ms,
                self.model_timeout_cap_ms,
            )?,
            texture_timeout: timeout_policy(
                "loader.texture_timeout_ms",
                self.texture_timeout_ms,
                self.texture_timeout_cap_ms,
            )?,
            max_retries: self.max_retries,
            base_retry_delay: Duration::from_millis(self.retry_delay_ms),
            priority_delay: Duration::from_millis(self.priority_delay_ms),
        })
    }
}

fn timeout_policy(
    field: &'static str,
    base_ms: u64,
    cap_ms: u64,
) -> std::result::Result<TimeoutPolicy, ConfigError> {
    if base_ms == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "timeout must be positive".to_string(),
        });
    }
    if cap_ms < base_ms {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("cap {cap_ms} ms is below base {base_ms} ms"),
        });
    }
    Ok(TimeoutPolicy::new(
        Duration::from_millis(base_ms),
        Duration::from_millis(cap_ms),
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub max_anchor_wait_ms: u64,
    pub settle_delay_ms: u64,
    pub high_latency_settle_delay_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Replaces the built-in binding catalog.
    pub catalog: Option<BindingCatalog>,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            max_anchor_wait_ms: 5_000,
            settle_delay_ms: 100,
            high_latency_settle_delay_ms: 200,
            max_retries: 3,
            retry_delay_ms: 1_500,
            catalog: None,
        }
    }
}

impl AnimationSettings {
    #[must_use]
    pub fn to_sequencer_config(&self, high_latency: bool) -> SequencerConfig {
        SequencerConfig {
            max_anchor_wait: Duration::from_millis(self.max_anchor_wait_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            high_latency_settle_delay: Duration::from_millis(self.high_latency_settle_delay_ms),
            high_latency,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> BindingCatalog {
        self.catalog.clone().unwrap_or_else(BindingCatalog::site_default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingSettings {
    /// Overrides hosting detection.
    pub high_latency: Option<bool>,
}
