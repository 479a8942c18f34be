//! Configuration management for the stakehub engine
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::epochs::EpochTracker;
use crate::keeper::Params;
use crate::outbox::ConnectionConfig;
use crate::ratelimit::{validate_update, RateLimitProposal};
use crate::types::{Dec, HostZone, Validator};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub engine: EngineConfig,
    #[serde(default)]
    pub params: Params,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
    pub epochs: Vec<EpochConfig>,
    pub connections: HashMap<String, ConnectionConfig>,
    #[serde(default)]
    pub host_zones: Vec<HostZoneConfig>,
    #[serde(default)]
    pub rate_limits: Vec<RateLimitConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub instance_id: String,
    pub block_time_ms: u64,
    pub event_queue_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

/// Bootstrap state of an epoch tracker
#[derive(Debug, Clone, Deserialize)]
pub struct EpochConfig {
    pub identifier: String,
    #[serde(default)]
    pub epoch_number: u64,
    /// Unix seconds
    pub next_epoch_start_time: u64,
    pub duration_secs: u64,
}

impl EpochConfig {
    pub fn to_tracker(&self) -> EpochTracker {
        EpochTracker::new(
            self.identifier.clone(),
            self.epoch_number,
            self.next_epoch_start_time.saturating_mul(1_000_000_000),
            self.duration_secs.saturating_mul(1_000_000_000),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorConfig {
    pub name: String,
    pub address: String,
    pub weight: u64,
}

/// A host zone registered at startup. Interchain accounts are filled in as
/// their channel handshakes complete.
#[derive(Debug, Clone, Deserialize)]
pub struct HostZoneConfig {
    pub chain_id: String,
    pub bech32_prefix: String,
    pub connection_id: String,
    pub transfer_channel_id: String,
    pub host_denom: String,
    pub ibc_denom: String,
    pub deposit_address: String,
    #[serde(default)]
    pub validators: Vec<ValidatorConfig>,
}

impl HostZoneConfig {
    pub fn to_host_zone(&self) -> HostZone {
        HostZone {
            chain_id: self.chain_id.clone(),
            bech32_prefix: self.bech32_prefix.clone(),
            connection_id: self.connection_id.clone(),
            transfer_channel_id: self.transfer_channel_id.clone(),
            host_denom: self.host_denom.clone(),
            ibc_denom: self.ibc_denom.clone(),
            deposit_address: self.deposit_address.clone(),
            redemption_rate: Dec::one(),
            staked_bal: 0,
            validators: self
                .validators
                .iter()
                .map(|v| Validator::new(v.name.clone(), v.address.clone(), v.weight, 0))
                .collect(),
            delegation_account: None,
            fee_account: None,
            withdrawal_account: None,
            redemption_account: None,
        }
    }
}

/// A rate limit installed at startup
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub denom: String,
    pub channel_id: String,
    pub max_percent_send: i64,
    pub max_percent_recv: i64,
    pub duration_hours: u64,
    /// Channel value the percentages apply to
    pub channel_value: u64,
}

impl RateLimitConfig {
    pub fn to_proposal(&self) -> RateLimitProposal {
        RateLimitProposal {
            title: format!("Bootstrap {} on {}", self.denom, self.channel_id),
            description: "Configured at startup".to_string(),
            denom: self.denom.clone(),
            channel_id: self.channel_id.clone(),
            max_percent_send: self.max_percent_send,
            max_percent_recv: self.max_percent_recv,
            duration_hours: self.duration_hours,
        }
    }
}

impl Settings {
    /// Load settings from `$STAKEHUB_CONFIG`, falling back to
    /// `config/default.toml`
    pub fn load() -> Result<Self> {
        let config_path = env::var("STAKEHUB_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings = toml::from_str(&config_str)
            .with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.engine.block_time_ms == 0 {
            anyhow::bail!("engine.block_time_ms must be positive");
        }
        if self.engine.event_queue_size == 0 {
            anyhow::bail!("engine.event_queue_size must be positive");
        }
        if self.params.buffer_size == 0 {
            anyhow::bail!("params.buffer_size must be positive");
        }
        if self.params.stride_commission > 100 {
            anyhow::bail!("params.stride_commission must be at most 100");
        }

        for epoch in &self.epochs {
            if epoch.duration_secs == 0 {
                anyhow::bail!("Epoch {} has a zero duration", epoch.identifier);
            }
        }

        for host_zone in &self.host_zones {
            if !self.connections.contains_key(&host_zone.connection_id) {
                anyhow::bail!(
                    "Host zone {} uses unknown connection {}",
                    host_zone.chain_id,
                    host_zone.connection_id
                );
            }
            if host_zone.validators.is_empty() {
                tracing::warn!("Host zone {} has no validators - deposits cannot be delegated", host_zone.chain_id);
            }
        }

        for rate_limit in &self.rate_limits {
            validate_update(&rate_limit.to_proposal())
                .with_context(|| format!("Invalid rate limit for {} on {}", rate_limit.denom, rate_limit.channel_id))?;
        }

        if self.params.fee_receiver_address.is_empty() {
            tracing::warn!("No fee receiver address configured - fee account balances cannot be cleared");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
