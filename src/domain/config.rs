use crate::domain::network::NetworkId;
use crate::error::{ConfigError, RoutingError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_enabled() -> bool {
    true
}

/// One network a merchant is willing to settle on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub network: NetworkId,
    /// Lower value wins. Unique among enabled entries.
    pub priority: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl NetworkEntry {
    pub fn new(network: NetworkId, priority: u32, enabled: bool) -> Self {
        Self {
            network,
            priority,
            enabled,
        }
    }
}

/// Per-merchant routing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantConfig {
    /// Used when no candidate survives filtering; does not need to be enabled.
    pub fallback_network: NetworkId,
    pub networks: Vec<NetworkEntry>,
    pub max_gas_price_gwei: Decimal,
    #[serde(default)]
    pub ai_enabled: bool,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            fallback_network: NetworkId::Ethereum,
            networks: vec![
                NetworkEntry::new(NetworkId::Ethereum, 1, true),
                NetworkEntry::new(NetworkId::Polygon, 2, true),
                NetworkEntry::new(NetworkId::Optimism, 3, true),
                NetworkEntry::new(NetworkId::Arbitrum, 4, true),
            ],
            max_gas_price_gwei: dec!(100),
            ai_enabled: true,
        }
    }
}

impl MerchantConfig {
    /// Checks the invariants writers are expected to uphold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_gas_price_gwei <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "max_gas_price_gwei must be positive, got {}",
                self.max_gas_price_gwei
            )));
        }

        let mut listed = HashSet::new();
        let mut priorities = HashSet::new();
        for entry in &self.networks {
            if !listed.insert(entry.network) {
                return Err(ConfigError::Invalid(format!(
                    "network {} is listed more than once",
                    entry.network
                )));
            }
            if entry.priority == 0 {
                return Err(ConfigError::Invalid(format!(
                    "priority of {} must be a positive integer",
                    entry.network
                )));
            }
            if entry.enabled && !priorities.insert(entry.priority) {
                return Err(ConfigError::Invalid(format!(
                    "priority {} is shared by more than one enabled network",
                    entry.priority
                )));
            }
        }
        Ok(())
    }

    pub fn enabled_networks(&self) -> impl Iterator<Item = &NetworkEntry> {
        self.networks.iter().filter(|entry| entry.enabled)
    }

    pub fn is_enabled(&self, network: NetworkId) -> bool {
        self.enabled_networks().any(|entry| entry.network == network)
    }

    /// Priority of an enabled network.
    pub fn priority_of(&self, network: NetworkId) -> Option<u32> {
        self.enabled_networks()
            .find(|entry| entry.network == network)
            .map(|entry| entry.priority)
    }

    /// Enabled networks narrowed to the request's preferred list, when it has one.
    pub fn candidates(&self, preferences: &RoutingPreferences) -> Vec<NetworkId> {
        self.enabled_networks()
            .map(|entry| entry.network)
            .filter(|network| {
                preferences.preferred_networks.is_empty()
                    || preferences.preferred_networks.contains(network)
            })
            .collect()
    }
}

/// Per-request constraints layered on top of the merchant config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPreferences {
    pub max_fee_percent: Decimal,
    /// Upper bound on acceptable confirmation time, in seconds.
    #[serde(alias = "min_confirmation_seconds")]
    pub max_confirmation_seconds: Decimal,
    #[serde(default)]
    pub use_ai_fallback: bool,
    #[serde(default)]
    pub preferred_networks: Vec<NetworkId>,
    /// Payment amount, in the selected network's fee token.
    #[serde(default)]
    pub amount: Decimal,
}

impl Default for RoutingPreferences {
    fn default() -> Self {
        Self {
            max_fee_percent: dec!(5),
            max_confirmation_seconds: dec!(30),
            use_ai_fallback: true,
            preferred_networks: NetworkId::ALL.to_vec(),
            amount: Decimal::ZERO,
        }
    }
}

impl RoutingPreferences {
    pub fn validate(&self) -> Result<(), RoutingError> {
        if self.max_fee_percent < Decimal::ZERO {
            return Err(RoutingError::InvalidPreferences(format!(
                "max_fee_percent must not be negative, got {}",
                self.max_fee_percent
            )));
        }
        if self.max_confirmation_seconds <= Decimal::ZERO {
            return Err(RoutingError::InvalidPreferences(format!(
                "max_confirmation_seconds must be positive, got {}",
                self.max_confirmation_seconds
            )));
        }
        if self.amount < Decimal::ZERO {
            return Err(RoutingError::InvalidPreferences(format!(
                "amount must not be negative, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}
