//! Genesis configuration for the vault module.
//!
//! This module defines the settings a vault instance is deployed with. They
//! are fixed for the lifetime of the instance.

use cipherbid_types::{compute_contract_address, Address, ZERO_ADDRESS};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::access::DisclosurePolicy;

/// Genesis configuration for the vault module.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultGenesisConfig {
    /// Address the vault is deployed at. Encrypted inputs are bound to it.
    #[serde_as(as = "serde_with::hex::Hex")]
    pub contract_address: Address,

    /// Whether a creator may bid on their own auction
    #[serde(default = "default_allow_creator_bids")]
    pub allow_creator_bids: bool,

    /// Who besides the bidder may decrypt a bid
    #[serde(default)]
    pub disclosure_policy: DisclosurePolicy,

    /// Input size limits
    #[serde(default)]
    pub limits: VaultLimits,

    /// Substrate clock at genesis
    #[serde(default)]
    pub initial_timestamp: u64,
}

/// Size limits for auction metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultLimits {
    /// Maximum title length in bytes
    pub max_title_len: usize,
    /// Maximum description length in bytes
    pub max_description_len: usize,
}

fn default_allow_creator_bids() -> bool {
    true
}

impl Default for VaultLimits {
    fn default() -> Self {
        Self {
            max_title_len: 128,
            max_description_len: 2048,
        }
    }
}

impl Default for VaultGenesisConfig {
    fn default() -> Self {
        Self {
            contract_address: compute_contract_address(&ZERO_ADDRESS, 0),
            allow_creator_bids: default_allow_creator_bids(),
            disclosure_policy: DisclosurePolicy::default(),
            limits: VaultLimits::default(),
            initial_timestamp: 0,
        }
    }
}

impl VaultGenesisConfig {
    /// Create a config for a vault deployed at `contract_address`.
    pub fn at_address(contract_address: Address) -> Self {
        Self {
            contract_address,
            ..Default::default()
        }
    }

    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.contract_address == ZERO_ADDRESS {
            return Err(GenesisValidationError::InvalidContractAddress);
        }

        if self.limits.max_title_len == 0 {
            return Err(GenesisValidationError::InvalidLimits(
                "Maximum title length cannot be zero".into(),
            ));
        }
        if self.limits.max_description_len == 0 {
            return Err(GenesisValidationError::InvalidLimits(
                "Maximum description length cannot be zero".into(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Contract address cannot be zero")]
    InvalidContractAddress,

    #[error("Invalid limits: {0}")]
    InvalidLimits(String),
}
