//! Contract configuration: own address, custom slot admins and the critical
//! parameter registry id.

use crate::domain::access::AdminBinding;
use crate::domain::address::StdAddress;
use crate::domain::value_objects::{ParamId, CRITICAL_PARAMS_ID};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;

/// Config contract account id on the masterchain.
pub const DEFAULT_CONFIG_ADDRESS: StdAddress = StdAddress::new(-1, [0x55; 32]);

/// Default admin of parameter -1024.
pub const DEFAULT_ADMIN_1024: StdAddress = StdAddress::new(-1, [0x33; 32]);

/// Static configuration of a contract instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Address of the contract itself.
    pub config_address: StdAddress,

    /// Who administers the custom slots.
    pub admins: AdminBinding,

    /// Parameter holding the critical parameter registry.
    #[serde(default = "default_critical_params_id")]
    pub critical_params_id: ParamId,
}

fn default_critical_params_id() -> ParamId {
    CRITICAL_PARAMS_ID
}

impl Default for ContractConfig {
    /// -1025 belongs to the config address itself, -1024 to `-1:33..33`.
    fn default() -> Self {
        Self {
            config_address: DEFAULT_CONFIG_ADDRESS,
            admins: AdminBinding::Distinct {
                slot_1024: DEFAULT_ADMIN_1024,
                slot_1025: DEFAULT_CONFIG_ADDRESS,
            },
            critical_params_id: CRITICAL_PARAMS_ID,
        }
    }
}

impl ContractConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CFG_CONFIG_ADDRESS`: Contract address, raw form (default: `-1:55..55`)
    /// - `CFG_SHARED_ADMIN`: Single admin for both slots; overrides the two below
    /// - `CFG_ADMIN_1024`: Admin of -1024 (default: `-1:33..33`)
    /// - `CFG_ADMIN_1025`: Admin of -1025 (default: the contract address)
    /// - `CFG_CRITICAL_PARAMS_ID`: Registry parameter (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let address = |var: &'static str, default: StdAddress| -> Result<StdAddress, ConfigError> {
            match lookup(var) {
                Some(raw) => raw
                    .parse()
                    .map_err(|source| ConfigError::InvalidAddress { var, source }),
                None => Ok(default),
            }
        };

        let config_address = address("CFG_CONFIG_ADDRESS", DEFAULT_CONFIG_ADDRESS)?;

        let admins = match lookup("CFG_SHARED_ADMIN") {
            Some(_) => AdminBinding::Shared {
                admin: address("CFG_SHARED_ADMIN", config_address)?,
            },
            None => AdminBinding::Distinct {
                slot_1024: address("CFG_ADMIN_1024", DEFAULT_ADMIN_1024)?,
                slot_1025: address("CFG_ADMIN_1025", config_address)?,
            },
        };

        let critical_params_id = match lookup("CFG_CRITICAL_PARAMS_ID") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidInteger {
                var: "CFG_CRITICAL_PARAMS_ID",
                value,
            })?,
            None => CRITICAL_PARAMS_ID,
        };

        Ok(Self {
            config_address,
            admins,
            critical_params_id,
        })
    }
}
