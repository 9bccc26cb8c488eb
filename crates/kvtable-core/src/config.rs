//! Module: config
//! Responsibility: table identity and decode limits, from code or TOML.
//! Boundary: validation happens here; tables accept only validated configs.

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    name::{KV_RAM, Name},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Default upper bound on a single stored value.
pub const DEFAULT_MAX_VALUE_BYTES: usize = 1024 * 1024;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid table config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("table config field `{field}` must be a non-empty name")]
    EmptyName { field: &'static str },

    #[error("table config `max_value_bytes` must be greater than zero")]
    ZeroValueLimit,
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// TableConfig
///
/// Identity of one table inside the host store.
///
/// ```toml
/// contract = "alice"
/// table = "users"
/// db = "eosio.kvdisk"       # optional, defaults to eosio.kvram
/// max_value_bytes = 65536   # optional, defaults to 1 MiB
/// ```
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    pub contract: Name,
    pub table: Name,

    #[serde(default = "default_db")]
    pub db: Name,

    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,
}

impl TableConfig {
    #[must_use]
    pub const fn new(contract: Name, table: Name) -> Self {
        Self {
            contract,
            table,
            db: KV_RAM,
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
        }
    }

    #[must_use]
    pub const fn with_db(mut self, db: Name) -> Self {
        self.db = db;
        self
    }

    #[must_use]
    pub const fn with_max_value_bytes(mut self, max_value_bytes: usize) -> Self {
        self.max_value_bytes = max_value_bytes;
        self
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.contract.is_empty() {
            return Err(ConfigError::EmptyName { field: "contract" });
        }
        if self.table.is_empty() {
            return Err(ConfigError::EmptyName { field: "table" });
        }
        if self.db.is_empty() {
            return Err(ConfigError::EmptyName { field: "db" });
        }
        if self.max_value_bytes == 0 {
            return Err(ConfigError::ZeroValueLimit);
        }

        Ok(())
    }
}

const fn default_db() -> Name {
    KV_RAM
}

const fn default_max_value_bytes() -> usize {
    DEFAULT_MAX_VALUE_BYTES
}

///
/// TESTS
///
