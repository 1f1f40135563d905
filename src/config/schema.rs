use serde::{Deserialize, Serialize};

use crate::registry::{EstimationConfig, RegistryConfig};
use crate::valuation::ValuationConfig;

/// Top-level config file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub valuation: ValuationConfig,

    #[serde(default)]
    pub estimation: EstimationConfig,
}
