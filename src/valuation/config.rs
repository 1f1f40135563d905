use serde::{Deserialize, Serialize};

/// Upper bound on the mileage factor used when nothing is configured.
pub const DEFAULT_MILEAGE_CAP: f64 = 1.4;

/// Engine tuning.
///
/// Example YAML:
/// ```yaml
/// valuation:
///   mileage_cap: 1.4
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ValuationConfig {
    /// Ceiling on the low-mileage bonus. `null` leaves the bonus uncapped.
    #[serde(default = "default_mileage_cap")]
    pub mileage_cap: Option<f64>,
}

fn default_mileage_cap() -> Option<f64> {
    Some(DEFAULT_MILEAGE_CAP)
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            mileage_cap: default_mileage_cap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valuation_config() {
        let config = ValuationConfig::default();
        assert_eq!(config.mileage_cap, Some(1.4));
    }

    #[test]
    fn test_empty_valuation_config_parse() {
        let config: ValuationConfig = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, ValuationConfig::default());
    }

    #[test]
    fn test_uncapped_valuation_config_parse() {
        let config: ValuationConfig = serde_saphyr::from_str("mileage_cap: null\n").unwrap();
        assert!(config.mileage_cap.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ValuationConfig, _> = serde_saphyr::from_str("trade_in_ratio: 0.9\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_valuation_config_serde_roundtrip() {
        let config = ValuationConfig {
            mileage_cap: Some(1.25),
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ValuationConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
