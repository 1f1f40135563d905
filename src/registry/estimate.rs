use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::valuation::FuelType;

/// Business heuristics used when a registry record has no price or emissions data.
///
/// Kept behind a trait so the tables can be replaced without touching the engine.
pub trait EstimationStrategy: Send + Sync {
    /// Estimated price when new, in GBP, rounded to the nearest pound.
    fn estimate_original_price(
        &self,
        make: &str,
        year: i32,
        engine_capacity_cc: Option<u32>,
        current_year: i32,
    ) -> f64;

    /// Whether the vehicle is likely allowed into the Ultra Low Emission Zone.
    fn is_ulez_compliant(&self, fuel: &FuelType, year: i32) -> bool;
}

pub const DEFAULT_BASE_PRICE: f64 = 25_000.0;
pub const DEFAULT_PETROL_CUTOFF_YEAR: i32 = 2005;
pub const DEFAULT_DIESEL_CUTOFF_YEAR: i32 = 2015;

const BRAND_BASE_PRICES: [(&str, f64); 21] = [
    ("BMW", 35_000.0),
    ("MERCEDES-BENZ", 40_000.0),
    ("MERCEDES", 40_000.0),
    ("AUDI", 35_000.0),
    ("TOYOTA", 25_000.0),
    ("HONDA", 24_000.0),
    ("FORD", 20_000.0),
    ("VAUXHALL", 18_000.0),
    ("VOLKSWAGEN", 28_000.0),
    ("NISSAN", 22_000.0),
    ("HYUNDAI", 20_000.0),
    ("JAGUAR", 45_000.0),
    ("LAND ROVER", 50_000.0),
    ("PORSCHE", 70_000.0),
    ("TESLA", 45_000.0),
    ("VOLVO", 35_000.0),
    ("MINI", 25_000.0),
    ("PEUGEOT", 22_000.0),
    ("RENAULT", 20_000.0),
    ("SKODA", 24_000.0),
    ("SEAT", 22_000.0),
];

/// Price estimation overrides.
///
/// Example YAML:
/// ```yaml
/// estimation:
///   default_base_price: 25000
///   brand_base_prices:
///     CUPRA: 30000
///   petrol_cutoff_year: 2005
///   diesel_cutoff_year: 2015
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EstimationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_base_price: Option<f64>,

    /// Merged over the built-in table; keys are matched case-insensitively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_base_prices: Option<HashMap<String, f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub petrol_cutoff_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diesel_cutoff_year: Option<i32>,
}

/// Table-driven estimator: brand base price, straight-line age depreciation
/// with a 60% floor, and an engine-size multiplier.
#[derive(Debug, Clone)]
pub struct HeuristicEstimator {
    brand_prices: HashMap<String, f64>,
    default_base_price: f64,
    petrol_cutoff_year: i32,
    diesel_cutoff_year: i32,
}

impl Default for HeuristicEstimator {
    fn default() -> Self {
        Self {
            brand_prices: BRAND_BASE_PRICES
                .iter()
                .map(|(brand, price)| (brand.to_string(), *price))
                .collect(),
            default_base_price: DEFAULT_BASE_PRICE,
            petrol_cutoff_year: DEFAULT_PETROL_CUTOFF_YEAR,
            diesel_cutoff_year: DEFAULT_DIESEL_CUTOFF_YEAR,
        }
    }
}

impl HeuristicEstimator {
    pub fn from_config(config: &EstimationConfig) -> Self {
        let mut estimator = Self::default();
        if let Some(price) = config.default_base_price {
            estimator.default_base_price = price;
        }
        if let Some(ref overrides) = config.brand_base_prices {
            for (brand, price) in overrides {
                estimator
                    .brand_prices
                    .insert(brand.trim().to_uppercase(), *price);
            }
        }
        if let Some(year) = config.petrol_cutoff_year {
            estimator.petrol_cutoff_year = year;
        }
        if let Some(year) = config.diesel_cutoff_year {
            estimator.diesel_cutoff_year = year;
        }
        estimator
    }

    pub fn base_price(&self, make: &str) -> f64 {
        self.brand_prices
            .get(&make.trim().to_uppercase())
            .copied()
            .unwrap_or(self.default_base_price)
    }
}

impl EstimationStrategy for HeuristicEstimator {
    fn estimate_original_price(
        &self,
        make: &str,
        year: i32,
        engine_capacity_cc: Option<u32>,
        current_year: i32,
    ) -> f64 {
        let base = self.base_price(make);
        let year_factor = (1.0 - f64::from(current_year.saturating_sub(year)) * 0.08).max(0.6);
        let engine_factor = match engine_capacity_cc {
            Some(cc) if cc > 0 => (f64::from(cc) / 1800.0).clamp(0.7, 1.8),
            _ => 1.0,
        };
        (base * year_factor * engine_factor).round()
    }

    fn is_ulez_compliant(&self, fuel: &FuelType, year: i32) -> bool {
        match fuel {
            FuelType::Electric => true,
            FuelType::Petrol => year >= self.petrol_cutoff_year,
            FuelType::Diesel => year >= self.diesel_cutoff_year,
            FuelType::Hybrid | FuelType::Other(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2026;

    #[test]
    fn test_brand_table_lookup() {
        let estimator = HeuristicEstimator::default();
        assert_eq!(estimator.base_price("BMW"), 35_000.0);
        assert_eq!(estimator.base_price("porsche"), 70_000.0);
        assert_eq!(estimator.base_price("Land Rover"), 50_000.0);
        assert_eq!(estimator.base_price("Lada"), 25_000.0);
    }

    #[test]
    fn test_new_vehicle_without_engine_size() {
        let estimator = HeuristicEstimator::default();
        assert_eq!(estimator.estimate_original_price("BMW", YEAR, None, YEAR), 35_000.0);
    }

    #[test]
    fn test_year_factor_linear_then_floored() {
        let estimator = HeuristicEstimator::default();
        // 2 years: 1 - 0.16 = 0.84
        assert_eq!(estimator.estimate_original_price("FORD", YEAR - 2, None, YEAR), 16_800.0);
        // 10 years: 1 - 0.8 = 0.2, floored at 0.6
        assert_eq!(estimator.estimate_original_price("FORD", YEAR - 10, None, YEAR), 12_000.0);
    }

    #[test]
    fn test_extreme_years_hit_the_floor() {
        let estimator = HeuristicEstimator::default();
        assert_eq!(estimator.estimate_original_price("FORD", i32::MIN, None, YEAR), 12_000.0);
        assert_eq!(estimator.estimate_original_price("FORD", 1885, None, YEAR), 12_000.0);
    }

    #[test]
    fn test_engine_factor_clamped() {
        let estimator = HeuristicEstimator::default();
        // 3600cc / 1800 = 2.0, clamped to 1.8
        assert_eq!(estimator.estimate_original_price("TOYOTA", YEAR, Some(3600), YEAR), 45_000.0);
        // 999cc / 1800 = 0.555, clamped to 0.7
        assert_eq!(estimator.estimate_original_price("TOYOTA", YEAR, Some(999), YEAR), 17_500.0);
        // 2700cc / 1800 = 1.5
        assert_eq!(estimator.estimate_original_price("TOYOTA", YEAR, Some(2700), YEAR), 37_500.0);
        // Zero capacity is treated as unknown
        assert_eq!(estimator.estimate_original_price("TOYOTA", YEAR, Some(0), YEAR), 25_000.0);
    }

    #[test]
    fn test_ulez_rules() {
        let estimator = HeuristicEstimator::default();
        assert!(estimator.is_ulez_compliant(&FuelType::Electric, 1998));
        assert!(estimator.is_ulez_compliant(&FuelType::Petrol, 2005));
        assert!(!estimator.is_ulez_compliant(&FuelType::Petrol, 2004));
        assert!(estimator.is_ulez_compliant(&FuelType::Diesel, 2015));
        assert!(!estimator.is_ulez_compliant(&FuelType::Diesel, 2014));
        assert!(!estimator.is_ulez_compliant(&FuelType::Hybrid, 2020));
        assert!(!estimator.is_ulez_compliant(&FuelType::Other("gas".to_string()), 2020));
    }

    #[test]
    fn test_config_overrides() {
        let mut brands = HashMap::new();
        brands.insert("cupra".to_string(), 30_000.0);
        brands.insert("BMW".to_string(), 38_000.0);
        let estimator = HeuristicEstimator::from_config(&EstimationConfig {
            default_base_price: Some(20_000.0),
            brand_base_prices: Some(brands),
            petrol_cutoff_year: Some(2006),
            diesel_cutoff_year: None,
        });

        assert_eq!(estimator.base_price("Cupra"), 30_000.0);
        assert_eq!(estimator.base_price("BMW"), 38_000.0);
        assert_eq!(estimator.base_price("AUDI"), 35_000.0);
        assert_eq!(estimator.base_price("Lada"), 20_000.0);
        assert!(!estimator.is_ulez_compliant(&FuelType::Petrol, 2005));
        assert!(estimator.is_ulez_compliant(&FuelType::Diesel, 2015));
    }

    #[test]
    fn test_estimation_config_parse() {
        let yaml = r#"
default_base_price: 21000
brand_base_prices:
  CUPRA: 30000
diesel_cutoff_year: 2016
"#;
        let config: EstimationConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.default_base_price, Some(21000.0));
        assert_eq!(config.brand_base_prices.unwrap().get("CUPRA"), Some(&30000.0));
        assert!(config.petrol_cutoff_year.is_none());
        assert_eq!(config.diesel_cutoff_year, Some(2016));
    }
}
