use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValuationError;

/// One row of a categorical factor table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorEntry {
    pub key: &'static str,
    pub multiplier: f64,
    pub description: &'static str,
}

pub const CONDITION_FACTORS: [FactorEntry; 5] = [
    FactorEntry { key: "excellent", multiplier: 1.08, description: "Like new, no visible wear" },
    FactorEntry { key: "verygood", multiplier: 1.03, description: "Minor wear, well maintained" },
    FactorEntry { key: "good", multiplier: 0.98, description: "Normal wear, good condition" },
    FactorEntry { key: "fair", multiplier: 0.85, description: "Noticeable issues, some repairs needed" },
    FactorEntry { key: "poor", multiplier: 0.70, description: "Significant issues, major repairs needed" },
];

pub const SERVICE_HISTORY_FACTORS: [FactorEntry; 3] = [
    FactorEntry { key: "full", multiplier: 1.05, description: "Complete service record" },
    FactorEntry { key: "partial", multiplier: 1.00, description: "Some service records" },
    FactorEntry { key: "none", multiplier: 0.90, description: "No service records" },
];

pub const MOT_FACTORS: [FactorEntry; 3] = [
    FactorEntry { key: "current", multiplier: 1.03, description: "Current MOT with no advisories" },
    FactorEntry { key: "advisories", multiplier: 1.00, description: "Current MOT with minor advisories" },
    FactorEntry { key: "expired", multiplier: 0.85, description: "Expired or significant issues" },
];

/// Factor applied to brands and fuels that have no entry in the market tables.
pub const UNKNOWN_MARKET_FACTOR: f64 = 0.98;

/// Look up a table row by key (case-insensitive).
pub fn lookup<'a>(
    table_name: &'static str,
    table: &'a [FactorEntry],
    key: &str,
) -> Result<&'a FactorEntry, ValuationError> {
    let key = key.trim();
    table
        .iter()
        .find(|entry| entry.key.eq_ignore_ascii_case(key))
        .ok_or_else(|| ValuationError::UnknownFactorKey {
            table: table_name,
            key: key.to_string(),
        })
}

fn parse_variant<T: Copy>(
    table_name: &'static str,
    table: &[FactorEntry],
    variants: &[T],
    entry_of: fn(&T) -> &'static FactorEntry,
    key: &str,
) -> Result<T, ValuationError> {
    let entry = lookup(table_name, table, key)?;
    variants
        .iter()
        .copied()
        .find(|variant| entry_of(variant).key == entry.key)
        .ok_or_else(|| ValuationError::UnknownFactorKey {
            table: table_name,
            key: key.trim().to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Excellent,
    VeryGood,
    #[default]
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::Excellent,
        Condition::VeryGood,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    pub fn entry(&self) -> &'static FactorEntry {
        match self {
            Condition::Excellent => &CONDITION_FACTORS[0],
            Condition::VeryGood => &CONDITION_FACTORS[1],
            Condition::Good => &CONDITION_FACTORS[2],
            Condition::Fair => &CONDITION_FACTORS[3],
            Condition::Poor => &CONDITION_FACTORS[4],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHistory {
    #[default]
    Full,
    Partial,
    None,
}

impl ServiceHistory {
    pub const ALL: [ServiceHistory; 3] = [
        ServiceHistory::Full,
        ServiceHistory::Partial,
        ServiceHistory::None,
    ];

    pub fn entry(&self) -> &'static FactorEntry {
        match self {
            ServiceHistory::Full => &SERVICE_HISTORY_FACTORS[0],
            ServiceHistory::Partial => &SERVICE_HISTORY_FACTORS[1],
            ServiceHistory::None => &SERVICE_HISTORY_FACTORS[2],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotStatus {
    #[default]
    Current,
    Advisories,
    Expired,
}

impl MotStatus {
    pub const ALL: [MotStatus; 3] = [MotStatus::Current, MotStatus::Advisories, MotStatus::Expired];

    pub fn entry(&self) -> &'static FactorEntry {
        match self {
            MotStatus::Current => &MOT_FACTORS[0],
            MotStatus::Advisories => &MOT_FACTORS[1],
            MotStatus::Expired => &MOT_FACTORS[2],
        }
    }
}

impl FromStr for Condition {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("condition", &CONDITION_FACTORS, &Condition::ALL, Condition::entry, s)
    }
}

impl FromStr for ServiceHistory {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(
            "service history",
            &SERVICE_HISTORY_FACTORS,
            &ServiceHistory::ALL,
            ServiceHistory::entry,
            s,
        )
    }
}

impl FromStr for MotStatus {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant("MOT status", &MOT_FACTORS, &MotStatus::ALL, MotStatus::entry, s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry().key)
    }
}

impl fmt::Display for ServiceHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry().key)
    }
}

impl fmt::Display for MotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry().key)
    }
}

/// Fuel type as used by the market table. Registry vocabulary that does not
/// map onto one of the four known fuels is kept lower-cased in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FuelType {
    #[default]
    Petrol,
    Diesel,
    Hybrid,
    Electric,
    Other(String),
}

impl FuelType {
    /// Infallible mapping from free text; unrecognised values become `Other`.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        match lower.as_str() {
            "petrol" => FuelType::Petrol,
            "diesel" => FuelType::Diesel,
            "hybrid" => FuelType::Hybrid,
            "electric" => FuelType::Electric,
            _ => FuelType::Other(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FuelType::Petrol => "petrol",
            FuelType::Diesel => "diesel",
            FuelType::Hybrid => "hybrid",
            FuelType::Electric => "electric",
            FuelType::Other(label) => label,
        }
    }

    pub fn market_factor(&self) -> f64 {
        match self {
            FuelType::Electric => 1.00,
            FuelType::Hybrid => 1.02,
            FuelType::Diesel => 1.00,
            FuelType::Petrol => 0.98,
            FuelType::Other(_) => UNKNOWN_MARKET_FACTOR,
        }
    }
}

/// Strict parse for manual entry: only the four known fuels are accepted.
impl FromStr for FuelType {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match FuelType::from_label(s) {
            FuelType::Other(key) => Err(ValuationError::UnknownFactorKey { table: "fuel", key }),
            fuel => Ok(fuel),
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FuelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Brands with a market trend adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketBrand {
    Bmw,
    Mercedes,
    Audi,
    Toyota,
    Honda,
    Ford,
    Vauxhall,
    Tesla,
    Ds,
    Polestar,
}

impl MarketBrand {
    /// Match a make as entered or as reported by the registry ("MERCEDES-BENZ").
    pub fn from_make(make: &str) -> Option<Self> {
        let make = make.trim().to_uppercase();
        let brand = match make.as_str() {
            "BMW" => MarketBrand::Bmw,
            "MERCEDES" | "MERCEDES-BENZ" => MarketBrand::Mercedes,
            "AUDI" => MarketBrand::Audi,
            "TOYOTA" => MarketBrand::Toyota,
            "HONDA" => MarketBrand::Honda,
            "FORD" => MarketBrand::Ford,
            "VAUXHALL" => MarketBrand::Vauxhall,
            "TESLA" => MarketBrand::Tesla,
            "DS" => MarketBrand::Ds,
            "POLESTAR" => MarketBrand::Polestar,
            _ => return None,
        };
        Some(brand)
    }

    pub fn factor(&self) -> f64 {
        match self {
            MarketBrand::Bmw => 1.02,
            MarketBrand::Mercedes => 1.05,
            MarketBrand::Audi => 1.01,
            MarketBrand::Toyota => 1.08,
            MarketBrand::Honda => 1.06,
            MarketBrand::Ford => 0.98,
            MarketBrand::Vauxhall => 0.95,
            MarketBrand::Tesla => 0.85,
            MarketBrand::Ds => 0.75,
            MarketBrand::Polestar => 0.80,
        }
    }
}

pub fn brand_factor(make: &str) -> f64 {
    MarketBrand::from_make(make)
        .map(|brand| brand.factor())
        .unwrap_or(UNKNOWN_MARKET_FACTOR)
}

/// Brand trend multiplied by fuel trend.
pub fn market_factor(make: &str, fuel: &FuelType) -> f64 {
    brand_factor(make) * fuel.market_factor()
}
