use serde::Serialize;

use super::config::ValuationConfig;
use super::factors::{brand_factor, market_factor};
use super::vehicle::{UserInputs, VehicleAttributes, EARLIEST_MANUFACTURE_YEAR};
use crate::error::ValuationError;

/// Share of market value a dealer offers in part-exchange.
pub const TRADE_IN_RATIO: f64 = 0.85;
/// UK standard annual mileage.
pub const ANNUAL_MILEAGE: u32 = 10_000;
pub const MILEAGE_FLOOR: f64 = 0.6;
pub const NON_COMPLIANT_FACTOR: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorContribution {
    pub label: &'static str,  // e.g. "Age", "Mileage", "ULEZ"
    pub description: String, // e.g. "3 years", "Normal wear, good condition"
    pub multiplier: f64,
    pub before: f64, // Value before this factor
    pub after: f64,  // Value after this factor
}

/// The seven factors as percentages, one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorPercentages {
    pub age: f64,
    pub mileage: f64,
    pub condition: f64,
    pub service_history: f64,
    pub mot: f64,
    pub market: f64,
    pub ulez: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationBreakdown {
    pub base_value: f64,
    pub age: i32,
    pub mileage: u32,
    pub expected_mileage: u64,
    /// Percentage of the original price lost, one decimal place
    pub total_depreciation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult {
    pub market_value: u64,
    pub trade_in_value: u64,
    pub factors: FactorPercentages,
    pub breakdown: ValuationBreakdown,
    pub contributions: Vec<FactorContribution>,
}

/// Share of the original price retained at a given age.
pub fn age_factor(age: i32) -> f64 {
    match age {
        i32::MIN..=1 => 0.80,
        2 => 0.70,
        3 => 0.61,
        4 => 0.55,
        5 => 0.50,
        6..=8 => 0.40 - f64::from(age - 5) * 0.03,
        9..=10 => 0.30,
        _ => 0.20,
    }
}

/// Adjustment for mileage relative to `age` years of average use.
///
/// A brand-new vehicle has no expected mileage, so the factor is neutral.
pub fn mileage_factor(actual_mileage: u32, age: i32, cap: Option<f64>) -> f64 {
    let expected = f64::from(age.max(0)) * f64::from(ANNUAL_MILEAGE);
    if expected == 0.0 {
        return 1.0;
    }
    let variance = (f64::from(actual_mileage) - expected) / expected;
    let factor = (1.0 - variance * 0.4).max(MILEAGE_FLOOR);
    match cap {
        Some(cap) => factor.min(cap),
        None => factor,
    }
}

pub fn ulez_factor(is_compliant: bool) -> f64 {
    if is_compliant {
        1.00
    } else {
        NON_COMPLIANT_FACTOR
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(factor: f64) -> f64 {
    round1(factor * 100.0)
}

fn validate(
    vehicle: &VehicleAttributes,
    config: &ValuationConfig,
    current_year: i32,
) -> Result<(), ValuationError> {
    if !vehicle.original_price.is_finite() {
        return Err(ValuationError::invalid("original price must be a number"));
    }
    if vehicle.original_price <= 0.0 {
        return Err(ValuationError::invalid(format!(
            "original price must be positive, got {}",
            vehicle.original_price
        )));
    }
    if vehicle.year < EARLIEST_MANUFACTURE_YEAR {
        return Err(ValuationError::invalid(format!(
            "manufacture year {} is before {}",
            vehicle.year, EARLIEST_MANUFACTURE_YEAR
        )));
    }
    if vehicle.year > current_year {
        return Err(ValuationError::invalid(format!(
            "manufacture year {} is in the future (current year {})",
            vehicle.year, current_year
        )));
    }
    if let Some(cap) = config.mileage_cap {
        if !cap.is_finite() {
            return Err(ValuationError::invalid("mileage cap must be a finite number"));
        }
    }
    Ok(())
}

/// Value a vehicle as of `current_year`.
///
/// All inputs are checked before any factor is computed, so an error never
/// comes with a partial result.
pub fn value_vehicle(
    vehicle: &VehicleAttributes,
    inputs: &UserInputs,
    config: &ValuationConfig,
    current_year: i32,
) -> Result<ValuationResult, ValuationError> {
    validate(vehicle, config, current_year)?;

    let age = vehicle.age(current_year);
    let expected_mileage = u64::from(age.unsigned_abs()) * u64::from(ANNUAL_MILEAGE);

    let condition = inputs.condition.entry();
    let service = inputs.service_history.entry();
    let mot = inputs.mot_status.entry();
    let market = market_factor(&vehicle.make, &vehicle.fuel_type);
    let ulez = ulez_factor(vehicle.is_ulez_compliant);
    let age_f = age_factor(age);
    let mileage_f = mileage_factor(inputs.current_mileage, age, config.mileage_cap);

    let steps: [(&'static str, f64, String); 7] = [
        ("Age", age_f, format!("{} years", age)),
        (
            "Mileage",
            mileage_f,
            format!(
                "{} miles vs {} expected",
                inputs.current_mileage, expected_mileage
            ),
        ),
        ("Condition", condition.multiplier, condition.description.to_string()),
        ("Service History", service.multiplier, service.description.to_string()),
        ("MOT", mot.multiplier, mot.description.to_string()),
        (
            "Market",
            market,
            format!(
                "{} x{} / {} x{}",
                vehicle.make,
                brand_factor(&vehicle.make),
                vehicle.fuel_type,
                vehicle.fuel_type.market_factor()
            ),
        ),
        (
            "ULEZ",
            ulez,
            if vehicle.is_ulez_compliant {
                "compliant".to_string()
            } else {
                "not compliant".to_string()
            },
        ),
    ];

    let mut value = vehicle.original_price;
    let mut contributions = Vec::with_capacity(steps.len());
    for (label, multiplier, description) in steps {
        let before = value;
        value *= multiplier;
        contributions.push(FactorContribution {
            label,
            description,
            multiplier,
            before,
            after: value,
        });
    }

    let market_value = value.round() as u64;
    let trade_in_value = (market_value as f64 * TRADE_IN_RATIO).round() as u64;
    let total_depreciation = round1((1.0 - market_value as f64 / vehicle.original_price) * 100.0);

    Ok(ValuationResult {
        market_value,
        trade_in_value,
        factors: FactorPercentages {
            age: percent(age_f),
            mileage: percent(mileage_f),
            condition: percent(condition.multiplier),
            service_history: percent(service.multiplier),
            mot: percent(mot.multiplier),
            market: percent(market),
            ulez: percent(ulez),
        },
        breakdown: ValuationBreakdown {
            base_value: vehicle.original_price,
            age,
            mileage: inputs.current_mileage,
            expected_mileage,
            total_depreciation,
        },
        contributions,
    })
}

/// Value a vehicle as of the current calendar year.
pub fn value_vehicle_now(
    vehicle: &VehicleAttributes,
    inputs: &UserInputs,
    config: &ValuationConfig,
) -> Result<ValuationResult, ValuationError> {
    value_vehicle(vehicle, inputs, config, super::current_year())
}
