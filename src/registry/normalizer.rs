use serde::Serialize;
use tracing::debug;

use super::estimate::EstimationStrategy;
use super::types::RegistryRecord;
use crate::valuation::{FuelType, VehicleAttributes, EARLIEST_MANUFACTURE_YEAR};

const UNKNOWN: &str = "Unknown";
/// Assumed age when the registry does not report a manufacture year.
const DEFAULT_AGE_YEARS: i32 = 5;

/// Registry fields that are shown to the user but do not affect the valuation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleDetails {
    /// e.g. "1998cc"
    pub engine_size: String,
    pub colour: String,
    pub tax_status: String,
    pub mot_status: String,
    pub co2_emissions: String,
    pub euro_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mot_expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_last_v5c_issued: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedVehicle {
    pub attributes: VehicleAttributes,
    pub details: VehicleDetails,
}

/// Map registry fuel vocabulary onto the market fuel types.
pub fn normalize_fuel(raw: Option<&str>) -> FuelType {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return FuelType::Petrol;
    };
    match raw.to_lowercase().as_str() {
        "electricity" => FuelType::Electric,
        "heavy oil" => FuelType::Diesel,
        "petrol" => FuelType::Petrol,
        other => FuelType::from_label(other),
    }
}

fn text_or_unknown(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Turn a raw registry record into valuation inputs plus display details.
pub fn normalize_record(
    record: &RegistryRecord,
    estimator: &dyn EstimationStrategy,
    current_year: i32,
) -> NormalizedVehicle {
    let make = text_or_unknown(&record.make);
    let model = text_or_unknown(&record.model);
    // Out-of-range years are treated as unreported
    let year = record
        .year_of_manufacture
        .and_then(|y| i32::try_from(y).ok())
        .filter(|y| (EARLIEST_MANUFACTURE_YEAR..=current_year).contains(y))
        .unwrap_or(current_year - DEFAULT_AGE_YEARS);
    let fuel_type = normalize_fuel(record.fuel_type.as_deref());
    let engine_cc = record
        .engine_capacity
        .and_then(|cc| u32::try_from(cc).ok())
        .filter(|cc| *cc > 0);

    let original_price = estimator.estimate_original_price(&make, year, engine_cc, current_year);
    let is_ulez_compliant = estimator.is_ulez_compliant(&fuel_type, year);

    let details = VehicleDetails {
        engine_size: engine_cc
            .map(|cc| format!("{}cc", cc))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        colour: text_or_unknown(&record.colour),
        tax_status: text_or_unknown(&record.tax_status),
        mot_status: text_or_unknown(&record.mot_status),
        co2_emissions: record
            .co2_emissions
            .map(|g| format!("{} g/km", g))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        euro_status: text_or_unknown(&record.euro_status),
        tax_due_date: record.tax_due_date.clone(),
        mot_expiry_date: record.mot_expiry_date.clone(),
        date_of_last_v5c_issued: record.date_of_last_v5c_issued.clone(),
    };

    let attributes = VehicleAttributes {
        make,
        model,
        year,
        fuel_type,
        original_price,
        is_ulez_compliant,
    };

    debug!(
        make = %attributes.make,
        model = %attributes.model,
        year = attributes.year,
        fuel = %attributes.fuel_type,
        original_price = attributes.original_price,
        ulez = attributes.is_ulez_compliant,
        "normalized registry record"
    );

    NormalizedVehicle {
        attributes,
        details,
    }
}
