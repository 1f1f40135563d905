use serde::Serialize;

use super::factors::{Condition, FuelType, MotStatus, ServiceHistory};

/// Oldest manufacture year accepted for a motor car.
pub const EARLIEST_MANUFACTURE_YEAR: i32 = 1885;

/// Canonical vehicle description consumed by the valuation engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleAttributes {
    pub make: String,
    pub model: String,
    /// Manufacture year
    pub year: i32,
    pub fuel_type: FuelType,
    /// Price when new in GBP, either estimated or entered by the user
    pub original_price: f64,
    pub is_ulez_compliant: bool,
}

/// Owner-supplied state of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UserInputs {
    pub current_mileage: u32,
    pub condition: Condition,
    pub service_history: ServiceHistory,
    pub mot_status: MotStatus,
}

impl VehicleAttributes {
    /// Age in whole calendar years. Negative when the manufacture year is in the future.
    pub fn age(&self, current_year: i32) -> i32 {
        current_year.saturating_sub(self.year)
    }

    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.year)
    }
}
