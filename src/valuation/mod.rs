pub mod config;
pub mod engine;
pub mod factors;
pub mod vehicle;

use chrono::{Datelike, Utc};

pub use config::*;
pub use engine::{value_vehicle, value_vehicle_now, FactorContribution, ValuationResult};
pub use factors::{Condition, FactorEntry, FuelType, MotStatus, ServiceHistory};
pub use vehicle::{UserInputs, VehicleAttributes, EARLIEST_MANUFACTURE_YEAR};

/// Current calendar year (UTC).
pub fn current_year() -> i32 {
    Utc::now().year()
}
