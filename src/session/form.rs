use serde::Serialize;

use super::state::LookupState;
use crate::error::ValuationError;
use crate::registry::VehicleDetails;
use crate::valuation::{
    value_vehicle, FuelType, UserInputs, ValuationConfig, ValuationResult, VehicleAttributes,
};

/// Vehicle fields as known so far. `None` means not supplied yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VehicleDraft {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub original_price: Option<f64>,
    pub fuel_type: Option<FuelType>,
    pub is_ulez_compliant: Option<bool>,
}

impl VehicleDraft {
    pub fn from_attributes(attributes: &VehicleAttributes) -> Self {
        Self {
            make: Some(attributes.make.clone()),
            model: Some(attributes.model.clone()),
            year: Some(attributes.year),
            original_price: Some(attributes.original_price),
            fuel_type: Some(attributes.fuel_type.clone()),
            is_ulez_compliant: Some(attributes.is_ulez_compliant),
        }
    }

    /// Fields set in `overrides` win over the ones already here.
    pub fn merge(self, overrides: VehicleDraft) -> Self {
        Self {
            make: overrides.make.or(self.make),
            model: overrides.model.or(self.model),
            year: overrides.year.or(self.year),
            original_price: overrides.original_price.or(self.original_price),
            fuel_type: overrides.fuel_type.or(self.fuel_type),
            is_ulez_compliant: overrides.is_ulez_compliant.or(self.is_ulez_compliant),
        }
    }
}

/// Snapshot of the in-progress valuation form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValuationForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    pub vehicle: VehicleDraft,
    pub inputs: UserInputs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<VehicleDetails>,
}

impl ValuationForm {
    pub fn new(inputs: UserInputs) -> Self {
        Self {
            inputs,
            ..Default::default()
        }
    }

    /// Fold a finished lookup into the form. A resolved lookup supplies the
    /// vehicle defaults; a fallback only records the registration.
    pub fn apply_lookup(self, state: &LookupState) -> Self {
        match state {
            LookupState::Resolved {
                registration,
                vehicle,
            } => Self {
                registration: Some(registration.clone()),
                vehicle: VehicleDraft::from_attributes(&vehicle.attributes),
                details: Some(vehicle.details.clone()),
                ..self
            },
            LookupState::Fallback { registration, .. } => Self {
                registration: Some(registration.clone()),
                ..self
            },
            LookupState::AwaitingRegistration | LookupState::LookupInFlight { .. } => self,
        }
    }

    pub fn with_overrides(self, overrides: VehicleDraft) -> Self {
        Self {
            vehicle: self.vehicle.merge(overrides),
            ..self
        }
    }

    pub fn with_inputs(self, inputs: UserInputs) -> Self {
        Self { inputs, ..self }
    }

    /// Build engine input. Year and original price have no sensible default.
    pub fn vehicle_attributes(&self) -> Result<VehicleAttributes, ValuationError> {
        let mut missing = Vec::new();
        if self.vehicle.year.is_none() {
            missing.push("year");
        }
        if self.vehicle.original_price.is_none() {
            missing.push("original price");
        }
        if !missing.is_empty() {
            return Err(ValuationError::invalid(format!(
                "missing required vehicle details: {}",
                missing.join(", ")
            )));
        }

        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("Unknown")
                .to_string()
        };

        Ok(VehicleAttributes {
            make: non_empty(&self.vehicle.make),
            model: non_empty(&self.vehicle.model),
            year: self.vehicle.year.unwrap_or_default(),
            fuel_type: self.vehicle.fuel_type.clone().unwrap_or_default(),
            original_price: self.vehicle.original_price.unwrap_or_default(),
            is_ulez_compliant: self.vehicle.is_ulez_compliant.unwrap_or(true),
        })
    }

    pub fn value(
        &self,
        config: &ValuationConfig,
        current_year: i32,
    ) -> Result<ValuationResult, ValuationError> {
        let vehicle = self.vehicle_attributes()?;
        value_vehicle(&vehicle, &self.inputs, config, current_year)
    }
}
