pub mod form;
pub mod state;

pub use form::{ValuationForm, VehicleDraft};
pub use state::{normalize_registration, LookupFailure, LookupState, Orchestrator};
