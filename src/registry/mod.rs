pub mod client;
pub mod estimate;
pub mod normalizer;
pub mod types;

pub use client::{
    create_client, RegistryClient, RegistryConfig, RegistryError, RegistryService,
};
pub use estimate::{EstimationConfig, EstimationStrategy, HeuristicEstimator};
pub use normalizer::{normalize_record, NormalizedVehicle, VehicleDetails};
pub use types::RegistryRecord;
