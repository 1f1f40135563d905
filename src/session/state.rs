use serde::Serialize;
use tracing::{info, warn};

use crate::error::{LookupErrorCategory, ValuationError};
use crate::registry::{
    normalize_record, EstimationStrategy, NormalizedVehicle, RegistryError, RegistryRecord,
    RegistryService,
};

/// A classified registry failure, kept so the caller can explain the fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupFailure {
    pub category: LookupErrorCategory,
    pub message: String,
}

impl LookupFailure {
    pub fn to_error(&self) -> ValuationError {
        ValuationError::LookupFailed {
            category: self.category,
            message: self.message.clone(),
        }
    }
}

impl From<&RegistryError> for LookupFailure {
    fn from(err: &RegistryError) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

/// Registration lookup progress. Transitions return a new state and leave
/// the old one untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupState {
    #[default]
    AwaitingRegistration,
    LookupInFlight {
        registration: String,
    },
    Resolved {
        registration: String,
        vehicle: NormalizedVehicle,
    },
    /// Lookup failed; the user continues with manual entry
    Fallback {
        registration: String,
        failure: LookupFailure,
    },
}

/// Strip all whitespace and upper-case, e.g. "ab21 abc" -> "AB21ABC".
pub fn normalize_registration(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

impl LookupState {
    pub fn registration(&self) -> Option<&str> {
        match self {
            LookupState::AwaitingRegistration => None,
            LookupState::LookupInFlight { registration }
            | LookupState::Resolved { registration, .. }
            | LookupState::Fallback { registration, .. } => Some(registration),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, LookupState::LookupInFlight { .. })
    }

    /// Start a lookup. Rejected while another lookup is in flight.
    pub fn begin(&self, raw_registration: &str) -> Result<LookupState, ValuationError> {
        if self.is_in_flight() {
            return Err(ValuationError::invalid("a registration lookup is already in progress"));
        }
        let registration = normalize_registration(raw_registration);
        if registration.is_empty() {
            return Err(ValuationError::invalid("please enter a registration number"));
        }
        Ok(LookupState::LookupInFlight { registration })
    }

    /// Finish the in-flight lookup with the registry outcome.
    pub fn complete(
        &self,
        outcome: Result<RegistryRecord, RegistryError>,
        estimator: &dyn EstimationStrategy,
        current_year: i32,
    ) -> Result<LookupState, ValuationError> {
        let LookupState::LookupInFlight { registration } = self else {
            return Err(ValuationError::invalid("no registration lookup is in progress"));
        };
        let registration = registration.clone();

        Ok(match outcome {
            Ok(record) => LookupState::Resolved {
                vehicle: normalize_record(&record, estimator, current_year),
                registration,
            },
            Err(err) => LookupState::Fallback {
                failure: LookupFailure::from(&err),
                registration,
            },
        })
    }
}

/// Drives a single registry lookup through the state machine.
pub struct Orchestrator<R> {
    registry: R,
    estimator: Box<dyn EstimationStrategy>,
    current_year: i32,
}

impl<R: RegistryService> Orchestrator<R> {
    pub fn new(registry: R, estimator: impl EstimationStrategy + 'static) -> Self {
        Self {
            registry,
            estimator: Box::new(estimator),
            current_year: crate::valuation::current_year(),
        }
    }

    /// Pin the calendar year used for price estimation.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Issue exactly one registry request and land in `Resolved` or `Fallback`.
    ///
    /// Registry failures are not errors here: they become `Fallback`. Errors
    /// are only returned for an empty registration or a lookup already in flight.
    pub async fn lookup(
        &self,
        state: &LookupState,
        raw_registration: &str,
    ) -> Result<LookupState, ValuationError> {
        let in_flight = state.begin(raw_registration)?;
        let registration = in_flight.registration().unwrap_or_default().to_string();
        info!(%registration, "looking up vehicle");

        let outcome = self.registry.fetch_vehicle(&registration).await;
        let next = in_flight.complete(outcome, self.estimator.as_ref(), self.current_year)?;

        match &next {
            LookupState::Resolved { vehicle, .. } => {
                info!(
                    %registration,
                    vehicle = %vehicle.attributes.display_name(),
                    "lookup resolved"
                );
            }
            LookupState::Fallback { failure, .. } => {
                warn!(
                    %registration,
                    category = %failure.category,
                    error = %failure.message,
                    "lookup failed, falling back to manual entry"
                );
            }
            _ => {}
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HeuristicEstimator;
    use crate::valuation::FuelType;
    use async_trait::async_trait;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const YEAR: i32 = 2026;

    struct StubRegistry {
        response: Result<RegistryRecord, RegistryError>,
        calls: AtomicUsize,
        last_registration: Mutex<Option<String>>,
    }

    impl StubRegistry {
        fn new(response: Result<RegistryRecord, RegistryError>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
                last_registration: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl RegistryService for StubRegistry {
        async fn fetch_vehicle(&self, registration: &str) -> Result<RegistryRecord, RegistryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_registration.lock().unwrap() = Some(registration.to_string());
            self.response.clone()
        }
    }

    fn bmw_record() -> RegistryRecord {
        RegistryRecord {
            make: Some("BMW".to_string()),
            model: Some("320D".to_string()),
            year_of_manufacture: Some(2018),
            fuel_type: Some("HEAVY OIL".to_string()),
            engine_capacity: Some(1995),
            ..Default::default()
        }
    }

    fn orchestrator(response: Result<RegistryRecord, RegistryError>) -> Orchestrator<StubRegistry> {
        Orchestrator::new(StubRegistry::new(response), HeuristicEstimator::default())
            .with_current_year(YEAR)
    }

    #[test]
    fn test_normalize_registration() {
        assert_eq!(normalize_registration(" ab21 abc "), "AB21ABC");
        assert_eq!(normalize_registration("a\tb\n1"), "AB1");
        assert_eq!(normalize_registration("   "), "");
    }

    #[test]
    fn test_begin_rejects_empty_registration() {
        let err = LookupState::AwaitingRegistration.begin("  ").unwrap_err();
        assert!(matches!(err, ValuationError::InvalidInput(_)));
    }

    #[test]
    fn test_begin_rejects_while_in_flight() {
        let in_flight = LookupState::AwaitingRegistration.begin("AB21ABC").unwrap();
        assert!(in_flight.is_in_flight());
        assert!(in_flight.begin("CD21DEF").is_err());
    }

    #[test]
    fn test_complete_requires_in_flight() {
        let estimator = HeuristicEstimator::default();
        let result = LookupState::AwaitingRegistration.complete(Ok(bmw_record()), &estimator, YEAR);
        assert!(result.is_err());
    }

    #[test]
    fn test_transitions_leave_previous_state_untouched() {
        let estimator = HeuristicEstimator::default();
        let in_flight = LookupState::AwaitingRegistration.begin("ab21 abc").unwrap();
        let resolved = in_flight.complete(Ok(bmw_record()), &estimator, YEAR).unwrap();
        assert!(in_flight.is_in_flight());
        assert_eq!(resolved.registration(), Some("AB21ABC"));
    }

    #[tokio::test]
    async fn test_lookup_resolves() {
        let orchestrator = orchestrator(Ok(bmw_record()));
        let state = orchestrator
            .lookup(&LookupState::AwaitingRegistration, "ab21 abc")
            .await
            .unwrap();

        assert_eq!(orchestrator.registry.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            orchestrator.registry.last_registration.lock().unwrap().as_deref(),
            Some("AB21ABC")
        );
        match state {
            LookupState::Resolved { registration, vehicle } => {
                assert_eq!(registration, "AB21ABC");
                assert_eq!(vehicle.attributes.make, "BMW");
                assert_eq!(vehicle.attributes.fuel_type, FuelType::Diesel);
                assert!(vehicle.attributes.is_ulez_compliant);
            }
            other => panic!("expected Resolved, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_not_found_falls_back() {
        let orchestrator = orchestrator(Err(RegistryError::Status {
            status: StatusCode::BAD_REQUEST,
            body: "vehicle not found".to_string(),
        }));
        let state = orchestrator
            .lookup(&LookupState::AwaitingRegistration, "ZZ99ZZZ")
            .await
            .unwrap();

        match state {
            LookupState::Fallback { registration, failure } => {
                assert_eq!(registration, "ZZ99ZZZ");
                assert_eq!(failure.category, LookupErrorCategory::RegistrationNotFound);
                assert!(matches!(
                    failure.to_error(),
                    ValuationError::LookupFailed {
                        category: LookupErrorCategory::RegistrationNotFound,
                        ..
                    }
                ));
            }
            other => panic!("expected Fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_network_failure_falls_back_without_retry() {
        let orchestrator = orchestrator(Err(RegistryError::Network("connection reset".to_string())));
        let state = orchestrator
            .lookup(&LookupState::AwaitingRegistration, "AB21ABC")
            .await
            .unwrap();

        assert_eq!(orchestrator.registry.calls.load(Ordering::SeqCst), 1);
        match state {
            LookupState::Fallback { failure, .. } => {
                assert_eq!(failure.category, LookupErrorCategory::NetworkOrCorsBlocked);
                assert!(failure.message.contains("connection reset"));
            }
            other => panic!("expected Fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_auth_failure_category() {
        let orchestrator = orchestrator(Err(RegistryError::Status {
            status: StatusCode::FORBIDDEN,
            body: String::new(),
        }));
        let state = orchestrator
            .lookup(&LookupState::AwaitingRegistration, "AB21ABC")
            .await
            .unwrap();
        assert!(matches!(
            state,
            LookupState::Fallback {
                failure: LookupFailure {
                    category: LookupErrorCategory::AuthenticationOrRateLimit,
                    ..
                },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_lookup_empty_registration_makes_no_request() {
        let orchestrator = orchestrator(Ok(bmw_record()));
        let result = orchestrator.lookup(&LookupState::AwaitingRegistration, " ").await;
        assert!(result.is_err());
        assert_eq!(orchestrator.registry.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_while_in_flight_makes_no_request() {
        let orchestrator = orchestrator(Ok(bmw_record()));
        let in_flight = LookupState::LookupInFlight {
            registration: "AB21ABC".to_string(),
        };
        assert!(orchestrator.lookup(&in_flight, "CD21DEF").await.is_err());
        assert_eq!(orchestrator.registry.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_new_lookup_allowed_after_fallback() {
        let orchestrator = orchestrator(Ok(bmw_record()));
        let fallback = LookupState::Fallback {
            registration: "OLD".to_string(),
            failure: LookupFailure {
                category: LookupErrorCategory::Other,
                message: "boom".to_string(),
            },
        };
        let state = orchestrator.lookup(&fallback, "AB21ABC").await.unwrap();
        assert!(matches!(state, LookupState::Resolved { .. }));
    }
}
