use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{RegistryRecord, RegistryRequest};
use crate::error::LookupErrorCategory;

pub const DEFAULT_ENDPOINT: &str =
    "https://driver-vehicle-licensing.api.gov.uk/vehicle-enquiry/v1/vehicles";
pub const DEFAULT_TIMEOUT: &str = "10s";
const USER_AGENT: &str = concat!("trade-value/", env!("CARGO_PKG_VERSION"));

/// Registry connection settings.
///
/// Example YAML:
/// ```yaml
/// registry:
///   endpoint: https://driver-vehicle-licensing.api.gov.uk/vehicle-enquiry/v1/vehicles
///   api_key: "..."
///   timeout: 10s
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// The TRADE_VALUE_API_KEY environment variable takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Transport timeout as a human duration ("10s", "1m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("no registry API key configured")]
    MissingApiKey,

    /// No HTTP response was received
    #[error("network error: {0}")]
    Network(String),

    #[error("registry returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unreadable registry response: {0}")]
    Decode(String),
}

impl RegistryError {
    /// Map the failure onto the category shown to the user.
    pub fn category(&self) -> LookupErrorCategory {
        match self {
            RegistryError::MissingApiKey => LookupErrorCategory::AuthenticationOrRateLimit,
            RegistryError::Network(_) => LookupErrorCategory::NetworkOrCorsBlocked,
            RegistryError::Status { status, .. } => match *status {
                StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                    LookupErrorCategory::RegistrationNotFound
                }
                StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
                | StatusCode::TOO_MANY_REQUESTS => LookupErrorCategory::AuthenticationOrRateLimit,
                _ => LookupErrorCategory::Other,
            },
            RegistryError::Decode(_) => LookupErrorCategory::Other,
        }
    }
}

/// A source of registry records, keyed by normalized registration.
#[async_trait]
pub trait RegistryService: Send + Sync {
    async fn fetch_vehicle(&self, registration: &str) -> Result<RegistryRecord, RegistryError>;
}

/// HTTP client for the vehicle enquiry API.
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

/// Install the ring crypto provider for rustls 0.23+. Safe to call more than once.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Build a registry client from configuration and an optional API key.
pub fn create_client(
    config: &RegistryConfig,
    api_key: Option<String>,
) -> anyhow::Result<RegistryClient> {
    use anyhow::Context;

    install_crypto_provider();

    let timeout: Duration = humantime::parse_duration(&config.timeout)
        .with_context(|| format!("Invalid registry timeout '{}'", config.timeout))?;

    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to create registry HTTP client")?;

    Ok(RegistryClient {
        http,
        endpoint: config.endpoint.clone(),
        api_key,
    })
}

#[async_trait]
impl RegistryService for RegistryClient {
    async fn fetch_vehicle(&self, registration: &str) -> Result<RegistryRecord, RegistryError> {
        let api_key = self.api_key.as_deref().ok_or(RegistryError::MissingApiKey)?;

        debug!(registration, endpoint = %self.endpoint, "sending registry enquiry");

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header(http::header::ACCEPT, "application/json")
            .json(&RegistryRequest {
                registration_number: registration,
            })
            .send()
            .await
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        let status = response.status();
        debug!(registration, status = status.as_u16(), "registry responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(registration, status = status.as_u16(), "registry enquiry rejected");
            return Err(RegistryError::Status { status, body });
        }

        response
            .json::<RegistryRecord>()
            .await
            .map_err(|e| RegistryError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> RegistryError {
        RegistryError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            body: String::new(),
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(status(400).category(), LookupErrorCategory::RegistrationNotFound);
        assert_eq!(status(404).category(), LookupErrorCategory::RegistrationNotFound);
        assert_eq!(status(401).category(), LookupErrorCategory::AuthenticationOrRateLimit);
        assert_eq!(status(403).category(), LookupErrorCategory::AuthenticationOrRateLimit);
        assert_eq!(status(429).category(), LookupErrorCategory::AuthenticationOrRateLimit);
        assert_eq!(status(500).category(), LookupErrorCategory::Other);
        assert_eq!(status(503).category(), LookupErrorCategory::Other);
    }

    #[test]
    fn test_transport_classification() {
        assert_eq!(
            RegistryError::Network("connection refused".to_string()).category(),
            LookupErrorCategory::NetworkOrCorsBlocked
        );
        assert_eq!(
            RegistryError::Decode("expected value".to_string()).category(),
            LookupErrorCategory::Other
        );
        assert_eq!(
            RegistryError::MissingApiKey.category(),
            LookupErrorCategory::AuthenticationOrRateLimit
        );
    }

    #[test]
    fn test_status_error_message_keeps_body() {
        let err = RegistryError::Status {
            status: StatusCode::BAD_REQUEST,
            body: "Invalid format for field - vehicle registration number".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("vehicle registration number"));
    }

    #[test]
    fn test_default_registry_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout, "10s");
    }

    #[test]
    fn test_create_client_rejects_bad_timeout() {
        let config = RegistryConfig {
            timeout: "soon".to_string(),
            ..Default::default()
        };
        assert!(create_client(&config, None).is_err());
    }

    /// Serve one canned HTTP response and hand back the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}/vehicles", addr), handle)
    }

    fn client_for(endpoint: String) -> RegistryClient {
        // Loopback traffic must not be routed through an ambient HTTP proxy
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()
            .unwrap();
        RegistryClient {
            http,
            endpoint,
            api_key: Some("secret-key".to_string()),
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_key_and_registration() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"registrationNumber":"AB21ABC","make":"FORD","yearOfManufacture":2021,"engineCapacity":"998"}"#,
        )
        .await;

        let record = client_for(endpoint).fetch_vehicle("AB21ABC").await.unwrap();
        assert_eq!(record.make.as_deref(), Some("FORD"));
        assert_eq!(record.year_of_manufacture, Some(2021));
        assert_eq!(record.engine_capacity, Some(998));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /vehicles "));
        assert!(request.to_lowercase().contains("x-api-key: secret-key"));
        assert!(request.ends_with(r#"{"registrationNumber":"AB21ABC"}"#));
    }

    #[tokio::test]
    async fn test_fetch_rejected_keeps_status_and_body() {
        let (endpoint, server) = serve_once(
            "400 Bad Request",
            r#"{"errors":[{"detail":"Invalid format for field - vehicle registration number"}]}"#,
        )
        .await;

        let err = client_for(endpoint).fetch_vehicle("NOTAREG").await.unwrap_err();
        server.await.unwrap();
        match &err {
            RegistryError::Status { status, body } => {
                assert_eq!(*status, StatusCode::BAD_REQUEST);
                assert!(body.contains("vehicle registration number"));
            }
            other => panic!("expected Status, got {:?}", other),
        }
        assert_eq!(err.category(), LookupErrorCategory::RegistrationNotFound);
    }

    #[tokio::test]
    async fn test_fetch_forbidden_is_auth_category() {
        let (endpoint, server) = serve_once("403 Forbidden", r#"{"message":"Forbidden"}"#).await;

        let err = client_for(endpoint).fetch_vehicle("AB21ABC").await.unwrap_err();
        server.await.unwrap();
        assert!(matches!(err, RegistryError::Status { .. }));
        assert_eq!(err.category(), LookupErrorCategory::AuthenticationOrRateLimit);
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_is_decode_error() {
        let (endpoint, server) = serve_once("200 OK", "not json").await;

        let err = client_for(endpoint).fetch_vehicle("AB21ABC").await.unwrap_err();
        server.await.unwrap();
        assert!(matches!(err, RegistryError::Decode(_)));
        assert_eq!(err.category(), LookupErrorCategory::Other);
    }

    #[tokio::test]
    async fn test_fetch_refused_connection_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(format!("http://{}/vehicles", addr))
            .fetch_vehicle("AB21ABC")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Network(_)));
        assert_eq!(err.category(), LookupErrorCategory::NetworkOrCorsBlocked);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let config = RegistryConfig {
            endpoint: "http://127.0.0.1:9/unreachable".to_string(),
            ..Default::default()
        };
        let client = create_client(&config, None).unwrap();
        let err = client.fetch_vehicle("AB21ABC").await.unwrap_err();
        assert_eq!(err, RegistryError::MissingApiKey);
    }
}
