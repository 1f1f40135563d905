use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a registry lookup did not produce usable vehicle data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupErrorCategory {
    /// The request never got a response (connect failure, timeout, blocked origin)
    NetworkOrCorsBlocked,
    /// The registry does not know this registration
    RegistrationNotFound,
    /// The API key was rejected or the caller is being throttled
    AuthenticationOrRateLimit,
    /// Anything else; the message carries the raw detail
    Other,
}

impl LookupErrorCategory {
    /// Advice shown to the user before continuing with manual entry.
    pub fn advice(&self) -> &'static str {
        match self {
            LookupErrorCategory::NetworkOrCorsBlocked => {
                "The vehicle registry could not be reached. Check your network connection."
            }
            LookupErrorCategory::RegistrationNotFound => {
                "The registry couldn't find this vehicle. Check the registration format (e.g. AB21 ABC)."
            }
            LookupErrorCategory::AuthenticationOrRateLimit => {
                "The registry rejected the API key or is rate limiting requests."
            }
            LookupErrorCategory::Other => "The registry returned an unexpected error.",
        }
    }
}

impl fmt::Display for LookupErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LookupErrorCategory::NetworkOrCorsBlocked => "network or CORS blocked",
            LookupErrorCategory::RegistrationNotFound => "registration not found",
            LookupErrorCategory::AuthenticationOrRateLimit => "authentication or rate limit",
            LookupErrorCategory::Other => "other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("vehicle lookup failed ({category}): {message}")]
    LookupFailed {
        category: LookupErrorCategory,
        message: String,
    },

    /// A categorical key that is not in its factor table. Only reachable from
    /// string parsing; the enums themselves always resolve.
    #[error("unknown {table} key '{key}'")]
    UnknownFactorKey { table: &'static str, key: String },
}

impl ValuationError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ValuationError::InvalidInput(msg.into())
    }
}
