//! Used-car market and trade-in valuation for the UK market.

pub mod config;
pub mod credentials;
pub mod error;
pub mod links;
pub mod output;
pub mod registry;
pub mod session;
pub mod telemetry;
pub mod valuation;
