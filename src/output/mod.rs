pub mod formatter;

pub use formatter::{
    format_contributions, format_currency, format_json, format_links, format_lookup_failure,
    format_valuation, format_vehicle, should_use_colors, ValuationReport, VehicleReport,
};
