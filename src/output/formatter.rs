use std::io::IsTerminal;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use terminal_size::{terminal_size, Width};

use crate::links::ReferenceLink;
use crate::registry::{NormalizedVehicle, VehicleDetails};
use crate::session::LookupFailure;
use crate::valuation::engine::FactorPercentages;
use crate::valuation::{FactorContribution, UserInputs, ValuationResult, VehicleAttributes};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Whole pounds with thousands separators: 22619 -> "£22,619"
pub fn format_currency(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("£{}", grouped)
}

fn format_money(value: f64) -> String {
    format_currency(value.round().max(0.0) as u64)
}

/// Thousands separators without the currency sign, for mileages
fn format_count(value: u64) -> String {
    format_currency(value).trim_start_matches('£').to_string()
}

/// Full valuation: headline values, factor percentages and breakdown.
/// The contribution trail is appended when `verbose` is set.
pub fn format_valuation(
    vehicle: &VehicleAttributes,
    inputs: &UserInputs,
    result: &ValuationResult,
    verbose: bool,
    use_colors: bool,
) -> String {
    let mut lines = Vec::new();

    let name = vehicle.display_name();
    let market = format_currency(result.market_value);
    let trade_in = format_currency(result.trade_in_value);
    if use_colors {
        lines.push(format!("{}", name.bold()));
        lines.push(format!("  Market value:   {}", market.green().bold()));
        lines.push(format!("  Trade-in value: {}", trade_in.yellow()));
    } else {
        lines.push(name);
        lines.push(format!("  Market value:   {}", market));
        lines.push(format!("  Trade-in value: {}", trade_in));
    }

    lines.push(String::new());
    lines.push(format!(
        "  Original price: {}  ({} years, {} miles, expected {})",
        format_money(result.breakdown.base_value),
        result.breakdown.age,
        format_count(u64::from(result.breakdown.mileage)),
        format_count(result.breakdown.expected_mileage),
    ));
    lines.push(format!(
        "  Condition: {}  Service: {}  MOT: {}  Fuel: {}  ULEZ: {}",
        inputs.condition,
        inputs.service_history,
        inputs.mot_status,
        vehicle.fuel_type,
        if vehicle.is_ulez_compliant {
            "compliant"
        } else {
            "non-compliant"
        }
    ));
    lines.push(format!(
        "  Total depreciation: {:.1}%",
        result.breakdown.total_depreciation
    ));

    lines.push(String::new());
    lines.extend(format_factor_rows(&result.factors, use_colors));

    if verbose {
        lines.push(String::new());
        lines.push(format_contributions(&result.contributions, use_colors));
    }

    lines.join("\n")
}

fn format_factor_rows(factors: &FactorPercentages, use_colors: bool) -> Vec<String> {
    let rows = [
        ("Age", factors.age),
        ("Mileage", factors.mileage),
        ("Condition", factors.condition),
        ("Service history", factors.service_history),
        ("MOT", factors.mot),
        ("Market", factors.market),
        ("ULEZ", factors.ulez),
    ];

    rows.iter()
        .map(|(label, percent)| {
            let value = format!("{:>6.1}%", percent);
            if !use_colors {
                format!("  {:<16}{}", label, value)
            } else if *percent > 100.0 {
                format!("  {:<16}{}", label, value.green())
            } else if *percent < 100.0 {
                format!("  {:<16}{}", label, value.red())
            } else {
                format!("  {:<16}{}", label, value.dimmed())
            }
        })
        .collect()
}

/// Step-by-step audit of how each factor moved the value.
pub fn format_contributions(contributions: &[FactorContribution], use_colors: bool) -> String {
    contributions
        .iter()
        .map(|c| {
            let step = format!(
                "{} -> {}",
                format_money(c.before),
                format_money(c.after)
            );
            if use_colors {
                format!(
                    "  {:<16}x{:.4}  {}  {}",
                    c.label,
                    c.multiplier,
                    step.bold(),
                    c.description.dimmed()
                )
            } else {
                format!(
                    "  {:<16}x{:.4}  {}  {}",
                    c.label, c.multiplier, step, c.description
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Registry result: canonical attributes plus the display-only extras.
pub fn format_vehicle(registration: &str, vehicle: &NormalizedVehicle, use_colors: bool) -> String {
    let attrs = &vehicle.attributes;
    let header = if use_colors {
        format!("{}  {}", registration.bold(), attrs.display_name().cyan())
    } else {
        format!("{}  {}", registration, attrs.display_name())
    };

    let mut lines = vec![
        header,
        format!("  Fuel: {}", attrs.fuel_type),
        format!(
            "  Estimated original price: {}",
            format_money(attrs.original_price)
        ),
        format!(
            "  ULEZ: {}",
            if attrs.is_ulez_compliant {
                "compliant"
            } else {
                "non-compliant"
            }
        ),
    ];
    lines.extend(format_details(&vehicle.details));
    lines.join("\n")
}

fn format_details(details: &VehicleDetails) -> Vec<String> {
    let mut lines = vec![
        format!("  Engine: {}", details.engine_size),
        format!("  Colour: {}", details.colour),
        format!("  Tax: {}", details.tax_status),
        format!("  MOT: {}", details.mot_status),
        format!("  CO2: {}", details.co2_emissions),
        format!("  Euro status: {}", details.euro_status),
    ];
    let dates = [
        ("Tax due", &details.tax_due_date),
        ("MOT expiry", &details.mot_expiry_date),
        ("Last V5C issued", &details.date_of_last_v5c_issued),
    ];
    for (label, date) in dates {
        if let Some(date) = date {
            lines.push(format!("  {}: {}", label, date));
        }
    }
    lines
}

/// Category advice followed by the raw detail.
pub fn format_lookup_failure(failure: &LookupFailure, use_colors: bool) -> String {
    if use_colors {
        format!(
            "{} {}\n  {}",
            "Lookup failed:".red().bold(),
            failure.category.advice(),
            failure.message.dimmed()
        )
    } else {
        format!(
            "Lookup failed: {}\n  {}",
            failure.category.advice(),
            failure.message
        )
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Numbered reference sites: index, label, URL, description.
/// Descriptions are truncated to the terminal width; pipes get full text.
pub fn format_links(links: &[ReferenceLink], use_colors: bool) -> String {
    format_links_with_width(links, use_colors, get_terminal_width())
}

fn format_links_with_width(
    links: &[ReferenceLink],
    use_colors: bool,
    term_width: Option<usize>,
) -> String {
    let label_width = links.iter().map(|l| l.label.len()).max().unwrap_or(0);
    let separator = "  ";

    links
        .iter()
        .enumerate()
        .map(|(idx, link)| {
            let index_str = format!("{:>2}.", idx + 1);
            let label = format!("{:<width$}", link.label, width = label_width);
            let fixed_width =
                index_str.len() + 1 + label_width + separator.len() * 2 + link.url.len();

            let description = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_text(link.description, width - fixed_width)
                }
                Some(_) => truncate_text(link.description, 20),
                None => link.description.to_string(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    label.bold(),
                    separator,
                    link.url.underline(),
                    separator,
                    description
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, label, separator, link.url, separator, description
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Machine-readable output for `--json`.
#[derive(Debug, Serialize)]
pub struct ValuationReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<&'a str>,
    pub vehicle: &'a VehicleAttributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a VehicleDetails>,
    pub inputs: &'a UserInputs,
    pub valuation: &'a ValuationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_failure: Option<&'a LookupFailure>,
}

/// Machine-readable output for `lookup --json`.
#[derive(Debug, Serialize)]
pub struct VehicleReport<'a> {
    pub registration: &'a str,
    #[serde(flatten)]
    pub vehicle: &'a NormalizedVehicle,
}

pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")
}
