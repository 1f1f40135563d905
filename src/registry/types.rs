use serde::{Deserialize, Deserializer, Serialize};

/// Vehicle record as returned by the registry enquiry service.
///
/// Every field is optional; the service omits whatever it does not hold.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year_of_manufacture: Option<i64>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    /// Engine capacity in cc
    #[serde(default, deserialize_with = "lenient_number")]
    pub engine_capacity: Option<i64>,
    #[serde(default)]
    pub colour: Option<String>,
    #[serde(default)]
    pub tax_status: Option<String>,
    #[serde(default)]
    pub mot_status: Option<String>,
    /// g/km
    #[serde(default, deserialize_with = "lenient_number")]
    pub co2_emissions: Option<i64>,
    #[serde(default)]
    pub euro_status: Option<String>,
    #[serde(default)]
    pub tax_due_date: Option<String>,
    #[serde(default)]
    pub mot_expiry_date: Option<String>,
    #[serde(default, rename = "dateOfLastV5CIssued")]
    pub date_of_last_v5c_issued: Option<String>,
}

/// Request body for the registry enquiry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRequest<'a> {
    pub registration_number: &'a str,
}

/// Accept a JSON number or a numeric string. Anything else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(serde_json::Value::String(s)) => parse_leading_int(&s),
        _ => None,
    })
}

/// Leading integer of a string, e.g. "2019" or "1998cc".
fn parse_leading_int(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}
