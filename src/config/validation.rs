use super::schema::Config;

const MIN_CUTOFF_YEAR: i32 = 1900;
const MAX_CUTOFF_YEAR: i32 = 2100;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Registry
    let endpoint = config.registry.endpoint.trim();
    if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
        errors.push(format!(
            "registry.endpoint: must be an http(s) URL, got '{}'",
            config.registry.endpoint
        ));
    }
    if let Err(e) = humantime::parse_duration(&config.registry.timeout) {
        errors.push(format!(
            "registry.timeout: invalid duration '{}' - {}",
            config.registry.timeout, e
        ));
    }

    // Valuation
    if let Some(cap) = config.valuation.mileage_cap {
        if !cap.is_finite() || cap < 1.0 {
            errors.push(format!(
                "valuation.mileage_cap: must be a number >= 1.0, got {}",
                cap
            ));
        }
    }

    // Estimation
    if let Some(price) = config.estimation.default_base_price {
        if !price.is_finite() || price <= 0.0 {
            errors.push(format!(
                "estimation.default_base_price: must be positive, got {}",
                price
            ));
        }
    }
    if let Some(ref brands) = config.estimation.brand_base_prices {
        let mut names: Vec<&String> = brands.keys().collect();
        names.sort();
        for name in names {
            let price = brands[name];
            if name.trim().is_empty() {
                errors.push("estimation.brand_base_prices: brand name must not be empty".to_string());
            }
            if !price.is_finite() || price <= 0.0 {
                errors.push(format!(
                    "estimation.brand_base_prices.{}: must be positive, got {}",
                    name, price
                ));
            }
        }
    }
    for (field, year) in [
        ("petrol_cutoff_year", config.estimation.petrol_cutoff_year),
        ("diesel_cutoff_year", config.estimation.diesel_cutoff_year),
    ] {
        if let Some(year) = year {
            if !(MIN_CUTOFF_YEAR..=MAX_CUTOFF_YEAR).contains(&year) {
                errors.push(format!(
                    "estimation.{}: must be between {} and {}, got {}",
                    field, MIN_CUTOFF_YEAR, MAX_CUTOFF_YEAR, year
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
